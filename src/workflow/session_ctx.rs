//! 会话上下文
//!
//! 封装"我正在等待哪份文档的哪个问题"这一信息

use std::fmt::Display;

use crate::models::{DocumentId, QuestionHandle};

/// 一次轮询会话的上下文，仅用于日志和记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCtx {
    /// 问题句柄
    pub question_id: QuestionHandle,
    /// 所属文档（手动检查时未知）
    pub file_id: Option<DocumentId>,
}

impl SessionCtx {
    pub fn new(question_id: QuestionHandle, file_id: Option<DocumentId>) -> Self {
        Self {
            question_id,
            file_id,
        }
    }
}

impl Display for SessionCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.file_id {
            Some(file_id) => write!(f, "[文档 {} 问题 {}]", file_id, self.question_id),
            None => write!(f, "[问题 {}]", self.question_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let ctx = SessionCtx::new(QuestionHandle::new("q1"), Some(DocumentId::new("f1")));
        assert_eq!(ctx.to_string(), "[文档 f1 问题 q1]");

        let ctx = SessionCtx::new(QuestionHandle::new("q1"), None);
        assert_eq!(ctx.to_string(), "[问题 q1]");
    }
}

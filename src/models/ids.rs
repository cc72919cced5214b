//! 服务端下发的不透明标识符

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// 文档ID（`POST /files` 返回的 `file_id`）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// 问题句柄（`POST /questions` 返回的 `question_id`）
///
/// 一经下发即不可变，一次轮询会话期间由调用方持有。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionHandle(String);

impl QuestionHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 去掉首尾空白后是否为空
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl Display for QuestionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_serializes_as_plain_string() {
        let handle = QuestionHandle::new("q-1");
        assert_eq!(serde_json::to_string(&handle).unwrap(), "\"q-1\"");

        let doc: DocumentId = serde_json::from_str("\"f-9\"").unwrap();
        assert_eq!(doc.as_str(), "f-9");
    }

    #[test]
    fn test_blank_handle() {
        assert!(QuestionHandle::new("   ").is_blank());
        assert!(!QuestionHandle::new("abc").is_blank());
    }
}

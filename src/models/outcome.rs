//! 一次轮询会话的终态

use std::fmt::Display;

use thiserror::Error;

use super::answer::Reference;

/// 传输层失败：非 2xx 响应、网络错误或无法解码的响应体
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct TransportError {
    /// HTTP 状态码，网络层失败时为 `None`
    pub status: Option<u16>,
    /// 响应体原文或底层错误描述
    pub message: String,
}

impl TransportError {
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: body.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }
}

impl Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(code) => write!(f, "HTTP {}: {}", code, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// 轮询会话的终态，每个会话恰好产生一个
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// 服务端完成计算
    Done {
        answer: String,
        references: Vec<Reference>,
    },
    /// 服务端明确报告的失败
    Error { message: String },
    /// 尝试次数耗尽时仍为 `Pending`
    TimedOut { attempts: u32 },
    /// 传输失败，不重试
    TransportError(TransportError),
}

impl Outcome {
    pub fn is_done(&self) -> bool {
        matches!(self, Outcome::Done { .. })
    }

    /// 用于日志和记录文件的短标签
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Done { .. } => "DONE",
            Outcome::Error { .. } => "ERROR",
            Outcome::TimedOut { .. } => "TIMED_OUT",
            Outcome::TransportError(_) => "TRANSPORT_ERROR",
        }
    }
}

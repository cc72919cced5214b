//! 结果记录服务 - 业务能力层
//!
//! 只负责把每个会话的终态追加写入记录文件，不关心流程

use std::fs::OpenOptions;
use std::io::Write;

use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::{Outcome, QuestionHandle};
use crate::utils::logging::truncate_text;

/// 摘要最多保留的字符数
const SUMMARY_MAX_CHARS: usize = 80;

/// 结果记录服务
pub struct TranscriptWriter {
    path: String,
}

impl TranscriptWriter {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// 覆盖写入带时间戳的文件头
    pub fn init(&self) -> AppResult<()> {
        let header = format!(
            "{}\n问答记录 - {}\n{}\n\n",
            "=".repeat(60),
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            "=".repeat(60)
        );
        std::fs::write(&self.path, header)
            .map_err(|e| AppError::file_write_failed(self.path.clone(), e))
    }

    /// 追加一条终态记录
    ///
    /// 格式：`时间 | 问题ID | 终态 | 摘要`，摘要中的换行替换为空格
    pub fn record(&self, handle: &QuestionHandle, outcome: &Outcome) -> AppResult<()> {
        let line = format!(
            "{} | {} | {} | {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            handle,
            outcome.label(),
            summary(outcome).replace(['\n', '\r'], " ")
        );
        debug!("写入记录: {}", line.trim_end());

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| AppError::file_write_failed(self.path.clone(), e))?;

        file.write_all(line.as_bytes())
            .map_err(|e| AppError::file_write_failed(self.path.clone(), e))
    }
}

fn summary(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Done { answer, references } => format!(
            "{} (引用 {} 条)",
            truncate_text(answer, SUMMARY_MAX_CHARS),
            references.len()
        ),
        Outcome::Error { message } => truncate_text(message, SUMMARY_MAX_CHARS),
        Outcome::TimedOut { attempts } => format!("查询 {} 次后放弃", attempts),
        Outcome::TransportError(e) => truncate_text(&e.to_string(), SUMMARY_MAX_CHARS),
    }
}

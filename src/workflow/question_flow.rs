//! 问答流程 - 流程层
//!
//! 核心职责：定义"一个问题"的完整处理流程
//!
//! 流程顺序：
//! 1. 上传文档 → file_id
//! 2. 提问 → question_id
//! 3. 轮询答案 → 终态
//! 4. 写入结果记录（如果配置了记录文件）

use std::path::Path;

use futures::future::join_all;
use tracing::{info, warn};

use crate::clients::ApiClient;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{AskMode, DocumentId, Outcome, QuestionHandle};
use crate::services::{PollingService, SubmissionService, TranscriptWriter};
use crate::utils::logging::truncate_text;
use crate::workflow::session_ctx::SessionCtx;

/// 问答流程
///
/// - 编排上传、提问、轮询
/// - 每次轮询都是全新的会话，不保留上一次的任何状态
/// - 只依赖业务能力（services）
pub struct QuestionFlow {
    submission: SubmissionService,
    polling: PollingService<ApiClient>,
    transcript: Option<TranscriptWriter>,
}

impl QuestionFlow {
    /// 创建新的问答流程
    pub fn new(config: &Config) -> AppResult<Self> {
        let client = ApiClient::new(config)?;
        let transcript = config
            .output_log_file
            .as_ref()
            .map(|path| TranscriptWriter::new(path.clone()));

        Ok(Self {
            submission: SubmissionService::new(client.clone()),
            polling: PollingService::new(client, config),
            transcript,
        })
    }

    /// 初始化结果记录文件（写入文件头）
    pub fn init_transcript(&self) -> AppResult<()> {
        match &self.transcript {
            Some(writer) => writer.init(),
            None => Ok(()),
        }
    }

    /// 上传文档
    pub async fn upload(&self, path: &Path) -> AppResult<DocumentId> {
        info!("📤 正在上传文档 {}...", path.display());
        self.submission.submit_document_file(path).await
    }

    /// 提问，返回会话上下文
    pub async fn ask(
        &self,
        file_id: &DocumentId,
        question: &str,
        mode: Option<AskMode>,
    ) -> AppResult<SessionCtx> {
        info!(
            "[文档 {}] ❓ 提交问题: {}",
            file_id,
            truncate_text(question.trim(), 80)
        );
        let handle = self
            .submission
            .submit_question(file_id, question, mode)
            .await?;
        Ok(SessionCtx::new(handle, Some(file_id.clone())))
    }

    /// 等待答案：开启一个新的轮询会话直到终态
    pub async fn wait(&self, ctx: &SessionCtx) -> Outcome {
        info!("{} ⏳ 等待答案...", ctx);
        let outcome = self.polling.poll_for_answer(&ctx.question_id).await;
        info!("{} 终态: {}", ctx, outcome.label());
        self.record(ctx, &outcome);
        outcome
    }

    /// 手动重新检查一个或多个问题
    ///
    /// 每个句柄一个独立会话并发进行，结果按输入顺序返回。
    pub async fn check(&self, handles: &[QuestionHandle]) -> AppResult<Vec<Outcome>> {
        if let Some(blank) = handles.iter().position(QuestionHandle::is_blank) {
            return Err(AppError::invalid_input(
                "question_id",
                format!("第 {} 个问题ID为空", blank + 1),
            ));
        }

        let sessions = handles.iter().map(|handle| async move {
            let ctx = SessionCtx::new(handle.clone(), None);
            self.wait(&ctx).await
        });
        Ok(join_all(sessions).await)
    }

    /// 完整流程：上传 → 提问 → 等待答案
    pub async fn run(
        &self,
        path: &Path,
        question: &str,
        mode: Option<AskMode>,
    ) -> AppResult<(SessionCtx, Outcome)> {
        let file_id = self.upload(path).await?;
        let ctx = self.ask(&file_id, question, mode).await?;
        let outcome = self.wait(&ctx).await;
        Ok((ctx, outcome))
    }

    /// 写入结果记录，失败只记日志，不影响终态
    fn record(&self, ctx: &SessionCtx, outcome: &Outcome) {
        if let Some(writer) = &self.transcript {
            if let Err(e) = writer.record(&ctx.question_id, outcome) {
                warn!("{} ⚠️ 写入结果记录 {} 失败: {}", ctx, writer.path(), e);
            }
        }
    }
}

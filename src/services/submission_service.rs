//! 提交服务 - 业务能力层
//!
//! 只负责"上传文档"和"提问"两个单次请求，失败不重试

use std::path::Path;

use tracing::{debug, info, warn};

use crate::clients::ApiClient;
use crate::error::{AppError, AppResult};
use crate::models::{AskMode, DocumentId, QuestionCreate, QuestionHandle};

/// 服务端只接受的文档扩展名
const ACCEPTED_EXTENSION: &str = "docx";

/// 提交服务
pub struct SubmissionService {
    client: ApiClient,
}

impl SubmissionService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// 上传文档内容
    ///
    /// # 参数
    /// - `file_name`: 文件名（服务端据此检查扩展名）
    /// - `bytes`: 文件内容
    pub async fn submit_document(&self, file_name: &str, bytes: Vec<u8>) -> AppResult<DocumentId> {
        if bytes.is_empty() {
            return Err(AppError::invalid_input("file", "文件内容为空"));
        }
        if !has_accepted_extension(file_name) {
            warn!(
                "⚠️ 文件 {} 不是 .{}，服务端可能拒绝",
                file_name, ACCEPTED_EXTENSION
            );
        }

        let file_id = self.client.upload_file(file_name, bytes).await?;
        info!("✓ 文档上传成功，file_id: {}", file_id);
        Ok(file_id)
    }

    /// 从磁盘读取并上传文档
    pub async fn submit_document_file(&self, path: &Path) -> AppResult<DocumentId> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "uploaded.docx".to_string());

        debug!("读取文件 {}: {} 字节", path.display(), bytes.len());
        self.submit_document(&file_name, bytes).await
    }

    /// 针对文档提问
    ///
    /// 文档ID和问题在去掉首尾空白后都不能为空。
    pub async fn submit_question(
        &self,
        file_id: &DocumentId,
        question: &str,
        mode: Option<AskMode>,
    ) -> AppResult<QuestionHandle> {
        let file_id = file_id.as_str().trim();
        let question = question.trim();

        if file_id.is_empty() {
            return Err(AppError::invalid_input("file_id", "不能为空"));
        }
        if question.is_empty() {
            return Err(AppError::invalid_input("question", "不能为空"));
        }

        let payload = QuestionCreate {
            file_id: DocumentId::new(file_id),
            question: question.to_string(),
            mode,
        };

        let handle = self.client.create_question(&payload).await?;
        info!("✓ 问题提交成功，question_id: {}", handle);
        Ok(handle)
    }
}

fn has_accepted_extension(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(ACCEPTED_EXTENSION))
        .unwrap_or(false)
}

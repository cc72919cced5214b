/// 问答 API 客户端
///
/// 封装所有与问答服务 HTTP 接口相关的调用逻辑，是唯一持有 `reqwest::Client` 的地方
use std::time::Duration;

use reqwest::{Response, Url};
use tracing::debug;

use crate::config::Config;
use crate::error::{ApiError, AppError, AppResult};
use crate::models::{
    AnswerResponse, AnswerStatus, DocumentId, FileUploadResponse, QuestionCreate,
    QuestionHandle, QuestionResponse, TransportError,
};
use crate::services::polling_service::AnswerSource;

const FILES_ENDPOINT: &str = "files";
const QUESTIONS_ENDPOINT: &str = "questions";
const ANSWERS_ENDPOINT: &str = "answers";

/// 问答 API 客户端
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: Url,
    /// 只作用于提交请求；状态查询不设整体超时
    submit_timeout: Duration,
}

impl ApiClient {
    /// 创建新的客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        let base_url = Url::parse(&config.api_base_url).map_err(|e| {
            AppError::invalid_config("api_base_url", format!("{}: {}", config.api_base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::invalid_config(
                "api_base_url",
                format!("{} 不能作为根地址", config.api_base_url),
            ));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| AppError::api_request_failed("client", e))?;

        Ok(Self {
            client,
            base_url,
            submit_timeout: Duration::from_secs(config.request_timeout_secs),
        })
    }

    /// 上传文档
    ///
    /// # 参数
    /// - `file_name`: 作为 multipart 字段 `file` 的文件名
    /// - `bytes`: 文件内容
    ///
    /// # 返回
    /// 返回服务端分配的文档ID
    pub async fn upload_file(&self, file_name: &str, bytes: Vec<u8>) -> AppResult<DocumentId> {
        let url = self.endpoint(&[FILES_ENDPOINT]);
        debug!("上传文档 {} ({} 字节) -> {}", file_name, bytes.len(), url);

        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(url)
            .timeout(self.submit_timeout)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(FILES_ENDPOINT, e))?;

        let body: FileUploadResponse = Self::read_json(FILES_ENDPOINT, response).await?;
        Ok(body.file_id)
    }

    /// 针对已上传的文档提问
    ///
    /// # 返回
    /// 返回问题句柄，用于后续轮询答案
    pub async fn create_question(&self, payload: &QuestionCreate) -> AppResult<QuestionHandle> {
        let url = self.endpoint(&[QUESTIONS_ENDPOINT]);
        debug!("提问 Payload: {:?}", payload);

        let response = self
            .client
            .post(url)
            .timeout(self.submit_timeout)
            .json(payload)
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(QUESTIONS_ENDPOINT, e))?;

        let body: QuestionResponse = Self::read_json(QUESTIONS_ENDPOINT, response).await?;
        Ok(body.question_id)
    }

    /// 查询一次答案状态
    ///
    /// 非 2xx、网络失败、响应体无法解码或状态未知都视为传输失败。
    /// 请求本身没有整体超时，慢响应会一直等到返回（只有连接超时）。
    pub async fn fetch_answer(
        &self,
        handle: &QuestionHandle,
    ) -> Result<AnswerStatus, TransportError> {
        let url = self.endpoint(&[ANSWERS_ENDPOINT, handle.as_str()]);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError::network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::http(status.as_u16(), body));
        }

        let body: AnswerResponse = response
            .json()
            .await
            .map_err(|e| TransportError::network(format!("无法解析答案响应: {}", e)))?;

        debug!("答案状态: {}", body.status);

        body.into_status()
            .map_err(|s| TransportError::network(format!("未知的答案状态: {}", s)))
    }

    /// 拼接接口地址，每个片段单独做路径编码
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// 检查响应状态并解析 JSON，非 2xx 时保留响应体作为诊断信息
    async fn read_json<T: serde::de::DeserializeOwned>(
        endpoint: &str,
        response: Response,
    ) -> AppResult<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::BadResponse {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            }
            .into());
        }

        response.json().await.map_err(|source| {
            ApiError::JsonParseFailed {
                endpoint: endpoint.to_string(),
                source,
            }
            .into()
        })
    }
}

impl AnswerSource for ApiClient {
    async fn fetch_status(&self, handle: &QuestionHandle) -> Result<AnswerStatus, TransportError> {
        self.fetch_answer(handle).await
    }
}

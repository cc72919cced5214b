//! 答案相关的线上格式与领域类型
//!
//! `AnswerResponse` 是 `GET /answers/{id}` 的原始 JSON 形状，
//! `AnswerStatus` 是解码后的封闭枚举，非法状态（例如没有答案的 `Done`）无法表示。

use serde::{Deserialize, Serialize};

use super::ids::{DocumentId, QuestionHandle};

/// 服务端返回 `ERROR` 但未附带消息时使用的默认文本
pub const DEFAULT_ERROR_MESSAGE: &str = "处理失败";

/// 一条支撑片段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// 从 1 开始的相关度排名
    pub rank: i64,
    /// 片段原文（不可信内容，展示前必须转义）
    pub snippet: String,
}

/// 单次轮询得到的答案状态
///
/// 每次轮询都是全新的值，不与上一次合并。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerStatus {
    Pending,
    Done {
        answer: String,
        references: Vec<Reference>,
    },
    Error {
        message: String,
    },
}

/// `GET /answers/{question_id}` 的响应体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub status: String,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub references: Option<Vec<Reference>>,
}

impl AnswerResponse {
    /// 转换为封闭的 `AnswerStatus`
    ///
    /// 未知的状态字符串返回 `Err(status)`。
    pub fn into_status(self) -> Result<AnswerStatus, String> {
        match self.status.as_str() {
            "PENDING" => Ok(AnswerStatus::Pending),
            "DONE" => Ok(AnswerStatus::Done {
                answer: self.answer.unwrap_or_default(),
                references: self.references.unwrap_or_default(),
            }),
            "ERROR" => {
                let message = self
                    .answer
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string());
                Ok(AnswerStatus::Error { message })
            }
            _ => Err(self.status),
        }
    }
}

/// 提问模式，对应服务端的 `rag` / `stuff`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AskMode {
    Rag,
    Stuff,
}

/// `POST /files` 的响应体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileUploadResponse {
    pub file_id: DocumentId,
}

/// `POST /questions` 的请求体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionCreate {
    pub file_id: DocumentId,
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<AskMode>,
}

/// `POST /questions` 的响应体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionResponse {
    pub question_id: QuestionHandle,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(value: serde_json::Value) -> Result<AnswerStatus, String> {
        serde_json::from_value::<AnswerResponse>(value)
            .unwrap()
            .into_status()
    }

    #[test]
    fn test_pending_ignores_other_fields() {
        let status = decode(json!({"status": "PENDING", "answer": null, "references": null}));
        assert_eq!(status, Ok(AnswerStatus::Pending));
    }

    #[test]
    fn test_done_keeps_reference_order() {
        let status = decode(json!({
            "status": "DONE",
            "answer": "42",
            "references": [
                {"rank": 2, "snippet": "second"},
                {"rank": 1, "snippet": "first"}
            ]
        }))
        .unwrap();

        match status {
            AnswerStatus::Done { answer, references } => {
                assert_eq!(answer, "42");
                assert_eq!(references[0].rank, 2);
                assert_eq!(references[1].snippet, "first");
            }
            other => panic!("意外状态: {:?}", other),
        }
    }

    #[test]
    fn test_done_without_answer_or_references() {
        let status = decode(json!({"status": "DONE"}));
        assert_eq!(
            status,
            Ok(AnswerStatus::Done {
                answer: String::new(),
                references: Vec::new(),
            })
        );
    }

    #[test]
    fn test_error_falls_back_to_default_message() {
        assert_eq!(
            decode(json!({"status": "ERROR"})),
            Ok(AnswerStatus::Error {
                message: DEFAULT_ERROR_MESSAGE.to_string()
            })
        );
        assert_eq!(
            decode(json!({"status": "ERROR", "answer": ""})),
            Ok(AnswerStatus::Error {
                message: DEFAULT_ERROR_MESSAGE.to_string()
            })
        );
        assert_eq!(
            decode(json!({"status": "ERROR", "answer": "文件不存在"})),
            Ok(AnswerStatus::Error {
                message: "文件不存在".to_string()
            })
        );
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        assert_eq!(
            decode(json!({"status": "RUNNING"})),
            Err("RUNNING".to_string())
        );
    }

    #[test]
    fn test_question_create_omits_missing_mode() {
        let body = QuestionCreate {
            file_id: DocumentId::new("f1"),
            question: "什么是RAG？".to_string(),
            mode: None,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"file_id": "f1", "question": "什么是RAG？"})
        );

        let body = QuestionCreate {
            mode: Some(AskMode::Stuff),
            ..body
        };
        assert_eq!(serde_json::to_value(&body).unwrap()["mode"], "stuff");
    }
}

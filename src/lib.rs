//! # Doc Question Client
//!
//! 上传文档、针对文档提问、轮询异步计算的答案的命令行客户端
//!
//! ## 架构设计
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - 唯一持有 HTTP 连接池，只暴露接口调用能力
//! - `ApiClient` - `POST /files`、`POST /questions`、`GET /answers/{id}`
//!
//! ### ② 业务能力层（Services）
//! - `PollingService` - 轮询答案直到终态（核心状态机）
//! - `SubmissionService` - 上传文档与提问
//! - `render_service` - 渲染终态并转义不可信内容
//! - `TranscriptWriter` - 追加写结果记录
//!
//! ### ③ 流程层（Workflow）
//! - `QuestionFlow` - 上传 → 提问 → 轮询
//! - `SessionCtx` - 会话上下文（file_id + question_id）
//!
//! ### ④ 入口（App）
//! - `app` - 命令行解析与子命令分发

pub mod app;
pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::{App, Cli};
pub use clients::ApiClient;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{AnswerStatus, DocumentId, Outcome, QuestionHandle, Reference, TransportError};
pub use services::{poll_for_answer, AnswerSource, PollingService, SubmissionService};
pub use workflow::{QuestionFlow, SessionCtx};

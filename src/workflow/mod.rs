pub mod question_flow;
pub mod session_ctx;

pub use question_flow::QuestionFlow;
pub use session_ctx::SessionCtx;

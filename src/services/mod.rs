pub mod polling_service;
pub mod render_service;
pub mod submission_service;
pub mod transcript_writer;

pub use polling_service::{poll_for_answer, AnswerSource, PollingService};
pub use render_service::{escape_html, render_outcome, OutputFormat};
pub use submission_service::SubmissionService;
pub use transcript_writer::TranscriptWriter;

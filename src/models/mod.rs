pub mod answer;
pub mod ids;
pub mod outcome;

pub use answer::{
    AnswerResponse, AnswerStatus, AskMode, FileUploadResponse, QuestionCreate, QuestionResponse,
    Reference, DEFAULT_ERROR_MESSAGE,
};
pub use ids::{DocumentId, QuestionHandle};
pub use outcome::{Outcome, TransportError};

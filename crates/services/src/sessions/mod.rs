mod controller;
mod view;
mod workflow;

pub use crate::error::QuizControllerError;
pub use controller::{QuizController, SessionSettings};
pub use view::{QuestionView, SessionSnapshot, SubmissionStatus};
pub use workflow::QuizSessionService;

#![forbid(unsafe_code)]

pub mod app_services;
pub mod config;
pub mod dashboard_service;
pub mod error;
pub mod progress_service;
pub mod sessions;
pub mod submission;

pub use adapt_core::Clock;

pub use app_services::AppServices;
pub use config::EngineConfig;
pub use dashboard_service::{Dashboard, DashboardService, NextStep, RecentAttempt, SkillProgressView};
pub use error::{
    AppServicesError, ConfigError, DashboardError, ProgressServiceError, QuizControllerError,
    SubmissionError,
};
pub use progress_service::{ProgressService, ProgressUpdate};
pub use sessions::{
    QuestionView, QuizController, QuizSessionService, SessionSettings, SessionSnapshot,
    SubmissionStatus,
};
pub use submission::{
    AttemptSubmitter, HttpAttemptSubmitter, LocalAttemptSubmitter, SubmissionReceipt,
};

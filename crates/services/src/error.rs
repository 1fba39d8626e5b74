//! Shared error types for the services crate.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use adapt_core::graph::GraphError;
use adapt_core::model::{SkillId, UserId, ValidationError};
use adapt_core::quiz::SessionError;
use storage::repository::StorageError;
use storage::seed::SeedError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressServiceError {
    #[error("user {user} has no progress record for skill {skill}")]
    UnknownProgress { user: UserId, skill: SkillId },
    #[error("skill {skill} still has incomplete prerequisites")]
    PrerequisitesIncomplete { skill: SkillId },
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `DashboardService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DashboardError {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Transient failures of the attempt store boundary. Recovered by the
/// fallback feedback path, never retried.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SubmissionError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("attempt store responded with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("attempt store did not answer within {0:?}")]
    Timeout(Duration),
    #[error("attempt store returned an invalid attempt: {0}")]
    InvalidResponse(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by the quiz session controller and its service.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizControllerError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("session state lock poisoned")]
    StatePoisoned,
}

/// Errors emitted while loading `EngineConfig`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {var}: {value}")]
    InvalidEnv { var: &'static str, value: String },
    #[error("config field {field} out of range: {value}")]
    OutOfRange { field: &'static str, value: String },
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Seed(#[from] SeedError),
    #[error(transparent)]
    Submitter(#[from] SubmissionError),
}

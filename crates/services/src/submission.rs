//! The attempt store boundary: where a finished session's outcome is persisted.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, instrument};

use adapt_core::feedback::FeedbackCategory;
use adapt_core::model::{Attempt, AttemptId, AttemptSubmission, Percentage, QuizId, UserId};
use storage::repository::AttemptRepository;

use crate::Clock;
use crate::error::SubmissionError;

/// What the attempt store answers with.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionReceipt {
    /// Advisory message for the learner.
    pub feedback: String,
    pub attempt: Attempt,
}

#[async_trait]
pub trait AttemptSubmitter: Send + Sync {
    /// Persist one finished session. Called at most once per session.
    ///
    /// # Errors
    ///
    /// Returns `SubmissionError` on transport, status or decoding failures.
    async fn submit(
        &self,
        submission: &AttemptSubmission,
    ) -> Result<SubmissionReceipt, SubmissionError>;
}

//
// ─── LOCAL ─────────────────────────────────────────────────────────────────────
//

/// Classifies and appends straight to the attempt repository.
#[derive(Clone)]
pub struct LocalAttemptSubmitter {
    clock: Clock,
    attempts: Arc<dyn AttemptRepository>,
}

impl LocalAttemptSubmitter {
    #[must_use]
    pub fn new(clock: Clock, attempts: Arc<dyn AttemptRepository>) -> Self {
        Self { clock, attempts }
    }
}

#[async_trait]
impl AttemptSubmitter for LocalAttemptSubmitter {
    #[instrument(skip(self, submission), fields(user = %submission.user_id, quiz = %submission.quiz_id))]
    async fn submit(
        &self,
        submission: &AttemptSubmission,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let attempt = self
            .attempts
            .append_attempt(submission, self.clock.now())
            .await?;
        debug!(attempt = %attempt.id(), "attempt stored locally");
        Ok(SubmissionReceipt {
            feedback: attempt.feedback().message().to_owned(),
            attempt,
        })
    }
}

//
// ─── HTTP ──────────────────────────────────────────────────────────────────────
//

pub const SUBMIT_PATH: &str = "/api/quiz/submit";

/// Posts submissions to a remote attempt store.
#[derive(Clone)]
pub struct HttpAttemptSubmitter {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpAttemptSubmitter {
    /// # Errors
    ///
    /// Returns `SubmissionError::Http` if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SubmissionError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}{SUBMIT_PATH}", base_url.trim_end_matches('/')),
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[derive(Debug, Deserialize)]
struct WireReceipt {
    feedback: String,
    attempt: WireAttempt,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireAttempt {
    id: u64,
    user_id: u64,
    quiz_id: u64,
    score: f64,
    time_spent: i64,
    attempted_at: DateTime<Utc>,
}

impl WireReceipt {
    fn into_receipt(self) -> Result<SubmissionReceipt, SubmissionError> {
        let wire = self.attempt;
        let score = Percentage::new(wire.score)
            .map_err(|e| SubmissionError::InvalidResponse(e.to_string()))?;
        let attempt = Attempt::from_persisted(
            AttemptId::new(wire.id),
            UserId::new(wire.user_id),
            QuizId::new(wire.quiz_id),
            score.value(),
            wire.time_spent,
            FeedbackCategory::classify(score),
            wire.attempted_at,
        )
        .map_err(|e| SubmissionError::InvalidResponse(e.to_string()))?;
        Ok(SubmissionReceipt {
            feedback: self.feedback,
            attempt,
        })
    }
}

#[async_trait]
impl AttemptSubmitter for HttpAttemptSubmitter {
    #[instrument(
        skip(self, submission),
        fields(user = %submission.user_id, quiz = %submission.quiz_id, endpoint = %self.endpoint)
    )]
    async fn submit(
        &self,
        submission: &AttemptSubmission,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(submission)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SubmissionError::HttpStatus(status));
        }

        let body = response.bytes().await?;
        let wire: WireReceipt = serde_json::from_slice(&body)
            .map_err(|e| SubmissionError::InvalidResponse(e.to_string()))?;
        let receipt = wire.into_receipt()?;
        debug!(attempt = %receipt.attempt.id(), "attempt stored remotely");
        Ok(receipt)
    }
}

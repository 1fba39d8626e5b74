use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::feedback::FeedbackCategory;
use crate::model::ids::{AttemptId, QuizId, UserId};
use crate::model::validation::{Percentage, ValidationError, time_spent_from_secs};

//
// ─── SUBMISSION ────────────────────────────────────────────────────────────────
//

/// What a finished session hands to the attempt store.
///
/// Serializes to the submission wire shape
/// `{userId, quizId, score, timeSpent}`. Deserialization validates the score
/// range and rejects negative durations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptSubmission {
    pub user_id: UserId,
    pub quiz_id: QuizId,
    pub score: Percentage,
    pub time_spent: u32,
}

impl AttemptSubmission {
    #[must_use]
    pub fn new(user_id: UserId, quiz_id: QuizId, score: Percentage, time_spent: u32) -> Self {
        Self {
            user_id,
            quiz_id,
            score,
            time_spent,
        }
    }
}

//
// ─── ATTEMPT ───────────────────────────────────────────────────────────────────
//

/// Persisted outcome of one finished quiz session. Append-only.
#[derive(Debug, Clone, PartialEq)]
pub struct Attempt {
    id: AttemptId,
    user_id: UserId,
    quiz_id: QuizId,
    score: Percentage,
    time_spent_secs: u32,
    feedback: FeedbackCategory,
    created_at: DateTime<Utc>,
}

impl Attempt {
    /// Records a submission, classifying its score.
    #[must_use]
    pub fn record(id: AttemptId, submission: &AttemptSubmission, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: submission.user_id,
            quiz_id: submission.quiz_id,
            score: submission.score,
            time_spent_secs: submission.time_spent,
            feedback: FeedbackCategory::classify(submission.score),
            created_at,
        }
    }

    /// Rehydrate from storage or the wire.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the score is outside `[0, 100]` or the
    /// duration is negative.
    pub fn from_persisted(
        id: AttemptId,
        user_id: UserId,
        quiz_id: QuizId,
        score: f64,
        time_spent_secs: i64,
        feedback: FeedbackCategory,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            id,
            user_id,
            quiz_id,
            score: Percentage::new(score)?,
            time_spent_secs: time_spent_from_secs(time_spent_secs)?,
            feedback,
            created_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> AttemptId {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn quiz_id(&self) -> QuizId {
        self.quiz_id
    }

    #[must_use]
    pub fn score(&self) -> Percentage {
        self.score
    }

    #[must_use]
    pub fn time_spent_secs(&self) -> u32 {
        self.time_spent_secs
    }

    #[must_use]
    pub fn feedback(&self) -> FeedbackCategory {
        self.feedback
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn record_classifies_score() {
        let submission = AttemptSubmission::new(
            UserId::new(1),
            QuizId::new(2),
            Percentage::new(85.0).unwrap(),
            120,
        );
        let attempt = Attempt::record(AttemptId::new(5), &submission, fixed_now());
        assert_eq!(attempt.feedback(), FeedbackCategory::FastTrack);
        assert_eq!(attempt.time_spent_secs(), 120);
        assert_eq!(attempt.created_at(), fixed_now());
    }

    #[test]
    fn persisted_attempt_rejects_bad_values() {
        let bad_score = Attempt::from_persisted(
            AttemptId::new(1),
            UserId::new(1),
            QuizId::new(1),
            101.0,
            10,
            FeedbackCategory::FastTrack,
            fixed_now(),
        );
        assert!(matches!(
            bad_score,
            Err(ValidationError::PercentageOutOfRange(_))
        ));

        let bad_time = Attempt::from_persisted(
            AttemptId::new(1),
            UserId::new(1),
            QuizId::new(1),
            40.0,
            -5,
            FeedbackCategory::Remedial,
            fixed_now(),
        );
        assert_eq!(bad_time.unwrap_err(), ValidationError::InvalidTimeSpent(-5));
    }
}

use adapt_core::feedback::FeedbackCategory;
use adapt_core::model::{Attempt, AttemptId, AttemptSubmission, UserId};
use chrono::{DateTime, Utc};

use super::SqliteRepository;
use super::mapping::{db, id_i64, map_attempt_row};
use crate::repository::{AttemptRepository, StorageError};

#[async_trait::async_trait]
impl AttemptRepository for SqliteRepository {
    async fn append_attempt(
        &self,
        submission: &AttemptSubmission,
        created_at: DateTime<Utc>,
    ) -> Result<Attempt, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO attempts (user_id, quiz_id, score, time_spent, feedback, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(id_i64("user_id", submission.user_id.value())?)
        .bind(id_i64("quiz_id", submission.quiz_id.value())?)
        .bind(submission.score.value())
        .bind(i64::from(submission.time_spent))
        .bind(FeedbackCategory::classify(submission.score).as_str())
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(db)?;

        let id = u64::try_from(res.last_insert_rowid())
            .map_err(|_| StorageError::Serialization("attempt id sign overflow".into()))?;
        Ok(Attempt::record(AttemptId::new(id), submission, created_at))
    }

    async fn list_attempts(&self, user_id: UserId) -> Result<Vec<Attempt>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, user_id, quiz_id, score, time_spent, feedback, created_at
                FROM attempts
                WHERE user_id = ?1
                ORDER BY created_at ASC, id ASC
            ",
        )
        .bind(id_i64("user_id", user_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(db)?;

        rows.iter().map(map_attempt_row).collect()
    }
}

use adapt_core::model::{ProgressRecord, UserId};

use super::SqliteRepository;
use super::mapping::{db, id_i64, map_progress_row};
use crate::repository::{ProgressRepository, StorageError};

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn insert_progress(&self, records: &[ProgressRecord]) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(db)?;

        for record in records {
            sqlx::query(
                r"
                    INSERT INTO progress (user_id, skill_id, mastery, status)
                    VALUES (?1, ?2, ?3, ?4)
                ",
            )
            .bind(id_i64("user_id", record.user_id().value())?)
            .bind(id_i64("skill_id", record.skill_id().value())?)
            .bind(record.mastery().value())
            .bind(record.status().as_str())
            .execute(&mut *tx)
            .await
            .map_err(db)?;
        }

        tx.commit().await.map_err(db)?;
        Ok(())
    }

    async fn list_progress(&self, user_id: UserId) -> Result<Vec<ProgressRecord>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT user_id, skill_id, mastery, status
                FROM progress
                WHERE user_id = ?1
                ORDER BY seq ASC
            ",
        )
        .bind(id_i64("user_id", user_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(db)?;

        rows.iter().map(map_progress_row).collect()
    }

    async fn update_progress(&self, record: &ProgressRecord) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
                UPDATE progress
                SET mastery = ?3, status = ?4
                WHERE user_id = ?1 AND skill_id = ?2
            ",
        )
        .bind(id_i64("user_id", record.user_id().value())?)
        .bind(id_i64("skill_id", record.skill_id().value())?)
        .bind(record.mastery().value())
        .bind(record.status().as_str())
        .execute(&self.pool)
        .await
        .map_err(db)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}

use adapt_core::model::{QuizDefinition, QuizId};

use super::SqliteRepository;
use super::mapping::{db, id_i64, map_quiz_row, questions_to_json};
use crate::repository::{QuizCatalog, StorageError};

#[async_trait::async_trait]
impl QuizCatalog for SqliteRepository {
    async fn upsert_quiz(&self, quiz: &QuizDefinition) -> Result<(), StorageError> {
        let sample_size = quiz
            .configured_sample_size()
            .map(|size| {
                i64::try_from(size)
                    .map_err(|_| StorageError::Serialization("sample_size overflow".into()))
            })
            .transpose()?;
        let linked_skill = quiz
            .linked_skill()
            .map(|id| id_i64("linked_skill_id", id.value()))
            .transpose()?;
        let linked_course = quiz
            .linked_course()
            .map(|id| id_i64("linked_course_id", id.value()))
            .transpose()?;

        sqlx::query(
            r"
                INSERT INTO quizzes (
                    id, title, category, difficulty_label, points_per_question,
                    sample_size, linked_skill_id, linked_course_id, questions
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                ON CONFLICT(id) DO UPDATE SET
                    title = excluded.title,
                    category = excluded.category,
                    difficulty_label = excluded.difficulty_label,
                    points_per_question = excluded.points_per_question,
                    sample_size = excluded.sample_size,
                    linked_skill_id = excluded.linked_skill_id,
                    linked_course_id = excluded.linked_course_id,
                    questions = excluded.questions
            ",
        )
        .bind(id_i64("quiz_id", quiz.id().value())?)
        .bind(quiz.title())
        .bind(quiz.category())
        .bind(quiz.difficulty_label())
        .bind(i64::from(quiz.points_per_question()))
        .bind(sample_size)
        .bind(linked_skill)
        .bind(linked_course)
        .bind(questions_to_json(quiz.questions())?)
        .execute(&self.pool)
        .await
        .map_err(db)?;

        Ok(())
    }

    async fn get_quiz(&self, id: QuizId) -> Result<QuizDefinition, StorageError> {
        let row = sqlx::query(
            r"
                SELECT
                    id, title, category, difficulty_label, points_per_question,
                    sample_size, linked_skill_id, linked_course_id, questions
                FROM quizzes
                WHERE id = ?1
            ",
        )
        .bind(id_i64("quiz_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(db)?
        .ok_or(StorageError::NotFound)?;

        map_quiz_row(&row)
    }

    async fn list_quizzes(&self) -> Result<Vec<QuizDefinition>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    id, title, category, difficulty_label, points_per_question,
                    sample_size, linked_skill_id, linked_course_id, questions
                FROM quizzes
                ORDER BY seq ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db)?;

        rows.iter().map(map_quiz_row).collect()
    }
}

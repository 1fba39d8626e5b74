use std::collections::HashMap;

use adapt_core::model::{Skill, SkillId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{db, id_i64, map_skill_row, ser, skill_id_from_i64};
use crate::repository::{SkillCatalog, StorageError};

impl SqliteRepository {
    async fn prerequisites_of(&self, id: SkillId) -> Result<Vec<SkillId>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT prerequisite_id
                FROM skill_prerequisites
                WHERE skill_id = ?1
                ORDER BY prerequisite_id ASC
            ",
        )
        .bind(id_i64("skill_id", id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(db)?;

        rows.iter()
            .map(|row| skill_id_from_i64(row.try_get::<i64, _>("prerequisite_id").map_err(ser)?))
            .collect()
    }
}

#[async_trait::async_trait]
impl SkillCatalog for SqliteRepository {
    async fn upsert_skill(&self, skill: &Skill) -> Result<(), StorageError> {
        let id = id_i64("skill_id", skill.id().value())?;
        let mut tx = self.pool.begin().await.map_err(db)?;

        sqlx::query(
            r"
                INSERT INTO skills (id, name, category, difficulty)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    category = excluded.category,
                    difficulty = excluded.difficulty
            ",
        )
        .bind(id)
        .bind(skill.name())
        .bind(skill.category())
        .bind(i64::from(skill.difficulty().value()))
        .execute(&mut *tx)
        .await
        .map_err(db)?;

        sqlx::query("DELETE FROM skill_prerequisites WHERE skill_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db)?;

        for prerequisite in skill.prerequisites() {
            sqlx::query(
                r"
                    INSERT INTO skill_prerequisites (skill_id, prerequisite_id)
                    VALUES (?1, ?2)
                ",
            )
            .bind(id)
            .bind(id_i64("prerequisite_id", prerequisite.value())?)
            .execute(&mut *tx)
            .await
            .map_err(db)?;
        }

        tx.commit().await.map_err(db)?;
        Ok(())
    }

    async fn list_skills(&self) -> Result<Vec<Skill>, StorageError> {
        let edges = sqlx::query("SELECT skill_id, prerequisite_id FROM skill_prerequisites")
            .fetch_all(&self.pool)
            .await
            .map_err(db)?;
        let mut prerequisites: HashMap<SkillId, Vec<SkillId>> = HashMap::new();
        for edge in &edges {
            let skill = skill_id_from_i64(edge.try_get::<i64, _>("skill_id").map_err(ser)?)?;
            let prerequisite =
                skill_id_from_i64(edge.try_get::<i64, _>("prerequisite_id").map_err(ser)?)?;
            prerequisites.entry(skill).or_default().push(prerequisite);
        }

        let rows = sqlx::query(
            r"
                SELECT id, name, category, difficulty
                FROM skills
                ORDER BY seq ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let id = skill_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?;
            let prereqs = prerequisites.remove(&id).unwrap_or_default();
            out.push(map_skill_row(&row, prereqs)?);
        }
        Ok(out)
    }

    async fn get_skill(&self, id: SkillId) -> Result<Skill, StorageError> {
        let row = sqlx::query(
            r"
                SELECT id, name, category, difficulty
                FROM skills
                WHERE id = ?1
            ",
        )
        .bind(id_i64("skill_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(db)?
        .ok_or(StorageError::NotFound)?;

        let prereqs = self.prerequisites_of(id).await?;
        map_skill_row(&row, prereqs)
    }
}

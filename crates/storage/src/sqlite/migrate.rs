use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Runs the versioned schema migrations.
///
/// Version 1 creates the catalog (skills, prerequisites, quizzes), the
/// progress ledger and the attempt history.
#[allow(clippy::too_many_lines)]
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        // `seq` keeps catalog order across upserts; `id` is the domain id.
        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS skills (
                    seq INTEGER PRIMARY KEY,
                    id INTEGER NOT NULL UNIQUE,
                    name TEXT NOT NULL,
                    category TEXT,
                    difficulty INTEGER NOT NULL CHECK (difficulty BETWEEN 1 AND 10)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        // No foreign key on prerequisite_id: dependents may be seeded before
        // their prerequisites. The graph validates references on load.
        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS skill_prerequisites (
                    skill_id INTEGER NOT NULL,
                    prerequisite_id INTEGER NOT NULL,
                    PRIMARY KEY (skill_id, prerequisite_id),
                    FOREIGN KEY (skill_id) REFERENCES skills(id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS quizzes (
                    seq INTEGER PRIMARY KEY,
                    id INTEGER NOT NULL UNIQUE,
                    title TEXT NOT NULL,
                    category TEXT,
                    difficulty_label TEXT,
                    points_per_question INTEGER NOT NULL CHECK (points_per_question > 0),
                    sample_size INTEGER CHECK (sample_size IS NULL OR sample_size > 0),
                    linked_skill_id INTEGER,
                    linked_course_id INTEGER,
                    questions TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS progress (
                    seq INTEGER PRIMARY KEY,
                    user_id INTEGER NOT NULL,
                    skill_id INTEGER NOT NULL,
                    mastery REAL NOT NULL CHECK (mastery BETWEEN 0 AND 100),
                    status TEXT NOT NULL CHECK (status IN ('locked', 'in-progress', 'completed')),
                    UNIQUE (user_id, skill_id),
                    FOREIGN KEY (skill_id) REFERENCES skills(id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS attempts (
                    id INTEGER PRIMARY KEY,
                    user_id INTEGER NOT NULL,
                    quiz_id INTEGER NOT NULL,
                    score REAL NOT NULL CHECK (score BETWEEN 0 AND 100),
                    time_spent INTEGER NOT NULL CHECK (time_spent >= 0),
                    feedback TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_progress_user_seq
                    ON progress (user_id, seq);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_attempts_user_created
                    ON attempts (user_id, created_at, id);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::debug!(version = 1, "applied schema migration");
    }

    Ok(())
}

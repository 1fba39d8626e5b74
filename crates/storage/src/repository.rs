use adapt_core::model::{
    Attempt, AttemptId, AttemptSubmission, ProgressRecord, QuizDefinition, QuizId, Skill, SkillId,
    UserId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── CONTRACTS ─────────────────────────────────────────────────────────────────
//

/// Read side of the skill catalog, plus the upsert used by seeding.
#[async_trait]
pub trait SkillCatalog: Send + Sync {
    /// Insert a skill, or replace the one with the same id in place.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the skill cannot be stored.
    async fn upsert_skill(&self, skill: &Skill) -> Result<(), StorageError>;

    /// All skills in catalog (first-insert) order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend or decoding failures.
    async fn list_skills(&self) -> Result<Vec<Skill>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no skill has this id.
    async fn get_skill(&self, id: SkillId) -> Result<Skill, StorageError>;
}

#[async_trait]
pub trait QuizCatalog: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the quiz cannot be stored.
    async fn upsert_quiz(&self, quiz: &QuizDefinition) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no quiz has this id.
    async fn get_quiz(&self, id: QuizId) -> Result<QuizDefinition, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend or decoding failures.
    async fn list_quizzes(&self) -> Result<Vec<QuizDefinition>, StorageError>;
}

/// Per-learner progress ledger.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Insert new records. All-or-nothing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if any (user, skill) pair already has a record.
    async fn insert_progress(&self, records: &[ProgressRecord]) -> Result<(), StorageError>;

    /// A learner's records in insertion order. Empty if the learner is unknown.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend or decoding failures.
    async fn list_progress(&self, user_id: UserId) -> Result<Vec<ProgressRecord>, StorageError>;

    /// Overwrite status and mastery of an existing record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the record does not exist.
    async fn update_progress(&self, record: &ProgressRecord) -> Result<(), StorageError>;
}

/// Append-only attempt history.
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// Persist a finished session and return the stored attempt with its id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the attempt cannot be stored.
    async fn append_attempt(
        &self,
        submission: &AttemptSubmission,
        created_at: DateTime<Utc>,
    ) -> Result<Attempt, StorageError>;

    /// A learner's attempts, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend or decoding failures.
    async fn list_attempts(&self, user_id: UserId) -> Result<Vec<Attempt>, StorageError>;
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

#[derive(Default)]
struct AttemptLog {
    next_id: u64,
    entries: Vec<Attempt>,
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    skills: Arc<Mutex<Vec<Skill>>>,
    quizzes: Arc<Mutex<Vec<QuizDefinition>>>,
    progress: Arc<Mutex<HashMap<UserId, Vec<ProgressRecord>>>>,
    attempts: Arc<Mutex<AttemptLog>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StorageError> {
    mutex
        .lock()
        .map_err(|e| StorageError::Connection(e.to_string()))
}

#[async_trait]
impl SkillCatalog for InMemoryRepository {
    async fn upsert_skill(&self, skill: &Skill) -> Result<(), StorageError> {
        let mut guard = lock(&self.skills)?;
        match guard.iter_mut().find(|s| s.id() == skill.id()) {
            Some(existing) => *existing = skill.clone(),
            None => guard.push(skill.clone()),
        }
        Ok(())
    }

    async fn list_skills(&self) -> Result<Vec<Skill>, StorageError> {
        Ok(lock(&self.skills)?.clone())
    }

    async fn get_skill(&self, id: SkillId) -> Result<Skill, StorageError> {
        let guard = lock(&self.skills)?;
        guard
            .iter()
            .find(|s| s.id() == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl QuizCatalog for InMemoryRepository {
    async fn upsert_quiz(&self, quiz: &QuizDefinition) -> Result<(), StorageError> {
        let mut guard = lock(&self.quizzes)?;
        match guard.iter_mut().find(|q| q.id() == quiz.id()) {
            Some(existing) => *existing = quiz.clone(),
            None => guard.push(quiz.clone()),
        }
        Ok(())
    }

    async fn get_quiz(&self, id: QuizId) -> Result<QuizDefinition, StorageError> {
        let guard = lock(&self.quizzes)?;
        guard
            .iter()
            .find(|q| q.id() == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn list_quizzes(&self) -> Result<Vec<QuizDefinition>, StorageError> {
        Ok(lock(&self.quizzes)?.clone())
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn insert_progress(&self, records: &[ProgressRecord]) -> Result<(), StorageError> {
        let mut guard = lock(&self.progress)?;

        let mut incoming = HashSet::with_capacity(records.len());
        for record in records {
            let key = (record.user_id(), record.skill_id());
            let exists = guard
                .get(&key.0)
                .is_some_and(|rows| rows.iter().any(|r| r.skill_id() == key.1));
            if exists || !incoming.insert(key) {
                return Err(StorageError::Conflict);
            }
        }

        for record in records {
            guard
                .entry(record.user_id())
                .or_default()
                .push(record.clone());
        }
        Ok(())
    }

    async fn list_progress(&self, user_id: UserId) -> Result<Vec<ProgressRecord>, StorageError> {
        let guard = lock(&self.progress)?;
        Ok(guard.get(&user_id).cloned().unwrap_or_default())
    }

    async fn update_progress(&self, record: &ProgressRecord) -> Result<(), StorageError> {
        let mut guard = lock(&self.progress)?;
        let existing = guard
            .get_mut(&record.user_id())
            .and_then(|rows| rows.iter_mut().find(|r| r.skill_id() == record.skill_id()))
            .ok_or(StorageError::NotFound)?;
        *existing = record.clone();
        Ok(())
    }
}

#[async_trait]
impl AttemptRepository for InMemoryRepository {
    async fn append_attempt(
        &self,
        submission: &AttemptSubmission,
        created_at: DateTime<Utc>,
    ) -> Result<Attempt, StorageError> {
        let mut guard = lock(&self.attempts)?;
        guard.next_id += 1;
        let attempt = Attempt::record(AttemptId::new(guard.next_id), submission, created_at);
        guard.entries.push(attempt.clone());
        Ok(attempt)
    }

    async fn list_attempts(&self, user_id: UserId) -> Result<Vec<Attempt>, StorageError> {
        let guard = lock(&self.attempts)?;
        Ok(guard
            .entries
            .iter()
            .filter(|a| a.user_id() == user_id)
            .cloned()
            .collect())
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub skills: Arc<dyn SkillCatalog>,
    pub quizzes: Arc<dyn QuizCatalog>,
    pub progress: Arc<dyn ProgressRepository>,
    pub attempts: Arc<dyn AttemptRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            skills: Arc::new(repo.clone()),
            quizzes: Arc::new(repo.clone()),
            progress: Arc::new(repo.clone()),
            attempts: Arc::new(repo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adapt_core::feedback::FeedbackCategory;
    use adapt_core::model::{Difficulty, Percentage, SkillStatus};
    use adapt_core::time::fixed_now;

    fn build_skill(id: u64, name: &str) -> Skill {
        Skill::new(
            SkillId::new(id),
            name,
            None,
            Difficulty::new(2).unwrap(),
            [],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn upsert_keeps_catalog_position() {
        let repo = InMemoryRepository::new();
        repo.upsert_skill(&build_skill(5, "First")).await.unwrap();
        repo.upsert_skill(&build_skill(2, "Second")).await.unwrap();
        repo.upsert_skill(&build_skill(5, "First, renamed"))
            .await
            .unwrap();

        let skills = repo.list_skills().await.unwrap();
        let names: Vec<_> = skills.iter().map(Skill::name).collect();
        assert_eq!(names, vec!["First, renamed", "Second"]);
        assert!(matches!(
            repo.get_skill(SkillId::new(9)).await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn progress_insert_is_all_or_nothing() {
        let repo = InMemoryRepository::new();
        let user = UserId::new(1);
        let first = ProgressRecord::new(user, SkillId::new(1), SkillStatus::InProgress);
        repo.insert_progress(std::slice::from_ref(&first))
            .await
            .unwrap();

        let second = ProgressRecord::new(user, SkillId::new(2), SkillStatus::Locked);
        let err = repo
            .insert_progress(&[second, first.clone()])
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict));
        assert_eq!(repo.list_progress(user).await.unwrap(), vec![first]);
    }

    #[tokio::test]
    async fn update_requires_existing_record() {
        let repo = InMemoryRepository::new();
        let mut record = ProgressRecord::new(UserId::new(1), SkillId::new(1), SkillStatus::Locked);
        assert!(matches!(
            repo.update_progress(&record).await,
            Err(StorageError::NotFound)
        ));

        repo.insert_progress(std::slice::from_ref(&record))
            .await
            .unwrap();
        record.advance_to(SkillStatus::Completed).unwrap();
        repo.update_progress(&record).await.unwrap();
        let stored = repo.list_progress(UserId::new(1)).await.unwrap();
        assert_eq!(stored[0].status(), SkillStatus::Completed);
        assert_eq!(stored[0].mastery(), Percentage::FULL);
    }

    #[tokio::test]
    async fn attempts_get_sequential_ids_and_filter_by_user() {
        let repo = InMemoryRepository::new();
        let score = Percentage::new(45.0).unwrap();
        let mine = AttemptSubmission::new(UserId::new(1), QuizId::new(1), score, 30);
        let theirs = AttemptSubmission::new(UserId::new(2), QuizId::new(1), score, 30);

        let a = repo.append_attempt(&mine, fixed_now()).await.unwrap();
        let b = repo.append_attempt(&theirs, fixed_now()).await.unwrap();
        assert_eq!(a.id(), AttemptId::new(1));
        assert_eq!(b.id(), AttemptId::new(2));
        assert_eq!(a.feedback(), FeedbackCategory::Remedial);

        let listed = repo.list_attempts(UserId::new(1)).await.unwrap();
        assert_eq!(listed, vec![a]);
    }
}

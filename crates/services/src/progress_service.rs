use std::collections::HashSet;
use std::sync::Arc;

use adapt_core::graph::SkillGraph;
use adapt_core::model::{Percentage, ProgressRecord, SkillId, SkillStatus, UserId};
use storage::repository::{InMemoryRepository, ProgressRepository, SkillCatalog};
use tracing::{info, instrument};

use crate::error::ProgressServiceError;

/// Outcome of a status change request.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub record: ProgressRecord,
    /// `false` when the record already had the requested status.
    pub changed: bool,
}

/// Onboarding and progress-ledger mutations for one catalog.
#[derive(Clone)]
pub struct ProgressService {
    skills: Arc<dyn SkillCatalog>,
    progress: Arc<dyn ProgressRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(skills: Arc<dyn SkillCatalog>, progress: Arc<dyn ProgressRepository>) -> Self {
        Self { skills, progress }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self::new(Arc::new(repo.clone()), Arc::new(repo))
    }

    /// Load the catalog and validate it as a graph.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Graph` for cycles or dangling prerequisites.
    pub async fn load_graph(&self) -> Result<SkillGraph, ProgressServiceError> {
        let skills = self.skills.list_skills().await?;
        Ok(SkillGraph::new(skills)?)
    }

    /// Create the learner's ledger from the current catalog. A learner who
    /// already has records gets them back unchanged.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError` if the catalog is invalid or storage fails.
    #[instrument(skip(self), fields(user = %user_id))]
    pub async fn onboard(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ProgressRecord>, ProgressServiceError> {
        let existing = self.progress.list_progress(user_id).await?;
        if !existing.is_empty() {
            info!(records = existing.len(), "learner already onboarded");
            return Ok(existing);
        }

        let graph = self.load_graph().await?;
        let records = graph.initialize_progress(user_id);
        self.progress.insert_progress(&records).await?;
        info!(records = records.len(), "onboarded learner");
        Ok(records)
    }

    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` on repository failures.
    pub async fn progress(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ProgressRecord>, ProgressServiceError> {
        Ok(self.progress.list_progress(user_id).await?)
    }

    /// Mark a skill completed (mastery 100). Repeating the call is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::UnknownProgress` if the learner has no
    /// record for the skill.
    #[instrument(skip(self), fields(user = %user_id, skill = %skill_id))]
    pub async fn complete_skill(
        &self,
        user_id: UserId,
        skill_id: SkillId,
    ) -> Result<ProgressUpdate, ProgressServiceError> {
        let update = self
            .transition(user_id, skill_id, SkillStatus::Completed)
            .await?;
        if update.changed {
            info!("skill completed");
        }
        Ok(update)
    }

    /// Unlock a skill for study once its prerequisites are completed.
    ///
    /// # Errors
    ///
    /// - `ProgressServiceError::PrerequisitesIncomplete` if any prerequisite is not completed.
    /// - `ProgressServiceError::Validation` if the skill is already completed.
    #[instrument(skip(self), fields(user = %user_id, skill = %skill_id))]
    pub async fn start_skill(
        &self,
        user_id: UserId,
        skill_id: SkillId,
    ) -> Result<ProgressUpdate, ProgressServiceError> {
        let graph = self.load_graph().await?;
        let records = self.progress.list_progress(user_id).await?;
        let completed: HashSet<SkillId> = records
            .iter()
            .filter(|r| r.is_completed())
            .map(ProgressRecord::skill_id)
            .collect();
        if !graph.is_unlockable(skill_id, &completed)? {
            return Err(ProgressServiceError::PrerequisitesIncomplete { skill: skill_id });
        }
        self.transition(user_id, skill_id, SkillStatus::InProgress)
            .await
    }

    /// # Errors
    ///
    /// Returns `ProgressServiceError::UnknownProgress` if the learner has no
    /// record for the skill.
    pub async fn set_mastery(
        &self,
        user_id: UserId,
        skill_id: SkillId,
        mastery: Percentage,
    ) -> Result<ProgressRecord, ProgressServiceError> {
        let mut record = self.find(user_id, skill_id).await?;
        record.set_mastery(mastery);
        self.progress.update_progress(&record).await?;
        Ok(record)
    }

    async fn transition(
        &self,
        user_id: UserId,
        skill_id: SkillId,
        next: SkillStatus,
    ) -> Result<ProgressUpdate, ProgressServiceError> {
        let mut record = self.find(user_id, skill_id).await?;
        let changed = record.advance_to(next)?;
        if changed {
            self.progress.update_progress(&record).await?;
        }
        Ok(ProgressUpdate { record, changed })
    }

    async fn find(
        &self,
        user_id: UserId,
        skill_id: SkillId,
    ) -> Result<ProgressRecord, ProgressServiceError> {
        self.progress
            .list_progress(user_id)
            .await?
            .into_iter()
            .find(|r| r.skill_id() == skill_id)
            .ok_or(ProgressServiceError::UnknownProgress {
                user: user_id,
                skill: skill_id,
            })
    }
}

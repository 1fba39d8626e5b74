use std::sync::Arc;

use rand::Rng;
use tracing::instrument;

use adapt_core::model::{QuizDefinition, QuizId, UserId};
use storage::repository::QuizCatalog;

use super::controller::{QuizController, SessionSettings};
use crate::error::QuizControllerError;
use crate::submission::AttemptSubmitter;

/// Starts live quiz sessions from the quiz catalog.
#[derive(Clone)]
pub struct QuizSessionService {
    quizzes: Arc<dyn QuizCatalog>,
    submitter: Arc<dyn AttemptSubmitter>,
    settings: SessionSettings,
}

impl QuizSessionService {
    #[must_use]
    pub fn new(
        quizzes: Arc<dyn QuizCatalog>,
        submitter: Arc<dyn AttemptSubmitter>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            quizzes,
            submitter,
            settings,
        }
    }

    #[must_use]
    pub fn settings(&self) -> SessionSettings {
        self.settings
    }

    /// Load a quiz and start a session over a freshly shuffled question set.
    ///
    /// # Errors
    ///
    /// Returns `QuizControllerError::Storage` (`NotFound` for unknown quizzes).
    #[instrument(skip(self), fields(user = %user_id, quiz = %quiz_id))]
    pub async fn start(
        &self,
        user_id: UserId,
        quiz_id: QuizId,
    ) -> Result<QuizController, QuizControllerError> {
        let quiz = self.quizzes.get_quiz(quiz_id).await?;
        self.launch(user_id, &quiz, &mut rand::rng())
    }

    /// Start a session over an already loaded quiz with an injected random source.
    ///
    /// # Errors
    ///
    /// Returns `QuizControllerError::Session` if the session cannot start.
    pub fn launch<R>(
        &self,
        user_id: UserId,
        quiz: &QuizDefinition,
        rng: &mut R,
    ) -> Result<QuizController, QuizControllerError>
    where
        R: Rng + ?Sized,
    {
        QuizController::launch(user_id, quiz, Arc::clone(&self.submitter), self.settings, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adapt_core::quiz::SessionPhase;
    use adapt_core::time::fixed_clock;
    use storage::repository::{InMemoryRepository, StorageError};
    use storage::seed::demo_catalog;

    use crate::submission::LocalAttemptSubmitter;

    async fn service() -> QuizSessionService {
        let repo = InMemoryRepository::new();
        for quiz in demo_catalog().unwrap().quizzes {
            repo.upsert_quiz(&quiz).await.unwrap();
        }
        let submitter = LocalAttemptSubmitter::new(fixed_clock(), Arc::new(repo.clone()));
        QuizSessionService::new(
            Arc::new(repo),
            Arc::new(submitter),
            SessionSettings::default(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn start_draws_the_configured_sample() {
        let service = service().await;
        let controller = service
            .start(UserId::new(1), QuizId::new(3))
            .await
            .unwrap();

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.phase, SessionPhase::Active);
        assert_eq!(snapshot.progress.total, 3);
        assert_eq!(snapshot.progress.remaining_secs, 300);
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_quiz_is_not_found() {
        let service = service().await;
        let err = service
            .start(UserId::new(1), QuizId::new(99))
            .await
            .err()
            .unwrap();
        assert!(matches!(
            err,
            QuizControllerError::Storage(StorageError::NotFound)
        ));
    }
}

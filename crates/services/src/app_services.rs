use std::sync::Arc;

use storage::repository::Storage;
use storage::seed::{SeedReport, seed_demo_catalog};
use tracing::info;

use crate::Clock;
use crate::config::EngineConfig;
use crate::dashboard_service::DashboardService;
use crate::error::{AppServicesError, SubmissionError};
use crate::progress_service::ProgressService;
use crate::sessions::QuizSessionService;
use crate::submission::{AttemptSubmitter, HttpAttemptSubmitter, LocalAttemptSubmitter};

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    storage: Storage,
    progress: Arc<ProgressService>,
    dashboard: Arc<DashboardService>,
    quiz_sessions: Arc<QuizSessionService>,
}

impl AppServices {
    /// Build services backed by `SQLite` at `config.database_url`.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails or the HTTP
    /// submitter cannot be built.
    pub async fn new_sqlite(config: &EngineConfig, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(&config.database_url).await?;
        Self::from_storage(storage, config, clock)
    }

    /// # Errors
    ///
    /// Returns `AppServicesError::Submitter` if the HTTP submitter cannot be built.
    pub fn in_memory(config: &EngineConfig, clock: Clock) -> Result<Self, AppServicesError> {
        Self::from_storage(Storage::in_memory(), config, clock)
    }

    /// # Errors
    ///
    /// Returns `AppServicesError::Submitter` if the HTTP submitter cannot be built.
    pub fn from_storage(
        storage: Storage,
        config: &EngineConfig,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let submitter = build_submitter(&storage, config, clock)?;

        let progress = Arc::new(ProgressService::new(
            Arc::clone(&storage.skills),
            Arc::clone(&storage.progress),
        ));
        let dashboard = Arc::new(
            DashboardService::new(
                Arc::clone(&storage.skills),
                Arc::clone(&storage.quizzes),
                Arc::clone(&storage.progress),
                Arc::clone(&storage.attempts),
            )
            .with_weak_spot_threshold(config.weak_spot_threshold)
            .with_forecast(Arc::new(config.forecast())),
        );
        let quiz_sessions = Arc::new(QuizSessionService::new(
            Arc::clone(&storage.quizzes),
            submitter,
            config.session_settings(),
        ));

        Ok(Self {
            storage,
            progress,
            dashboard,
            quiz_sessions,
        })
    }

    /// Upsert the demo catalog.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Seed` if the catalog cannot be stored.
    pub async fn seed_demo(&self) -> Result<SeedReport, AppServicesError> {
        Ok(seed_demo_catalog(&self.storage).await?)
    }

    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn dashboard(&self) -> Arc<DashboardService> {
        Arc::clone(&self.dashboard)
    }

    #[must_use]
    pub fn quiz_sessions(&self) -> Arc<QuizSessionService> {
        Arc::clone(&self.quiz_sessions)
    }
}

fn build_submitter(
    storage: &Storage,
    config: &EngineConfig,
    clock: Clock,
) -> Result<Arc<dyn AttemptSubmitter>, SubmissionError> {
    match config.attempt_store_url.as_deref() {
        Some(url) => {
            info!(url, "submitting attempts to remote store");
            Ok(Arc::new(HttpAttemptSubmitter::new(
                url,
                config.submission_timeout(),
            )?))
        }
        None => Ok(Arc::new(LocalAttemptSubmitter::new(
            clock,
            Arc::clone(&storage.attempts),
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adapt_core::model::UserId;
    use adapt_core::time::fixed_clock;

    #[tokio::test]
    async fn seeded_in_memory_services_onboard_and_report() {
        let services = AppServices::in_memory(&EngineConfig::default(), fixed_clock()).unwrap();
        let report = services.seed_demo().await.unwrap();
        assert_eq!(report.skills, 5);

        let user = UserId::new(1);
        let records = services.progress().onboard(user).await.unwrap();
        assert_eq!(records.len(), 5);

        let dashboard = services.dashboard().dashboard(user).await.unwrap();
        assert_eq!(dashboard.overall_completion, 0);
        assert_eq!(dashboard.skills[0].name, "HTML Basics");
    }

    #[test]
    fn remote_store_url_selects_http_submitter() {
        let config = EngineConfig {
            attempt_store_url: Some("http://localhost:5000".into()),
            ..EngineConfig::default()
        };
        assert!(AppServices::in_memory(&config, fixed_clock()).is_ok());
    }
}

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use rand::Rng;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{info, warn};

use adapt_core::feedback::FeedbackCategory;
use adapt_core::model::{AttemptSubmission, QuizDefinition, QuizId, UserId};
use adapt_core::quiz::{CountdownTick, DEFAULT_TIME_BUDGET_SECS, QuizSession, SessionPhase, Step};

use super::view::{SessionSnapshot, SubmissionStatus};
use crate::error::{QuizControllerError, SubmissionError};
use crate::submission::AttemptSubmitter;

/// Timing knobs for live quiz sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub time_budget_secs: u32,
    /// Upper bound on one attempt submission before falling back to local feedback.
    pub submission_timeout: Duration,
    /// Wall time per countdown second.
    pub tick_interval: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            time_budget_secs: DEFAULT_TIME_BUDGET_SECS,
            submission_timeout: Duration::from_secs(10),
            tick_interval: Duration::from_secs(1),
        }
    }
}

//
// ─── SHARED STATE ──────────────────────────────────────────────────────────────
//

struct Shared {
    session: QuizSession,
    submission: SubmissionStatus,
}

struct PendingSubmission {
    submission: AttemptSubmission,
    category: FeedbackCategory,
}

impl Shared {
    /// Claims the single submission of a session that has just finished.
    fn begin_submission(&mut self) -> Option<PendingSubmission> {
        if !matches!(self.submission, SubmissionStatus::NotStarted) {
            return None;
        }
        let submission = self.session.submission()?;
        let category = self.session.result()?.feedback;
        self.submission = SubmissionStatus::Pending;
        Some(PendingSubmission {
            submission,
            category,
        })
    }
}

struct Inner {
    shared: Mutex<Shared>,
    updates: watch::Sender<SessionSnapshot>,
    submitter: Arc<dyn AttemptSubmitter>,
    submission_timeout: Duration,
}

impl Inner {
    fn lock(&self) -> Result<MutexGuard<'_, Shared>, QuizControllerError> {
        self.shared
            .lock()
            .map_err(|_| QuizControllerError::StatePoisoned)
    }

    fn publish(&self, shared: &Shared) -> SessionSnapshot {
        let snapshot = SessionSnapshot::capture(&shared.session, &shared.submission);
        self.updates.send_replace(snapshot.clone());
        snapshot
    }
}

//
// ─── TASKS ─────────────────────────────────────────────────────────────────────
//

fn spawn_submission(inner: &Arc<Inner>, pending: PendingSubmission) {
    tokio::spawn(submit(Arc::clone(inner), pending));
}

async fn submit(inner: Arc<Inner>, pending: PendingSubmission) {
    let PendingSubmission {
        submission,
        category,
    } = pending;

    let outcome = match time::timeout(
        inner.submission_timeout,
        inner.submitter.submit(&submission),
    )
    .await
    {
        Ok(result) => result,
        Err(_) => Err(SubmissionError::Timeout(inner.submission_timeout)),
    };

    let status = match outcome {
        Ok(receipt) => {
            info!(
                attempt = %receipt.attempt.id(),
                quiz = %submission.quiz_id,
                "attempt persisted"
            );
            SubmissionStatus::Persisted {
                attempt: receipt.attempt,
                feedback: receipt.feedback,
            }
        }
        Err(err) => {
            warn!(
                error = %err,
                quiz = %submission.quiz_id,
                category = %category,
                "attempt submission failed, using local feedback"
            );
            SubmissionStatus::Fallback {
                reason: err.to_string(),
                feedback: category.message().to_owned(),
            }
        }
    };

    match inner.lock() {
        Ok(mut shared) => {
            shared.submission = status;
            inner.publish(&shared);
        }
        Err(err) => warn!(error = %err, "could not record submission outcome"),
    }
}

async fn run_timer(inner: Arc<Inner>, period: Duration) {
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        let pending = {
            let mut shared = match inner.lock() {
                Ok(shared) => shared,
                Err(err) => {
                    warn!(error = %err, "stopping quiz timer");
                    return;
                }
            };
            match shared.session.tick() {
                CountdownTick::Running { .. } => {
                    inner.publish(&shared);
                    continue;
                }
                CountdownTick::Idle => return,
                CountdownTick::Expired => {
                    info!(quiz = %shared.session.quiz_id(), "quiz time expired");
                    let pending = shared.begin_submission();
                    inner.publish(&shared);
                    pending
                }
            }
        };
        if let Some(pending) = pending {
            spawn_submission(&inner, pending);
        }
        return;
    }
}

//
// ─── CONTROLLER ────────────────────────────────────────────────────────────────
//

/// A live quiz session: the state machine, its 1 Hz countdown task, and the
/// one-shot attempt submission once it finishes.
///
/// Dropping the controller stops the countdown; a submission already in
/// flight still completes.
pub struct QuizController {
    inner: Arc<Inner>,
    timer: Option<JoinHandle<()>>,
}

impl QuizController {
    /// Draws the question set from `rng` and starts the countdown.
    ///
    /// Must be called inside a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `QuizControllerError::Session` if the session cannot start.
    pub fn launch<R>(
        user_id: UserId,
        quiz: &QuizDefinition,
        submitter: Arc<dyn AttemptSubmitter>,
        settings: SessionSettings,
        rng: &mut R,
    ) -> Result<Self, QuizControllerError>
    where
        R: Rng + ?Sized,
    {
        let mut session = QuizSession::new(user_id, quiz, settings.time_budget_secs);
        let phase = session.start(rng)?;

        let shared = Shared {
            session,
            submission: SubmissionStatus::NotStarted,
        };
        let (updates, _) = watch::channel(SessionSnapshot::capture(
            &shared.session,
            &shared.submission,
        ));
        let inner = Arc::new(Inner {
            shared: Mutex::new(shared),
            updates,
            submitter,
            submission_timeout: settings.submission_timeout,
        });

        let timer = if phase == SessionPhase::Active {
            info!(
                user = %user_id,
                quiz = %quiz.id(),
                questions = inner.updates.borrow().progress.total,
                budget_secs = settings.time_budget_secs,
                "quiz session started"
            );
            let period = settings.tick_interval.max(Duration::from_millis(1));
            Some(tokio::spawn(run_timer(Arc::clone(&inner), period)))
        } else {
            warn!(quiz = %quiz.id(), "quiz has no questions");
            None
        };

        Ok(Self { inner, timer })
    }

    /// # Errors
    ///
    /// - `QuizControllerError::Session` unless active, or for an out-of-range option.
    /// - `QuizControllerError::StatePoisoned` if a previous holder panicked.
    pub fn select_option(&self, index: usize) -> Result<SessionSnapshot, QuizControllerError> {
        let mut shared = self.inner.lock()?;
        shared.session.select_option(index)?;
        Ok(self.inner.publish(&shared))
    }

    /// Records the selected answer; finishing the last question stops the
    /// countdown and hands the attempt to the submitter.
    ///
    /// # Errors
    ///
    /// - `QuizControllerError::Session` unless active, or with nothing selected.
    /// - `QuizControllerError::StatePoisoned` if a previous holder panicked.
    pub fn advance(&self) -> Result<SessionSnapshot, QuizControllerError> {
        let (snapshot, pending) = {
            let mut shared = self.inner.lock()?;
            let pending = match shared.session.advance()? {
                Step::Next { .. } => None,
                Step::Finished => {
                    info!(quiz = %shared.session.quiz_id(), "quiz completed");
                    shared.begin_submission()
                }
            };
            (self.inner.publish(&shared), pending)
        };

        if let Some(pending) = pending {
            self.stop_timer();
            spawn_submission(&self.inner, pending);
        }
        Ok(snapshot)
    }

    /// Abandons the session. Nothing is submitted.
    ///
    /// # Errors
    ///
    /// - `QuizControllerError::Session` from a terminal state.
    /// - `QuizControllerError::StatePoisoned` if a previous holder panicked.
    pub fn cancel(&self) -> Result<SessionSnapshot, QuizControllerError> {
        let snapshot = {
            let mut shared = self.inner.lock()?;
            shared.session.cancel()?;
            info!(quiz = %shared.session.quiz_id(), "quiz cancelled");
            self.inner.publish(&shared)
        };
        self.stop_timer();
        Ok(snapshot)
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.updates.borrow().clone()
    }

    /// A receiver that observes every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.updates.subscribe()
    }

    #[must_use]
    pub fn quiz_id(&self) -> QuizId {
        self.inner.updates.borrow().quiz_id
    }

    /// Resolves once the session is terminal and any submission has settled.
    pub async fn wait_settled(&self) -> SessionSnapshot {
        let mut updates = self.inner.updates.subscribe();
        match updates.wait_for(SessionSnapshot::is_settled).await {
            Ok(snapshot) => (*snapshot).clone(),
            Err(_) => self.snapshot(),
        }
    }

    fn stop_timer(&self) {
        if let Some(timer) = &self.timer {
            timer.abort();
        }
    }
}

impl Drop for QuizController {
    fn drop(&mut self) {
        self.stop_timer();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adapt_core::model::{Percentage, QuizQuestion};
    use adapt_core::quiz::{FinishReason, SessionError};
    use adapt_core::time::fixed_clock;
    use async_trait::async_trait;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use storage::repository::{AttemptRepository, InMemoryRepository};

    use crate::submission::{LocalAttemptSubmitter, SubmissionReceipt};

    const USER: UserId = UserId::new(9);

    struct FailingSubmitter;

    #[async_trait]
    impl AttemptSubmitter for FailingSubmitter {
        async fn submit(
            &self,
            _submission: &AttemptSubmission,
        ) -> Result<SubmissionReceipt, SubmissionError> {
            Err(SubmissionError::InvalidResponse("boom".into()))
        }
    }

    struct StalledSubmitter;

    #[async_trait]
    impl AttemptSubmitter for StalledSubmitter {
        async fn submit(
            &self,
            _submission: &AttemptSubmission,
        ) -> Result<SubmissionReceipt, SubmissionError> {
            time::sleep(Duration::from_secs(3600)).await;
            Err(SubmissionError::InvalidResponse("too late".into()))
        }
    }

    /// Every question's first option is correct.
    fn quiz(questions: usize) -> QuizDefinition {
        let pool = (0..questions)
            .map(|i| QuizQuestion::new(format!("Q{i}"), vec!["yes".into(), "no".into()], 0).unwrap())
            .collect();
        QuizDefinition::new(QuizId::new(1), "Timed", pool).unwrap()
    }

    fn settings(budget: u32) -> SessionSettings {
        SessionSettings {
            time_budget_secs: budget,
            ..SessionSettings::default()
        }
    }

    fn local(repo: &InMemoryRepository) -> Arc<dyn AttemptSubmitter> {
        Arc::new(LocalAttemptSubmitter::new(fixed_clock(), Arc::new(repo.clone())))
    }

    fn launch(
        questions: usize,
        budget: u32,
        submitter: Arc<dyn AttemptSubmitter>,
    ) -> QuizController {
        QuizController::launch(
            USER,
            &quiz(questions),
            submitter,
            settings(budget),
            &mut StdRng::seed_from_u64(3),
        )
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_publishes_every_second() {
        let repo = InMemoryRepository::new();
        let controller = launch(2, 5, local(&repo));
        let mut updates = controller.subscribe();

        updates.changed().await.unwrap();
        assert_eq!(updates.borrow().progress.remaining_secs, 4);
        updates.changed().await.unwrap();
        assert_eq!(updates.borrow().progress.remaining_secs, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_finishes_with_partial_log_and_submits_once() {
        let repo = InMemoryRepository::new();
        let controller = launch(3, 3, local(&repo));
        controller.select_option(0).unwrap();
        controller.advance().unwrap();

        let settled = controller.wait_settled().await;
        let result = settled.result.unwrap();
        assert_eq!(result.finish_reason, FinishReason::TimeExpired);
        assert_eq!(result.answer_log.len(), 1);
        assert_eq!(result.time_spent_secs, 3);
        assert!((result.score_percentage.value() - 100.0 / 3.0).abs() < 1e-9);
        assert!(matches!(settled.submission, SubmissionStatus::Persisted { .. }));

        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(repo.list_attempts(USER).await.unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn normal_finish_stops_the_countdown() {
        let repo = InMemoryRepository::new();
        let controller = launch(2, 30, local(&repo));
        for _ in 0..2 {
            controller.select_option(0).unwrap();
            controller.advance().unwrap();
        }

        let settled = controller.wait_settled().await;
        let result = settled.result.unwrap();
        assert_eq!(result.finish_reason, FinishReason::Completed);
        assert_eq!(result.score_percentage, Percentage::FULL);
        assert_eq!(
            settled.submission.feedback(),
            Some(FeedbackCategory::FastTrack.message())
        );

        time::sleep(Duration::from_secs(60)).await;
        let after = controller.snapshot();
        assert_eq!(after.result.unwrap().finish_reason, FinishReason::Completed);
        assert_eq!(repo.list_attempts(USER).await.unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_submission_falls_back_to_local_feedback() {
        let controller = launch(1, 30, Arc::new(FailingSubmitter));
        controller.select_option(1).unwrap();
        controller.advance().unwrap();

        let settled = controller.wait_settled().await;
        assert_eq!(settled.result.unwrap().feedback, FeedbackCategory::Remedial);
        assert_eq!(
            settled.submission,
            SubmissionStatus::Fallback {
                reason: "attempt store returned an invalid attempt: boom".into(),
                feedback: FeedbackCategory::Remedial.message().into(),
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_submission_times_out() {
        let controller = launch(1, 30, Arc::new(StalledSubmitter));
        controller.select_option(0).unwrap();
        let finished = controller.advance().unwrap();
        assert_eq!(finished.phase, SessionPhase::Finished);
        assert!(finished.submission.is_pending());

        let settled = controller.wait_settled().await;
        let SubmissionStatus::Fallback { reason, feedback } = settled.submission else {
            panic!("expected fallback");
        };
        assert!(reason.contains("did not answer"));
        assert_eq!(feedback, FeedbackCategory::FastTrack.message());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_persists_nothing_and_stops_the_countdown() {
        let repo = InMemoryRepository::new();
        let controller = launch(2, 3, local(&repo));
        controller.cancel().unwrap();

        time::sleep(Duration::from_secs(10)).await;
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.phase, SessionPhase::Cancelled);
        assert_eq!(snapshot.progress.remaining_secs, 3);
        assert!(repo.list_attempts(USER).await.unwrap().is_empty());

        let err = controller.select_option(0).unwrap_err();
        assert!(matches!(
            err,
            QuizControllerError::Session(SessionError::InvalidTransition { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_pool_is_unavailable_and_settled() {
        let repo = InMemoryRepository::new();
        let controller = launch(0, 30, local(&repo));
        let snapshot = controller.wait_settled().await;
        assert_eq!(snapshot.phase, SessionPhase::Unavailable);
        assert_eq!(snapshot.submission, SubmissionStatus::NotStarted);
    }
}

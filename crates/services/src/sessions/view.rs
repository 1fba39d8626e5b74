use adapt_core::model::{Attempt, QuizId};
use adapt_core::quiz::{QuizResult, QuizSession, SessionPhase, SessionProgress};

/// Where a finished session's attempt stands with the attempt store.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SubmissionStatus {
    #[default]
    NotStarted,
    Pending,
    Persisted { attempt: Attempt, feedback: String },
    /// The store failed or timed out; `feedback` is the local advisory.
    Fallback { reason: String, feedback: String },
}

impl SubmissionStatus {
    #[must_use]
    pub fn feedback(&self) -> Option<&str> {
        match self {
            Self::Persisted { feedback, .. } | Self::Fallback { feedback, .. } => Some(feedback),
            Self::NotStarted | Self::Pending => None,
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// The question on screen. Does not reveal the correct option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView {
    /// 1-based.
    pub number: usize,
    pub text: String,
    pub options: Vec<String>,
}

/// Presentation-agnostic copy of a controller's state, broadcast on every change.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub quiz_id: QuizId,
    pub phase: SessionPhase,
    pub question: Option<QuestionView>,
    pub selected: Option<usize>,
    pub progress: SessionProgress,
    pub result: Option<QuizResult>,
    pub submission: SubmissionStatus,
}

impl SessionSnapshot {
    #[must_use]
    pub fn capture(session: &QuizSession, submission: &SubmissionStatus) -> Self {
        let progress = session.progress();
        let question = session
            .current_question()
            .zip(progress.current)
            .map(|(q, number)| QuestionView {
                number,
                text: q.text().to_owned(),
                options: q.options().to_vec(),
            });
        Self {
            quiz_id: session.quiz_id(),
            phase: session.phase(),
            question,
            selected: session.selected_option(),
            progress,
            result: session.result().cloned(),
            submission: submission.clone(),
        }
    }

    /// Terminal, with no submission still in flight.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        match self.phase {
            SessionPhase::Finished => {
                !matches!(
                    self.submission,
                    SubmissionStatus::NotStarted | SubmissionStatus::Pending
                )
            }
            SessionPhase::Unavailable | SessionPhase::Cancelled => true,
            SessionPhase::Loading | SessionPhase::Active => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adapt_core::model::{QuizDefinition, QuizQuestion, UserId};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn session() -> QuizSession {
        let quiz = QuizDefinition::new(
            QuizId::new(1),
            "Quiz",
            vec![QuizQuestion::new("Q1", vec!["a".into(), "b".into()], 1).unwrap()],
        )
        .unwrap();
        QuizSession::new(UserId::new(1), &quiz, 30)
    }

    #[test]
    fn active_snapshot_shows_question_without_answer() {
        let mut session = session();
        session.start(&mut StdRng::seed_from_u64(1)).unwrap();
        let snapshot = SessionSnapshot::capture(&session, &SubmissionStatus::NotStarted);

        let question = snapshot.question.as_ref().unwrap();
        assert_eq!(question.number, 1);
        assert_eq!(question.options, vec!["a".to_owned(), "b".to_owned()]);
        assert!(!snapshot.is_settled());
    }

    #[test]
    fn finished_snapshot_settles_once_submission_resolves() {
        let mut session = session();
        session.start(&mut StdRng::seed_from_u64(1)).unwrap();
        session.select_option(1).unwrap();
        session.advance().unwrap();

        let pending = SessionSnapshot::capture(&session, &SubmissionStatus::Pending);
        assert!(pending.question.is_none());
        assert!(!pending.is_settled());

        let fallback = SubmissionStatus::Fallback {
            reason: "offline".into(),
            feedback: "Good progress. Keep practicing.".into(),
        };
        let settled = SessionSnapshot::capture(&session, &fallback);
        assert!(settled.is_settled());
        assert_eq!(
            settled.submission.feedback(),
            Some("Good progress. Keep practicing.")
        );
    }

    #[test]
    fn cancelled_snapshot_is_settled() {
        let mut session = session();
        session.cancel().unwrap();
        assert!(SessionSnapshot::capture(&session, &SubmissionStatus::NotStarted).is_settled());
    }
}

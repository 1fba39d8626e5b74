use std::fmt;

use rand::Rng;
use thiserror::Error;

use crate::feedback::FeedbackCategory;
use crate::model::{
    AttemptSubmission, Percentage, QuizDefinition, QuizId, QuizQuestion, UserId, ValidationError,
};
use crate::quiz::sampling::draw_sample;
use crate::quiz::timer::{Countdown, CountdownTick};

//
// ─── EVENTS & PHASES ───────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionEvent {
    Start,
    Select,
    Advance,
    Tick,
    Cancel,
}

impl fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::Select => "select",
            Self::Advance => "advance",
            Self::Tick => "tick",
            Self::Cancel => "cancel",
        };
        f.write_str(name)
    }
}

/// How a phase treats an incoming event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Allowed,
    Ignored,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    Loading,
    Active,
    Finished,
    Unavailable,
    Cancelled,
}

impl SessionPhase {
    /// The transition table.
    #[must_use]
    pub fn disposition(self, event: SessionEvent) -> Disposition {
        use Disposition::{Allowed, Ignored, Rejected};
        use SessionEvent::{Advance, Cancel, Select, Start, Tick};

        match (self, event) {
            (Self::Loading, Start | Cancel) => Allowed,
            (Self::Active, Select | Advance | Tick | Cancel) => Allowed,
            (_, Tick) => Ignored,
            _ => Rejected,
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Unavailable | Self::Cancelled)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Loading => "loading",
            Self::Active => "active",
            Self::Finished => "finished",
            Self::Unavailable => "unavailable",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("cannot {event} while the session is {phase}")]
    InvalidTransition {
        phase: SessionPhase,
        event: SessionEvent,
    },

    #[error("no option selected for the current question")]
    NoSelection,

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

//
// ─── RESULT ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerRecord {
    pub question_index: usize,
    pub selected_option: usize,
    pub correct_option: usize,
    pub is_correct: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Completed,
    TimeExpired,
}

/// Outcome of a finished session, computed locally at the moment it finished.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizResult {
    pub score_percentage: Percentage,
    pub points: u32,
    pub question_count: usize,
    pub feedback: FeedbackCategory,
    pub answer_log: Vec<AnswerRecord>,
    pub time_spent_secs: u32,
    pub finish_reason: FinishReason,
}

impl QuizResult {
    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.answer_log.iter().filter(|a| a.is_correct).count()
    }
}

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Loading,
    Active {
        question_index: usize,
        selected: Option<usize>,
    },
    Finished(QuizResult),
    Unavailable,
    Cancelled,
}

impl SessionState {
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        match self {
            Self::Loading => SessionPhase::Loading,
            Self::Active { .. } => SessionPhase::Active,
            Self::Finished(_) => SessionPhase::Finished,
            Self::Unavailable => SessionPhase::Unavailable,
            Self::Cancelled => SessionPhase::Cancelled,
        }
    }
}

/// What `advance` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Next { question_index: usize },
    Finished,
}

/// Counters for a progress bar or status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    /// 1-based number of the question on screen, while active.
    pub current: Option<usize>,
    pub remaining_secs: u32,
    pub correct: usize,
    pub wrong: usize,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One learner's timed run through a sampled question set.
///
/// Every mutation goes through the transition table in
/// [`SessionPhase::disposition`]. Time only moves when the owner calls
/// [`QuizSession::tick`], once per elapsed second.
#[derive(Debug, Clone)]
pub struct QuizSession {
    user_id: UserId,
    quiz_id: QuizId,
    points_per_question: u32,
    sample_size: usize,
    pool: Vec<QuizQuestion>,
    questions: Vec<QuizQuestion>,
    answer_log: Vec<AnswerRecord>,
    points: u32,
    countdown: Countdown,
    state: SessionState,
}

impl QuizSession {
    #[must_use]
    pub fn new(user_id: UserId, quiz: &QuizDefinition, time_budget_secs: u32) -> Self {
        Self {
            user_id,
            quiz_id: quiz.id(),
            points_per_question: quiz.points_per_question(),
            sample_size: quiz.sample_size(),
            pool: quiz.questions().to_vec(),
            questions: Vec::new(),
            answer_log: Vec::new(),
            points: 0,
            countdown: Countdown::new(time_budget_secs),
            state: SessionState::Loading,
        }
    }

    /// Draws the question set and starts the countdown. An empty pool ends in
    /// `Unavailable` instead.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless the session is loading.
    pub fn start<R>(&mut self, rng: &mut R) -> Result<SessionPhase, SessionError>
    where
        R: Rng + ?Sized,
    {
        self.admit(SessionEvent::Start)?;

        self.questions = draw_sample(&self.pool, self.sample_size, rng);
        if self.questions.is_empty() {
            self.state = SessionState::Unavailable;
        } else {
            self.state = SessionState::Active {
                question_index: 0,
                selected: None,
            };
            self.countdown.start();
        }
        Ok(self.phase())
    }

    /// Chooses an answer for the current question. May be called repeatedly.
    ///
    /// # Errors
    ///
    /// - `SessionError::InvalidTransition` unless active.
    /// - `SessionError::Validation` if `index` does not address an option.
    pub fn select_option(&mut self, index: usize) -> Result<(), SessionError> {
        self.admit(SessionEvent::Select)?;
        let SessionState::Active {
            question_index,
            selected,
        } = &mut self.state
        else {
            return Err(self.rejected(SessionEvent::Select));
        };
        self.questions[*question_index].check_option(index)?;
        *selected = Some(index);
        Ok(())
    }

    /// Records the selected answer and moves on, finishing after the last question.
    ///
    /// # Errors
    ///
    /// - `SessionError::InvalidTransition` unless active.
    /// - `SessionError::NoSelection` if nothing was selected.
    pub fn advance(&mut self) -> Result<Step, SessionError> {
        self.admit(SessionEvent::Advance)?;
        let SessionState::Active {
            question_index,
            selected,
        } = self.state
        else {
            return Err(self.rejected(SessionEvent::Advance));
        };
        let selected_option = selected.ok_or(SessionError::NoSelection)?;

        let correct_option = self.questions[question_index].correct_option();
        let is_correct = selected_option == correct_option;
        if is_correct {
            self.points = self.points.saturating_add(self.points_per_question);
        }
        self.answer_log.push(AnswerRecord {
            question_index,
            selected_option,
            correct_option,
            is_correct,
        });

        let next = question_index + 1;
        if next < self.questions.len() {
            self.state = SessionState::Active {
                question_index: next,
                selected: None,
            };
            Ok(Step::Next {
                question_index: next,
            })
        } else {
            self.finish(FinishReason::Completed);
            Ok(Step::Finished)
        }
    }

    /// Feeds one elapsed second. Reaching zero finishes the session with the
    /// answers logged so far; outside `Active` this is a no-op.
    pub fn tick(&mut self) -> CountdownTick {
        if self.phase().disposition(SessionEvent::Tick) != Disposition::Allowed {
            self.countdown.stop();
            return CountdownTick::Idle;
        }
        let tick = self.countdown.tick();
        if tick == CountdownTick::Expired {
            self.finish(FinishReason::TimeExpired);
        }
        tick
    }

    /// Abandons the session. Nothing is scored.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` from a terminal state.
    pub fn cancel(&mut self) -> Result<(), SessionError> {
        self.admit(SessionEvent::Cancel)?;
        self.countdown.stop();
        self.state = SessionState::Cancelled;
        Ok(())
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.state.phase()
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn quiz_id(&self) -> QuizId {
        self.quiz_id
    }

    /// The drawn question set, empty until started.
    #[must_use]
    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&QuizQuestion> {
        match self.state {
            SessionState::Active { question_index, .. } => self.questions.get(question_index),
            _ => None,
        }
    }

    #[must_use]
    pub fn selected_option(&self) -> Option<usize> {
        match self.state {
            SessionState::Active { selected, .. } => selected,
            _ => None,
        }
    }

    #[must_use]
    pub fn answer_log(&self) -> &[AnswerRecord] {
        &self.answer_log
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        self.countdown.remaining()
    }

    #[must_use]
    pub fn result(&self) -> Option<&QuizResult> {
        match &self.state {
            SessionState::Finished(result) => Some(result),
            _ => None,
        }
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let correct = self.answer_log.iter().filter(|a| a.is_correct).count();
        let current = match self.state {
            SessionState::Active { question_index, .. } => Some(question_index + 1),
            _ => None,
        };
        SessionProgress {
            total: self.questions.len(),
            answered: self.answer_log.len(),
            current,
            remaining_secs: self.countdown.remaining(),
            correct,
            wrong: self.answer_log.len() - correct,
        }
    }

    /// The attempt record to persist, once finished.
    #[must_use]
    pub fn submission(&self) -> Option<AttemptSubmission> {
        self.result().map(|result| {
            AttemptSubmission::new(
                self.user_id,
                self.quiz_id,
                result.score_percentage,
                result.time_spent_secs,
            )
        })
    }

    fn admit(&self, event: SessionEvent) -> Result<(), SessionError> {
        match self.phase().disposition(event) {
            Disposition::Allowed => Ok(()),
            Disposition::Ignored | Disposition::Rejected => Err(self.rejected(event)),
        }
    }

    fn rejected(&self, event: SessionEvent) -> SessionError {
        SessionError::InvalidTransition {
            phase: self.phase(),
            event,
        }
    }

    fn finish(&mut self, finish_reason: FinishReason) {
        self.countdown.stop();

        let possible = f64::from(self.points_per_question) * self.questions.len() as f64;
        let score_percentage = if possible > 0.0 {
            Percentage::clamped(f64::from(self.points) / possible * 100.0)
        } else {
            Percentage::ZERO
        };

        self.state = SessionState::Finished(QuizResult {
            score_percentage,
            points: self.points,
            question_count: self.questions.len(),
            feedback: FeedbackCategory::classify(score_percentage),
            answer_log: self.answer_log.clone(),
            time_spent_secs: self.countdown.elapsed(),
            finish_reason,
        });
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

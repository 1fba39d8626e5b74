mod sampling;
mod session;
mod timer;

pub use sampling::draw_sample;
pub use session::{
    AnswerRecord, Disposition, FinishReason, QuizResult, QuizSession, SessionError, SessionEvent,
    SessionPhase, SessionProgress, SessionState, Step,
};
pub use timer::{Countdown, CountdownTick, DEFAULT_TIME_BUDGET_SECS};

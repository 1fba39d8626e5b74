mod attempt;
mod ids;
mod progress;
mod quiz;
mod skill;
mod validation;

pub use ids::{AttemptId, CourseId, ParseIdError, QuizId, SkillId, UserId};

pub use attempt::{Attempt, AttemptSubmission};
pub use progress::{ProgressRecord, SkillStatus};
pub use quiz::{DEFAULT_POINTS_PER_QUESTION, QuizDefinition, QuizQuestion};
pub use skill::{Difficulty, Skill};
pub use validation::{Percentage, ValidationError, time_spent_from_secs};

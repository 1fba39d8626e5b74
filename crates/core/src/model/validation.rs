use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::progress::SkillStatus;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Construction-time rejections. Values that fail these checks never enter the
/// data model.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("percentage must be a finite value in [0, 100], got {0}")]
    PercentageOutOfRange(f64),

    #[error("time spent must be a non-negative number of seconds, got {0}")]
    InvalidTimeSpent(i64),

    #[error("{field} cannot be empty")]
    Blank { field: &'static str },

    #[error("skill difficulty must be between 1 and 10, got {0}")]
    SkillDifficulty(u8),

    #[error("a question needs at least two options, got {0}")]
    TooFewOptions(usize),

    #[error("option {index} is out of range for a question with {len} options")]
    OptionOutOfRange { index: usize, len: usize },

    #[error("points per question must be > 0")]
    ZeroPoints,

    #[error("sample size must be between 1 and the pool size ({pool}), got {requested}")]
    SampleSize { requested: usize, pool: usize },

    #[error("progress cannot move from {from} back to {to}")]
    StatusRegression { from: SkillStatus, to: SkillStatus },
}

//
// ─── PERCENTAGE ────────────────────────────────────────────────────────────────
//

/// A score or mastery value guaranteed to lie in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Percentage(f64);

impl Percentage {
    pub const ZERO: Self = Self(0.0);
    pub const FULL: Self = Self(100.0);

    /// Validates a percentage.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::PercentageOutOfRange` for NaN, infinities, or
    /// values outside `[0, 100]`.
    pub fn new(value: f64) -> Result<Self, ValidationError> {
        if value.is_finite() && (0.0..=100.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ValidationError::PercentageOutOfRange(value))
        }
    }

    /// Clamps a computed value into range. NaN maps to zero.
    #[must_use]
    pub fn clamped(value: f64) -> Self {
        if value.is_nan() {
            Self::ZERO
        } else {
            Self(value.clamp(0.0, 100.0))
        }
    }

    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Percentage {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Percentage> for f64 {
    fn from(value: Percentage) -> Self {
        value.0
    }
}

/// Converts a signed seconds count (as stored or received) into a validated duration.
///
/// # Errors
///
/// Returns `ValidationError::InvalidTimeSpent` for negative or overflowing values.
pub fn time_spent_from_secs(secs: i64) -> Result<u32, ValidationError> {
    u32::try_from(secs).map_err(|_| ValidationError::InvalidTimeSpent(secs))
}

pub(crate) fn non_blank(field: &'static str, value: String) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Blank { field });
    }
    if trimmed.len() == value.len() {
        Ok(value)
    } else {
        Ok(trimmed.to_owned())
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::ids::{SkillId, UserId};
use crate::model::validation::{Percentage, ValidationError};

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

/// Lifecycle of a learner's skill. Variants are declared in advancement order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkillStatus {
    Locked,
    InProgress,
    Completed,
}

impl SkillStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SkillStatus::Locked => "locked",
            SkillStatus::InProgress => "in-progress",
            SkillStatus::Completed => "completed",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "locked" => Some(Self::Locked),
            "in-progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

impl fmt::Display for SkillStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── PROGRESS RECORD ───────────────────────────────────────────────────────────
//

/// One learner's standing on one skill.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressRecord {
    user_id: UserId,
    skill_id: SkillId,
    mastery: Percentage,
    status: SkillStatus,
}

impl ProgressRecord {
    /// Fresh record with zero mastery.
    #[must_use]
    pub fn new(user_id: UserId, skill_id: SkillId, status: SkillStatus) -> Self {
        Self {
            user_id,
            skill_id,
            mastery: Percentage::ZERO,
            status,
        }
    }

    /// Rehydrate a record from storage.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::PercentageOutOfRange` if the stored mastery is invalid.
    pub fn from_persisted(
        user_id: UserId,
        skill_id: SkillId,
        mastery: f64,
        status: SkillStatus,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            user_id,
            skill_id,
            mastery: Percentage::new(mastery)?,
            status,
        })
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn skill_id(&self) -> SkillId {
        self.skill_id
    }

    #[must_use]
    pub fn mastery(&self) -> Percentage {
        self.mastery
    }

    #[must_use]
    pub fn status(&self) -> SkillStatus {
        self.status
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == SkillStatus::Completed
    }

    /// Moves the record forward. Completing a skill pins mastery at 100.
    ///
    /// Returns `false` when the record already had `next` status.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::StatusRegression` if `next` is behind the current status.
    pub fn advance_to(&mut self, next: SkillStatus) -> Result<bool, ValidationError> {
        if next < self.status {
            return Err(ValidationError::StatusRegression {
                from: self.status,
                to: next,
            });
        }
        if next == self.status {
            return Ok(false);
        }

        self.status = next;
        if next == SkillStatus::Completed {
            self.mastery = Percentage::FULL;
        }
        Ok(true)
    }

    pub fn set_mastery(&mut self, mastery: Percentage) {
        self.mastery = mastery;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(status: SkillStatus) -> ProgressRecord {
        ProgressRecord::new(UserId::new(1), SkillId::new(1), status)
    }

    #[test]
    fn status_strings_round_trip() {
        for status in [
            SkillStatus::Locked,
            SkillStatus::InProgress,
            SkillStatus::Completed,
        ] {
            assert_eq!(SkillStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(SkillStatus::parse("done"), None);
    }

    #[test]
    fn advancing_to_completed_sets_full_mastery() {
        let mut rec = record(SkillStatus::Locked);
        assert!(rec.advance_to(SkillStatus::Completed).unwrap());
        assert!(rec.is_completed());
        assert_eq!(rec.mastery(), Percentage::FULL);
    }

    #[test]
    fn same_status_is_a_no_op() {
        let mut rec = record(SkillStatus::InProgress);
        assert!(!rec.advance_to(SkillStatus::InProgress).unwrap());
        assert_eq!(rec.mastery(), Percentage::ZERO);
    }

    #[test]
    fn regression_is_rejected() {
        let mut rec = record(SkillStatus::Completed);
        let err = rec.advance_to(SkillStatus::Locked).unwrap_err();
        assert_eq!(
            err,
            ValidationError::StatusRegression {
                from: SkillStatus::Completed,
                to: SkillStatus::Locked,
            }
        );
        assert!(rec.is_completed());
    }

    #[test]
    fn persisted_mastery_is_validated() {
        let err = ProgressRecord::from_persisted(
            UserId::new(1),
            SkillId::new(2),
            180.0,
            SkillStatus::InProgress,
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::PercentageOutOfRange(_)));
    }
}

//! Rule-based feedback for quiz scores.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::Percentage;

/// Scores strictly below this are remedial.
pub const REMEDIAL_BELOW: f64 = 50.0;
/// Scores at or above this are fast-tracked.
pub const FAST_TRACK_FROM: f64 = 80.0;

/// Advisory bucket derived from a quiz score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeedbackCategory {
    Remedial,
    Progressing,
    FastTrack,
}

impl FeedbackCategory {
    /// Total over `[0, 100]`: `< 50` remedial, `[50, 80)` progressing, `>= 80` fast-track.
    #[must_use]
    pub fn classify(score: Percentage) -> Self {
        let score = score.value();
        if score < REMEDIAL_BELOW {
            Self::Remedial
        } else if score < FAST_TRACK_FROM {
            Self::Progressing
        } else {
            Self::FastTrack
        }
    }

    /// Fixed advisory shown to the learner.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Remedial => {
                "Our AI suggests revisiting the fundamentals of this topic. Remedial content unlocked."
            }
            Self::Progressing => "Good progress. Keep practicing.",
            Self::FastTrack => {
                "Excellent! You've mastered this topic. Fast-tracking the next module."
            }
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Remedial => "remedial",
            Self::Progressing => "progressing",
            Self::FastTrack => "fast-track",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "remedial" => Some(Self::Remedial),
            "progressing" => Some(Self::Progressing),
            "fast-track" => Some(Self::FastTrack),
            _ => None,
        }
    }
}

impl fmt::Display for FeedbackCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Next-skill recommendation, completion roll-up, weak-spot detection and the
//! milestone forecast shown on the dashboard.

use std::collections::HashSet;

use crate::graph::{GraphError, SkillGraph};
use crate::model::{Percentage, ProgressRecord, SkillId, SkillStatus};

//
// ─── RECOMMENDATION ────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recommendation {
    Skill(SkillId),
    MasteryAchieved,
}

impl Recommendation {
    #[must_use]
    pub fn skill(self) -> Option<SkillId> {
        match self {
            Self::Skill(id) => Some(id),
            Self::MasteryAchieved => None,
        }
    }
}

/// The first still-locked skill, in record order, whose prerequisites are all completed.
///
/// Skills already in progress are not candidates; when none qualify the user
/// has nothing new to unlock and gets `MasteryAchieved`.
///
/// # Errors
///
/// Returns `GraphError::UnknownSkill` if any record references a skill outside
/// the graph.
pub fn recommend_next(
    graph: &SkillGraph,
    progress: &[ProgressRecord],
) -> Result<Recommendation, GraphError> {
    if let Some(stray) = progress.iter().find(|r| !graph.contains(r.skill_id())) {
        return Err(GraphError::UnknownSkill(stray.skill_id()));
    }

    let completed: HashSet<SkillId> = progress
        .iter()
        .filter(|r| r.is_completed())
        .map(ProgressRecord::skill_id)
        .collect();

    for record in progress.iter().filter(|r| r.status() == SkillStatus::Locked) {
        if graph.is_unlockable(record.skill_id(), &completed)? {
            return Ok(Recommendation::Skill(record.skill_id()));
        }
    }
    Ok(Recommendation::MasteryAchieved)
}

/// Rounded share of completed records, `0..=100`. Empty progress is 0.
#[must_use]
pub fn overall_completion(progress: &[ProgressRecord]) -> u8 {
    if progress.is_empty() {
        return 0;
    }
    let done = progress.iter().filter(|r| r.is_completed()).count();
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let pct = ((done as f64 / progress.len() as f64) * 100.0).round() as u8;
    pct.min(100)
}

//
// ─── WEAK SPOTS ────────────────────────────────────────────────────────────────
//

pub const DEFAULT_WEAK_SPOT_THRESHOLD: f64 = 60.0;

/// Label used for attempts whose quiz has no linked skill.
pub const GENERAL_LABEL: &str = "General";

/// One attempt score tagged with the skill it exercised, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledScore {
    pub label: Option<String>,
    pub score: Percentage,
}

impl LabeledScore {
    #[must_use]
    pub fn new(label: Option<String>, score: Percentage) -> Self {
        Self { label, score }
    }

    #[must_use]
    pub fn label_or_general(&self) -> &str {
        self.label.as_deref().unwrap_or(GENERAL_LABEL)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkillAverage {
    pub label: String,
    pub mean: f64,
    pub attempts: usize,
}

/// Mean score per label, labels in first-seen order.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn skill_averages(scores: &[LabeledScore]) -> Vec<SkillAverage> {
    let mut buckets: Vec<(String, f64, usize)> = Vec::new();
    for entry in scores {
        let label = entry.label_or_general();
        match buckets.iter_mut().find(|(l, _, _)| l == label) {
            Some((_, sum, count)) => {
                *sum += entry.score.value();
                *count += 1;
            }
            None => buckets.push((label.to_owned(), entry.score.value(), 1)),
        }
    }

    buckets
        .into_iter()
        .map(|(label, sum, attempts)| SkillAverage {
            label,
            mean: sum / attempts as f64,
            attempts,
        })
        .collect()
}

/// The label with the lowest mean score, if that mean is below `threshold`.
///
/// Ties go to the label seen first.
#[must_use]
pub fn detect_weak_spot(scores: &[LabeledScore], threshold: f64) -> Option<String> {
    let mut weakest: Option<SkillAverage> = None;
    for avg in skill_averages(scores) {
        if weakest.as_ref().is_none_or(|current| avg.mean < current.mean) {
            weakest = Some(avg);
        }
    }
    weakest
        .filter(|avg| avg.mean < threshold)
        .map(|avg| avg.label)
}

//
// ─── FORECAST ──────────────────────────────────────────────────────────────────
//

/// Milestone estimate from the number of completed skills.
pub trait Forecast: Send + Sync {
    fn estimate(&self, completed: usize) -> String;
}

impl<F> Forecast for F
where
    F: Fn(usize) -> String + Send + Sync,
{
    fn estimate(&self, completed: usize) -> String {
        self(completed)
    }
}

/// Two-step forecast: `near` once any skill is done, `far` before that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MilestoneForecast {
    near: String,
    far: String,
}

impl MilestoneForecast {
    #[must_use]
    pub fn new(near: impl Into<String>, far: impl Into<String>) -> Self {
        Self {
            near: near.into(),
            far: far.into(),
        }
    }
}

impl Default for MilestoneForecast {
    fn default() -> Self {
        Self::new("April 2026", "May 2026")
    }
}

impl Forecast for MilestoneForecast {
    fn estimate(&self, completed: usize) -> String {
        if completed > 0 {
            self.near.clone()
        } else {
            self.far.clone()
        }
    }
}

#[must_use]
pub fn forecast(progress: &[ProgressRecord], model: &(impl Forecast + ?Sized)) -> String {
    model.estimate(progress.iter().filter(|r| r.is_completed()).count())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

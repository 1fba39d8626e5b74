use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use tracing::{info, instrument};

use adapt_core::graph::SkillGraph;
use adapt_core::model::{Attempt, Percentage, QuizDefinition, QuizId, SkillId, SkillStatus, UserId};
use adapt_core::recommend::{
    self, DEFAULT_WEAK_SPOT_THRESHOLD, Forecast, LabeledScore, MilestoneForecast, Recommendation,
    SkillAverage,
};
use storage::repository::{AttemptRepository, ProgressRepository, QuizCatalog, SkillCatalog};

use crate::error::DashboardError;

/// How many attempts the dashboard lists, newest first.
pub const RECENT_ATTEMPTS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct SkillProgressView {
    pub skill_id: SkillId,
    pub name: String,
    pub status: SkillStatus,
    pub mastery: Percentage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextStep {
    Skill { id: SkillId, name: String },
    MasteryAchieved,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecentAttempt {
    pub attempt: Attempt,
    pub quiz_title: String,
    /// Linked skill name, or `"General"`.
    pub label: String,
}

/// One learner's overview. Built fresh on every call.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub user_id: UserId,
    pub skills: Vec<SkillProgressView>,
    pub next: NextStep,
    pub overall_completion: u8,
    pub weak_spot: Option<String>,
    pub skill_averages: Vec<SkillAverage>,
    pub forecast: String,
    pub recent_attempts: Vec<RecentAttempt>,
}

/// Read model combining progress, recommendation, weak spot and forecast.
#[derive(Clone)]
pub struct DashboardService {
    skills: Arc<dyn SkillCatalog>,
    quizzes: Arc<dyn QuizCatalog>,
    progress: Arc<dyn ProgressRepository>,
    attempts: Arc<dyn AttemptRepository>,
    weak_spot_threshold: f64,
    forecast: Arc<dyn Forecast>,
}

impl DashboardService {
    #[must_use]
    pub fn new(
        skills: Arc<dyn SkillCatalog>,
        quizzes: Arc<dyn QuizCatalog>,
        progress: Arc<dyn ProgressRepository>,
        attempts: Arc<dyn AttemptRepository>,
    ) -> Self {
        Self {
            skills,
            quizzes,
            progress,
            attempts,
            weak_spot_threshold: DEFAULT_WEAK_SPOT_THRESHOLD,
            forecast: Arc::new(MilestoneForecast::default()),
        }
    }

    #[must_use]
    pub fn with_weak_spot_threshold(mut self, threshold: f64) -> Self {
        self.weak_spot_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_forecast(mut self, forecast: Arc<dyn Forecast>) -> Self {
        self.forecast = forecast;
        self
    }

    /// # Errors
    ///
    /// - `DashboardError::Graph` if the catalog is invalid or a record or quiz
    ///   references a skill outside it.
    /// - `DashboardError::Storage` on repository failures, including attempts
    ///   for quizzes that no longer exist.
    #[instrument(skip(self), fields(user = %user_id))]
    pub async fn dashboard(&self, user_id: UserId) -> Result<Dashboard, DashboardError> {
        let graph = SkillGraph::new(self.skills.list_skills().await?)?;
        let progress = self.progress.list_progress(user_id).await?;

        let next = match recommend::recommend_next(&graph, &progress)? {
            Recommendation::Skill(id) => NextStep::Skill {
                id,
                name: graph.skill(id)?.name().to_owned(),
            },
            Recommendation::MasteryAchieved => NextStep::MasteryAchieved,
        };

        let mut skills = Vec::with_capacity(progress.len());
        for record in &progress {
            skills.push(SkillProgressView {
                skill_id: record.skill_id(),
                name: graph.skill(record.skill_id())?.name().to_owned(),
                status: record.status(),
                mastery: record.mastery(),
            });
        }

        let attempts = self.attempts.list_attempts(user_id).await?;
        let labelled = self.label_attempts(&graph, attempts).await?;
        let scores: Vec<LabeledScore> = labelled
            .iter()
            .map(|a| LabeledScore::new(Some(a.label.clone()), a.attempt.score()))
            .collect();

        let weak_spot = recommend::detect_weak_spot(&scores, self.weak_spot_threshold);
        let overall_completion = recommend::overall_completion(&progress);
        let dashboard = Dashboard {
            user_id,
            skills,
            next,
            overall_completion,
            weak_spot,
            skill_averages: recommend::skill_averages(&scores),
            forecast: recommend::forecast(&progress, self.forecast.as_ref()),
            recent_attempts: labelled.into_iter().rev().take(RECENT_ATTEMPTS).collect(),
        };

        info!(
            completion = dashboard.overall_completion,
            weak_spot = ?dashboard.weak_spot,
            attempts = scores.len(),
            "dashboard built"
        );
        Ok(dashboard)
    }

    /// Resolves attempt -> quiz -> linked skill name, oldest attempt first.
    async fn label_attempts(
        &self,
        graph: &SkillGraph,
        attempts: Vec<Attempt>,
    ) -> Result<Vec<RecentAttempt>, DashboardError> {
        let mut quizzes: HashMap<QuizId, QuizDefinition> = HashMap::new();
        let mut labelled = Vec::with_capacity(attempts.len());

        for attempt in attempts {
            let quiz_id = attempt.quiz_id();
            let quiz = match quizzes.entry(quiz_id) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => entry.insert(self.quizzes.get_quiz(quiz_id).await?),
            };

            let label = match quiz.linked_skill() {
                Some(skill) => graph.skill(skill)?.name().to_owned(),
                None => recommend::GENERAL_LABEL.to_owned(),
            };
            labelled.push(RecentAttempt {
                quiz_title: quiz.title().to_owned(),
                label,
                attempt,
            });
        }
        Ok(labelled)
    }
}

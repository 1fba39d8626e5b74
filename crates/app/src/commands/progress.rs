//! `adapt onboard`, `adapt dashboard`, `adapt start-skill` and `adapt complete-skill`.

use adapt_core::model::{SkillId, UserId};
use anyhow::{Context, Result};
use services::{AppServices, Dashboard, NextStep};

pub async fn onboard(services: &AppServices, user: UserId) -> Result<()> {
    let records = services
        .progress()
        .onboard(user)
        .await
        .with_context(|| format!("onboarding user {user}"))?;
    println!("User {user} has {} skills on their track.", records.len());
    Ok(())
}

pub async fn dashboard(services: &AppServices, user: UserId) -> Result<()> {
    let dashboard = services
        .dashboard()
        .dashboard(user)
        .await
        .with_context(|| format!("building dashboard for user {user}"))?;
    print!("{}", render(&dashboard));
    Ok(())
}

pub async fn start_skill(services: &AppServices, user: UserId, skill: SkillId) -> Result<()> {
    let update = services.progress().start_skill(user, skill).await?;
    if update.changed {
        println!("Started skill {skill}.");
    } else {
        println!("Skill {skill} is already in progress.");
    }
    Ok(())
}

pub async fn complete_skill(services: &AppServices, user: UserId, skill: SkillId) -> Result<()> {
    let update = services.progress().complete_skill(user, skill).await?;
    if update.changed {
        println!("Completed skill {skill}.");
    } else {
        println!("Skill {skill} was already completed.");
    }
    Ok(())
}

fn render(dashboard: &Dashboard) -> String {
    use std::fmt::Write as _;

    let mut out = String::new();
    if dashboard.skills.is_empty() {
        let _ = writeln!(
            out,
            "User {} has no progress yet. Run `adapt onboard --user {}`.",
            dashboard.user_id, dashboard.user_id
        );
        return out;
    }

    let _ = writeln!(out, "Skills");
    for skill in &dashboard.skills {
        let _ = writeln!(
            out,
            "  {:<22} {:<12} {:>5.1}%",
            skill.name,
            skill.status.as_str(),
            skill.mastery.value()
        );
    }

    let next = match &dashboard.next {
        NextStep::Skill { name, .. } => name.as_str(),
        NextStep::MasteryAchieved => "Mastery achieved",
    };
    let _ = writeln!(out, "\nNext up:      {next}");
    let _ = writeln!(out, "Completion:   {}%", dashboard.overall_completion);
    let _ = writeln!(
        out,
        "Weak spot:    {}",
        dashboard.weak_spot.as_deref().unwrap_or("none")
    );
    let _ = writeln!(out, "Forecast:     {}", dashboard.forecast);

    if !dashboard.skill_averages.is_empty() {
        let _ = writeln!(out, "\nAverage scores");
        for avg in &dashboard.skill_averages {
            let _ = writeln!(
                out,
                "  {:<22} {:>5.1}%  ({} attempts)",
                avg.label, avg.mean, avg.attempts
            );
        }
    }

    if !dashboard.recent_attempts.is_empty() {
        let _ = writeln!(out, "\nRecent attempts");
        for recent in &dashboard.recent_attempts {
            let _ = writeln!(
                out,
                "  {}  {:<30} {:>5.1}%  {}",
                recent.attempt.created_at().format("%Y-%m-%d %H:%M"),
                recent.quiz_title,
                recent.attempt.score().value(),
                recent.attempt.feedback()
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use adapt_core::model::{Percentage, SkillStatus};
    use services::SkillProgressView;

    fn dashboard(next: NextStep) -> Dashboard {
        Dashboard {
            user_id: UserId::new(1),
            skills: vec![SkillProgressView {
                skill_id: SkillId::new(1),
                name: "HTML Basics".into(),
                status: SkillStatus::Completed,
                mastery: Percentage::FULL,
            }],
            next,
            overall_completion: 100,
            weak_spot: None,
            skill_averages: Vec::new(),
            forecast: "April 2026".into(),
            recent_attempts: Vec::new(),
        }
    }

    #[test]
    fn renders_mastery_and_forecast() {
        let text = render(&dashboard(NextStep::MasteryAchieved));
        assert!(text.contains("Mastery achieved"));
        assert!(text.contains("Completion:   100%"));
        assert!(text.contains("Weak spot:    none"));
        assert!(text.contains("April 2026"));
    }

    #[test]
    fn empty_dashboard_points_to_onboarding() {
        let mut empty = dashboard(NextStep::MasteryAchieved);
        empty.skills.clear();
        assert!(render(&empty).contains("adapt onboard --user 1"));
    }
}

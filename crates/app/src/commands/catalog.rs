//! `adapt seed`, `adapt skills` and `adapt quizzes`.

use anyhow::Result;
use services::AppServices;
use storage::repository::{QuizCatalog, SkillCatalog};

pub async fn seed(services: &AppServices) -> Result<()> {
    let report = services.seed_demo().await?;
    println!(
        "Seeded {} skills and {} quizzes.",
        report.skills, report.quizzes
    );
    Ok(())
}

pub async fn skills(services: &AppServices) -> Result<()> {
    let graph = services.progress().load_graph().await?;
    if graph.is_empty() {
        println!("No skills yet. Run `adapt seed` first.");
        return Ok(());
    }

    for skill in graph.iter() {
        let prerequisites: Vec<String> = skill
            .prerequisites()
            .iter()
            .filter_map(|id| graph.get(*id).map(|s| s.name().to_owned()))
            .collect();
        let requires = if prerequisites.is_empty() {
            String::new()
        } else {
            format!("  (requires {})", prerequisites.join(", "))
        };
        println!(
            "{:>3}  {:<22} difficulty {:>2}  {}{requires}",
            skill.id(),
            skill.name(),
            skill.difficulty().value(),
            skill.category().unwrap_or("-"),
        );
    }
    Ok(())
}

pub async fn quizzes(services: &AppServices) -> Result<()> {
    let quizzes = services.storage().quizzes.list_quizzes().await?;
    if quizzes.is_empty() {
        println!("No quizzes yet. Run `adapt seed` first.");
        return Ok(());
    }

    for quiz in &quizzes {
        let skill = match quiz.linked_skill() {
            Some(id) => services
                .storage()
                .skills
                .get_skill(id)
                .await
                .map_or_else(|_| format!("skill {id}"), |s| s.name().to_owned()),
            None => "General".to_owned(),
        };
        println!(
            "{:>3}  {:<30} {} of {} questions  [{skill}]",
            quiz.id(),
            quiz.title(),
            quiz.sample_size(),
            quiz.questions().len(),
        );
    }
    Ok(())
}

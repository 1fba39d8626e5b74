//! Demo catalog: a five-skill web development track with linked quizzes.
//!
//! Seeding upserts by id, so running it twice leaves one copy of everything.

use adapt_core::model::{
    Difficulty, QuizDefinition, QuizId, QuizQuestion, Skill, SkillId, ValidationError,
};
use thiserror::Error;

use crate::repository::{Storage, StorageError};

pub const HTML_BASICS: SkillId = SkillId::new(1);
pub const CSS_FUNDAMENTALS: SkillId = SkillId::new(2);
pub const JAVASCRIPT_CORE: SkillId = SkillId::new(3);
pub const REACT_DEVELOPMENT: SkillId = SkillId::new(4);
pub const NODE_BACKEND: SkillId = SkillId::new(5);

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SeedError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone)]
pub struct DemoCatalog {
    pub skills: Vec<Skill>,
    pub quizzes: Vec<QuizDefinition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub skills: usize,
    pub quizzes: usize,
}

fn skill(
    id: SkillId,
    name: &str,
    category: &str,
    difficulty: u8,
    prerequisites: &[SkillId],
) -> Result<Skill, ValidationError> {
    Skill::new(
        id,
        name,
        Some(category.to_owned()),
        Difficulty::new(difficulty)?,
        prerequisites.iter().copied(),
    )
}

fn question(
    text: &str,
    options: &[&str],
    correct: usize,
    explanation: &str,
) -> Result<QuizQuestion, ValidationError> {
    Ok(QuizQuestion::new(
        text,
        options.iter().map(|o| (*o).to_owned()).collect(),
        correct,
    )?
    .with_explanation(explanation))
}

/// Builds the demo skills and quizzes.
///
/// # Errors
///
/// Returns `ValidationError` only if the built-in data is malformed.
pub fn demo_catalog() -> Result<DemoCatalog, ValidationError> {
    let skills = vec![
        skill(HTML_BASICS, "HTML Basics", "Frontend", 2, &[])?,
        skill(CSS_FUNDAMENTALS, "CSS Fundamentals", "Frontend", 3, &[HTML_BASICS])?,
        skill(JAVASCRIPT_CORE, "JavaScript Core", "Language", 5, &[CSS_FUNDAMENTALS])?,
        skill(REACT_DEVELOPMENT, "React Development", "Framework", 7, &[JAVASCRIPT_CORE])?,
        skill(NODE_BACKEND, "Node.js Backend", "Backend", 8, &[JAVASCRIPT_CORE])?,
    ];

    let html = QuizDefinition::new(
        QuizId::new(1),
        "HTML Basics Quiz",
        vec![
            question(
                "Which element holds the visible page content?",
                &["<head>", "<body>", "<meta>", "<title>"],
                1,
                "Everything rendered in the viewport lives inside <body>.",
            )?,
            question(
                "Which attribute gives an image its text alternative?",
                &["title", "src", "alt", "name"],
                2,
                "Screen readers announce the alt text.",
            )?,
            question(
                "Which tag creates a hyperlink?",
                &["<a>", "<link>", "<href>", "<nav>"],
                0,
                "<link> relates documents; <a> is the clickable anchor.",
            )?,
        ],
    )?
    .with_category("Frontend")
    .with_difficulty_label("easy")
    .linked_to_skill(HTML_BASICS);

    let css = QuizDefinition::new(
        QuizId::new(2),
        "CSS Fundamentals Quiz",
        vec![
            question(
                "Which selector has the highest specificity?",
                &["p", ".note", "#main", "*"],
                2,
                "Id selectors outrank classes and element selectors.",
            )?,
            question(
                "Which property switches an element to flex layout?",
                &["position: flex", "display: flex", "float: flex", "layout: flex"],
                1,
                "Flexbox is enabled through the display property.",
            )?,
            question(
                "What does the box model's padding sit between?",
                &[
                    "Margin and border",
                    "Content and border",
                    "Border and outline",
                    "Content and margin",
                ],
                1,
                "Padding is inside the border, around the content.",
            )?,
        ],
    )?
    .with_category("Frontend")
    .with_difficulty_label("medium")
    .linked_to_skill(CSS_FUNDAMENTALS);

    let js = QuizDefinition::new(
        QuizId::new(3),
        "JavaScript Fundamentals Quiz",
        vec![
            question(
                "What is the use of the \"let\" keyword?",
                &["Block scoped variable", "Global variable", "Constant", "Function"],
                0,
                "let declares a variable scoped to the enclosing block.",
            )?,
            question(
                "What does `typeof null` evaluate to?",
                &["\"null\"", "\"undefined\"", "\"object\"", "\"number\""],
                2,
                "A long-standing quirk of the language.",
            )?,
            question(
                "Which method returns a new array with transformed elements?",
                &["forEach", "map", "push", "splice"],
                1,
                "map builds a new array from the callback results.",
            )?,
            question(
                "Which comparison does not coerce types?",
                &["==", "===", "=", "<=>"],
                1,
                "Strict equality compares type and value.",
            )?,
            question(
                "What does a Promise represent?",
                &[
                    "A value available later",
                    "A synchronous loop",
                    "A CSS rule",
                    "A DOM node",
                ],
                0,
                "Promises stand for the eventual result of async work.",
            )?,
        ],
    )?
    .with_sample_size(3)?
    .with_category("Language")
    .with_difficulty_label("medium")
    .linked_to_skill(JAVASCRIPT_CORE);

    let general = QuizDefinition::new(
        QuizId::new(4),
        "Web Platform Warm-up",
        vec![
            question(
                "Which protocol do browsers use to load pages?",
                &["FTP", "SMTP", "HTTP", "SSH"],
                2,
                "Pages are fetched over HTTP or HTTPS.",
            )?,
            question(
                "What does DNS translate?",
                &[
                    "Domain names to addresses",
                    "HTML to CSS",
                    "Images to text",
                    "Ports to protocols",
                ],
                0,
                "DNS resolves host names to IP addresses.",
            )?,
        ],
    )?
    .with_difficulty_label("easy");

    Ok(DemoCatalog {
        skills,
        quizzes: vec![html, css, js, general],
    })
}

/// Upserts the demo catalog into `storage`.
///
/// # Errors
///
/// Returns `SeedError` if the catalog cannot be built or stored.
pub async fn seed_demo_catalog(storage: &Storage) -> Result<SeedReport, SeedError> {
    let catalog = demo_catalog()?;
    for skill in &catalog.skills {
        storage.skills.upsert_skill(skill).await?;
    }
    for quiz in &catalog.quizzes {
        storage.quizzes.upsert_quiz(quiz).await?;
    }

    let report = SeedReport {
        skills: catalog.skills.len(),
        quizzes: catalog.quizzes.len(),
    };
    tracing::info!(skills = report.skills, quizzes = report.quizzes, "seeded demo catalog");
    Ok(report)
}

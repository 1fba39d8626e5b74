use adapt_core::feedback::FeedbackCategory;
use adapt_core::model::{
    Attempt, AttemptId, CourseId, Difficulty, ProgressRecord, QuizDefinition, QuizId,
    QuizQuestion, Skill, SkillId, SkillStatus, UserId,
};
use serde::{Deserialize, Serialize};
use sqlx::Row;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Unique/primary-key violations become `Conflict`; everything else is a connection problem.
pub(crate) fn db(e: sqlx::Error) -> StorageError {
    match &e {
        sqlx::Error::Database(inner) if inner.is_unique_violation() => StorageError::Conflict,
        _ => StorageError::Connection(e.to_string()),
    }
}

pub(crate) fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn skill_id_from_i64(v: i64) -> Result<SkillId, StorageError> {
    Ok(SkillId::new(i64_to_u64("skill_id", v)?))
}

pub(crate) fn quiz_id_from_i64(v: i64) -> Result<QuizId, StorageError> {
    Ok(QuizId::new(i64_to_u64("quiz_id", v)?))
}

pub(crate) fn user_id_from_i64(v: i64) -> Result<UserId, StorageError> {
    Ok(UserId::new(i64_to_u64("user_id", v)?))
}

pub(crate) fn parse_status(s: &str) -> Result<SkillStatus, StorageError> {
    SkillStatus::parse(s).ok_or_else(|| StorageError::Serialization(format!("invalid status: {s}")))
}

pub(crate) fn parse_feedback(s: &str) -> Result<FeedbackCategory, StorageError> {
    FeedbackCategory::parse(s)
        .ok_or_else(|| StorageError::Serialization(format!("invalid feedback: {s}")))
}

//
// ─── SKILLS ────────────────────────────────────────────────────────────────────
//

pub(crate) fn map_skill_row(
    row: &sqlx::sqlite::SqliteRow,
    prerequisites: Vec<SkillId>,
) -> Result<Skill, StorageError> {
    let raw_difficulty: i64 = row.try_get("difficulty").map_err(ser)?;
    let difficulty = u8::try_from(raw_difficulty)
        .map_err(|_| StorageError::Serialization(format!("invalid difficulty: {raw_difficulty}")))
        .and_then(|d| Difficulty::new(d).map_err(ser))?;

    Skill::new(
        skill_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        row.try_get::<String, _>("name").map_err(ser)?,
        row.try_get::<Option<String>, _>("category").map_err(ser)?,
        difficulty,
        prerequisites,
    )
    .map_err(ser)
}

//
// ─── QUIZZES ───────────────────────────────────────────────────────────────────
//

/// Stored JSON shape of one question inside `quizzes.questions`.
#[derive(Debug, Serialize, Deserialize)]
struct QuestionRow {
    text: String,
    options: Vec<String>,
    correct_option: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    difficulty: Option<u8>,
}

pub(crate) fn questions_to_json(questions: &[QuizQuestion]) -> Result<String, StorageError> {
    let rows: Vec<QuestionRow> = questions
        .iter()
        .map(|q| QuestionRow {
            text: q.text().to_owned(),
            options: q.options().to_vec(),
            correct_option: q.correct_option(),
            explanation: q.explanation().map(str::to_owned),
            difficulty: q.difficulty(),
        })
        .collect();
    serde_json::to_string(&rows).map_err(ser)
}

fn questions_from_json(raw: &str) -> Result<Vec<QuizQuestion>, StorageError> {
    let rows: Vec<QuestionRow> = serde_json::from_str(raw).map_err(ser)?;
    rows.into_iter()
        .map(|row| {
            let mut question =
                QuizQuestion::new(row.text, row.options, row.correct_option).map_err(ser)?;
            if let Some(explanation) = row.explanation {
                question = question.with_explanation(explanation);
            }
            if let Some(difficulty) = row.difficulty {
                question = question.with_difficulty(difficulty);
            }
            Ok(question)
        })
        .collect()
}

pub(crate) fn map_quiz_row(row: &sqlx::sqlite::SqliteRow) -> Result<QuizDefinition, StorageError> {
    let questions = questions_from_json(&row.try_get::<String, _>("questions").map_err(ser)?)?;
    let mut quiz = QuizDefinition::new(
        quiz_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        row.try_get::<String, _>("title").map_err(ser)?,
        questions,
    )
    .map_err(ser)?;

    let points: i64 = row.try_get("points_per_question").map_err(ser)?;
    let points = u32::try_from(points)
        .map_err(|_| StorageError::Serialization(format!("invalid points_per_question: {points}")))?;
    quiz = quiz.with_points_per_question(points).map_err(ser)?;

    if let Some(size) = row.try_get::<Option<i64>, _>("sample_size").map_err(ser)? {
        let size = usize::try_from(size)
            .map_err(|_| StorageError::Serialization(format!("invalid sample_size: {size}")))?;
        quiz = quiz.with_sample_size(size).map_err(ser)?;
    }
    if let Some(category) = row.try_get::<Option<String>, _>("category").map_err(ser)? {
        quiz = quiz.with_category(category);
    }
    if let Some(label) = row
        .try_get::<Option<String>, _>("difficulty_label")
        .map_err(ser)?
    {
        quiz = quiz.with_difficulty_label(label);
    }
    if let Some(skill) = row.try_get::<Option<i64>, _>("linked_skill_id").map_err(ser)? {
        quiz = quiz.linked_to_skill(skill_id_from_i64(skill)?);
    }
    if let Some(course) = row.try_get::<Option<i64>, _>("linked_course_id").map_err(ser)? {
        quiz = quiz.linked_to_course(CourseId::new(i64_to_u64("linked_course_id", course)?));
    }
    Ok(quiz)
}

//
// ─── PROGRESS & ATTEMPTS ───────────────────────────────────────────────────────
//

pub(crate) fn map_progress_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<ProgressRecord, StorageError> {
    let status: String = row.try_get("status").map_err(ser)?;
    ProgressRecord::from_persisted(
        user_id_from_i64(row.try_get::<i64, _>("user_id").map_err(ser)?)?,
        skill_id_from_i64(row.try_get::<i64, _>("skill_id").map_err(ser)?)?,
        row.try_get("mastery").map_err(ser)?,
        parse_status(&status)?,
    )
    .map_err(ser)
}

pub(crate) fn map_attempt_row(row: &sqlx::sqlite::SqliteRow) -> Result<Attempt, StorageError> {
    let feedback: String = row.try_get("feedback").map_err(ser)?;
    Attempt::from_persisted(
        AttemptId::new(i64_to_u64("attempt_id", row.try_get::<i64, _>("id").map_err(ser)?)?),
        user_id_from_i64(row.try_get::<i64, _>("user_id").map_err(ser)?)?,
        quiz_id_from_i64(row.try_get::<i64, _>("quiz_id").map_err(ser)?)?,
        row.try_get("score").map_err(ser)?,
        row.try_get("time_spent").map_err(ser)?,
        parse_feedback(&feedback)?,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

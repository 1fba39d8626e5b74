use crate::model::ids::{CourseId, QuizId, SkillId};
use crate::model::validation::{ValidationError, non_blank};

/// Points awarded per correct answer when a quiz does not say otherwise.
pub const DEFAULT_POINTS_PER_QUESTION: u32 = 100;

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single multiple-choice question. Immutable once authored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizQuestion {
    text: String,
    options: Vec<String>,
    correct_option: usize,
    explanation: Option<String>,
    difficulty: Option<u8>,
}

impl QuizQuestion {
    /// # Errors
    ///
    /// Returns `ValidationError` for blank text, fewer than two options, or a
    /// correct index that does not address an option.
    pub fn new(
        text: impl Into<String>,
        options: Vec<String>,
        correct_option: usize,
    ) -> Result<Self, ValidationError> {
        let text = non_blank("question text", text.into())?;
        if options.len() < 2 {
            return Err(ValidationError::TooFewOptions(options.len()));
        }
        if correct_option >= options.len() {
            return Err(ValidationError::OptionOutOfRange {
                index: correct_option,
                len: options.len(),
            });
        }

        Ok(Self {
            text,
            options,
            correct_option,
            explanation: None,
            difficulty: None,
        })
    }

    #[must_use]
    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        let explanation = explanation.into();
        self.explanation = (!explanation.trim().is_empty()).then_some(explanation);
        self
    }

    #[must_use]
    pub fn with_difficulty(mut self, difficulty: u8) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_option(&self) -> usize {
        self.correct_option
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    #[must_use]
    pub fn difficulty(&self) -> Option<u8> {
        self.difficulty
    }

    /// Checks that `index` addresses one of this question's options.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::OptionOutOfRange` otherwise.
    pub fn check_option(&self, index: usize) -> Result<(), ValidationError> {
        if index < self.options.len() {
            Ok(())
        } else {
            Err(ValidationError::OptionOutOfRange {
                index,
                len: self.options.len(),
            })
        }
    }
}

//
// ─── QUIZ DEFINITION ───────────────────────────────────────────────────────────
//

/// An authored quiz: a question pool plus sampling and scoring parameters.
///
/// An empty pool is allowed; sessions over it end up `Unavailable`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizDefinition {
    id: QuizId,
    title: String,
    category: Option<String>,
    difficulty_label: Option<String>,
    points_per_question: u32,
    questions: Vec<QuizQuestion>,
    sample_size: Option<usize>,
    linked_skill: Option<SkillId>,
    linked_course: Option<CourseId>,
}

impl QuizDefinition {
    /// # Errors
    ///
    /// Returns `ValidationError::Blank` for an empty title.
    pub fn new(
        id: QuizId,
        title: impl Into<String>,
        questions: Vec<QuizQuestion>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            id,
            title: non_blank("quiz title", title.into())?,
            category: None,
            difficulty_label: None,
            points_per_question: DEFAULT_POINTS_PER_QUESTION,
            questions,
            sample_size: None,
            linked_skill: None,
            linked_course: None,
        })
    }

    /// # Errors
    ///
    /// Returns `ValidationError::ZeroPoints` when `points` is zero.
    pub fn with_points_per_question(mut self, points: u32) -> Result<Self, ValidationError> {
        if points == 0 {
            return Err(ValidationError::ZeroPoints);
        }
        self.points_per_question = points;
        Ok(self)
    }

    /// Draw only `size` questions per session instead of the whole pool.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::SampleSize` unless `1 <= size <= pool size`.
    pub fn with_sample_size(mut self, size: usize) -> Result<Self, ValidationError> {
        if size == 0 || size > self.questions.len() {
            return Err(ValidationError::SampleSize {
                requested: size,
                pool: self.questions.len(),
            });
        }
        self.sample_size = Some(size);
        Ok(self)
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn with_difficulty_label(mut self, label: impl Into<String>) -> Self {
        self.difficulty_label = Some(label.into());
        self
    }

    #[must_use]
    pub fn linked_to_skill(mut self, skill: SkillId) -> Self {
        self.linked_skill = Some(skill);
        self
    }

    #[must_use]
    pub fn linked_to_course(mut self, course: CourseId) -> Self {
        self.linked_course = Some(course);
        self
    }

    #[must_use]
    pub fn id(&self) -> QuizId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    #[must_use]
    pub fn difficulty_label(&self) -> Option<&str> {
        self.difficulty_label.as_deref()
    }

    #[must_use]
    pub fn points_per_question(&self) -> u32 {
        self.points_per_question
    }

    #[must_use]
    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    /// The sample size as authored, if any.
    #[must_use]
    pub fn configured_sample_size(&self) -> Option<usize> {
        self.sample_size
    }

    /// Number of questions a session draws: the configured size, else the whole pool.
    #[must_use]
    pub fn sample_size(&self) -> usize {
        self.sample_size.unwrap_or(self.questions.len())
    }

    #[must_use]
    pub fn linked_skill(&self) -> Option<SkillId> {
        self.linked_skill
    }

    #[must_use]
    pub fn linked_course(&self) -> Option<CourseId> {
        self.linked_course
    }
}

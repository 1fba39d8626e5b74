use std::collections::BTreeSet;

use crate::model::ids::SkillId;
use crate::model::validation::{ValidationError, non_blank};

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

/// Skill difficulty on a 1..=10 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Difficulty(u8);

impl Difficulty {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    /// # Errors
    ///
    /// Returns `ValidationError::SkillDifficulty` when outside 1..=10.
    pub fn new(value: u8) -> Result<Self, ValidationError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ValidationError::SkillDifficulty(value))
        }
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }
}

//
// ─── SKILL ─────────────────────────────────────────────────────────────────────
//

/// A node in the skill catalog. Prerequisites are stored by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skill {
    id: SkillId,
    name: String,
    category: Option<String>,
    difficulty: Difficulty,
    prerequisites: BTreeSet<SkillId>,
}

impl Skill {
    /// Creates a skill.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::Blank` for an empty name.
    pub fn new(
        id: SkillId,
        name: impl Into<String>,
        category: Option<String>,
        difficulty: Difficulty,
        prerequisites: impl IntoIterator<Item = SkillId>,
    ) -> Result<Self, ValidationError> {
        let name = non_blank("skill name", name.into())?;
        let category = category
            .map(|c| c.trim().to_owned())
            .filter(|c| !c.is_empty());

        Ok(Self {
            id,
            name,
            category,
            difficulty,
            prerequisites: prerequisites.into_iter().collect(),
        })
    }

    #[must_use]
    pub fn id(&self) -> SkillId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn prerequisites(&self) -> &BTreeSet<SkillId> {
        &self.prerequisites
    }

    /// True for entry-level skills that are open from onboarding.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.prerequisites.is_empty()
    }
}

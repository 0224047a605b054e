use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::choice::{ChoiceLetter, ChoiceTexts};
use crate::model::ids::{ClassificationId, ExamId, QuestionId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question stem cannot be empty")]
    EmptyStem,

    #[error("composite question must have at least one subpart")]
    NoSubparts,

    #[error("subpart numbers start at 1")]
    InvalidSubpartNumber,

    #[error("duplicate subpart number: {number}")]
    DuplicateSubpartNumber { number: u32 },
}

//
// ─── QUESTION CONTENT ──────────────────────────────────────────────────────────
//

/// The shared payload of a pool question: identity, stratification axes,
/// stem, optional reading passage, the four options, and the local correct
/// marker when the bank delivers one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionContent {
    id: QuestionId,
    exam_id: ExamId,
    year: u16,
    classification_id: ClassificationId,
    stem: String,
    passage: Option<String>,
    options: ChoiceTexts,
    correct: Option<ChoiceLetter>,
}

impl QuestionContent {
    /// Creates validated question content.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyStem` if the stem is blank.
    pub fn new(
        id: QuestionId,
        exam_id: ExamId,
        year: u16,
        classification_id: ClassificationId,
        stem: impl Into<String>,
        options: ChoiceTexts,
    ) -> Result<Self, QuestionError> {
        let stem = stem.into();
        if stem.trim().is_empty() {
            return Err(QuestionError::EmptyStem);
        }

        Ok(Self {
            id,
            exam_id,
            year,
            classification_id,
            stem: stem.trim().to_owned(),
            passage: None,
            options,
            correct: None,
        })
    }

    /// Attaches the shared reading passage; blank text is dropped.
    #[must_use]
    pub fn with_passage(mut self, passage: impl Into<String>) -> Self {
        let passage = passage.into();
        self.passage = Some(passage.trim().to_owned()).filter(|p| !p.is_empty());
        self
    }

    /// Attaches the locally-known correct option.
    #[must_use]
    pub fn with_correct(mut self, correct: ChoiceLetter) -> Self {
        self.correct = Some(correct);
        self
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn exam_id(&self) -> ExamId {
        self.exam_id
    }

    #[must_use]
    pub fn year(&self) -> u16 {
        self.year
    }

    #[must_use]
    pub fn classification_id(&self) -> ClassificationId {
        self.classification_id
    }

    #[must_use]
    pub fn stem(&self) -> &str {
        &self.stem
    }

    #[must_use]
    pub fn passage(&self) -> Option<&str> {
        self.passage.as_deref()
    }

    #[must_use]
    pub fn options(&self) -> &ChoiceTexts {
        &self.options
    }

    #[must_use]
    pub fn correct(&self) -> Option<ChoiceLetter> {
        self.correct
    }
}

//
// ─── SUBPART ───────────────────────────────────────────────────────────────────
//

/// One sub-question of a composite item.
///
/// Every field except the number is an override: absent fields fall back to
/// the parent's content during flattening. A subpart that carries its own
/// passage is treated as self-contained and does not receive the parent's
/// passage as context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subpart {
    number: u32,
    stem: Option<String>,
    passage: Option<String>,
    options: Option<ChoiceTexts>,
    correct: Option<ChoiceLetter>,
}

impl Subpart {
    /// Creates a subpart with the given 1-based number and no overrides.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::InvalidSubpartNumber` for number 0.
    pub fn new(number: u32) -> Result<Self, QuestionError> {
        if number == 0 {
            return Err(QuestionError::InvalidSubpartNumber);
        }
        Ok(Self {
            number,
            stem: None,
            passage: None,
            options: None,
            correct: None,
        })
    }

    /// Overrides the stem for this subpart; blank text is dropped.
    #[must_use]
    pub fn with_stem(mut self, stem: impl Into<String>) -> Self {
        let stem = stem.into();
        self.stem = Some(stem.trim().to_owned()).filter(|s| !s.is_empty());
        self
    }

    /// Sets a passage already embedded on this subpart; blank text is dropped.
    #[must_use]
    pub fn with_passage(mut self, passage: impl Into<String>) -> Self {
        let passage = passage.into();
        self.passage = Some(passage.trim().to_owned()).filter(|p| !p.is_empty());
        self
    }

    /// Overrides the option texts for this subpart.
    #[must_use]
    pub fn with_options(mut self, options: ChoiceTexts) -> Self {
        self.options = Some(options);
        self
    }

    /// Sets this subpart's correct option.
    #[must_use]
    pub fn with_correct(mut self, correct: ChoiceLetter) -> Self {
        self.correct = Some(correct);
        self
    }

    // Accessors
    #[must_use]
    pub fn number(&self) -> u32 {
        self.number
    }

    #[must_use]
    pub fn stem(&self) -> Option<&str> {
        self.stem.as_deref()
    }

    #[must_use]
    pub fn passage(&self) -> Option<&str> {
        self.passage.as_deref()
    }

    #[must_use]
    pub fn options(&self) -> Option<&ChoiceTexts> {
        self.options.as_ref()
    }

    #[must_use]
    pub fn correct(&self) -> Option<ChoiceLetter> {
        self.correct
    }
}

//
// ─── POOL QUESTION ─────────────────────────────────────────────────────────────
//

/// A source record from the question bank.
///
/// Either a single answerable question or a composite item whose subparts
/// are answered independently. The tagged shape keeps the flattener
/// exhaustive: there is no "maybe has subparts" middle ground.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PoolQuestion {
    Simple(QuestionContent),
    Composite {
        content: QuestionContent,
        subparts: Vec<Subpart>,
    },
}

impl PoolQuestion {
    /// Wraps standalone content as a simple question.
    #[must_use]
    pub fn simple(content: QuestionContent) -> Self {
        Self::Simple(content)
    }

    /// Builds a composite question from parent content and its subparts.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::NoSubparts` for an empty subpart list and
    /// `QuestionError::DuplicateSubpartNumber` when two subparts share a
    /// number.
    pub fn composite(
        content: QuestionContent,
        subparts: Vec<Subpart>,
    ) -> Result<Self, QuestionError> {
        if subparts.is_empty() {
            return Err(QuestionError::NoSubparts);
        }
        let mut seen = std::collections::HashSet::new();
        for subpart in &subparts {
            if !seen.insert(subpart.number()) {
                return Err(QuestionError::DuplicateSubpartNumber {
                    number: subpart.number(),
                });
            }
        }

        Ok(Self::Composite { content, subparts })
    }

    /// The parent-level content regardless of shape.
    #[must_use]
    pub fn content(&self) -> &QuestionContent {
        match self {
            PoolQuestion::Simple(content) | PoolQuestion::Composite { content, .. } => content,
        }
    }

    /// Subparts of a composite question; empty for simple questions.
    #[must_use]
    pub fn subparts(&self) -> &[Subpart] {
        match self {
            PoolQuestion::Simple(_) => &[],
            PoolQuestion::Composite { subparts, .. } => subparts,
        }
    }

    /// The number of gradable units this question contributes.
    #[must_use]
    pub fn weight(&self) -> u32 {
        match self {
            PoolQuestion::Simple(_) => 1,
            PoolQuestion::Composite { subparts, .. } => subparts.len() as u32,
        }
    }

    #[must_use]
    pub fn is_composite(&self) -> bool {
        matches!(self, PoolQuestion::Composite { .. })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.content().id()
    }

    #[must_use]
    pub fn exam_id(&self) -> ExamId {
        self.content().exam_id()
    }

    #[must_use]
    pub fn year(&self) -> u16 {
        self.content().year()
    }

    #[must_use]
    pub fn classification_id(&self) -> ClassificationId {
        self.content().classification_id()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

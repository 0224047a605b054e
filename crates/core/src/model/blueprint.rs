use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{ExamId, UserId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BlueprintError {
    #[error("target weight must be > 0")]
    InvalidTargetWeight,
}

//
// ─── EXAM CONTEXT ──────────────────────────────────────────────────────────────
//

/// The identity an attempt is submitted under: which exam, which user,
/// which sitting year. Multi-year pools still submit under one primary
/// exam; the grading response may answer with blocks for several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamContext {
    exam_id: ExamId,
    user_id: UserId,
    year: u16,
}

impl ExamContext {
    #[must_use]
    pub fn new(exam_id: ExamId, user_id: UserId, year: u16) -> Self {
        Self {
            exam_id,
            user_id,
            year,
        }
    }

    #[must_use]
    pub fn exam_id(&self) -> ExamId {
        self.exam_id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn year(&self) -> u16 {
        self.year
    }
}

//
// ─── ATTEMPT BLUEPRINT ─────────────────────────────────────────────────────────
//

/// Everything needed to assemble one attempt: submission identity, the
/// global weight target for the sampler, and the presentation labels that
/// travel with the pending snapshot so a resumed attempt can describe
/// itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptBlueprint {
    context: ExamContext,
    target_weight: u32,
    modality: Option<String>,
    level: Option<String>,
    specialty: Option<String>,
    year_label: Option<String>,
}

impl AttemptBlueprint {
    /// Creates a blueprint with no labels set.
    ///
    /// # Errors
    ///
    /// Returns `BlueprintError::InvalidTargetWeight` for a zero target.
    pub fn new(context: ExamContext, target_weight: u32) -> Result<Self, BlueprintError> {
        if target_weight == 0 {
            return Err(BlueprintError::InvalidTargetWeight);
        }

        Ok(Self {
            context,
            target_weight,
            modality: None,
            level: None,
            specialty: None,
            year_label: None,
        })
    }

    /// Sets the modality label; blank text is dropped.
    #[must_use]
    pub fn with_modality(mut self, modality: impl Into<String>) -> Self {
        self.modality = normalize_label(modality.into());
        self
    }

    /// Sets the level label; blank text is dropped.
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = normalize_label(level.into());
        self
    }

    /// Sets the specialty label; blank text is dropped.
    #[must_use]
    pub fn with_specialty(mut self, specialty: impl Into<String>) -> Self {
        self.specialty = normalize_label(specialty.into());
        self
    }

    /// Sets the year-range label shown on the review surface; blank text is
    /// dropped.
    #[must_use]
    pub fn with_year_label(mut self, year_label: impl Into<String>) -> Self {
        self.year_label = normalize_label(year_label.into());
        self
    }

    // Accessors
    #[must_use]
    pub fn context(&self) -> ExamContext {
        self.context
    }

    #[must_use]
    pub fn target_weight(&self) -> u32 {
        self.target_weight
    }

    #[must_use]
    pub fn modality(&self) -> Option<&str> {
        self.modality.as_deref()
    }

    #[must_use]
    pub fn level(&self) -> Option<&str> {
        self.level.as_deref()
    }

    #[must_use]
    pub fn specialty(&self) -> Option<&str> {
        self.specialty.as_deref()
    }

    #[must_use]
    pub fn year_label(&self) -> Option<&str> {
        self.year_label.as_deref()
    }
}

fn normalize_label(label: String) -> Option<String> {
    Some(label.trim().to_owned()).filter(|l| !l.is_empty())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

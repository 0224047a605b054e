//! Question retrieval.
//!
//! The pool is an opaque input to assembly: whatever source it comes from,
//! the bank hands back domain questions and the flattener takes it from
//! there.

use std::sync::Arc;

use async_trait::async_trait;

use exam_core::model::{ClassificationId, PoolQuestion};

use crate::error::BankError;

/// Retrieval criteria for one pool fetch.
///
/// Empty id/year lists mean "no restriction". The label criteria
/// (modality, level, specialty) describe attributes questions carry only
/// on the backend; remote banks forward them, the in-memory bank ignores
/// them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoolFilter {
    classification_ids: Vec<ClassificationId>,
    years: Vec<u16>,
    modality: Option<String>,
    level: Option<String>,
    specialty: Option<String>,
}

impl PoolFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_classifications(
        mut self,
        ids: impl IntoIterator<Item = ClassificationId>,
    ) -> Self {
        self.classification_ids = ids.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_years(mut self, years: impl IntoIterator<Item = u16>) -> Self {
        self.years = years.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_modality(mut self, modality: impl Into<String>) -> Self {
        self.modality = normalize(modality);
        self
    }

    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = normalize(level);
        self
    }

    #[must_use]
    pub fn with_specialty(mut self, specialty: impl Into<String>) -> Self {
        self.specialty = normalize(specialty);
        self
    }

    // Accessors
    #[must_use]
    pub fn classification_ids(&self) -> &[ClassificationId] {
        &self.classification_ids
    }

    #[must_use]
    pub fn years(&self) -> &[u16] {
        &self.years
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

    /// Whether a question passes the id and year criteria.
    #[must_use]
    pub fn matches(&self, question: &PoolQuestion) -> bool {
        let classification_ok = self.classification_ids.is_empty()
            || self.classification_ids.contains(&question.classification_id());
        let year_ok = self.years.is_empty() || self.years.contains(&question.year());
        classification_ok && year_ok
    }
}

fn normalize(label: impl Into<String>) -> Option<String> {
    let label = label.into();
    Some(label.trim().to_owned()).filter(|l| !l.is_empty())
}

/// Source of pool questions.
#[async_trait]
pub trait QuestionBank: Send + Sync {
    /// Fetch every question matching the filter.
    ///
    /// # Errors
    ///
    /// Returns `BankError` when the source cannot be reached or hands back
    /// data that does not parse into domain questions.
    async fn fetch(&self, filter: &PoolFilter) -> Result<Vec<PoolQuestion>, BankError>;
}

/// Bank over a seeded question list, for tests and local use.
#[derive(Clone, Default)]
pub struct InMemoryQuestionBank {
    questions: Arc<Vec<PoolQuestion>>,
}

impl InMemoryQuestionBank {
    #[must_use]
    pub fn new(questions: Vec<PoolQuestion>) -> Self {
        Self {
            questions: Arc::new(questions),
        }
    }
}

#[async_trait]
impl QuestionBank for InMemoryQuestionBank {
    async fn fetch(&self, filter: &PoolFilter) -> Result<Vec<PoolQuestion>, BankError> {
        Ok(self
            .questions
            .iter()
            .filter(|question| filter.matches(question))
            .cloned()
            .collect())
    }
}

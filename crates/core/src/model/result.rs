use serde::{Deserialize, Serialize};

use crate::model::ids::ExamId;

//
// ─── EXAM RESULT BLOCK ────────────────────────────────────────────────────────
//

/// Per-exam slice of a remote grading result.
///
/// The three ID lists use the backend's string keys: `"<backingId>"` for
/// whole questions and `"<backingId>-<subpartNumber>"` for subparts — though
/// some backend rows omit the suffix, which is why reconciliation falls back
/// to the bare id. Counts are reported by the backend and are not re-derived
/// from the lists here.
///
/// Field names serialize in the grading service's camelCase wire form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamResultBlock {
    exam_id: ExamId,
    total_score: f64,
    correct_count: u32,
    incorrect_count: u32,
    omitted_count: u32,
    correct_ids: Vec<String>,
    incorrect_ids: Vec<String>,
    omitted_ids: Vec<String>,
}

impl ExamResultBlock {
    /// An empty block for the given exam.
    #[must_use]
    pub fn new(exam_id: ExamId, total_score: f64) -> Self {
        Self {
            exam_id,
            total_score,
            correct_count: 0,
            incorrect_count: 0,
            omitted_count: 0,
            correct_ids: Vec::new(),
            incorrect_ids: Vec::new(),
            omitted_ids: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_counts(mut self, correct: u32, incorrect: u32, omitted: u32) -> Self {
        self.correct_count = correct;
        self.incorrect_count = incorrect;
        self.omitted_count = omitted;
        self
    }

    #[must_use]
    pub fn with_correct_ids(mut self, ids: Vec<String>) -> Self {
        self.correct_ids = ids;
        self
    }

    #[must_use]
    pub fn with_incorrect_ids(mut self, ids: Vec<String>) -> Self {
        self.incorrect_ids = ids;
        self
    }

    #[must_use]
    pub fn with_omitted_ids(mut self, ids: Vec<String>) -> Self {
        self.omitted_ids = ids;
        self
    }

    // Accessors
    #[must_use]
    pub fn exam_id(&self) -> ExamId {
        self.exam_id
    }

    #[must_use]
    pub fn total_score(&self) -> f64 {
        self.total_score
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn incorrect_count(&self) -> u32 {
        self.incorrect_count
    }

    #[must_use]
    pub fn omitted_count(&self) -> u32 {
        self.omitted_count
    }

    #[must_use]
    pub fn correct_ids(&self) -> &[String] {
        &self.correct_ids
    }

    #[must_use]
    pub fn incorrect_ids(&self) -> &[String] {
        &self.incorrect_ids
    }

    #[must_use]
    pub fn omitted_ids(&self) -> &[String] {
        &self.omitted_ids
    }
}

//
// ─── SESSION RESULT ───────────────────────────────────────────────────────────
//

/// The authoritative grading verdict for one attempt: a global score plus
/// one result block per exam the submitted questions belonged to.
///
/// Created exactly once, at the finish transition, and terminal thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResult {
    global_score: f64,
    results: Vec<ExamResultBlock>,
}

impl SessionResult {
    #[must_use]
    pub fn new(global_score: f64, results: Vec<ExamResultBlock>) -> Self {
        Self {
            global_score,
            results,
        }
    }

    #[must_use]
    pub fn global_score(&self) -> f64 {
        self.global_score
    }

    #[must_use]
    pub fn results(&self) -> &[ExamResultBlock] {
        &self.results
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_builders_fill_lists() {
        let block = ExamResultBlock::new(ExamId::new(9), 7.5)
            .with_counts(2, 1, 0)
            .with_correct_ids(vec!["105-1".into(), "106".into()])
            .with_incorrect_ids(vec!["107".into()]);

        assert_eq!(block.exam_id(), ExamId::new(9));
        assert_eq!(block.correct_count(), 2);
        assert_eq!(block.correct_ids(), ["105-1", "106"]);
        assert_eq!(block.incorrect_ids(), ["107"]);
        assert!(block.omitted_ids().is_empty());
    }

    #[test]
    fn wire_names_are_camel_case() {
        let json = r#"{
            "globalScore": 6.2,
            "results": [{
                "examId": 4,
                "totalScore": 6.2,
                "correctCount": 1,
                "incorrectCount": 0,
                "omittedCount": 1,
                "correctIds": ["105-1"],
                "incorrectIds": [],
                "omittedIds": ["106"]
            }]
        }"#;

        let result: SessionResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.global_score(), 6.2);
        assert_eq!(result.results().len(), 1);
        assert_eq!(result.results()[0].exam_id(), ExamId::new(4));
        assert_eq!(result.results()[0].correct_ids(), ["105-1"]);
    }
}

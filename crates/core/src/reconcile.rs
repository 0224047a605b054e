//! Reconciliation of remote grading results against the local attempt.
//!
//! The backend returns flat ID lists split by exam; the attempt addresses
//! items by sequence position. This module joins the two views into one
//! per-item verdict table plus per-classification tallies. Reconciliation
//! is total: malformed or partial results degrade to `Omitted`, never to an
//! error.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::flatten::FlattenedItem;
use crate::model::{AnswerRecord, ChoiceLetter, ClassificationId, SessionResult, Verdict};

//
// ─── POINT VALUES ──────────────────────────────────────────────────────────────
//

/// Pre-computed points awarded per correct item, by classification.
///
/// The reconciler multiplies these values by correct counts and nothing
/// more; whatever scheme produced them (exam weighting, difficulty tiers)
/// is the caller's business.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointValues {
    default: f64,
    per_classification: BTreeMap<ClassificationId, f64>,
}

impl Default for PointValues {
    /// One point per correct item everywhere.
    fn default() -> Self {
        Self::uniform(1.0)
    }
}

impl PointValues {
    #[must_use]
    pub fn uniform(value: f64) -> Self {
        Self {
            default: value,
            per_classification: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_classification(mut self, id: ClassificationId, value: f64) -> Self {
        self.per_classification.insert(id, value);
        self
    }

    #[must_use]
    pub fn for_classification(&self, id: ClassificationId) -> f64 {
        self.per_classification.get(&id).copied().unwrap_or(self.default)
    }
}

//
// ─── REPORT TYPES ──────────────────────────────────────────────────────────────
//

/// Final verdict for one sequence position, paired with the selection it
/// was graded on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemOutcome {
    verdict: Verdict,
    selected: Option<ChoiceLetter>,
}

impl ItemOutcome {
    #[must_use]
    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    #[must_use]
    pub fn selected(&self) -> Option<ChoiceLetter> {
        self.selected
    }
}

/// Verdict counts and earned points for one classification.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClassificationTally {
    correct: u32,
    incorrect: u32,
    omitted: u32,
    points: f64,
}

impl ClassificationTally {
    fn record(&mut self, verdict: Verdict, points_per_correct: f64) {
        match verdict {
            Verdict::Correct => {
                self.correct += 1;
                self.points += points_per_correct;
            }
            Verdict::Incorrect => self.incorrect += 1,
            Verdict::Omitted => self.omitted += 1,
        }
    }

    // Accessors
    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn incorrect(&self) -> u32 {
        self.incorrect
    }

    #[must_use]
    pub fn omitted(&self) -> u32 {
        self.omitted
    }

    #[must_use]
    pub fn points(&self) -> f64 {
        self.points
    }
}

/// The reconciled view of one graded attempt: exactly one outcome per
/// sequence position, in sequence order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeReport {
    global_score: f64,
    outcomes: Vec<ItemOutcome>,
    tallies: BTreeMap<ClassificationId, ClassificationTally>,
}

impl GradeReport {
    #[must_use]
    pub fn global_score(&self) -> f64 {
        self.global_score
    }

    #[must_use]
    pub fn outcomes(&self) -> &[ItemOutcome] {
        &self.outcomes
    }

    #[must_use]
    pub fn outcome(&self, index: usize) -> Option<&ItemOutcome> {
        self.outcomes.get(index)
    }

    #[must_use]
    pub fn tallies(&self) -> &BTreeMap<ClassificationId, ClassificationTally> {
        &self.tallies
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.count_where(Verdict::Correct)
    }

    #[must_use]
    pub fn incorrect_count(&self) -> u32 {
        self.count_where(Verdict::Incorrect)
    }

    #[must_use]
    pub fn omitted_count(&self) -> u32 {
        self.count_where(Verdict::Omitted)
    }

    fn count_where(&self, verdict: Verdict) -> u32 {
        let count = self
            .outcomes
            .iter()
            .filter(|outcome| outcome.verdict == verdict)
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }
}

//
// ─── RECONCILIATION ────────────────────────────────────────────────────────────
//

/// Membership sets merged across every result block. The backend splits
/// rows by exam but the composite keys are globally unique per backing
/// question, so one merged set per verdict is enough.
struct VerdictSets {
    correct: HashSet<String>,
    incorrect: HashSet<String>,
    omitted: HashSet<String>,
}

impl VerdictSets {
    fn merge(result: &SessionResult) -> Self {
        let mut sets = Self {
            correct: HashSet::new(),
            incorrect: HashSet::new(),
            omitted: HashSet::new(),
        };
        for block in result.results() {
            sets.correct.extend(block.correct_ids().iter().cloned());
            sets.incorrect.extend(block.incorrect_ids().iter().cloned());
            sets.omitted.extend(block.omitted_ids().iter().cloned());
        }
        sets
    }

    /// Ordered probe: an id landing in several lists grades as the best of
    /// them. Reported omissions carry no more weight than absent ones, so
    /// correctness always wins a conflict.
    fn lookup(&self, key: &str) -> Option<Verdict> {
        if self.correct.contains(key) {
            Some(Verdict::Correct)
        } else if self.incorrect.contains(key) {
            Some(Verdict::Incorrect)
        } else if self.omitted.contains(key) {
            Some(Verdict::Omitted)
        } else {
            None
        }
    }

    fn verdict_for(&self, item: &FlattenedItem) -> Verdict {
        if let Some(verdict) = self.lookup(&item.composite_key()) {
            return verdict;
        }
        // Some backend rows key subparts by the bare backing id.
        if item.is_subpart() {
            if let Some(verdict) = self.lookup(&item.question_id().to_string()) {
                return verdict;
            }
        }
        Verdict::Omitted
    }
}

/// Joins a remote result onto the attempt's item sequence.
///
/// Every sequence position receives exactly one verdict: matched keys take
/// the remote verdict (composite key first, bare backing id as the subpart
/// fallback), unmatched items default to [`Verdict::Omitted`]. Tallies are
/// grouped by classification with points accrued per correct item from the
/// given table.
#[must_use]
pub fn reconcile(
    items: &[FlattenedItem],
    answers: &BTreeMap<usize, AnswerRecord>,
    result: &SessionResult,
    points: &PointValues,
) -> GradeReport {
    let sets = VerdictSets::merge(result);

    let mut outcomes = Vec::with_capacity(items.len());
    let mut tallies: BTreeMap<ClassificationId, ClassificationTally> = BTreeMap::new();

    for (index, item) in items.iter().enumerate() {
        let verdict = sets.verdict_for(item);
        let selected = answers.get(&index).and_then(AnswerRecord::selected);
        outcomes.push(ItemOutcome { verdict, selected });

        let value = points.for_classification(item.classification_id());
        tallies
            .entry(item.classification_id())
            .or_default()
            .record(verdict, value);
    }

    GradeReport {
        global_score: result.global_score(),
        outcomes,
        tallies,
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::flatten_pool;
    use crate::model::{
        ChoiceTexts, ExamId, ExamResultBlock, PoolQuestion, QuestionContent, QuestionId, Subpart,
    };

    fn build_content(id: u64, class_id: u64) -> QuestionContent {
        QuestionContent::new(
            QuestionId::new(id),
            ExamId::new(1),
            2021,
            ClassificationId::new(class_id),
            "stem",
            ChoiceTexts::new("a", "b", "c", "d"),
        )
        .unwrap()
    }

    fn build_simple(id: u64, class_id: u64) -> PoolQuestion {
        PoolQuestion::simple(build_content(id, class_id))
    }

    fn build_composite(id: u64, class_id: u64, parts: u32) -> PoolQuestion {
        let subparts = (1..=parts).map(|n| Subpart::new(n).unwrap()).collect();
        PoolQuestion::composite(build_content(id, class_id), subparts).unwrap()
    }

    fn result_with(block: ExamResultBlock) -> SessionResult {
        SessionResult::new(block.total_score(), vec![block])
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|id| (*id).to_owned()).collect()
    }

    #[test]
    fn subpart_key_match_leaves_sibling_omitted() {
        let items = flatten_pool(&[build_composite(105, 3, 2)]);
        let result = result_with(
            ExamResultBlock::new(ExamId::new(1), 1.0).with_correct_ids(ids(&["105-1"])),
        );

        let report = reconcile(&items, &BTreeMap::new(), &result, &PointValues::default());

        assert_eq!(report.outcomes().len(), 2);
        assert_eq!(report.outcome(0).unwrap().verdict(), Verdict::Correct);
        assert_eq!(report.outcome(1).unwrap().verdict(), Verdict::Omitted);
    }

    #[test]
    fn bare_id_is_the_subpart_fallback() {
        let items = flatten_pool(&[build_composite(105, 3, 2)]);
        let result = result_with(
            ExamResultBlock::new(ExamId::new(1), 2.0).with_correct_ids(ids(&["105"])),
        );

        let report = reconcile(&items, &BTreeMap::new(), &result, &PointValues::default());

        assert_eq!(report.outcome(0).unwrap().verdict(), Verdict::Correct);
        assert_eq!(report.outcome(1).unwrap().verdict(), Verdict::Correct);
    }

    #[test]
    fn composite_key_beats_bare_fallback() {
        let items = flatten_pool(&[build_composite(105, 3, 2)]);
        let result = result_with(
            ExamResultBlock::new(ExamId::new(1), 1.0)
                .with_correct_ids(ids(&["105"]))
                .with_incorrect_ids(ids(&["105-2"])),
        );

        let report = reconcile(&items, &BTreeMap::new(), &result, &PointValues::default());

        assert_eq!(report.outcome(0).unwrap().verdict(), Verdict::Correct);
        assert_eq!(report.outcome(1).unwrap().verdict(), Verdict::Incorrect);
    }

    #[test]
    fn conflicting_lists_resolve_to_the_best_verdict() {
        let items = flatten_pool(&[build_simple(7, 3), build_simple(8, 3)]);
        let result = result_with(
            ExamResultBlock::new(ExamId::new(1), 1.0)
                .with_correct_ids(ids(&["7"]))
                .with_incorrect_ids(ids(&["7", "8"]))
                .with_omitted_ids(ids(&["8"])),
        );

        let report = reconcile(&items, &BTreeMap::new(), &result, &PointValues::default());

        assert_eq!(report.outcome(0).unwrap().verdict(), Verdict::Correct);
        assert_eq!(report.outcome(1).unwrap().verdict(), Verdict::Incorrect);
    }

    #[test]
    fn unmatched_items_default_to_omitted() {
        let items = flatten_pool(&[build_simple(1, 3), build_simple(2, 3), build_simple(3, 3)]);
        let result = result_with(
            ExamResultBlock::new(ExamId::new(1), 1.0).with_correct_ids(ids(&["2"])),
        );

        let report = reconcile(&items, &BTreeMap::new(), &result, &PointValues::default());

        let verdicts: Vec<_> = report.outcomes().iter().map(ItemOutcome::verdict).collect();
        assert_eq!(
            verdicts,
            [Verdict::Omitted, Verdict::Correct, Verdict::Omitted]
        );
    }

    #[test]
    fn blocks_from_different_exams_merge() {
        let items = flatten_pool(&[build_simple(1, 3), build_simple(2, 3)]);
        let result = SessionResult::new(
            2.0,
            vec![
                ExamResultBlock::new(ExamId::new(1), 1.0).with_correct_ids(ids(&["1"])),
                ExamResultBlock::new(ExamId::new(2), 1.0).with_incorrect_ids(ids(&["2"])),
            ],
        );

        let report = reconcile(&items, &BTreeMap::new(), &result, &PointValues::default());

        assert_eq!(report.outcome(0).unwrap().verdict(), Verdict::Correct);
        assert_eq!(report.outcome(1).unwrap().verdict(), Verdict::Incorrect);
        assert_eq!(report.global_score(), 2.0);
    }

    #[test]
    fn tallies_group_by_classification_and_accrue_points() {
        let items = flatten_pool(&[
            build_simple(1, 3),
            build_simple(2, 3),
            build_simple(3, 9),
            build_simple(4, 9),
        ]);
        let result = result_with(
            ExamResultBlock::new(ExamId::new(1), 6.0)
                .with_correct_ids(ids(&["1", "2", "3"]))
                .with_incorrect_ids(ids(&["4"])),
        );
        let points = PointValues::default().with_classification(ClassificationId::new(3), 2.5);

        let report = reconcile(&items, &BTreeMap::new(), &result, &points);

        let tally_3 = report.tallies()[&ClassificationId::new(3)];
        assert_eq!(tally_3.correct(), 2);
        assert_eq!(tally_3.points(), 5.0);

        let tally_9 = report.tallies()[&ClassificationId::new(9)];
        assert_eq!(tally_9.correct(), 1);
        assert_eq!(tally_9.incorrect(), 1);
        assert_eq!(tally_9.points(), 1.0);

        assert_eq!(report.correct_count(), 3);
        assert_eq!(report.incorrect_count(), 1);
        assert_eq!(report.omitted_count(), 0);
    }

    #[test]
    fn selections_flow_into_outcomes() {
        let items = flatten_pool(&[build_simple(1, 3), build_simple(2, 3)]);
        let mut answers = BTreeMap::new();
        let mut record = AnswerRecord::new();
        record.select(ChoiceLetter::C);
        answers.insert(0, record);

        let result = result_with(
            ExamResultBlock::new(ExamId::new(1), 1.0).with_correct_ids(ids(&["1"])),
        );
        let report = reconcile(&items, &answers, &result, &PointValues::default());

        assert_eq!(report.outcome(0).unwrap().selected(), Some(ChoiceLetter::C));
        assert_eq!(report.outcome(1).unwrap().selected(), None);
    }
}

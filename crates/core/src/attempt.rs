//! The in-progress attempt: answer state plus the submission lifecycle.
//!
//! Two state machines live here. Each item moves unanswered → selected →
//! locked through its [`AnswerRecord`]; the attempt as a whole moves
//! `InProgress` → `Submitting` → `Resolved`, where `Submitting` is the
//! guard that makes a concurrent second finish observable instead of
//! racing.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::flatten::FlattenedItem;
use crate::model::{AnswerRecord, AttemptBlueprint, ChoiceLetter, Verdict};
use crate::reconcile::GradeReport;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AttemptError {
    #[error("attempt has no items")]
    Empty,

    #[error("no item at position {index} (attempt holds {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("attempt is no longer accepting answers")]
    Closed,

    #[error("a submission for this attempt is already in flight")]
    SubmissionInFlight,

    #[error("attempt is already resolved")]
    AlreadyResolved,

    #[error("no submission is in flight")]
    NotSubmitting,
}

/// Global lifecycle phase of an attempt.
///
/// `Submitting` spans the grading call: entered when a finish begins,
/// left either forward to `Resolved` or back to `InProgress` on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttemptPhase {
    InProgress,
    Submitting,
    Resolved,
}

//
// ─── EXAM ATTEMPT ─────────────────────────────────────────────────────────────
//

/// One user's pass over an assembled item sequence.
///
/// Items are addressed by sequence position. Answer records are created
/// lazily on first touch, so an untouched item costs nothing and reads as
/// a fresh record.
#[derive(Debug, Clone, PartialEq)]
pub struct ExamAttempt {
    blueprint: AttemptBlueprint,
    items: Vec<FlattenedItem>,
    answers: BTreeMap<usize, AnswerRecord>,
    phase: AttemptPhase,
    started_at: DateTime<Utc>,
    report: Option<GradeReport>,
}

impl ExamAttempt {
    /// Starts an attempt over an assembled item sequence.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::Empty` when the sequence holds no items.
    pub fn new(
        blueprint: AttemptBlueprint,
        items: Vec<FlattenedItem>,
        started_at: DateTime<Utc>,
    ) -> Result<Self, AttemptError> {
        if items.is_empty() {
            return Err(AttemptError::Empty);
        }
        Ok(Self {
            blueprint,
            items,
            answers: BTreeMap::new(),
            phase: AttemptPhase::InProgress,
            started_at,
            report: None,
        })
    }

    fn guard_open(&self) -> Result<(), AttemptError> {
        match self.phase {
            AttemptPhase::InProgress => Ok(()),
            AttemptPhase::Submitting | AttemptPhase::Resolved => Err(AttemptError::Closed),
        }
    }

    fn check_bounds(&self, index: usize) -> Result<(), AttemptError> {
        if index < self.items.len() {
            Ok(())
        } else {
            Err(AttemptError::IndexOutOfBounds {
                index,
                len: self.items.len(),
            })
        }
    }

    /// Records a selection on the item at `index`. Last write wins while
    /// the item is unlocked; on a locked item the call is ignored and
    /// `false` comes back.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::Closed` once submission has begun and
    /// `AttemptError::IndexOutOfBounds` for a position past the sequence.
    pub fn select(&mut self, index: usize, letter: ChoiceLetter) -> Result<bool, AttemptError> {
        self.guard_open()?;
        self.check_bounds(index)?;
        Ok(self.answers.entry(index).or_default().select(letter))
    }

    /// Locks the item at `index`, computing the provisional verdict when
    /// the item carries a local correct marker. Idempotent: relocking
    /// keeps the first verdict.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::Closed` once submission has begun and
    /// `AttemptError::IndexOutOfBounds` for a position past the sequence.
    pub fn lock(&mut self, index: usize) -> Result<Option<Verdict>, AttemptError> {
        self.guard_open()?;
        self.check_bounds(index)?;
        let correct = self.items[index].correct();
        let record = self.answers.entry(index).or_default();
        record.lock(correct);
        Ok(record.local_verdict())
    }

    /// Locks every remaining item, moves the attempt into `Submitting`,
    /// and returns the answered `(item, selection)` pairs in sequence
    /// order. Unanswered items are not part of the submission; the grader
    /// derives omissions from absence.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::SubmissionInFlight` while another submission
    /// is under way and `AttemptError::AlreadyResolved` after resolution.
    pub fn begin_submission(&mut self) -> Result<Vec<(FlattenedItem, ChoiceLetter)>, AttemptError> {
        match self.phase {
            AttemptPhase::InProgress => {}
            AttemptPhase::Submitting => return Err(AttemptError::SubmissionInFlight),
            AttemptPhase::Resolved => return Err(AttemptError::AlreadyResolved),
        }

        for (index, item) in self.items.iter().enumerate() {
            self.answers.entry(index).or_default().lock(item.correct());
        }
        self.phase = AttemptPhase::Submitting;

        let answered = self
            .items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| {
                let selected = self.answers.get(&index)?.selected()?;
                Some((item.clone(), selected))
            })
            .collect();
        Ok(answered)
    }

    /// Releases the submission guard after a failed grading call so the
    /// finish can be retried. Item locks are not undone.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::NotSubmitting` when no submission is under
    /// way and `AttemptError::AlreadyResolved` after resolution.
    pub fn fail_submission(&mut self) -> Result<(), AttemptError> {
        match self.phase {
            AttemptPhase::Submitting => {
                self.phase = AttemptPhase::InProgress;
                Ok(())
            }
            AttemptPhase::InProgress => Err(AttemptError::NotSubmitting),
            AttemptPhase::Resolved => Err(AttemptError::AlreadyResolved),
        }
    }

    /// Stores the reconciled report and makes the attempt terminal.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::NotSubmitting` when no submission is under
    /// way and `AttemptError::AlreadyResolved` after resolution.
    pub fn complete_submission(&mut self, report: GradeReport) -> Result<(), AttemptError> {
        match self.phase {
            AttemptPhase::Submitting => {
                self.report = Some(report);
                self.phase = AttemptPhase::Resolved;
                Ok(())
            }
            AttemptPhase::InProgress => Err(AttemptError::NotSubmitting),
            AttemptPhase::Resolved => Err(AttemptError::AlreadyResolved),
        }
    }

    // Accessors
    #[must_use]
    pub fn blueprint(&self) -> &AttemptBlueprint {
        &self.blueprint
    }

    #[must_use]
    pub fn phase(&self) -> AttemptPhase {
        self.phase
    }

    #[must_use]
    pub fn items(&self) -> &[FlattenedItem] {
        &self.items
    }

    #[must_use]
    pub fn item(&self, index: usize) -> Option<&FlattenedItem> {
        self.items.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Answer state at `index`; untouched positions read as a fresh record.
    #[must_use]
    pub fn answer(&self, index: usize) -> AnswerRecord {
        self.answers.get(&index).cloned().unwrap_or_default()
    }

    /// Touched answer records by sequence position.
    #[must_use]
    pub fn answers(&self) -> &BTreeMap<usize, AnswerRecord> {
        &self.answers
    }

    #[must_use]
    pub fn report(&self) -> Option<&GradeReport> {
        self.report.as_ref()
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers
            .values()
            .filter(|record| record.is_answered())
            .count()
    }

    #[must_use]
    pub fn unanswered_count(&self) -> usize {
        self.len().saturating_sub(self.answered_count())
    }

    /// Items whose lock-time verdict came out correct. Only meaningful
    /// when the pool carries local correct markers.
    #[must_use]
    pub fn local_correct_count(&self) -> usize {
        self.answers
            .values()
            .filter(|record| record.local_verdict() == Some(Verdict::Correct))
            .count()
    }

    /// Whole seconds since the attempt started, clamped at zero.
    #[must_use]
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> u64 {
        u64::try_from((now - self.started_at).num_seconds()).unwrap_or(0)
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
        ChoiceTexts, ClassificationId, ExamContext, ExamId, ExamResultBlock, PoolQuestion,
        QuestionContent, QuestionId, SessionResult, UserId,
    };
    use crate::reconcile::{PointValues, reconcile};
    use crate::time::fixed_now;
    use chrono::Duration;

    fn build_question(id: u64, correct: Option<ChoiceLetter>) -> PoolQuestion {
        let mut content = QuestionContent::new(
            QuestionId::new(id),
            ExamId::new(1),
            2021,
            ClassificationId::new(3),
            "stem",
            ChoiceTexts::new("a", "b", "c", "d"),
        )
        .unwrap();
        if let Some(marker) = correct {
            content = content.with_correct(marker);
        }
        PoolQuestion::simple(content)
    }

    fn build_blueprint() -> AttemptBlueprint {
        let context = ExamContext::new(ExamId::new(1), UserId::new(7), 2021);
        AttemptBlueprint::new(context, 10).unwrap()
    }

    fn build_attempt(markers: &[Option<ChoiceLetter>]) -> ExamAttempt {
        let pool: Vec<_> = markers
            .iter()
            .enumerate()
            .map(|(i, marker)| build_question(i as u64 + 1, *marker))
            .collect();
        ExamAttempt::new(build_blueprint(), flatten_pool(&pool), fixed_now()).unwrap()
    }

    fn build_report(attempt: &ExamAttempt) -> GradeReport {
        let result = SessionResult::new(0.0, vec![ExamResultBlock::new(ExamId::new(1), 0.0)]);
        reconcile(
            attempt.items(),
            attempt.answers(),
            &result,
            &PointValues::default(),
        )
    }

    #[test]
    fn empty_sequence_is_rejected() {
        let err = ExamAttempt::new(build_blueprint(), Vec::new(), fixed_now()).unwrap_err();
        assert_eq!(err, AttemptError::Empty);
    }

    #[test]
    fn selection_overwrites_until_the_item_locks() {
        let mut attempt = build_attempt(&[None, None]);

        assert_eq!(attempt.select(0, ChoiceLetter::A), Ok(true));
        assert_eq!(attempt.select(0, ChoiceLetter::C), Ok(true));
        assert_eq!(attempt.answer(0).selected(), Some(ChoiceLetter::C));

        attempt.lock(0).unwrap();
        assert_eq!(attempt.select(0, ChoiceLetter::D), Ok(false));
        assert_eq!(attempt.answer(0).selected(), Some(ChoiceLetter::C));
    }

    #[test]
    fn out_of_bounds_positions_are_reported() {
        let mut attempt = build_attempt(&[None, None]);
        let err = attempt.select(9, ChoiceLetter::A).unwrap_err();
        assert_eq!(err, AttemptError::IndexOutOfBounds { index: 9, len: 2 });
    }

    #[test]
    fn lock_computes_the_local_verdict_when_a_marker_exists() {
        let mut attempt = build_attempt(&[Some(ChoiceLetter::B), Some(ChoiceLetter::B), None]);

        attempt.select(0, ChoiceLetter::B).unwrap();
        assert_eq!(attempt.lock(0), Ok(Some(Verdict::Correct)));

        attempt.select(1, ChoiceLetter::A).unwrap();
        assert_eq!(attempt.lock(1), Ok(Some(Verdict::Incorrect)));

        attempt.select(2, ChoiceLetter::A).unwrap();
        assert_eq!(attempt.lock(2), Ok(None));
    }

    #[test]
    fn begin_submission_locks_everything_and_returns_answered_pairs() {
        let mut attempt = build_attempt(&[None, None, None]);
        attempt.select(0, ChoiceLetter::A).unwrap();
        attempt.select(2, ChoiceLetter::D).unwrap();

        let answered = attempt.begin_submission().unwrap();

        assert_eq!(attempt.phase(), AttemptPhase::Submitting);
        assert_eq!(answered.len(), 2);
        assert_eq!(answered[0].0.question_id(), QuestionId::new(1));
        assert_eq!(answered[0].1, ChoiceLetter::A);
        assert_eq!(answered[1].0.question_id(), QuestionId::new(3));
        assert_eq!(answered[1].1, ChoiceLetter::D);
        for index in 0..attempt.len() {
            assert!(attempt.answer(index).is_locked());
        }
    }

    #[test]
    fn second_submission_hits_the_guard() {
        let mut attempt = build_attempt(&[None]);
        attempt.begin_submission().unwrap();

        assert_eq!(
            attempt.begin_submission().unwrap_err(),
            AttemptError::SubmissionInFlight
        );
        assert_eq!(
            attempt.select(0, ChoiceLetter::A).unwrap_err(),
            AttemptError::Closed
        );
    }

    #[test]
    fn failed_submission_releases_the_guard_but_keeps_locks() {
        let mut attempt = build_attempt(&[None]);
        attempt.select(0, ChoiceLetter::B).unwrap();
        attempt.begin_submission().unwrap();

        attempt.fail_submission().unwrap();
        assert_eq!(attempt.phase(), AttemptPhase::InProgress);
        assert!(attempt.answer(0).is_locked());

        // The retry goes through.
        let answered = attempt.begin_submission().unwrap();
        assert_eq!(answered.len(), 1);
    }

    #[test]
    fn completed_submission_is_terminal() {
        let mut attempt = build_attempt(&[None]);
        attempt.select(0, ChoiceLetter::A).unwrap();
        attempt.begin_submission().unwrap();

        let report = build_report(&attempt);
        attempt.complete_submission(report).unwrap();

        assert_eq!(attempt.phase(), AttemptPhase::Resolved);
        assert!(attempt.report().is_some());
        assert_eq!(
            attempt.begin_submission().unwrap_err(),
            AttemptError::AlreadyResolved
        );
        assert_eq!(
            attempt.select(0, ChoiceLetter::B).unwrap_err(),
            AttemptError::Closed
        );
    }

    #[test]
    fn submission_transitions_require_the_submitting_phase() {
        let mut attempt = build_attempt(&[None]);
        assert_eq!(attempt.fail_submission(), Err(AttemptError::NotSubmitting));

        let report = build_report(&attempt);
        assert_eq!(
            attempt.complete_submission(report),
            Err(AttemptError::NotSubmitting)
        );
    }

    #[test]
    fn counts_follow_the_answer_map() {
        let mut attempt = build_attempt(&[Some(ChoiceLetter::B), Some(ChoiceLetter::B), None]);
        attempt.select(0, ChoiceLetter::B).unwrap();
        attempt.select(1, ChoiceLetter::C).unwrap();
        attempt.lock(0).unwrap();
        attempt.lock(1).unwrap();

        assert_eq!(attempt.answered_count(), 2);
        assert_eq!(attempt.unanswered_count(), 1);
        assert_eq!(attempt.local_correct_count(), 1);
    }

    #[test]
    fn elapsed_seconds_track_the_given_instant() {
        let attempt = build_attempt(&[None]);
        let later = fixed_now() + Duration::seconds(125);

        assert_eq!(attempt.elapsed_seconds(later), 125);
        assert_eq!(attempt.elapsed_seconds(fixed_now() - Duration::seconds(5)), 0);
    }
}

use std::fmt;

use chrono::{DateTime, Utc};

use exam_core::attempt::{AttemptPhase, ExamAttempt};
use exam_core::flatten::FlattenedItem;
use exam_core::model::{AnswerRecord, ChoiceLetter, Verdict};

use super::progress::AttemptProgress;
use crate::error::SessionError;

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Interactive stepper over an in-progress attempt.
///
/// Holds the attempt state machine plus the cursor the user moves through
/// the item sequence. Moving the cursor off an item locks it, which is what
/// turns a glance at the next question into a committed answer on the
/// previous one.
pub struct SessionService {
    attempt: ExamAttempt,
    cursor: usize,
}

impl SessionService {
    #[must_use]
    pub fn new(attempt: ExamAttempt) -> Self {
        Self { attempt, cursor: 0 }
    }

    #[must_use]
    pub fn attempt(&self) -> &ExamAttempt {
        &self.attempt
    }

    pub(crate) fn attempt_mut(&mut self) -> &mut ExamAttempt {
        &mut self.attempt
    }

    #[must_use]
    pub fn phase(&self) -> AttemptPhase {
        self.attempt.phase()
    }

    /// Cursor position in the item sequence.
    #[must_use]
    pub fn position(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn current_item(&self) -> Option<&FlattenedItem> {
        self.attempt.item(self.cursor)
    }

    /// Answer state of the item under the cursor.
    #[must_use]
    pub fn current_answer(&self) -> AnswerRecord {
        self.attempt.answer(self.cursor)
    }

    /// Records a selection on the item under the cursor. Returns `false`
    /// when the item is already locked and the selection was ignored.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` once submission has begun.
    pub fn select(&mut self, letter: ChoiceLetter) -> Result<bool, SessionError> {
        Ok(self.attempt.select(self.cursor, letter)?)
    }

    /// Locks the item under the cursor without moving, returning the local
    /// verdict when the item carries a correct marker.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` once submission has begun.
    pub fn lock_current(&mut self) -> Result<Option<Verdict>, SessionError> {
        Ok(self.attempt.lock(self.cursor)?)
    }

    /// Moves the cursor forward, locking the item being left. Clamped at
    /// the last item: no movement, no lock. Returns the new position.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` once submission has begun.
    pub fn go_next(&mut self) -> Result<usize, SessionError> {
        if self.cursor + 1 >= self.attempt.len() {
            return Ok(self.cursor);
        }
        self.attempt.lock(self.cursor)?;
        self.cursor += 1;
        Ok(self.cursor)
    }

    /// Moves the cursor backward, locking the item being left. Clamped at
    /// the first item: no movement, no lock. Returns the new position.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` once submission has begun.
    pub fn go_previous(&mut self) -> Result<usize, SessionError> {
        if self.cursor == 0 {
            return Ok(self.cursor);
        }
        self.attempt.lock(self.cursor)?;
        self.cursor -= 1;
        Ok(self.cursor)
    }

    /// Returns a summary of the current attempt progress.
    #[must_use]
    pub fn progress(&self, now: DateTime<Utc>) -> AttemptProgress {
        let locked = self
            .attempt
            .answers()
            .values()
            .filter(|record| record.is_locked())
            .count();

        AttemptProgress {
            total: self.attempt.len(),
            answered: self.attempt.answered_count(),
            unanswered: self.attempt.unanswered_count(),
            locked,
            local_correct: self.attempt.local_correct_count(),
            position: self.cursor,
            elapsed_seconds: self.attempt.elapsed_seconds(now),
        }
    }
}

impl fmt::Debug for SessionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionService")
            .field("phase", &self.attempt.phase())
            .field("items_len", &self.attempt.len())
            .field("cursor", &self.cursor)
            .field("answered", &self.attempt.answered_count())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use exam_core::flatten::flatten_pool;
    use exam_core::model::{
        AttemptBlueprint, ChoiceTexts, ClassificationId, ExamContext, ExamId, PoolQuestion,
        QuestionContent, QuestionId, UserId,
    };
    use exam_core::time::fixed_now;

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

    fn build_session(markers: &[Option<ChoiceLetter>]) -> SessionService {
        let pool: Vec<_> = markers
            .iter()
            .enumerate()
            .map(|(i, marker)| build_question(i as u64 + 1, *marker))
            .collect();
        let context = ExamContext::new(ExamId::new(1), UserId::new(7), 2021);
        let blueprint = AttemptBlueprint::new(context, 10).unwrap();
        let attempt = ExamAttempt::new(blueprint, flatten_pool(&pool), fixed_now()).unwrap();
        SessionService::new(attempt)
    }

    #[test]
    fn advancing_locks_the_departed_item() {
        let mut session = build_session(&[None, None, None]);
        session.select(ChoiceLetter::B).unwrap();

        assert_eq!(session.go_next().unwrap(), 1);
        assert!(session.attempt().answer(0).is_locked());
        assert_eq!(session.attempt().answer(0).selected(), Some(ChoiceLetter::B));
        assert!(!session.current_answer().is_locked());
    }

    #[test]
    fn going_back_locks_the_departed_item_too() {
        let mut session = build_session(&[None, None]);
        session.go_next().unwrap();
        session.select(ChoiceLetter::A).unwrap();

        assert_eq!(session.go_previous().unwrap(), 0);
        assert!(session.attempt().answer(1).is_locked());
    }

    #[test]
    fn navigation_clamps_at_the_ends_without_locking() {
        let mut session = build_session(&[None, None]);

        assert_eq!(session.go_previous().unwrap(), 0);
        assert!(!session.current_answer().is_locked());

        session.go_next().unwrap();
        assert_eq!(session.go_next().unwrap(), 1);
        assert!(!session.current_answer().is_locked());
    }

    #[test]
    fn lock_current_reports_the_local_verdict() {
        let mut session = build_session(&[Some(ChoiceLetter::C)]);
        session.select(ChoiceLetter::C).unwrap();

        assert_eq!(session.lock_current().unwrap(), Some(Verdict::Correct));
        assert!(!session.select(ChoiceLetter::A).unwrap());
    }

    #[test]
    fn progress_counts_answer_state_and_elapsed_time() {
        let mut session = build_session(&[Some(ChoiceLetter::B), None, None]);
        session.select(ChoiceLetter::B).unwrap();
        session.go_next().unwrap();
        session.select(ChoiceLetter::D).unwrap();

        let progress = session.progress(fixed_now() + Duration::seconds(42));
        assert_eq!(progress.total, 3);
        assert_eq!(progress.answered, 2);
        assert_eq!(progress.unanswered, 1);
        assert_eq!(progress.locked, 1);
        assert_eq!(progress.local_correct, 1);
        assert_eq!(progress.position, 1);
        assert_eq!(progress.elapsed_seconds, 42);
    }

    #[test]
    fn stepping_is_rejected_once_submission_begins() {
        let mut session = build_session(&[None, None]);
        session.attempt_mut().begin_submission().unwrap();

        assert!(session.select(ChoiceLetter::A).is_err());
        assert!(session.go_next().is_err());
        assert_eq!(session.phase(), AttemptPhase::Submitting);
    }
}

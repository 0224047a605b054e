use serde::{Deserialize, Serialize};

use crate::model::choice::ChoiceLetter;

//
// ─── VERDICT ──────────────────────────────────────────────────────────────────
//

/// Final per-item classification after grading.
///
/// Also used for the provisional `local_verdict` computed at lock time when
/// the correct option is known locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Correct,
    Incorrect,
    Omitted,
}

impl Verdict {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Correct => "correct",
            Verdict::Incorrect => "incorrect",
            Verdict::Omitted => "omitted",
        }
    }
}

//
// ─── ANSWER RECORD ────────────────────────────────────────────────────────────
//

/// The answer lifecycle of one flattened item.
///
/// Created lazily on first selection, mutated until locked, then immutable.
/// The record itself enforces the lock: a locked record ignores further
/// selection attempts regardless of who calls.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnswerRecord {
    selected: Option<ChoiceLetter>,
    locked: bool,
    local_verdict: Option<Verdict>,
}

impl AnswerRecord {
    /// A fresh, untouched record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a selection. Last write wins; a locked record is left
    /// untouched and `false` is returned.
    pub fn select(&mut self, letter: ChoiceLetter) -> bool {
        if self.locked {
            return false;
        }
        self.selected = Some(letter);
        true
    }

    /// Locks the record, computing the local verdict against the given
    /// correct marker when one is known. Idempotent: a second lock keeps
    /// the original verdict.
    pub fn lock(&mut self, correct: Option<ChoiceLetter>) {
        if self.locked {
            return;
        }
        self.locked = true;
        self.local_verdict = correct.map(|marker| match self.selected {
            Some(selected) if selected == marker => Verdict::Correct,
            Some(_) => Verdict::Incorrect,
            None => Verdict::Omitted,
        });
    }

    // Accessors
    #[must_use]
    pub fn selected(&self) -> Option<ChoiceLetter> {
        self.selected
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    #[must_use]
    pub fn local_verdict(&self) -> Option<Verdict> {
        self.local_verdict
    }

    #[must_use]
    pub fn is_answered(&self) -> bool {
        self.selected.is_some()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

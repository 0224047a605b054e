use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Errors that can occur when interpreting answer options.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChoiceError {
    #[error("invalid choice letter: {0:?}")]
    InvalidLetter(String),
}

//
// ─── CHOICE LETTER ────────────────────────────────────────────────────────────
//

/// One of the four answer options a question offers.
///
/// The letter form (`A`–`D`) is how selections are held locally and how
/// subpart answers travel to the grading service. Non-subpart answers are
/// transmitted in the numeric form (`1`–`4`) instead; see [`wire_digit`].
///
/// [`wire_digit`]: ChoiceLetter::wire_digit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChoiceLetter {
    A,
    B,
    C,
    D,
}

impl ChoiceLetter {
    /// Parses a letter in the form the question bank delivers (`"A"`–`"D"`).
    ///
    /// # Errors
    ///
    /// Returns `ChoiceError::InvalidLetter` for anything else, including
    /// lowercase or multi-character input.
    pub fn from_letter(value: &str) -> Result<Self, ChoiceError> {
        match value {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            "D" => Ok(Self::D),
            other => Err(ChoiceError::InvalidLetter(other.to_string())),
        }
    }

    /// The letter form, used locally and for subpart answers on the wire.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ChoiceLetter::A => "A",
            ChoiceLetter::B => "B",
            ChoiceLetter::C => "C",
            ChoiceLetter::D => "D",
        }
    }

    /// The numeric form the grading protocol expects for non-subpart answers.
    #[must_use]
    pub fn wire_digit(self) -> &'static str {
        match self {
            ChoiceLetter::A => "1",
            ChoiceLetter::B => "2",
            ChoiceLetter::C => "3",
            ChoiceLetter::D => "4",
        }
    }

    /// All four letters in display order.
    #[must_use]
    pub fn all() -> [ChoiceLetter; 4] {
        [Self::A, Self::B, Self::C, Self::D]
    }
}

//
// ─── CHOICE TEXTS ─────────────────────────────────────────────────────────────
//

/// The four option texts of a question, addressed by letter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceTexts {
    a: String,
    b: String,
    c: String,
    d: String,
}

impl ChoiceTexts {
    #[must_use]
    pub fn new(
        a: impl Into<String>,
        b: impl Into<String>,
        c: impl Into<String>,
        d: impl Into<String>,
    ) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
            c: c.into(),
            d: d.into(),
        }
    }

    /// Returns the option text behind the given letter.
    #[must_use]
    pub fn text(&self, letter: ChoiceLetter) -> &str {
        match letter {
            ChoiceLetter::A => &self.a,
            ChoiceLetter::B => &self.b,
            ChoiceLetter::C => &self.c,
            ChoiceLetter::D => &self.d,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

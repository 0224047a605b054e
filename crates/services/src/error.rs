//! Shared error types for the services crate.

use thiserror::Error;

use exam_core::attempt::AttemptError;
use storage::repository::StorageError;

/// Errors emitted by question banks.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BankError {
    #[error("question bank unavailable: {0}")]
    Unavailable(String),
    #[error("malformed question data: {0}")]
    Malformed(String),
}

/// Errors emitted by grading clients.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GradingError {
    #[error("grading service is not configured")]
    Disabled,
    #[error("grading request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by session workflows.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions matched the requested pool")]
    EmptyPool,
    #[error(transparent)]
    Attempt(#[from] AttemptError),
    #[error(transparent)]
    Bank(#[from] BankError),
    #[error(transparent)]
    Grading(#[from] GradingError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use exam_core::flatten::FlattenedItem;
use exam_core::model::{AnswerRecord, AttemptBlueprint, SessionResult};
use exam_core::reconcile::GradeReport;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted shape of a resumable attempt, written once at assembly.
///
/// Answer state is deliberately absent: an interrupted attempt resumes
/// with its item sequence intact and its answers blank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingSnapshot {
    pub blueprint: AttemptBlueprint,
    pub items: Vec<FlattenedItem>,
    pub started_at: DateTime<Utc>,
    pub saved_at: DateTime<Utc>,
}

/// Persisted shape of a graded attempt, written once at resolution and
/// immutable after. The review surface reads everything from here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSnapshot {
    pub result: SessionResult,
    pub report: GradeReport,
    pub answers: BTreeMap<usize, AnswerRecord>,
    pub elapsed_seconds: u64,
    pub finished_at: DateTime<Utc>,
}

/// Repository contract for the two attempt slots.
///
/// One pending slot (the resumable attempt) and one resolved slot (the
/// last graded outcome). Saving overwrites; an absent slot loads as
/// `Ok(None)`, not an error.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Persist or overwrite the pending slot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be stored.
    async fn save_pending(&self, snapshot: &PendingSnapshot) -> Result<(), StorageError>;

    /// Fetch the pending slot, if any attempt is resumable.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the slot cannot be read or decoded.
    async fn load_pending(&self) -> Result<Option<PendingSnapshot>, StorageError>;

    /// Drop the pending slot. Clearing an absent slot is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the slot cannot be cleared.
    async fn clear_pending(&self) -> Result<(), StorageError>;

    /// Persist or overwrite the resolved slot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be stored.
    async fn save_resolved(&self, snapshot: &ResolvedSnapshot) -> Result<(), StorageError>;

    /// Fetch the resolved slot, if an attempt has been graded.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the slot cannot be read or decoded.
    async fn load_resolved(&self) -> Result<Option<ResolvedSnapshot>, StorageError>;
}

/// Simple in-memory session store for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    pending: Arc<Mutex<Option<PendingSnapshot>>>,
    resolved: Arc<Mutex<Option<ResolvedSnapshot>>>,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionStore {
    async fn save_pending(&self, snapshot: &PendingSnapshot) -> Result<(), StorageError> {
        let mut guard = self
            .pending
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(snapshot.clone());
        Ok(())
    }

    async fn load_pending(&self) -> Result<Option<PendingSnapshot>, StorageError> {
        let guard = self
            .pending
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn clear_pending(&self) -> Result<(), StorageError> {
        let mut guard = self
            .pending
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = None;
        Ok(())
    }

    async fn save_resolved(&self, snapshot: &ResolvedSnapshot) -> Result<(), StorageError> {
        let mut guard = self
            .resolved
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(snapshot.clone());
        Ok(())
    }

    async fn load_resolved(&self) -> Result<Option<ResolvedSnapshot>, StorageError> {
        let guard = self
            .resolved
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;

use super::SqliteSessionStore;
use crate::repository::{PendingSnapshot, ResolvedSnapshot, SessionRepository, StorageError};

const PENDING_SLOT: &str = "pending";
const RESOLVED_SLOT: &str = "resolved";

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

impl SqliteSessionStore {
    async fn write_slot(
        &self,
        slot: &str,
        payload: String,
        saved_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO session_slots (slot, payload, saved_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(slot) DO UPDATE SET
                    payload = excluded.payload,
                    saved_at = excluded.saved_at
            ",
        )
        .bind(slot)
        .bind(payload)
        .bind(saved_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }

    async fn read_slot(&self, slot: &str) -> Result<Option<String>, StorageError> {
        let row = sqlx::query("SELECT payload FROM session_slots WHERE slot = ?1")
            .bind(slot)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        row.map(|r| r.try_get::<String, _>("payload").map_err(ser))
            .transpose()
    }

    async fn delete_slot(&self, slot: &str) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM session_slots WHERE slot = ?1")
            .bind(slot)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl SessionRepository for SqliteSessionStore {
    async fn save_pending(&self, snapshot: &PendingSnapshot) -> Result<(), StorageError> {
        let payload = serde_json::to_string(snapshot).map_err(ser)?;
        self.write_slot(PENDING_SLOT, payload, snapshot.saved_at)
            .await
    }

    async fn load_pending(&self) -> Result<Option<PendingSnapshot>, StorageError> {
        match self.read_slot(PENDING_SLOT).await? {
            Some(payload) => serde_json::from_str(&payload).map(Some).map_err(ser),
            None => Ok(None),
        }
    }

    async fn clear_pending(&self) -> Result<(), StorageError> {
        self.delete_slot(PENDING_SLOT).await
    }

    async fn save_resolved(&self, snapshot: &ResolvedSnapshot) -> Result<(), StorageError> {
        let payload = serde_json::to_string(snapshot).map_err(ser)?;
        self.write_slot(RESOLVED_SLOT, payload, snapshot.finished_at)
            .await
    }

    async fn load_resolved(&self) -> Result<Option<ResolvedSnapshot>, StorageError> {
        match self.read_slot(RESOLVED_SLOT).await? {
            Some(payload) => serde_json::from_str(&payload).map(Some).map_err(ser),
            None => Ok(None),
        }
    }
}

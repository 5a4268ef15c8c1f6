//! Session result storage.
//!
//! Reconciliation runs are asynchronous from the caller's point of view:
//! results are stored under a task identifier and polled for later. The
//! [`SessionStore`] trait abstracts the backing store so tests and embedded
//! use run on the in-memory implementation while deployments can plug in a
//! shared cache.

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for one reconciliation task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Generates a new random task ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors that can occur during session store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No entry exists for the task.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// Payload (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend error.
    #[error("session backend error: {0}")]
    Backend(String),
}

/// Storage contract for task results.
///
/// Payloads are JSON values so the store stays agnostic of what each
/// pipeline stage persists. Implementations must be safe under concurrent
/// access.
pub trait SessionStore: Send + Sync {
    /// Stores a payload under a task ID, replacing any previous entry.
    fn set(&self, id: TaskId, payload: serde_json::Value) -> Result<(), StoreError>;

    /// Fetches the payload for a task, if present and not expired.
    fn get(&self, id: TaskId) -> Result<Option<serde_json::Value>, StoreError>;

    /// Sets a time-to-live on an existing entry. Returns an error if the
    /// task is absent.
    fn expire(&self, id: TaskId, ttl: Duration) -> Result<(), StoreError>;

    /// Removes an entry. Removing an absent entry is not an error.
    fn remove(&self, id: TaskId) -> Result<(), StoreError>;
}

fn lock_err(context: &'static str) -> StoreError {
    StoreError::Backend(format!("poisoned lock: {context}"))
}

#[derive(Debug, Clone)]
struct Entry {
    payload: serde_json::Value,
    expires_at: Option<DateTime<Utc>>,
}

/// Thread-safe in-memory session store.
///
/// Expiry is lazy: entries past their deadline are dropped when next
/// observed, not by a background sweeper.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    entries: RwLock<HashMap<TaskId, Entry>>,
}

impl InMemorySessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn set(&self, id: TaskId, payload: serde_json::Value) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| lock_err("session set"))?;
        entries.insert(
            id,
            Entry {
                payload,
                expires_at: None,
            },
        );
        Ok(())
    }

    fn get(&self, id: TaskId) -> Result<Option<serde_json::Value>, StoreError> {
        let mut entries = self.entries.write().map_err(|_| lock_err("session get"))?;
        let expired = entries
            .get(&id)
            .and_then(|entry| entry.expires_at)
            .is_some_and(|deadline| deadline <= Utc::now());
        if expired {
            entries.remove(&id);
            return Ok(None);
        }
        Ok(entries.get(&id).map(|entry| entry.payload.clone()))
    }

    fn expire(&self, id: TaskId, ttl: Duration) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| lock_err("session expire"))?;
        let entry = entries.get_mut(&id).ok_or(StoreError::TaskNotFound(id))?;
        entry.expires_at = Some(Utc::now() + ttl);
        Ok(())
    }

    fn remove(&self, id: TaskId) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| lock_err("session remove"))?;
        entries.remove(&id);
        Ok(())
    }
}

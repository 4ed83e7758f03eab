use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use revise_core::model::StudentRecord;

/// Errors surfaced by storage adapters.
///
/// Only `save` can fail; `load` recovers locally by substituting a fresh
/// default record.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("lock poisoned: {0}")]
    Lock(String),
}

/// Repository contract for the single student record.
#[async_trait]
pub trait StudentRepository: Send + Sync {
    /// Read the persisted record.
    ///
    /// Never fails: a missing, unreadable, or corrupt backing document
    /// falls back to a fresh default record (a diagnostic is logged).
    async fn load(&self) -> StudentRecord;

    /// Persist the full record, overwriting the previous document.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be written. Callers
    /// treat this as non-fatal: the in-memory record stays authoritative
    /// for the rest of the process lifetime.
    async fn save(&self, record: &StudentRecord) -> Result<(), StorageError>;
}

/// In-memory repository for tests and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    record: Arc<Mutex<StudentRecord>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current stored record, for test assertions.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn snapshot(&self) -> StudentRecord {
        self.record.lock().expect("in-memory store lock").clone()
    }
}

#[async_trait]
impl StudentRepository for InMemoryStore {
    async fn load(&self) -> StudentRecord {
        match self.record.lock() {
            Ok(guard) => guard.clone(),
            Err(err) => {
                warn!("in-memory store lock poisoned, starting fresh: {err}");
                StudentRecord::new()
            }
        }
    }

    async fn save(&self, record: &StudentRecord) -> Result<(), StorageError> {
        let mut guard = self
            .record
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        *guard = record.clone();
        Ok(())
    }
}

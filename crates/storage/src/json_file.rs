//! Flat JSON-file store for the student record.
//!
//! The whole record lives in one pretty-printed JSON document that is
//! rewritten after every mutating operation. A half-written file is an
//! acceptable failure: the next load falls back to a fresh record rather
//! than crashing the caller.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::warn;

use revise_core::model::StudentRecord;

use crate::repository::{StorageError, StudentRepository};

/// Default backing document, relative to the working directory.
pub const DEFAULT_DATA_FILE: &str = "student-data.json";

/// JSON-document-backed implementation of [`StudentRepository`].
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl StudentRepository for JsonFileStore {
    async fn load(&self) -> StudentRecord {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return StudentRecord::new();
            }
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    "could not read student data file, starting fresh: {err}"
                );
                return StudentRecord::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    "corrupted student data file, starting fresh: {err}"
                );
                StudentRecord::new()
            }
        }
    }

    async fn save(&self, record: &StudentRecord) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(record)?;
        fs::write(&self.path, json).await?;
        Ok(())
    }
}

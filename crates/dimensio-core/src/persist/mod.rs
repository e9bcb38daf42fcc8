//! Persistence: the versioned `.dio` project format.
//!
//! Loading runs `parse -> migrate -> decode -> validate`; saving is atomic
//! (temp file in the target directory, then rename). Background saves go
//! through a [`SaveWorker`] that allows one write in flight at a time.

mod file;
pub mod migrate;
mod schema;
mod state;
mod worker;

pub use file::{FILE_EXTENSION, StagedWrite, load, read_document, stage, with_dio_extension, write};
pub use migrate::{FORMAT_VERSION, detect_version};
pub use schema::{deserialize, serialize};
pub use state::{SaveState, SaveTracker};
pub use worker::{SaveOutcome, SaveTicket, SaveWorker};

use crate::model::ValidationReport;
use std::path::PathBuf;
use thiserror::Error;

/// Persistence errors.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid project file: {reason}")]
    Schema { reason: String },
    #[error("Project failed validation: {0}")]
    Invalid(ValidationReport),
    #[error("Unsupported future format version {found} (this build reads up to {supported})")]
    FutureVersion { found: u64, supported: u32 },
    #[error("Document has no format version")]
    Unversioned,
    #[error("Migration from version {from} failed: {reason}")]
    Migration { from: u32, reason: String },
    #[error("A save is already in progress")]
    SaveInProgress,
    #[error("Save worker has stopped")]
    WorkerGone,
}

impl PersistError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn schema(reason: impl Into<String>) -> Self {
        Self::Schema {
            reason: reason.into(),
        }
    }
}

/// Result type for persistence operations.
pub type PersistResult<T> = Result<T, PersistError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = PersistError::FutureVersion {
            found: 9,
            supported: FORMAT_VERSION,
        };
        assert!(err.to_string().contains("future format version 9"));

        let err = PersistError::schema("frames must be an object");
        assert!(err.to_string().contains("frames must be an object"));

        let err = PersistError::Migration {
            from: 1,
            reason: "frames must be a list".into(),
        };
        assert!(err.to_string().contains("version 1"));
    }
}

//! Error types for the import pipeline

use serde::Serialize;
use thiserror::Error;

use super::types::ConflictId;

/// One rule broken by one row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub row_number: usize,
    pub external_id: String,
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.external_id.is_empty() {
            write!(f, "row {}: {}: {}", self.row_number, self.field, self.message)
        } else {
            write!(
                f,
                "row {} ({}): {}: {}",
                self.row_number, self.external_id, self.field, self.message
            )
        }
    }
}

/// Every violation found in a batch; any violation rejects the whole batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("batch rejected with {} validation error(s)", .violations.len())]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

impl ValidationError {
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Why a single write failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "detail")]
pub enum PersistenceFailure {
    /// A unique key (identifier or email) is already taken
    DuplicateKey,
    /// The record to overwrite no longer exists
    Missing,
    /// The write did not finish within the configured timeout
    TimedOut,
    /// Any other store error
    Store(String),
}

impl std::fmt::Display for PersistenceFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistenceFailure::DuplicateKey => write!(f, "value already exists in the store"),
            PersistenceFailure::Missing => write!(f, "record no longer exists in the store"),
            PersistenceFailure::TimedOut => write!(f, "write timed out"),
            PersistenceFailure::Store(msg) => write!(f, "{}", msg),
        }
    }
}

/// A write that failed for one record; the rest of the batch continues
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{external_id}: {field}: {reason}")]
pub struct RecordPersistenceError {
    pub external_id: String,
    pub field: String,
    pub reason: PersistenceFailure,
}

/// Batch-level import failures
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("malformed workbook: {0}")]
    MalformedWorkbook(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{} conflict(s) still need a resolution: {:?}", .0.len(), .0)]
    ConflictRequiresResolution(Vec<ConflictId>),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

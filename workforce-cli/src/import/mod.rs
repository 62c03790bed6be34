//! Bulk import and conflict resolution for workforce records
//!
//! A workbook is read into raw rows, normalized into typed records and
//! validated as a whole. Valid batches are matched against the employee
//! store; clean records are inserted and conflicting ones are kept or
//! overwritten according to the chosen policy or per-conflict decisions.

pub mod apply;
pub mod detect;
pub mod error;
pub mod excel;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod types;
pub mod validate;

pub use apply::{ApplyContext, PlannedWrite};
pub use detect::{
    BatchEntry, CompareOptions, DetectionPlan, RejectedRecord, compare_fields, detect_conflicts,
};
pub use error::{ImportError, PersistenceFailure, RecordPersistenceError, ValidationError, Violation};
pub use pipeline::{
    ImportOptions, PendingBatch, SubmitOutcome, parse_workbook, prepare_batch, submit_batch,
    submit_workbook,
};
pub use report::{BatchDetails, BatchResult, RowError};
pub use validate::validate_batch;

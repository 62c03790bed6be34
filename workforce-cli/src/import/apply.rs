//! Resolution applier: turns decisions into store writes
//!
//! Writes run one at a time in spreadsheet row order. Each write is bounded
//! by a timeout and a failing write is recorded without stopping the batch.

use std::time::Duration;

use log::{debug, info, warn};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::error::{PersistenceFailure, RecordPersistenceError};
use super::detect::{BatchEntry, DetectionPlan};
use super::report::{BatchResult, RowError};
use super::types::{CanonicalRecord, ConflictId, ConflictRecord, ResolutionAction};
use crate::store::employees;

/// Default bound on a single write
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Who is writing and how long each write may take
#[derive(Debug, Clone)]
pub struct ApplyContext {
    /// Recorded in created_by / updated_by
    pub actor: String,
    pub write_timeout: Duration,
}

impl Default for ApplyContext {
    fn default() -> Self {
        ApplyContext {
            actor: "import".to_string(),
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }
}

/// One store mutation (or deliberate non-mutation) decided for a record
#[derive(Debug, Clone)]
pub enum PlannedWrite {
    /// No match in the store
    Insert { record: CanonicalRecord },
    /// Full-field replacement of an existing employee
    Overwrite {
        conflict_id: ConflictId,
        target: Uuid,
        record: CanonicalRecord,
    },
    /// Existing employee kept as is
    Keep {
        conflict_id: ConflictId,
        record: CanonicalRecord,
        reason: String,
    },
    /// Turned away at detection; reported as a row error
    Reject {
        record: CanonicalRecord,
        error: RowError,
    },
}

impl PlannedWrite {
    pub fn record(&self) -> &CanonicalRecord {
        match self {
            PlannedWrite::Insert { record }
            | PlannedWrite::Overwrite { record, .. }
            | PlannedWrite::Keep { record, .. }
            | PlannedWrite::Reject { record, .. } => record,
        }
    }

    pub fn conflict_id(&self) -> Option<ConflictId> {
        match self {
            PlannedWrite::Insert { .. } | PlannedWrite::Reject { .. } => None,
            PlannedWrite::Overwrite { conflict_id, .. } | PlannedWrite::Keep { conflict_id, .. } => {
                Some(*conflict_id)
            }
        }
    }
}

/// Flatten a detection plan into row-ordered writes. Records sharing a row
/// number, as directly submitted ones do, keep their submission order.
///
/// Fails with the ids of conflicts that are still pending.
pub fn plan_writes(plan: &DetectionPlan) -> Result<Vec<PlannedWrite>, Vec<ConflictId>> {
    let pending = plan.pending_ids();
    if !pending.is_empty() {
        return Err(pending);
    }

    let mut writes = Vec::with_capacity(plan.order().len());
    for entry in plan.order() {
        let write = match *entry {
            BatchEntry::Insert(index) => PlannedWrite::Insert {
                record: plan.inserts[index].clone(),
            },
            BatchEntry::Rejected(index) => PlannedWrite::Reject {
                record: plan.rejected[index].record.clone(),
                error: plan.rejected[index].error.clone(),
            },
            BatchEntry::Conflict(id) => {
                let conflict = &plan.conflicts[id];
                match conflict.action() {
                    Some(ResolutionAction::UseIncoming) => PlannedWrite::Overwrite {
                        conflict_id: conflict.id,
                        target: conflict.existing.id,
                        record: conflict.incoming.clone(),
                    },
                    _ => PlannedWrite::Keep {
                        conflict_id: conflict.id,
                        record: conflict.incoming.clone(),
                        reason: if conflict.has_differences() {
                            "kept existing record".to_string()
                        } else {
                            "no differences".to_string()
                        },
                    },
                }
            }
        };
        writes.push(write);
    }

    // Stable, so ties stay in submission order
    writes.sort_by_key(|w| w.record().row_number);
    Ok(writes)
}

/// Classify a failed repository call
fn persistence_error(record: &CanonicalRecord, err: &anyhow::Error) -> RecordPersistenceError {
    match employees::unique_violation_field(err) {
        Some(field) => RecordPersistenceError {
            external_id: record.external_id.clone(),
            field,
            reason: PersistenceFailure::DuplicateKey,
        },
        None => RecordPersistenceError {
            external_id: record.external_id.clone(),
            field: "record".to_string(),
            reason: PersistenceFailure::Store(format!("{:#}", err)),
        },
    }
}

fn failure(record: &CanonicalRecord, reason: PersistenceFailure) -> RecordPersistenceError {
    RecordPersistenceError {
        external_id: record.external_id.clone(),
        field: "record".to_string(),
        reason,
    }
}

async fn execute(
    pool: &SqlitePool,
    write: &PlannedWrite,
    ctx: &ApplyContext,
) -> Result<Option<Uuid>, RecordPersistenceError> {
    match write {
        PlannedWrite::Insert { record } => {
            match tokio::time::timeout(ctx.write_timeout, employees::insert(pool, record, &ctx.actor))
                .await
            {
                Ok(Ok(id)) => Ok(Some(id)),
                Ok(Err(e)) => Err(persistence_error(record, &e)),
                Err(_) => Err(failure(record, PersistenceFailure::TimedOut)),
            }
        }
        PlannedWrite::Overwrite { target, record, .. } => {
            match tokio::time::timeout(
                ctx.write_timeout,
                employees::overwrite(pool, *target, record, &ctx.actor),
            )
            .await
            {
                Ok(Ok(true)) => Ok(Some(*target)),
                Ok(Ok(false)) => Err(failure(record, PersistenceFailure::Missing)),
                Ok(Err(e)) => Err(persistence_error(record, &e)),
                Err(_) => Err(failure(record, PersistenceFailure::TimedOut)),
            }
        }
        PlannedWrite::Keep { .. } | PlannedWrite::Reject { .. } => Ok(None),
    }
}

/// Execute planned writes sequentially and collect the outcome.
///
/// Conflict states in `conflicts` are moved to applied or failed.
pub async fn apply_writes(
    pool: &SqlitePool,
    writes: &[PlannedWrite],
    conflicts: &mut [ConflictRecord],
    ctx: &ApplyContext,
) -> BatchResult {
    let mut result = BatchResult::default();

    for write in writes {
        if let PlannedWrite::Reject { record, error } = write {
            debug!("Row {}: rejected '{}': {}", record.row_number, record.external_id, error.message);
            result.record_error(error.clone());
            continue;
        }

        let record = write.record();
        let outcome = execute(pool, write, ctx).await;

        match (&outcome, write) {
            (Ok(Some(id)), PlannedWrite::Insert { .. }) => {
                debug!("Row {}: created '{}' as {}", record.row_number, record.external_id, id);
                result.record_created(&record.external_id, *id);
            }
            (Ok(Some(id)), PlannedWrite::Overwrite { .. }) => {
                debug!("Row {}: overwrote {} with '{}'", record.row_number, id, record.external_id);
                result.record_updated(&record.external_id, *id);
            }
            (Ok(_), PlannedWrite::Keep { reason, .. }) => {
                debug!("Row {}: kept existing '{}' ({})", record.row_number, record.external_id, reason);
                result.record_skipped(&record.external_id, reason.clone());
            }
            (Ok(_), _) => {}
            (Err(err), _) => {
                warn!("Row {}: write failed: {}", record.row_number, err);
                result.record_error(RowError::from_persistence(record.row_number, err));
            }
        }

        if let Some(conflict) = write.conflict_id().and_then(|id| conflicts.get_mut(id)) {
            match &outcome {
                Ok(_) => conflict.mark_applied(),
                Err(err) => conflict.mark_failed(err.reason.to_string()),
            }
        }
    }

    info!("Applied batch: {}", result.summary());
    result
}

//! Import pipeline: reader → normalizer → validator → detector → applier

use sqlx::SqlitePool;

use super::apply::{ApplyContext, PlannedWrite, apply_writes, plan_writes};
use super::detect::{CompareOptions, DetectionPlan, RejectedRecord, detect_conflicts};
use super::error::ImportError;
use super::excel::read_workbook_bytes;
use super::normalize::normalize_rows;
use super::report::BatchResult;
use super::types::{
    CanonicalRecord, ConflictId, ConflictPolicy, ConflictRecord, RawRow, Resolution,
    flatten_resolutions,
};
use super::validate::validate_batch;
use crate::store::employees;

/// Settings for one import run
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub apply: ApplyContext,
    pub compare: CompareOptions,
}

/// A validated, matched batch waiting for conflict decisions.
///
/// Holds the raw rows and normalized records so resolution resumes
/// without reading the workbook again.
#[derive(Debug, Clone)]
pub struct PendingBatch {
    raw_rows: Vec<RawRow>,
    plan: DetectionPlan,
}

impl PendingBatch {
    pub fn raw_rows(&self) -> &[RawRow] {
        &self.raw_rows
    }

    /// Records with no match in the store
    pub fn inserts(&self) -> &[CanonicalRecord] {
        &self.plan.inserts
    }

    pub fn conflicts(&self) -> &[ConflictRecord] {
        &self.plan.conflicts
    }

    /// Records that will be reported as failed without a write
    pub fn rejected(&self) -> &[RejectedRecord] {
        &self.plan.rejected
    }

    /// Conflicts still waiting for a decision
    pub fn pending_ids(&self) -> Vec<ConflictId> {
        self.plan.pending_ids()
    }

    pub fn is_ready(&self) -> bool {
        self.plan.conflicts.iter().all(|c| !c.is_pending())
    }

    /// Apply a batch-wide policy to every conflict. `Ask` changes nothing.
    pub fn apply_policy(&mut self, policy: ConflictPolicy) {
        if let Some(action) = policy.default_action() {
            for conflict in &mut self.plan.conflicts {
                conflict.resolve(action);
            }
        }
    }

    /// Record caller decisions. A per-conflict decision wins over a batch
    /// default, including one given in an earlier call.
    ///
    /// Fails with the ids still unresolved; the batch keeps every decision
    /// made so far and can be resolved again.
    pub fn resolve(&mut self, resolutions: &[Resolution]) -> Result<(), ImportError> {
        let set = flatten_resolutions(resolutions);

        for id in set.per_conflict.keys() {
            if *id >= self.plan.conflicts.len() {
                log::warn!("Ignoring resolution for unknown conflict {}", id);
            }
        }

        // The batch default only fills conflicts nobody decided yet
        for conflict in &mut self.plan.conflicts {
            if let Some(action) = set.per_conflict.get(&conflict.id) {
                conflict.resolve(*action);
            } else if conflict.is_pending() {
                if let Some(action) = set.default {
                    conflict.resolve(action);
                }
            }
        }

        let pending = self.pending_ids();
        if pending.is_empty() {
            Ok(())
        } else {
            Err(ImportError::ConflictRequiresResolution(pending))
        }
    }

    /// The writes `apply` would perform, in execution order
    pub fn planned_writes(&self) -> Result<Vec<PlannedWrite>, ImportError> {
        plan_writes(&self.plan).map_err(ImportError::ConflictRequiresResolution)
    }

    /// Perform the writes. Every conflict must be resolved first.
    pub async fn apply(
        mut self,
        pool: &SqlitePool,
        ctx: &ApplyContext,
    ) -> Result<BatchResult, ImportError> {
        let writes = self.planned_writes()?;
        Ok(apply_writes(pool, &writes, &mut self.plan.conflicts, ctx).await)
    }
}

/// What a submission produced
#[derive(Debug)]
pub enum SubmitOutcome {
    /// All writes attempted
    Completed(BatchResult),
    /// `ask` policy with conflicts to decide
    NeedsResolution(PendingBatch),
}

/// Decode and normalize a workbook. Raw rows are returned alongside the records.
pub fn parse_workbook(bytes: &[u8]) -> Result<(Vec<RawRow>, Vec<CanonicalRecord>), ImportError> {
    let raw_rows = read_workbook_bytes(bytes)?;
    let records = normalize_rows(&raw_rows);
    Ok((raw_rows, records))
}

/// Validate and match a batch against the current store contents
pub async fn prepare_batch(
    pool: &SqlitePool,
    raw_rows: Vec<RawRow>,
    records: Vec<CanonicalRecord>,
    options: &ImportOptions,
) -> Result<PendingBatch, ImportError> {
    validate_batch(&records)?;

    let snapshot = employees::snapshot(pool).await?;
    log::debug!("Matching {} record(s) against {} stored", records.len(), snapshot.len());

    let plan = detect_conflicts(records, &snapshot, &options.compare);
    Ok(PendingBatch { raw_rows, plan })
}

/// Submit normalized records under a conflict policy.
///
/// Validation failures reject the batch before any write. Under `ask`, a
/// batch with undecided conflicts comes back as `NeedsResolution`.
pub async fn submit_batch(
    pool: &SqlitePool,
    records: Vec<CanonicalRecord>,
    policy: ConflictPolicy,
    options: &ImportOptions,
) -> Result<SubmitOutcome, ImportError> {
    let batch = prepare_batch(pool, Vec::new(), records, options).await?;
    finish(pool, batch, policy, options).await
}

/// Read a workbook and submit it
pub async fn submit_workbook(
    pool: &SqlitePool,
    bytes: &[u8],
    policy: ConflictPolicy,
    options: &ImportOptions,
) -> Result<SubmitOutcome, ImportError> {
    let (raw_rows, records) = parse_workbook(bytes)?;
    let batch = prepare_batch(pool, raw_rows, records, options).await?;
    finish(pool, batch, policy, options).await
}

async fn finish(
    pool: &SqlitePool,
    mut batch: PendingBatch,
    policy: ConflictPolicy,
    options: &ImportOptions,
) -> Result<SubmitOutcome, ImportError> {
    batch.apply_policy(policy);

    if !batch.is_ready() {
        log::info!(
            "{} conflict(s) need a decision before the batch can be applied",
            batch.pending_ids().len()
        );
        return Ok(SubmitOutcome::NeedsResolution(batch));
    }

    let result = batch.apply(pool, &options.apply).await?;
    Ok(SubmitOutcome::Completed(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::types::ResolutionAction;
    use crate::store::connect_in_memory;

    fn record(row: usize, id: &str, name: &str) -> CanonicalRecord {
        CanonicalRecord {
            row_number: row,
            external_id: id.into(),
            name: name.into(),
            email: Some(format!("{}@example.com", id.to_lowercase())),
            department: "Engineering".into(),
            designation: "Engineer".into(),
            ..Default::default()
        }
    }

    fn completed(outcome: SubmitOutcome) -> BatchResult {
        match outcome {
            SubmitOutcome::Completed(result) => result,
            SubmitOutcome::NeedsResolution(batch) => {
                panic!("unexpected pending conflicts: {:?}", batch.pending_ids())
            }
        }
    }

    #[tokio::test]
    async fn test_ask_suspends_and_resumes() {
        let pool = connect_in_memory().await.unwrap();
        let options = ImportOptions::default();
        completed(
            submit_batch(&pool, vec![record(2, "E1", "Asha"), record(3, "E2", "Ravi")], ConflictPolicy::Skip, &options)
                .await
                .unwrap(),
        );

        let outcome = submit_batch(
            &pool,
            vec![record(2, "E1", "Asha R"), record(3, "E2", "Ravi K"), record(4, "E3", "Meera")],
            ConflictPolicy::Ask,
            &options,
        )
        .await
        .unwrap();

        let mut batch = match outcome {
            SubmitOutcome::NeedsResolution(batch) => batch,
            SubmitOutcome::Completed(_) => panic!("expected pending conflicts"),
        };
        assert_eq!(batch.pending_ids(), vec![0, 1]);
        assert_eq!(batch.inserts().len(), 1);

        // Partial decisions leave the batch pending but keep what was decided
        let err = batch
            .resolve(&[Resolution::PerConflict {
                conflict_id: 1,
                action: ResolutionAction::UseIncoming,
            }])
            .unwrap_err();
        assert!(matches!(err, ImportError::ConflictRequiresResolution(ref ids) if ids == &vec![0]));

        batch
            .resolve(&[Resolution::BatchDefault {
                action: ResolutionAction::KeepExisting,
            }])
            .unwrap();

        let result = batch.apply(&pool, &options.apply).await.unwrap();
        assert_eq!(result.created, 1);
        assert_eq!(result.updated, 1);
        assert_eq!(result.skipped, 1);

        let e1 = employees::find_by_external_id(&pool, "E1").await.unwrap().unwrap();
        let e2 = employees::find_by_external_id(&pool, "E2").await.unwrap().unwrap();
        assert_eq!(e1.record.name, "Asha");
        assert_eq!(e2.record.name, "Ravi K");
    }

    #[tokio::test]
    async fn test_validation_failure_writes_nothing() {
        let pool = connect_in_memory().await.unwrap();
        let mut bad = record(3, "E2", "Ravi");
        bad.department = String::new();

        let err = submit_batch(
            &pool,
            vec![record(2, "E1", "Asha"), bad],
            ConflictPolicy::Overwrite,
            &ImportOptions::default(),
        )
        .await
        .unwrap_err();

        match err {
            ImportError::Validation(v) => assert_eq!(v.violations.len(), 1),
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(employees::count(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_apply_before_resolve_is_rejected() {
        let pool = connect_in_memory().await.unwrap();
        let options = ImportOptions::default();
        completed(
            submit_batch(&pool, vec![record(2, "E1", "Asha")], ConflictPolicy::Skip, &options)
                .await
                .unwrap(),
        );

        let batch = prepare_batch(&pool, Vec::new(), vec![record(2, "E1", "Asha R")], &options)
            .await
            .unwrap();
        assert!(matches!(
            batch.apply(&pool, &options.apply).await,
            Err(ImportError::ConflictRequiresResolution(_))
        ));
    }
}

//! Conflict detection against a snapshot of the employee store

mod compare;

use std::collections::HashMap;

use uuid::Uuid;

pub use compare::{CompareOptions, DEFAULT_PROJECT_SUFFIX, compare_fields, dates_equivalent};

use super::report::RowError;
use super::types::{
    CanonicalRecord, ConflictId, ConflictKind, ConflictRecord, FieldKey, StoredEmployee,
};

/// Case-insensitive lookup tables over stored employees
pub struct SnapshotIndex<'a> {
    by_id: HashMap<String, &'a StoredEmployee>,
    by_email: HashMap<String, &'a StoredEmployee>,
}

impl<'a> SnapshotIndex<'a> {
    pub fn new(snapshot: &'a [StoredEmployee]) -> Self {
        let mut by_id = HashMap::with_capacity(snapshot.len());
        let mut by_email = HashMap::with_capacity(snapshot.len());
        for employee in snapshot {
            let id_key = employee.record.id_key();
            if !id_key.is_empty() {
                by_id.insert(id_key, employee);
            }
            if let Some(email_key) = employee.record.email_key() {
                by_email.insert(email_key, employee);
            }
        }
        SnapshotIndex { by_id, by_email }
    }

    pub fn find_by_id(&self, record: &CanonicalRecord) -> Option<&'a StoredEmployee> {
        self.by_id.get(&record.id_key()).copied()
    }

    pub fn find_by_email(&self, record: &CanonicalRecord) -> Option<&'a StoredEmployee> {
        record
            .email_key()
            .and_then(|key| self.by_email.get(&key).copied())
    }
}

/// A record turned away at detection time, before any write
#[derive(Debug, Clone)]
pub struct RejectedRecord {
    pub record: CanonicalRecord,
    pub error: RowError,
}

/// Where a submitted record ended up, in submission order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchEntry {
    Insert(usize),
    Conflict(ConflictId),
    Rejected(usize),
}

/// Outcome of matching a batch against the store
#[derive(Debug, Clone, Default)]
pub struct DetectionPlan {
    /// Records with no match, in batch order
    pub inserts: Vec<CanonicalRecord>,
    /// Records that collide with stored employees, ids assigned sequentially
    pub conflicts: Vec<ConflictRecord>,
    /// Records matching a stored employee an earlier record already matched
    pub rejected: Vec<RejectedRecord>,
    order: Vec<BatchEntry>,
}

impl DetectionPlan {
    pub fn push_insert(&mut self, record: CanonicalRecord) {
        self.order.push(BatchEntry::Insert(self.inserts.len()));
        self.inserts.push(record);
    }

    /// Add a conflict; its id is replaced by the next sequential one
    pub fn push_conflict(&mut self, mut conflict: ConflictRecord) {
        conflict.id = self.conflicts.len();
        self.order.push(BatchEntry::Conflict(conflict.id));
        self.conflicts.push(conflict);
    }

    pub fn push_rejected(&mut self, rejected: RejectedRecord) {
        self.order.push(BatchEntry::Rejected(self.rejected.len()));
        self.rejected.push(rejected);
    }

    /// Every record's bucket, in the order records were submitted
    pub fn order(&self) -> &[BatchEntry] {
        &self.order
    }

    /// Ids of conflicts that still need a decision
    pub fn pending_ids(&self) -> Vec<ConflictId> {
        self.conflicts
            .iter()
            .filter(|c| c.is_pending())
            .map(|c| c.id)
            .collect()
    }

    /// Conflicts that resolved themselves because nothing differs
    pub fn unchanged_count(&self) -> usize {
        self.conflicts.iter().filter(|c| !c.has_differences()).count()
    }
}

/// Match every record against the snapshot and compute differences.
///
/// When the identifier and the email hit two different stored records the
/// conflict targets the identifier match. A stored employee is the target of
/// at most one record; later records aiming at the same employee are
/// rejected so one write cannot silently undo another.
pub fn detect_conflicts(
    records: Vec<CanonicalRecord>,
    snapshot: &[StoredEmployee],
    options: &CompareOptions,
) -> DetectionPlan {
    let index = SnapshotIndex::new(snapshot);
    let mut plan = DetectionPlan::default();
    let mut claimed: HashMap<Uuid, (usize, String)> = HashMap::new();

    for record in records {
        let by_id = index.find_by_id(&record);
        let by_email = index.find_by_email(&record);

        let (kind, target, email_owner) = match (by_id, by_email) {
            (None, None) => {
                log::debug!(
                    "Row {}: no existing employee for '{}', will insert",
                    record.row_number,
                    record.external_id
                );
                plan.push_insert(record);
                continue;
            }
            (Some(id_match), None) => (ConflictKind::IdOnly, id_match, None),
            (None, Some(email_match)) => (ConflictKind::EmailOnly, email_match, None),
            (Some(id_match), Some(email_match)) if id_match.id == email_match.id => {
                (ConflictKind::IdOnly, id_match, None)
            }
            (Some(id_match), Some(email_match)) => (
                ConflictKind::IdAndEmailDistinct,
                id_match,
                Some(email_match.id),
            ),
        };

        if let Some((row, external_id)) = claimed.get(&target.id) {
            let field = match kind {
                ConflictKind::EmailOnly => FieldKey::Email,
                _ => FieldKey::EmployeeId,
            };
            let message = format!(
                "matches the same stored employee as row {} ('{}')",
                row, external_id
            );
            log::warn!("Row {}: '{}' {}", record.row_number, record.external_id, message);
            plan.push_rejected(RejectedRecord {
                error: RowError {
                    row_number: record.row_number,
                    external_id: record.external_id.clone(),
                    field: field.name().to_string(),
                    message,
                },
                record,
            });
            continue;
        }
        claimed.insert(target.id, (record.row_number, record.external_id.clone()));

        let differences = compare_fields(&target.record, &record, options);
        log::debug!(
            "Row {}: '{}' matches employee {} by {} with {} difference(s)",
            record.row_number,
            record.external_id,
            target.id,
            kind,
            differences.len()
        );

        let mut conflict = ConflictRecord::new(
            plan.conflicts.len(),
            kind,
            record,
            target.clone(),
            differences,
        );
        conflict.email_owner = email_owner;
        plan.push_conflict(conflict);
    }

    log::info!(
        "Detection: {} insert(s), {} conflict(s) ({} unchanged), {} rejected",
        plan.inserts.len(),
        plan.conflicts.len(),
        plan.unchanged_count(),
        plan.rejected.len()
    );
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::normalize::parse_date_text;
    use crate::import::types::{ConflictState, ProjectAssignment, ResolutionAction};

    fn record(id: &str, email: Option<&str>) -> CanonicalRecord {
        CanonicalRecord {
            external_id: id.into(),
            name: format!("Person {}", id),
            email: email.map(String::from),
            department: "Engineering".into(),
            designation: "Engineer".into(),
            ..Default::default()
        }
    }

    fn stored(record: CanonicalRecord) -> StoredEmployee {
        StoredEmployee {
            id: Uuid::new_v4(),
            record,
            created_at: String::new(),
            created_by: String::new(),
            updated_at: String::new(),
            updated_by: String::new(),
        }
    }

    #[test]
    fn test_classification() {
        let a = stored(record("E1", Some("a@example.com")));
        let b = stored(record("E2", Some("b@example.com")));
        let c = stored(record("E4", Some("d@example.com")));
        let snapshot = vec![a.clone(), b.clone(), c.clone()];

        let plan = detect_conflicts(
            vec![
                record("e1", None),
                record("E9", Some("B@example.com")),
                record("E4", Some("b@example.com")),
                record("E3", Some("c@example.com")),
            ],
            &snapshot,
            &CompareOptions::default(),
        );

        assert_eq!(plan.inserts.len(), 1);
        assert_eq!(plan.inserts[0].external_id, "E3");

        let kinds: Vec<ConflictKind> = plan.conflicts.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ConflictKind::IdOnly,
                ConflictKind::EmailOnly,
                ConflictKind::IdAndEmailDistinct
            ]
        );
        assert_eq!(plan.conflicts[1].existing.id, b.id);
        assert_eq!(plan.conflicts[0].existing.id, a.id);
        assert_eq!(plan.conflicts[1].existing.id, b.id);
        assert_eq!(plan.conflicts[2].existing.id, c.id);
        assert_eq!(plan.conflicts[2].email_owner, Some(b.id));
        assert_eq!(
            plan.conflicts.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert!(plan.rejected.is_empty());
        assert_eq!(
            plan.order(),
            &[
                BatchEntry::Conflict(0),
                BatchEntry::Conflict(1),
                BatchEntry::Conflict(2),
                BatchEntry::Insert(0)
            ]
        );
    }

    #[test]
    fn test_second_record_for_same_employee_is_rejected() {
        let stored_e1 = stored(record("E1", Some("a@x.io")));
        let mut by_id = record("E1", Some("b@x.io"));
        by_id.row_number = 2;
        let mut by_email = record("E9", Some("a@x.io"));
        by_email.row_number = 3;

        let plan = detect_conflicts(
            vec![by_id, by_email],
            &[stored_e1.clone()],
            &CompareOptions::default(),
        );

        assert_eq!(plan.conflicts.len(), 1);
        assert_eq!(plan.conflicts[0].incoming.external_id, "E1");
        assert_eq!(plan.conflicts[0].existing.id, stored_e1.id);

        assert_eq!(plan.rejected.len(), 1);
        let error = &plan.rejected[0].error;
        assert_eq!(error.row_number, 3);
        assert_eq!(error.external_id, "E9");
        assert_eq!(error.field, "email");
        assert!(error.message.contains("row 2"));
        assert_eq!(plan.order(), &[BatchEntry::Conflict(0), BatchEntry::Rejected(0)]);
    }

    #[test]
    fn test_sow_against_empty_end_date_auto_resolves() {
        let mut existing = record("E1", Some("a@example.com"));
        existing.projects = vec![ProjectAssignment {
            project_name: "Atlas".into(),
            client: "Acme".into(),
            allocation_percentage: 100.0,
            ..Default::default()
        }];
        let mut incoming = existing.clone();
        incoming.projects[0].end_date = parse_date_text("SOW");

        let plan = detect_conflicts(
            vec![incoming],
            &[stored(existing)],
            &CompareOptions::default(),
        );

        assert_eq!(plan.conflicts.len(), 1);
        assert!(plan.conflicts[0].differences.is_empty());
        assert_eq!(
            plan.conflicts[0].state,
            ConflictState::Resolved(ResolutionAction::KeepExisting)
        );
        assert!(plan.pending_ids().is_empty());
    }

    #[test]
    fn test_email_and_id_hitting_same_record_is_id_only() {
        let a = stored(record("E1", Some("a@example.com")));
        let mut incoming = record("E1", Some("a@example.com"));
        incoming.name = "Renamed".into();

        let plan = detect_conflicts(vec![incoming], &[a], &CompareOptions::default());
        assert_eq!(plan.conflicts[0].kind, ConflictKind::IdOnly);
        assert_eq!(plan.pending_ids(), vec![0]);
    }
}

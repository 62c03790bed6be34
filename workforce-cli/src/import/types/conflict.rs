//! Conflicts between incoming records and the existing store

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{CanonicalRecord, ResolutionAction, StoredEmployee};

/// Sequential identifier of a conflict within one batch
pub type ConflictId = usize;

/// How an incoming record matched the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConflictKind {
    /// Matched by identifier only
    IdOnly,
    /// Matched by email only
    EmailOnly,
    /// Identifier and email matched two different existing records
    IdAndEmailDistinct,
}

impl std::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictKind::IdOnly => write!(f, "id"),
            ConflictKind::EmailOnly => write!(f, "email"),
            ConflictKind::IdAndEmailDistinct => write!(f, "id+email (distinct records)"),
        }
    }
}

/// A single semantically meaningful difference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDifference {
    pub field: String,
    pub existing: String,
    pub incoming: String,
}

impl FieldDifference {
    pub fn new(
        field: impl Into<String>,
        existing: impl Into<String>,
        incoming: impl Into<String>,
    ) -> Self {
        FieldDifference {
            field: field.into(),
            existing: existing.into(),
            incoming: incoming.into(),
        }
    }
}

/// Lifecycle of a conflict between detection and application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "state", content = "detail")]
pub enum ConflictState {
    /// Waiting for an operator or batch policy decision
    PendingResolution,
    /// Decision made, write not attempted yet
    Resolved(ResolutionAction),
    /// Decision carried out
    Applied(ResolutionAction),
    /// The write for this conflict failed
    Failed(String),
}

/// An incoming record paired with the existing record it collides with
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictRecord {
    pub id: ConflictId,
    pub kind: ConflictKind,
    pub incoming: CanonicalRecord,
    /// The record a `useIncoming` decision overwrites
    pub existing: StoredEmployee,
    /// For `IdAndEmailDistinct`, the other record that owns the email
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_owner: Option<Uuid>,
    pub differences: Vec<FieldDifference>,
    pub state: ConflictState,
}

impl ConflictRecord {
    /// Create a conflict; one without real differences resolves itself to keep-existing
    pub fn new(
        id: ConflictId,
        kind: ConflictKind,
        incoming: CanonicalRecord,
        existing: StoredEmployee,
        differences: Vec<FieldDifference>,
    ) -> Self {
        let state = if differences.is_empty() {
            ConflictState::Resolved(ResolutionAction::KeepExisting)
        } else {
            ConflictState::PendingResolution
        };
        ConflictRecord {
            id,
            kind,
            incoming,
            existing,
            email_owner: None,
            differences,
            state,
        }
    }

    pub fn has_differences(&self) -> bool {
        !self.differences.is_empty()
    }

    /// Check if an explicit decision is still required
    pub fn is_pending(&self) -> bool {
        matches!(self.state, ConflictState::PendingResolution)
    }

    /// The decision taken, if any
    pub fn action(&self) -> Option<ResolutionAction> {
        match self.state {
            ConflictState::Resolved(action) | ConflictState::Applied(action) => Some(action),
            _ => None,
        }
    }

    /// Record a decision. Conflicts without differences always keep the existing record.
    pub fn resolve(&mut self, action: ResolutionAction) {
        let action = if self.has_differences() {
            action
        } else {
            ResolutionAction::KeepExisting
        };
        self.state = ConflictState::Resolved(action);
    }

    pub fn mark_applied(&mut self) {
        if let ConflictState::Resolved(action) = self.state {
            self.state = ConflictState::Applied(action);
        }
    }

    pub fn mark_failed(&mut self, message: impl Into<String>) {
        self.state = ConflictState::Failed(message.into());
    }
}

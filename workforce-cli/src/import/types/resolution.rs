//! Resolution decisions and batch conflict policies

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ConflictId;

/// What to do with one conflicting record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResolutionAction {
    /// Leave the stored record untouched
    KeepExisting,
    /// Replace every field of the stored record with the incoming one
    UseIncoming,
}

impl std::fmt::Display for ResolutionAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolutionAction::KeepExisting => write!(f, "keep existing"),
            ResolutionAction::UseIncoming => write!(f, "use incoming"),
        }
    }
}

/// Batch-wide conflict selector chosen at submission time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConflictPolicy {
    /// Keep every existing record
    #[default]
    Skip,
    /// Take every incoming record
    Overwrite,
    /// Stop and hand the pending conflicts back to the caller
    Ask,
}

impl ConflictPolicy {
    /// The batch default this policy implies, `None` for `Ask`
    pub fn default_action(self) -> Option<ResolutionAction> {
        match self {
            ConflictPolicy::Skip => Some(ResolutionAction::KeepExisting),
            ConflictPolicy::Overwrite => Some(ResolutionAction::UseIncoming),
            ConflictPolicy::Ask => None,
        }
    }
}

impl FromStr for ConflictPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "skip" => Ok(ConflictPolicy::Skip),
            "overwrite" => Ok(ConflictPolicy::Overwrite),
            "ask" => Ok(ConflictPolicy::Ask),
            other => Err(format!(
                "unknown conflict policy '{}' (expected skip, overwrite or ask)",
                other
            )),
        }
    }
}

impl std::fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictPolicy::Skip => write!(f, "skip"),
            ConflictPolicy::Overwrite => write!(f, "overwrite"),
            ConflictPolicy::Ask => write!(f, "ask"),
        }
    }
}

/// A resolution supplied by the caller
///
/// In JSON: `{"kind": "batchDefault", "action": "keepExisting"}` or
/// `{"kind": "perConflict", "conflictId": 3, "action": "useIncoming"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Resolution {
    /// Applies to every conflict without its own decision
    BatchDefault { action: ResolutionAction },
    /// Applies to a single conflict and wins over the batch default
    PerConflict {
        conflict_id: ConflictId,
        action: ResolutionAction,
    },
}

/// Resolutions flattened to one action per conflict id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolutionSet {
    pub default: Option<ResolutionAction>,
    pub per_conflict: HashMap<ConflictId, ResolutionAction>,
}

impl ResolutionSet {
    /// Look up the action for a conflict, falling back to the batch default
    pub fn action_for(&self, id: ConflictId) -> Option<ResolutionAction> {
        self.per_conflict.get(&id).copied().or(self.default)
    }
}

/// Collapse a list of resolutions. Later entries win over earlier ones of the same shape.
pub fn flatten_resolutions(resolutions: &[Resolution]) -> ResolutionSet {
    let mut set = ResolutionSet::default();
    for resolution in resolutions {
        match resolution {
            Resolution::BatchDefault { action } => set.default = Some(*action),
            Resolution::PerConflict {
                conflict_id,
                action,
            } => {
                set.per_conflict.insert(*conflict_id, *action);
            }
        }
    }
    set
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_conflict_overrides_batch_default() {
        let set = flatten_resolutions(&[
            Resolution::PerConflict {
                conflict_id: 2,
                action: ResolutionAction::KeepExisting,
            },
            Resolution::BatchDefault {
                action: ResolutionAction::UseIncoming,
            },
        ]);

        assert_eq!(set.action_for(2), Some(ResolutionAction::KeepExisting));
        assert_eq!(set.action_for(7), Some(ResolutionAction::UseIncoming));
    }

    #[test]
    fn test_resolution_json_shape() {
        let json = r#"[
            {"kind": "batchDefault", "action": "keepExisting"},
            {"kind": "perConflict", "conflictId": 1, "action": "useIncoming"}
        ]"#;
        let parsed: Vec<Resolution> = serde_json::from_str(json).unwrap();
        assert_eq!(
            parsed[1],
            Resolution::PerConflict {
                conflict_id: 1,
                action: ResolutionAction::UseIncoming
            }
        );
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("Overwrite".parse::<ConflictPolicy>(), Ok(ConflictPolicy::Overwrite));
        assert!("merge".parse::<ConflictPolicy>().is_err());
        assert_eq!(ConflictPolicy::Ask.default_action(), None);
    }
}

//! Shared types of the import pipeline

mod conflict;
mod field;
mod record;
mod resolution;
mod value;

pub use conflict::{ConflictId, ConflictKind, ConflictRecord, ConflictState, FieldDifference};
pub use field::FieldKey;
pub use record::{
    CanonicalRecord, DATE_FORMAT, DateField, ProjectAssignment, SentinelKind, StoredEmployee,
};
pub use resolution::{
    ConflictPolicy, Resolution, ResolutionAction, ResolutionSet, flatten_resolutions,
};
pub use value::{Cell, RawRow, format_number};

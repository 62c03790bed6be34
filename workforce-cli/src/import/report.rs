//! Batch results and row-level error reporting

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use csv::Writer;
use serde::Serialize;
use uuid::Uuid;

use super::error::{RecordPersistenceError, Violation};

/// One failed record, located by its spreadsheet row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowError {
    pub row_number: usize,
    pub external_id: String,
    pub field: String,
    pub message: String,
}

impl RowError {
    pub fn from_persistence(row_number: usize, err: &RecordPersistenceError) -> Self {
        RowError {
            row_number,
            external_id: err.external_id.clone(),
            field: err.field.clone(),
            message: err.reason.to_string(),
        }
    }
}

impl From<&Violation> for RowError {
    fn from(v: &Violation) -> Self {
        RowError {
            row_number: v.row_number,
            external_id: v.external_id.clone(),
            field: v.field.clone(),
            message: v.message.clone(),
        }
    }
}

/// Per-bucket detail keyed by external identifier
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchDetails {
    /// External id → new internal id
    pub created: BTreeMap<String, Uuid>,
    /// External id → overwritten internal id
    pub updated: BTreeMap<String, Uuid>,
    /// External id → why it was left alone
    pub skipped: BTreeMap<String, String>,
    /// External id → failure
    pub errors: BTreeMap<String, RowError>,
}

/// Outcome of applying one batch
///
/// Serializes as `{created, updated, skipped, errors, details}` with
/// `errors` as a count; the rows themselves are under `details.errors`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    /// Failed rows in write order
    #[serde(serialize_with = "serialize_count")]
    pub errors: Vec<RowError>,
    pub details: BatchDetails,
}

#[allow(clippy::ptr_arg)]
fn serialize_count<S: serde::Serializer>(errors: &Vec<RowError>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(errors.len() as u64)
}

impl BatchResult {
    pub fn record_created(&mut self, external_id: &str, id: Uuid) {
        self.created += 1;
        self.details.created.insert(external_id.to_string(), id);
    }

    pub fn record_updated(&mut self, external_id: &str, id: Uuid) {
        self.updated += 1;
        self.details.updated.insert(external_id.to_string(), id);
    }

    pub fn record_skipped(&mut self, external_id: &str, reason: impl Into<String>) {
        self.skipped += 1;
        self.details
            .skipped
            .insert(external_id.to_string(), reason.into());
    }

    pub fn record_error(&mut self, error: RowError) {
        self.details
            .errors
            .insert(error.external_id.clone(), error.clone());
        self.errors.push(error);
    }

    /// Number of records whose write failed
    pub fn failed(&self) -> usize {
        self.errors.len()
    }

    /// Total records accounted for
    pub fn total(&self) -> usize {
        self.created + self.updated + self.skipped + self.failed()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// One-line summary for logs and terminal output
    pub fn summary(&self) -> String {
        format!(
            "{} created, {} updated, {} skipped, {} failed",
            self.created,
            self.updated,
            self.skipped,
            self.failed()
        )
    }
}

/// Write row errors as CSV (header + one line per error)
pub fn write_errors_to<W: Write>(writer: W, errors: &[RowError]) -> Result<()> {
    let mut wtr = Writer::from_writer(writer);
    wtr.write_record(["Row", "Employee ID", "Field", "Message"])
        .context("Failed to write CSV header")?;

    for error in errors {
        let row = error.row_number.to_string();
        wtr.write_record([
            row.as_str(),
            error.external_id.as_str(),
            error.field.as_str(),
            error.message.as_str(),
        ])
        .with_context(|| format!("Failed to write error for row {}", error.row_number))?;
    }

    wtr.flush().context("Failed to flush CSV writer")?;
    Ok(())
}

/// Write row errors to a CSV file for row-level retry
pub fn write_errors_csv(path: &Path, errors: &[RowError]) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
    write_errors_to(file, errors)?;
    log::info!("Wrote {} error row(s) to {}", errors.len(), path.display());
    Ok(())
}

/// Write validation violations to a CSV file
pub fn write_violations_csv(path: &Path, violations: &[Violation]) -> Result<()> {
    let errors: Vec<RowError> = violations.iter().map(RowError::from).collect();
    write_errors_csv(path, &errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_and_details() {
        let mut result = BatchResult::default();
        let id = Uuid::new_v4();
        result.record_created("E1", id);
        result.record_skipped("E2", "no differences");
        result.record_error(RowError {
            row_number: 4,
            external_id: "E3".into(),
            field: "email".into(),
            message: "value already exists in the store".into(),
        });

        assert_eq!(result.total(), 3);
        assert_eq!(result.failed(), 1);
        assert_eq!(result.details.created["E1"], id);
        assert_eq!(result.summary(), "1 created, 0 updated, 1 skipped, 1 failed");
    }

    #[test]
    fn test_json_shape() {
        let mut result = BatchResult::default();
        result.record_skipped("E2", "kept existing");
        result.record_error(RowError {
            row_number: 5,
            external_id: "E4".into(),
            field: "record".into(),
            message: "write timed out".into(),
        });
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["created"], 0);
        assert_eq!(json["skipped"], 1);
        assert_eq!(json["errors"], 1);
        assert_eq!(json["details"]["skipped"]["E2"], "kept existing");
        assert_eq!(json["details"]["errors"]["E4"]["rowNumber"], 5);
    }

    #[test]
    fn test_errors_csv() {
        let mut buf = Vec::new();
        write_errors_to(
            &mut buf,
            &[RowError {
                row_number: 3,
                external_id: "E1".into(),
                field: "email".into(),
                message: "duplicate, see row 2".into(),
            }],
        )
        .unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "Row,Employee ID,Field,Message\n3,E1,email,\"duplicate, see row 2\"\n"
        );
    }
}

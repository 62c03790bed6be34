//! Batch validation
//!
//! Every rule is checked on every row and all violations are returned
//! together. A single violation rejects the whole batch.

use std::collections::HashMap;

use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;

use super::error::{ValidationError, Violation};
use super::types::{CanonicalRecord, DateField, FieldKey};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

/// Minimum digits in a phone number
const MIN_PHONE_DIGITS: usize = 7;

/// Tolerance for the allocation total, so 33.3 + 33.3 + 33.4 passes
const ALLOCATION_EPSILON: f64 = 1e-6;

/// Collects violations for one batch
struct Collector {
    violations: Vec<Violation>,
}

impl Collector {
    fn push(&mut self, record: &CanonicalRecord, field: impl Into<String>, message: impl Into<String>) {
        self.violations.push(Violation {
            row_number: record.row_number,
            external_id: record.external_id.clone(),
            field: field.into(),
            message: message.into(),
        });
    }
}

/// Validate a normalized batch
pub fn validate_batch(records: &[CanonicalRecord]) -> Result<(), ValidationError> {
    let mut collector = Collector {
        violations: Vec::new(),
    };

    // First row seen per identifier / email
    let mut seen_ids: HashMap<String, usize> = HashMap::new();
    let mut seen_emails: HashMap<String, usize> = HashMap::new();

    for record in records {
        check_required(&mut collector, record);

        let id_key = record.id_key();
        if !id_key.is_empty() {
            if let Some(first) = seen_ids.get(&id_key) {
                collector.push(
                    record,
                    FieldKey::EmployeeId.name(),
                    format!(
                        "duplicate employee ID '{}' (first seen on row {})",
                        record.external_id, first
                    ),
                );
            } else {
                seen_ids.insert(id_key, record.row_number);
            }
        }

        if let Some(email) = record.email.as_deref() {
            if !EMAIL_RE.is_match(email.trim()) {
                collector.push(
                    record,
                    FieldKey::Email.name(),
                    format!("'{}' is not a valid email address", email),
                );
            }
        }
        if let Some(email_key) = record.email_key() {
            if let Some(first) = seen_emails.get(&email_key) {
                collector.push(
                    record,
                    FieldKey::Email.name(),
                    format!("duplicate email '{}' (first seen on row {})", email_key, first),
                );
            } else {
                seen_emails.insert(email_key, record.row_number);
            }
        }

        if let Some(phone) = record.phone.as_deref() {
            if let Some(problem) = phone_problem(phone) {
                collector.push(record, FieldKey::Phone.name(), problem);
            }
        }

        check_numbers(&mut collector, record);
        check_dates(&mut collector, record);
        check_allocation(&mut collector, record);
    }

    if collector.violations.is_empty() {
        debug!("Batch of {} record(s) passed validation", records.len());
        Ok(())
    } else {
        info!(
            "Batch of {} record(s) rejected with {} violation(s)",
            records.len(),
            collector.violations.len()
        );
        Err(ValidationError {
            violations: collector.violations,
        })
    }
}

fn check_required(collector: &mut Collector, record: &CanonicalRecord) {
    let required = [
        (FieldKey::EmployeeId, &record.external_id),
        (FieldKey::Name, &record.name),
        (FieldKey::Department, &record.department),
        (FieldKey::Designation, &record.designation),
    ];
    for (key, value) in required {
        if value.trim().is_empty() {
            collector.push(record, key.name(), "is required");
        }
    }
}

/// Describe what is wrong with a phone number, `None` when it is acceptable
fn phone_problem(phone: &str) -> Option<String> {
    if let Some(bad) = phone
        .chars()
        .find(|c| !(c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')' | '+')))
    {
        return Some(format!("'{}' contains invalid character '{}'", phone, bad));
    }

    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    if digits < MIN_PHONE_DIGITS {
        return Some(format!(
            "'{}' has {} digit(s), at least {} required",
            phone, digits, MIN_PHONE_DIGITS
        ));
    }
    None
}

fn check_percentage(collector: &mut Collector, record: &CanonicalRecord, field: &str, value: f64) {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        collector.push(record, field, format!("{} is outside 0-100", value));
    }
}

fn check_amount(collector: &mut Collector, record: &CanonicalRecord, field: &str, value: f64) {
    if !value.is_finite() || value < 0.0 {
        collector.push(record, field, format!("{} must not be negative", value));
    }
}

fn check_numbers(collector: &mut Collector, record: &CanonicalRecord) {
    check_percentage(
        collector,
        record,
        FieldKey::BillabilityPercentage.name(),
        record.billability_percentage,
    );
    check_amount(collector, record, FieldKey::Rate.name(), record.rate);
    check_amount(collector, record, FieldKey::Ctc.name(), record.ctc);

    for (idx, project) in record.projects.iter().enumerate() {
        check_percentage(
            collector,
            record,
            &FieldKey::ProjectAllocation.indexed_name(idx),
            project.allocation_percentage,
        );
        check_amount(
            collector,
            record,
            &FieldKey::BillingRate.indexed_name(idx),
            project.billing_rate,
        );
    }
}

fn check_date(collector: &mut Collector, record: &CanonicalRecord, field: &str, value: &DateField) {
    if let DateField::Unparsed(raw) = value {
        collector.push(
            record,
            field,
            format!("'{}' is not a date (use DD-MM-YYYY, NA, Milestone or SOW)", raw),
        );
    }
}

fn check_dates(collector: &mut Collector, record: &CanonicalRecord) {
    for key in [
        FieldKey::JoiningDate,
        FieldKey::SeparationDate,
        FieldKey::PoStartDate,
        FieldKey::PoEndDate,
    ] {
        if let Some(value) = record.date(key) {
            check_date(collector, record, key.name(), value);
        }
    }

    for (idx, project) in record.projects.iter().enumerate() {
        check_date(
            collector,
            record,
            &FieldKey::ProjectStartDate.indexed_name(idx),
            &project.start_date,
        );
        check_date(
            collector,
            record,
            &FieldKey::ProjectEndDate.indexed_name(idx),
            &project.end_date,
        );
    }
}

fn check_allocation(collector: &mut Collector, record: &CanonicalRecord) {
    let total = record.allocation_percentage();
    if total > 100.0 + ALLOCATION_EPSILON {
        collector.push(
            record,
            FieldKey::ProjectAllocation.name(),
            format!("total allocation {}% exceeds 100%", total),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::normalize::parse_date_text;
    use crate::import::types::ProjectAssignment;

    fn record(row: usize, id: &str, email: Option<&str>) -> CanonicalRecord {
        CanonicalRecord {
            row_number: row,
            external_id: id.to_string(),
            name: format!("Person {}", id),
            email: email.map(String::from),
            department: "Engineering".into(),
            designation: "Engineer".into(),
            ..Default::default()
        }
    }

    fn violations(records: &[CanonicalRecord]) -> Vec<Violation> {
        validate_batch(records).unwrap_err().violations
    }

    #[test]
    fn test_valid_batch_passes() {
        let mut r = record(2, "E1", Some("e1@example.com"));
        r.phone = Some("+91 (080) 4567-8910".into());
        r.po_end_date = parse_date_text("SOW");
        assert!(validate_batch(&[r, record(3, "E2", None)]).is_ok());
    }

    #[test]
    fn test_duplicate_id_reported_once_on_later_row() {
        let v = violations(&[record(2, "E1", None), record(3, "e1", None)]);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].row_number, 3);
        assert_eq!(v[0].field, "employeeId");
        assert!(v[0].message.contains("row 2"));
    }

    #[test]
    fn test_duplicate_email_is_case_insensitive() {
        let v = violations(&[
            record(2, "E1", Some("Same@Example.com")),
            record(3, "E2", Some("same@example.COM")),
        ]);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].row_number, 3);
        assert_eq!(v[0].field, "email");
    }

    #[test]
    fn test_all_violations_are_collected() {
        let mut bad = record(5, "", Some("not-an-email"));
        bad.name = String::new();
        bad.department = String::new();
        bad.phone = Some("12-34".into());
        bad.joining_date = parse_date_text("someday");

        let v = violations(&[bad]);
        let fields: Vec<&str> = v.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["employeeId", "name", "department", "email", "phone", "joiningDate"]
        );
        assert!(v.iter().all(|v| v.row_number == 5));
    }

    #[test]
    fn test_phone_rules() {
        assert!(phone_problem("+1 (555) 123-4567").is_none());
        assert!(phone_problem("555 12#34").is_some());
        assert!(phone_problem("123 456").is_some());
    }

    #[test]
    fn test_allocation_over_100_rejected() {
        let mut r = record(2, "E1", None);
        r.projects = vec![
            ProjectAssignment {
                project_name: "Atlas".into(),
                allocation_percentage: 70.0,
                ..Default::default()
            },
            ProjectAssignment {
                project_name: "Borealis".into(),
                allocation_percentage: 50.0,
                ..Default::default()
            },
        ];

        let v = violations(&[r]);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].field, "projectAllocation");
        assert!(v[0].message.contains("120"));
    }

    #[test]
    fn test_out_of_range_numbers_from_direct_submission() {
        let mut r = record(0, "E1", None);
        r.billability_percentage = 150.0;
        r.ctc = -1.0;
        let v = violations(&[r]);
        assert_eq!(v.len(), 2);
    }

    #[test]
    fn test_project_fields_are_indexed() {
        let mut r = record(2, "E1", None);
        r.projects = vec![
            ProjectAssignment {
                project_name: "Atlas".into(),
                ..Default::default()
            },
            ProjectAssignment {
                project_name: "Borealis".into(),
                end_date: parse_date_text("later"),
                ..Default::default()
            },
        ];
        let v = violations(&[r]);
        assert_eq!(v[0].field, "projectEndDate[2]");
    }
}

//! Field-level comparison with domain suppression rules

use crate::import::types::{
    CanonicalRecord, DateField, FieldDifference, FieldKey, ProjectAssignment, format_number,
};

/// Suffix the default placeholder project may carry after the client name
pub const DEFAULT_PROJECT_SUFFIX: &str = " - Default Project";

const NUMBER_TOLERANCE: f64 = 1e-9;

/// Settings that change what counts as a difference
#[derive(Debug, Clone)]
pub struct CompareOptions {
    /// Suffix of the placeholder project name, as in `"Acme - Default Project"`
    pub default_project_suffix: String,
}

impl Default for CompareOptions {
    fn default() -> Self {
        CompareOptions {
            default_project_suffix: DEFAULT_PROJECT_SUFFIX.to_string(),
        }
    }
}

impl CompareOptions {
    /// Check if `name` is the placeholder project label for `client`
    pub fn is_default_project(&self, name: &str, client: &str) -> bool {
        let name = name.trim().to_lowercase();
        let client = client.trim().to_lowercase();
        if client.is_empty() || name.is_empty() {
            return false;
        }
        let suffixed = format!("{}{}", client, self.default_project_suffix.to_lowercase());
        name == client || name == suffixed
    }
}

/// Compare an existing record with an incoming one.
///
/// Only semantically distinct values produce a difference. The derived
/// allocation total is never compared.
pub fn compare_fields(
    existing: &CanonicalRecord,
    incoming: &CanonicalRecord,
    options: &CompareOptions,
) -> Vec<FieldDifference> {
    let mut diffs = Vec::new();

    let text_fields = [
        FieldKey::EmployeeId,
        FieldKey::Name,
        FieldKey::Phone,
        FieldKey::Department,
        FieldKey::Designation,
        FieldKey::Location,
        FieldKey::Skills,
        FieldKey::ManagementMode,
        FieldKey::BillabilityStatus,
        FieldKey::ExperienceBand,
    ];
    for key in text_fields {
        compare_text(
            &mut diffs,
            key.name(),
            &existing.field_text(key),
            &incoming.field_text(key),
        );
    }

    // Addresses are matched case-insensitively, so they compare that way too
    if existing.email_key() != incoming.email_key() {
        diffs.push(FieldDifference::new(
            FieldKey::Email.name(),
            existing.field_text(FieldKey::Email),
            incoming.field_text(FieldKey::Email),
        ));
    }

    let numeric_fields = [
        (
            FieldKey::BillabilityPercentage,
            existing.billability_percentage,
            incoming.billability_percentage,
        ),
        (FieldKey::Rate, existing.rate, incoming.rate),
        (FieldKey::Ctc, existing.ctc, incoming.ctc),
        (
            FieldKey::AgeingDays,
            existing.ageing_days as f64,
            incoming.ageing_days as f64,
        ),
        (
            FieldKey::BenchDays,
            existing.bench_days as f64,
            incoming.bench_days as f64,
        ),
    ];
    for (key, a, b) in numeric_fields {
        compare_number(&mut diffs, key.name(), a, b);
    }

    for key in [
        FieldKey::JoiningDate,
        FieldKey::SeparationDate,
        FieldKey::PoStartDate,
        FieldKey::PoEndDate,
    ] {
        if let (Some(a), Some(b)) = (existing.date(key), incoming.date(key)) {
            compare_date(&mut diffs, key.name().to_string(), a, b);
        }
    }

    compare_projects(&mut diffs, &existing.projects, &incoming.projects, options);

    diffs
}

fn compare_text(diffs: &mut Vec<FieldDifference>, field: &str, existing: &str, incoming: &str) {
    if existing.trim() != incoming.trim() {
        diffs.push(FieldDifference::new(field, existing.trim(), incoming.trim()));
    }
}

fn compare_number(diffs: &mut Vec<FieldDifference>, field: &str, existing: f64, incoming: f64) {
    if (existing - incoming).abs() > NUMBER_TOLERANCE {
        diffs.push(FieldDifference::new(
            field,
            format_number(existing),
            format_number(incoming),
        ));
    }
}

/// Two date values are the same when their normalized keys match, or when
/// neither holds a concrete date (empty, NA, Milestone, SOW)
pub fn dates_equivalent(existing: &DateField, incoming: &DateField) -> bool {
    if existing.is_open() && incoming.is_open() {
        return true;
    }
    existing.comparison_key() == incoming.comparison_key()
}

fn compare_date(
    diffs: &mut Vec<FieldDifference>,
    field: String,
    existing: &DateField,
    incoming: &DateField,
) {
    if !dates_equivalent(existing, incoming) {
        diffs.push(FieldDifference::new(
            field,
            existing.to_string(),
            incoming.to_string(),
        ));
    }
}

/// Project names are equivalent when equal, or when both are placeholder
/// labels for the same client: empty, the client name itself, or the client
/// name plus the default-project suffix
fn project_names_equivalent(
    existing: &ProjectAssignment,
    incoming: &ProjectAssignment,
    options: &CompareOptions,
) -> bool {
    let a = existing.project_name.trim();
    let b = incoming.project_name.trim();
    if a == b {
        return true;
    }

    let placeholder = |name: &str, client: &str| name.is_empty() || options.is_default_project(name, client);
    let matched = [existing.client.as_str(), incoming.client.as_str()]
        .into_iter()
        .filter(|client| !client.trim().is_empty())
        .any(|client| placeholder(a, client) && placeholder(b, client));
    if matched {
        log::debug!("Suppressing placeholder project name difference '{}' vs '{}'", a, b);
    }
    matched
}

fn compare_projects(
    diffs: &mut Vec<FieldDifference>,
    existing: &[ProjectAssignment],
    incoming: &[ProjectAssignment],
    options: &CompareOptions,
) {
    let blank = ProjectAssignment::default();
    let count = existing.len().max(incoming.len());

    for position in 0..count {
        let a = existing.get(position).unwrap_or(&blank);
        let b = incoming.get(position).unwrap_or(&blank);

        if !project_names_equivalent(a, b, options) {
            diffs.push(FieldDifference::new(
                FieldKey::ProjectName.indexed_name(position),
                a.project_name.trim(),
                b.project_name.trim(),
            ));
        }

        for key in [FieldKey::Client, FieldKey::ProjectRole, FieldKey::PoNumber] {
            compare_text(
                diffs,
                &key.indexed_name(position),
                &a.field_text(key),
                &b.field_text(key),
            );
        }

        compare_number(
            diffs,
            &FieldKey::ProjectAllocation.indexed_name(position),
            a.allocation_percentage,
            b.allocation_percentage,
        );
        compare_number(
            diffs,
            &FieldKey::BillingRate.indexed_name(position),
            a.billing_rate,
            b.billing_rate,
        );

        compare_date(
            diffs,
            FieldKey::ProjectStartDate.indexed_name(position),
            &a.start_date,
            &b.start_date,
        );
        compare_date(
            diffs,
            FieldKey::ProjectEndDate.indexed_name(position),
            &a.end_date,
            &b.end_date,
        );
    }
}

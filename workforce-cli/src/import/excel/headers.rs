//! Header normalization and the column alias table
//!
//! Headers are lower-cased, stripped of punctuation and whitespace-collapsed
//! before lookup, so `"E-mail"`, `"EMAIL"` and `" Email "` all resolve alike.

use std::collections::HashMap;

use log::debug;
use once_cell::sync::Lazy;

use crate::import::types::FieldKey;

/// Normalized header text → canonical field
const ALIASES: &[(&str, FieldKey)] = &[
    // Identity
    ("employee id", FieldKey::EmployeeId),
    ("employeeid", FieldKey::EmployeeId),
    ("emp id", FieldKey::EmployeeId),
    ("empid", FieldKey::EmployeeId),
    ("employee code", FieldKey::EmployeeId),
    ("emp code", FieldKey::EmployeeId),
    ("external id", FieldKey::EmployeeId),
    ("id", FieldKey::EmployeeId),
    ("name", FieldKey::Name),
    ("employee name", FieldKey::Name),
    ("full name", FieldKey::Name),
    ("email", FieldKey::Email),
    ("email id", FieldKey::Email),
    ("email address", FieldKey::Email),
    ("mail", FieldKey::Email),
    ("phone", FieldKey::Phone),
    ("phone number", FieldKey::Phone),
    ("mobile", FieldKey::Phone),
    ("mobile number", FieldKey::Phone),
    ("contact", FieldKey::Phone),
    ("contact number", FieldKey::Phone),
    ("department", FieldKey::Department),
    ("dept", FieldKey::Department),
    ("designation", FieldKey::Designation),
    ("title", FieldKey::Designation),
    ("job title", FieldKey::Designation),
    ("location", FieldKey::Location),
    ("base location", FieldKey::Location),
    ("office", FieldKey::Location),
    ("skills", FieldKey::Skills),
    ("skill", FieldKey::Skills),
    ("skill set", FieldKey::Skills),
    ("skillset", FieldKey::Skills),
    // Classification
    ("management mode", FieldKey::ManagementMode),
    ("mode of management", FieldKey::ManagementMode),
    ("billability status", FieldKey::BillabilityStatus),
    ("billable status", FieldKey::BillabilityStatus),
    ("experience band", FieldKey::ExperienceBand),
    ("experience", FieldKey::ExperienceBand),
    ("band", FieldKey::ExperienceBand),
    // Numbers
    ("billability", FieldKey::BillabilityPercentage),
    ("billability percentage", FieldKey::BillabilityPercentage),
    ("billable percentage", FieldKey::BillabilityPercentage),
    ("rate", FieldKey::Rate),
    ("hourly rate", FieldKey::Rate),
    ("ctc", FieldKey::Ctc),
    ("cost to company", FieldKey::Ctc),
    ("salary", FieldKey::Ctc),
    ("ageing", FieldKey::AgeingDays),
    ("ageing days", FieldKey::AgeingDays),
    ("aging", FieldKey::AgeingDays),
    ("aging days", FieldKey::AgeingDays),
    ("bench days", FieldKey::BenchDays),
    ("bench", FieldKey::BenchDays),
    ("days on bench", FieldKey::BenchDays),
    // Dates
    ("joining date", FieldKey::JoiningDate),
    ("date of joining", FieldKey::JoiningDate),
    ("doj", FieldKey::JoiningDate),
    ("separation date", FieldKey::SeparationDate),
    ("date of separation", FieldKey::SeparationDate),
    ("exit date", FieldKey::SeparationDate),
    ("last working day", FieldKey::SeparationDate),
    ("po start date", FieldKey::PoStartDate),
    ("po start", FieldKey::PoStartDate),
    ("po end date", FieldKey::PoEndDate),
    ("po end", FieldKey::PoEndDate),
    // Project group
    ("project", FieldKey::ProjectName),
    ("project name", FieldKey::ProjectName),
    ("projects", FieldKey::ProjectName),
    ("client", FieldKey::Client),
    ("client name", FieldKey::Client),
    ("customer", FieldKey::Client),
    ("allocation", FieldKey::ProjectAllocation),
    ("allocation percentage", FieldKey::ProjectAllocation),
    ("project allocation", FieldKey::ProjectAllocation),
    ("project start date", FieldKey::ProjectStartDate),
    ("project start", FieldKey::ProjectStartDate),
    ("start date", FieldKey::ProjectStartDate),
    ("project end date", FieldKey::ProjectEndDate),
    ("project end", FieldKey::ProjectEndDate),
    ("end date", FieldKey::ProjectEndDate),
    ("project role", FieldKey::ProjectRole),
    ("role", FieldKey::ProjectRole),
    ("po number", FieldKey::PoNumber),
    ("po no", FieldKey::PoNumber),
    ("po", FieldKey::PoNumber),
    ("purchase order", FieldKey::PoNumber),
    ("billing rate", FieldKey::BillingRate),
    ("project billing rate", FieldKey::BillingRate),
];

static ALIAS_MAP: Lazy<HashMap<String, FieldKey>> = Lazy::new(|| {
    let mut map: HashMap<String, FieldKey> = ALIASES
        .iter()
        .map(|(alias, key)| (alias.to_string(), *key))
        .collect();

    // Canonical labels always resolve, whatever the alias list says
    for key in FieldKey::ALL {
        map.entry(normalize_header(key.label())).or_insert(key);
    }
    map
});

/// Lower-case, drop punctuation, collapse whitespace
pub fn normalize_header(header: &str) -> String {
    let cleaned: String = header
        .chars()
        .map(|c| if c == '_' { ' ' } else { c })
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .to_lowercase();

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Map a header cell to its canonical field, `None` for unknown headers
pub fn resolve_header(header: &str) -> Option<FieldKey> {
    let normalized = normalize_header(header);
    if normalized.is_empty() {
        return None;
    }

    let key = ALIAS_MAP.get(&normalized).copied();
    if key.is_none() {
        debug!("Ignoring unknown column header '{}'", header);
    }
    key
}

/// Resolve a whole header row to `(column index, field)` pairs.
///
/// When two columns resolve to the same field the first one wins.
pub fn resolve_header_row(headers: &[String]) -> Vec<(usize, FieldKey)> {
    let mut seen = Vec::new();
    let mut columns = Vec::new();
    for (idx, header) in headers.iter().enumerate() {
        if let Some(key) = resolve_header(header) {
            if seen.contains(&key) {
                debug!(
                    "Column {} ('{}') duplicates field {}, ignoring",
                    idx + 1,
                    header,
                    key
                );
                continue;
            }
            seen.push(key);
            columns.push((idx, key));
        }
    }
    columns
}

//! RawRow → CanonicalRecord conversion

use log::debug;

use super::dates::normalize_date_cell;
use super::values::{day_count, money, optional_text, percentage, split_list, text};
use crate::import::types::{CanonicalRecord, Cell, FieldKey, ProjectAssignment, RawRow};

/// Convert one raw row into a typed record. Never fails; bad values are
/// carried through for the validator to reject.
pub fn normalize_row(row: &RawRow) -> CanonicalRecord {
    CanonicalRecord {
        row_number: row.row_number,
        external_id: text(row.get(FieldKey::EmployeeId)),
        name: text(row.get(FieldKey::Name)),
        email: optional_text(row.get(FieldKey::Email)),
        phone: optional_text(row.get(FieldKey::Phone)),
        department: text(row.get(FieldKey::Department)),
        designation: text(row.get(FieldKey::Designation)),
        location: text(row.get(FieldKey::Location)),
        skills: split_list(row.get(FieldKey::Skills)),
        management_mode: text(row.get(FieldKey::ManagementMode)),
        billability_status: text(row.get(FieldKey::BillabilityStatus)),
        experience_band: text(row.get(FieldKey::ExperienceBand)),
        billability_percentage: percentage(row.get(FieldKey::BillabilityPercentage)),
        rate: money(row.get(FieldKey::Rate)),
        ctc: money(row.get(FieldKey::Ctc)),
        ageing_days: day_count(row.get(FieldKey::AgeingDays)),
        bench_days: day_count(row.get(FieldKey::BenchDays)),
        joining_date: normalize_date_cell(row.get(FieldKey::JoiningDate)),
        separation_date: normalize_date_cell(row.get(FieldKey::SeparationDate)),
        po_start_date: normalize_date_cell(row.get(FieldKey::PoStartDate)),
        po_end_date: normalize_date_cell(row.get(FieldKey::PoEndDate)),
        projects: expand_projects(row),
    }
}

/// Normalize every row of a batch, preserving order
pub fn normalize_rows(rows: &[RawRow]) -> Vec<CanonicalRecord> {
    rows.iter().map(normalize_row).collect()
}

/// Split a project-group cell into one cell per position.
///
/// Numeric cells cannot hold several values and stay whole, which keeps a
/// date serial in a single-project row intact.
fn split_cells(cell: &Cell) -> Vec<Cell> {
    match cell {
        Cell::Empty => Vec::new(),
        Cell::Number(_) | Cell::DateSerial(_) => vec![cell.clone()],
        Cell::Text(s) => {
            if s.trim().is_empty() {
                return Vec::new();
            }
            s.split(';')
                .map(|part| {
                    let part = part.trim();
                    if part.is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(part.to_string())
                    }
                })
                .collect()
        }
    }
}

/// Zip the project-group columns positionally into assignments.
///
/// A position missing from a shorter column, or left blank as in `"Lead; "`,
/// falls back to that column's first value. An assignment with a client but no project name becomes the
/// client's default project, named after the client.
pub fn expand_projects(row: &RawRow) -> Vec<ProjectAssignment> {
    let columns: Vec<(FieldKey, Vec<Cell>)> = FieldKey::PROJECT_GROUP
        .iter()
        .map(|key| (*key, split_cells(row.get(*key))))
        .collect();

    let count = columns.iter().map(|(_, cells)| cells.len()).max().unwrap_or(0);
    let mut projects = Vec::with_capacity(count);

    for position in 0..count {
        let mut assignment = ProjectAssignment::default();
        for (key, cells) in &columns {
            let cell = match cells
                .get(position)
                .filter(|cell| !cell.is_empty())
                .or_else(|| cells.first())
            {
                Some(cell) => cell,
                None => continue,
            };
            match key {
                FieldKey::ProjectName => assignment.project_name = text(cell),
                FieldKey::Client => assignment.client = text(cell),
                FieldKey::ProjectAllocation => assignment.allocation_percentage = percentage(cell),
                FieldKey::ProjectStartDate => assignment.start_date = normalize_date_cell(cell),
                FieldKey::ProjectEndDate => assignment.end_date = normalize_date_cell(cell),
                FieldKey::ProjectRole => assignment.role = text(cell),
                FieldKey::PoNumber => assignment.po_number = text(cell),
                FieldKey::BillingRate => assignment.billing_rate = money(cell),
                _ => {}
            }
        }

        if assignment.project_name.is_empty() && assignment.client.is_empty() {
            debug!(
                "Row {}: dropping project position {} with no name or client",
                row.row_number,
                position + 1
            );
            continue;
        }

        if assignment.project_name.is_empty() {
            assignment.project_name = assignment.client.clone();
        }

        projects.push(assignment);
    }

    projects
}

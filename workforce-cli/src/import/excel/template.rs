//! Blank import template generation

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, warn};
use rust_xlsxwriter::{
    DataValidation, DataValidationErrorStyle, Format, Formula, Workbook, Worksheet,
};

use crate::import::types::{DATE_FORMAT, FieldKey};

const DATA_SHEET: &str = "Employees";
const INSTRUCTIONS_SHEET: &str = "Instructions";
const OPTIONS_SHEET: &str = "Options";

/// Last template row that gets a dropdown
const VALIDATION_LAST_ROW: u32 = 1000;

/// Inline list formulas are limited to 255 characters including separators
const INLINE_LIST_LIMIT: usize = 255;

/// Sample rows in `FieldKey::ALL` order: one multi-project employee, one
/// on a client default project closed by scope of work
const SAMPLE_ROWS: [[&str; 28]; 2] = [
    [
        "EMP001",
        "Asha Rao",
        "asha.rao@example.com",
        "+91 98450 12345",
        "Engineering",
        "Senior Engineer",
        "Bengaluru",
        "Rust; SQL; Kubernetes",
        "Managed",
        "Billable",
        "5-8 years",
        "100",
        "1800",
        "2400000",
        "0",
        "0",
        "15-01-2020",
        "",
        "01-04-2024",
        "31-03-2025",
        "Atlas; Borealis",
        "Acme Corp; Globex",
        "60; 40",
        "01-04-2024; 01-06-2024",
        "31-03-2025; Milestone",
        "Tech Lead; Reviewer",
        "PO-1001; PO-1002",
        "2000; 1800",
    ],
    [
        "EMP002",
        "Vikram Shah",
        "vikram.shah@example.com",
        "022-4567-8910",
        "Delivery",
        "Project Manager",
        "Mumbai",
        "Scrum; Stakeholder Management",
        "Self",
        "Billable",
        "8-12 years",
        "80",
        "2200",
        "3100000",
        "12",
        "0",
        "03-07-2018",
        "",
        "SOW",
        "SOW",
        "",
        "Initech",
        "100",
        "01-01-2024",
        "SOW",
        "Delivery Manager",
        "PO-2001",
        "2500",
    ],
];

/// Instruction lines written one per row
fn instruction_lines() -> Vec<String> {
    vec![
        "How to fill in this template".to_string(),
        String::new(),
        format!(
            "Dates: use {} (for example 31-03-2025). YYYY-MM-DD and spreadsheet date cells are also accepted.",
            DATE_FORMAT
                .replace("%d", "DD")
                .replace("%m", "MM")
                .replace("%Y", "YYYY")
        ),
        "Date columns also accept NA, Milestone and SOW when there is no fixed date.".to_string(),
        "Employee ID and Name are required on every row; Department and Designation too."
            .to_string(),
        "Employee ID and Email must be unique within the file.".to_string(),
        "Skills: separate several values with a semicolon (Rust; SQL).".to_string(),
        "Projects: put several projects in one row separated by semicolons. Client, Allocation %, dates, role, PO Number and Billing Rate follow the same order.".to_string(),
        "A client without a project name is booked on that client's default project.".to_string(),
        "Allocation % across all projects of one employee must not exceed 100.".to_string(),
        "Dropdowns list the configured values but are advisory; other values are accepted."
            .to_string(),
    ]
}

/// How each category column gets its dropdown
enum ListSource {
    Inline(Vec<String>),
    /// Column index in the options sheet and number of values
    Sheet(u16, usize),
}

/// Build the template workbook in memory.
///
/// `options` maps an option category (see `FieldKey::option_category`) to
/// its allowed values.
pub fn build_template(options: &BTreeMap<String, Vec<String>>) -> Result<Vec<u8>> {
    let mut sources: Vec<(u16, ListSource)> = Vec::new();
    let mut overflow: Vec<&Vec<String>> = Vec::new();

    for (col, key) in FieldKey::ALL.iter().enumerate() {
        let values = match key.option_category().and_then(|c| options.get(c)) {
            Some(values) if !values.is_empty() => values,
            _ => continue,
        };

        let inline_len: usize = values.iter().map(|v| v.len() + 1).sum();
        if inline_len <= INLINE_LIST_LIMIT {
            sources.push((col as u16, ListSource::Inline(values.clone())));
        } else {
            debug!(
                "Options for {} exceed the inline limit, listing them on the {} sheet",
                key, OPTIONS_SHEET
            );
            sources.push((
                col as u16,
                ListSource::Sheet(overflow.len() as u16, values.len()),
            ));
            overflow.push(values);
        }
    }

    let mut workbook = Workbook::new();

    let sheet = workbook.add_worksheet();
    sheet.set_name(DATA_SHEET)?;
    write_data_sheet(sheet, &sources)?;

    let sheet = workbook.add_worksheet();
    sheet.set_name(INSTRUCTIONS_SHEET)?;
    let bold = Format::new().set_bold();
    for (row, line) in instruction_lines().iter().enumerate() {
        if row == 0 {
            sheet.write_string_with_format(row as u32, 0, line, &bold)?;
        } else {
            sheet.write_string(row as u32, 0, line)?;
        }
    }
    sheet.set_column_width(0, 110)?;

    if !overflow.is_empty() {
        let sheet = workbook.add_worksheet();
        sheet.set_name(OPTIONS_SHEET)?;
        for (col, values) in overflow.iter().enumerate() {
            for (row, value) in values.iter().enumerate() {
                sheet.write_string(row as u32, col as u16, value)?;
            }
        }
    }

    workbook
        .save_to_buffer()
        .context("Failed to render template workbook")
}

/// Build the template and write it to `path`
pub fn write_template(path: &Path, options: &BTreeMap<String, Vec<String>>) -> Result<()> {
    let bytes = build_template(options)?;
    std::fs::write(path, bytes)
        .with_context(|| format!("Failed to write template: {}", path.display()))
}

fn write_data_sheet(sheet: &mut Worksheet, sources: &[(u16, ListSource)]) -> Result<()> {
    let header = Format::new().set_bold();

    for (col, key) in FieldKey::ALL.iter().enumerate() {
        let col = col as u16;
        sheet.write_string_with_format(0, col, key.label(), &header)?;
        sheet.set_column_width(col, (key.label().len() + 6) as f64)?;
    }

    for (idx, sample) in SAMPLE_ROWS.iter().enumerate() {
        let row = (idx + 1) as u32;
        for (col, value) in sample.iter().enumerate() {
            if !value.is_empty() {
                sheet.write_string(row, col as u16, *value)?;
            }
        }
    }

    for (col, source) in sources {
        let validation = match source {
            ListSource::Inline(values) => {
                let refs: Vec<&str> = values.iter().map(|s| s.as_str()).collect();
                match DataValidation::new().allow_list_strings(&refs) {
                    Ok(dv) => dv,
                    Err(e) => {
                        warn!("Skipping dropdown for column {}: {}", col + 1, e);
                        continue;
                    }
                }
            }
            ListSource::Sheet(options_col, len) => {
                let letter = column_letter(*options_col);
                DataValidation::new().allow_list_formula(Formula::new(format!(
                    "{}!${}$1:${}${}",
                    OPTIONS_SHEET, letter, letter, len
                )))
            }
        };

        // Advisory only: out-of-list values get an information popup, not a hard stop
        let validation = validation.set_error_style(DataValidationErrorStyle::Information);
        sheet.add_data_validation(1, *col, VALIDATION_LAST_ROW, *col, &validation)?;
    }

    sheet.set_freeze_panes(1, 0)?;
    Ok(())
}

/// Zero-based column index to spreadsheet letters (0 → A, 26 → AA)
fn column_letter(mut col: u16) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push((b'A' + (col % 26) as u8) as char);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    letters.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::excel::read_workbook_bytes;
    use crate::import::normalize::normalize_rows;
    use crate::import::types::DateField;
    use crate::import::validate::validate_batch;

    fn options() -> BTreeMap<String, Vec<String>> {
        let mut options = BTreeMap::new();
        options.insert(
            "department".to_string(),
            vec!["Engineering".to_string(), "Delivery".to_string()],
        );
        options.insert(
            "location".to_string(),
            (0..80).map(|i| format!("Office number {}", i)).collect(),
        );
        options
    }

    #[test]
    fn test_template_reads_back_as_valid_batch() {
        let bytes = build_template(&options()).unwrap();
        let rows = read_workbook_bytes(&bytes).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row_number, 2);

        let records = normalize_rows(&rows);
        validate_batch(&records).unwrap();

        assert_eq!(records[0].projects.len(), 2);
        assert_eq!(records[1].projects[0].project_name, "Initech");
        assert!(matches!(records[1].po_end_date, DateField::Sentinel { .. }));
        assert_eq!(records[1].po_end_date.to_string(), "SOW");
    }

    #[test]
    fn test_column_letter() {
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(25), "Z");
        assert_eq!(column_letter(26), "AA");
        assert_eq!(column_letter(27), "AB");
    }
}

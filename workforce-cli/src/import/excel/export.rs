//! Write stored records back to a workbook that can be re-imported

use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::import::types::{CanonicalRecord, FieldKey};

const SHEET_NAME: &str = "Employees";

/// Render records in canonical header order.
///
/// Dates and sentinels are written as text exactly as they display, so a
/// `SOW` read from a workbook comes back as `SOW`.
pub fn export_records(records: &[CanonicalRecord]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    let header = Format::new().set_bold();
    for (col, key) in FieldKey::ALL.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, key.label(), &header)?;
    }

    for (idx, record) in records.iter().enumerate() {
        write_record(sheet, (idx + 1) as u32, record)?;
    }

    sheet.set_freeze_panes(1, 0)?;

    workbook
        .save_to_buffer()
        .context("Failed to render export workbook")
}

/// Export records to a file
pub fn write_export(path: &Path, records: &[CanonicalRecord]) -> Result<()> {
    let bytes = export_records(records)?;
    std::fs::write(path, bytes)
        .with_context(|| format!("Failed to write export: {}", path.display()))
}

fn write_record(ws: &mut Worksheet, row: u32, record: &CanonicalRecord) -> Result<()> {
    for (col, key) in FieldKey::ALL.iter().enumerate() {
        let col = col as u16;
        match key {
            FieldKey::BillabilityPercentage => {
                ws.write_number(row, col, record.billability_percentage)?;
            }
            FieldKey::Rate => {
                ws.write_number(row, col, record.rate)?;
            }
            FieldKey::Ctc => {
                ws.write_number(row, col, record.ctc)?;
            }
            FieldKey::AgeingDays => {
                ws.write_number(row, col, record.ageing_days)?;
            }
            FieldKey::BenchDays => {
                ws.write_number(row, col, record.bench_days)?;
            }
            _ => {
                let text = record.field_text(*key);
                if !text.is_empty() {
                    ws.write_string(row, col, &text)?;
                }
            }
        }
    }
    Ok(())
}

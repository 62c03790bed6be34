//! Read raw rows from the first sheet of a workbook

use std::io::Cursor;
use std::path::Path;

use anyhow::Context;
use calamine::{Data, Reader, open_workbook_auto_from_rs};
use log::{debug, info};

use super::headers::resolve_header_row;
use crate::import::error::ImportError;
use crate::import::types::{Cell, RawRow};

/// Read a workbook file from disk
pub fn read_workbook_file(path: &Path) -> Result<Vec<RawRow>, ImportError> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read workbook: {}", path.display()))?;
    read_workbook_bytes(&bytes)
}

/// Decode an xlsx/xls/ods buffer into raw rows.
///
/// Only the first sheet is read. Rows with neither an identifier nor a name
/// are dropped.
pub fn read_workbook_bytes(bytes: &[u8]) -> Result<Vec<RawRow>, ImportError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| ImportError::MalformedWorkbook(format!("cannot open workbook: {}", e)))?;

    let range = match workbook.worksheet_range_at(0) {
        Some(Ok(range)) => range,
        Some(Err(e)) => {
            return Err(ImportError::MalformedWorkbook(format!(
                "cannot read first sheet: {}",
                e
            )));
        }
        None => {
            return Err(ImportError::MalformedWorkbook(
                "workbook has no sheets".to_string(),
            ));
        }
    };

    let rows: Vec<&[Data]> = range.rows().collect();
    if rows.len() < 2 {
        return Err(ImportError::MalformedWorkbook(
            "expected a header row and at least one data row".to_string(),
        ));
    }

    let headers: Vec<String> = rows[0].iter().map(header_text).collect();
    let columns = resolve_header_row(&headers);
    if columns.is_empty() {
        return Err(ImportError::MalformedWorkbook(
            "no recognised column headers".to_string(),
        ));
    }
    debug!("Resolved {} of {} header columns", columns.len(), headers.len());

    // Range may not begin at A1
    let (start_row, _) = range.start().unwrap_or((0, 0));

    let mut raw_rows = Vec::with_capacity(rows.len() - 1);
    let mut dropped = 0;
    for (idx, row) in rows.iter().enumerate().skip(1) {
        let row_number = start_row as usize + idx + 1;
        let mut raw = RawRow::new(row_number);
        for (col, key) in &columns {
            let cell = row.get(*col).map(to_cell).unwrap_or_default();
            raw.insert(*key, cell);
        }

        if raw.is_blank_record() {
            dropped += 1;
            continue;
        }
        raw_rows.push(raw);
    }

    info!(
        "Read {} row(s) from workbook ({} blank row(s) dropped)",
        raw_rows.len(),
        dropped
    );
    Ok(raw_rows)
}

fn header_text(cell: &Data) -> String {
    to_cell(cell).as_text().unwrap_or_default()
}

/// Convert a calamine cell, keeping date-typed numbers distinguishable
fn to_cell(cell: &Data) -> Cell {
    match cell {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) if s.trim().is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => Cell::DateSerial(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

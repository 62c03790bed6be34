//! Date parsing for workforce date columns

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};

use crate::import::types::{Cell, DateField, SentinelKind, format_number};

/// Plain date layouts accepted in text cells
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", // 2024-03-01
    "%Y/%m/%d", // 2024/03/01
    "%d-%m-%Y", // 01-03-2024
    "%d/%m/%Y", // 01/03/2024
    "%d.%m.%Y", // 01.03.2024
];

/// Timestamp layouts without an offset
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f", // 2024-03-01T10:30:00.000
    "%Y-%m-%dT%H:%M",       // 2024-03-01T10:30
    "%Y-%m-%d %H:%M:%S%.f", // 2024-03-01 10:30:00
];

/// Highest serial a workbook can hold (31-12-9999)
const MAX_SERIAL: f64 = 2_958_465.0;

/// Parse the text of a date cell.
///
/// Sentinels keep the literal as written. Anything unrecognised comes back as
/// `DateField::Unparsed` so the validator can report it.
pub fn parse_date_text(raw: &str) -> DateField {
    let s = raw.trim();
    if s.is_empty() {
        return DateField::Empty;
    }

    if let Some(kind) = SentinelKind::parse(s) {
        return DateField::Sentinel {
            kind,
            literal: s.to_string(),
        };
    }

    match parse_calendar_date(s) {
        Some(date) => DateField::Date(date),
        None => DateField::Unparsed(s.to_string()),
    }
}

fn parse_calendar_date(s: &str) -> Option<NaiveDate> {
    for format in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, format) {
            return Some(d);
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    for format in TIMESTAMP_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.date());
        }
    }

    None
}

/// Convert a spreadsheet serial day number to a date.
///
/// The epoch is 30-12-1899. Workbooks treat 1900 as a leap year, so serials
/// below 61 are shifted forward one day and the phantom 29-02-1900 (serial 60)
/// lands on 01-03-1900.
pub fn from_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(1.0..=MAX_SERIAL).contains(&serial) {
        return None;
    }

    let mut days = serial.floor() as i64;
    if days < 61 {
        days += 1;
    }

    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(days))
}

/// Normalize one date cell. Only numeric cells are treated as serials.
pub fn normalize_date_cell(cell: &Cell) -> DateField {
    match cell {
        Cell::Empty => DateField::Empty,
        Cell::Text(s) => parse_date_text(s),
        Cell::Number(n) | Cell::DateSerial(n) => match from_serial(*n) {
            Some(date) => DateField::Date(date),
            None => DateField::Unparsed(format_number(*n)),
        },
    }
}

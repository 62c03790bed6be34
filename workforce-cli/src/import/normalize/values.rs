//! Scalar and list value parsing

use crate::import::types::Cell;

/// Characters stripped from numeric text before parsing
const NUMERIC_NOISE: &[char] = &['₹', '$', '€', '£', ',', '%', ' '];

/// Split a multi-valued cell on `;` keeping empty positions
///
/// `"A; ; C"` gives `["A", "", "C"]` so project columns stay aligned.
pub fn split_positions(cell: &Cell) -> Vec<String> {
    match cell.as_text() {
        Some(text) => text.split(';').map(|part| part.trim().to_string()).collect(),
        None => Vec::new(),
    }
}

/// Split a list cell on `;` dropping empty entries
pub fn split_list(cell: &Cell) -> Vec<String> {
    split_positions(cell)
        .into_iter()
        .filter(|item| !item.is_empty())
        .collect()
}

/// Parse numeric text, tolerating currency symbols, thousands separators and `%`
pub fn parse_number_text(text: &str) -> Option<f64> {
    let cleaned: String = text.chars().filter(|c| !NUMERIC_NOISE.contains(c)).collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parse a numeric cell, `None` when blank or unreadable
pub fn parse_number(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(n) | Cell::DateSerial(n) => Some(*n).filter(|n| n.is_finite()),
        Cell::Text(s) => parse_number_text(s),
        Cell::Empty => None,
    }
}

/// Percentage clamped to `[0, 100]`, defaulting to 0
pub fn percentage(cell: &Cell) -> f64 {
    parse_number(cell).unwrap_or(0.0).clamp(0.0, 100.0)
}

/// Money amount clamped to `>= 0`, defaulting to 0
pub fn money(cell: &Cell) -> f64 {
    parse_number(cell).unwrap_or(0.0).max(0.0)
}

/// Whole day count clamped to `>= 0`, defaulting to 0
pub fn day_count(cell: &Cell) -> u32 {
    let days = parse_number(cell).unwrap_or(0.0).max(0.0).round();
    if days >= u32::MAX as f64 {
        u32::MAX
    } else {
        days as u32
    }
}

/// Optional trimmed text
pub fn optional_text(cell: &Cell) -> Option<String> {
    cell.as_text()
}

/// Trimmed text, empty when blank
pub fn text(cell: &Cell) -> String {
    cell.as_text().unwrap_or_default()
}

//! Raw spreadsheet cell values, before normalization

use std::collections::BTreeMap;

use super::FieldKey;

/// A single untyped spreadsheet cell
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    /// Blank cell (or a cell holding a spreadsheet error)
    #[default]
    Empty,
    /// Text value, untrimmed
    Text(String),
    /// Plain number
    Number(f64),
    /// Number the workbook itself flagged as a date (days since the spreadsheet epoch)
    DateSerial(f64),
}

static EMPTY_CELL: Cell = Cell::Empty;

impl Cell {
    /// Check if this cell carries no usable value
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) | Cell::DateSerial(_) => false,
        }
    }

    /// Render the cell as trimmed text, `None` when blank.
    ///
    /// Whole numbers render without a fractional part so numeric identifiers
    /// such as `1001` do not come back as `1001.0`.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            Cell::Number(n) | Cell::DateSerial(n) => Some(format_number(*n)),
        }
    }

    /// Try to get the cell as a number without any text parsing
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) | Cell::DateSerial(n) => Some(*n),
            _ => None,
        }
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_text().unwrap_or_default())
    }
}

/// Format a number the way a spreadsheet user typed it
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// One data row of the workbook, keyed by canonical field
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    /// 1-based spreadsheet row number (header is row 1)
    pub row_number: usize,
    /// Cells in canonical column order
    pub cells: BTreeMap<FieldKey, Cell>,
}

impl RawRow {
    pub fn new(row_number: usize) -> Self {
        RawRow {
            row_number,
            cells: BTreeMap::new(),
        }
    }

    /// Set a cell value
    pub fn insert(&mut self, key: FieldKey, cell: Cell) {
        self.cells.insert(key, cell);
    }

    /// Get a cell, or an empty cell when the column is absent
    pub fn get(&self, key: FieldKey) -> &Cell {
        self.cells.get(&key).unwrap_or(&EMPTY_CELL)
    }

    /// Get a cell as trimmed text
    pub fn text(&self, key: FieldKey) -> Option<String> {
        self.get(key).as_text()
    }

    /// A row with neither identifier nor name is a blank/formatting row
    pub fn is_blank_record(&self) -> bool {
        self.get(FieldKey::EmployeeId).is_empty() && self.get(FieldKey::Name).is_empty()
    }
}

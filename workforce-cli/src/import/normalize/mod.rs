//! Field normalization: raw cells to typed record fields

pub mod dates;
mod record;
pub mod values;

pub use dates::{from_serial, normalize_date_cell, parse_date_text};
pub use record::{expand_projects, normalize_row, normalize_rows};

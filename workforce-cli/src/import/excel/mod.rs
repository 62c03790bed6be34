//! Workbook input and output

mod export;
pub mod headers;
mod reader;
mod template;

pub use export::{export_records, write_export};
pub use headers::{normalize_header, resolve_header};
pub use reader::{read_workbook_bytes, read_workbook_file};
pub use template::{build_template, write_template};

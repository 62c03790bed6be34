//! Workforce spreadsheet import with conflict detection and resolution

pub mod cli;
pub mod config;
pub mod import;
pub mod store;

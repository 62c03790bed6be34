//! Export command handler

use std::path::Path;

use anyhow::Result;
use colored::*;

use super::open_store;
use crate::config::Config;
use crate::import::excel::write_export;
use crate::import::types::CanonicalRecord;
use crate::store::employees;

pub async fn handle_export_command(out: &Path, config: &Config) -> Result<()> {
    let pool = open_store(config).await?;
    let records: Vec<CanonicalRecord> = employees::snapshot(&pool)
        .await?
        .into_iter()
        .map(|employee| employee.record)
        .collect();

    write_export(out, &records)?;

    println!(
        "Exported {} employee(s) to {}",
        records.len(),
        out.display().to_string().bright_green()
    );
    Ok(())
}

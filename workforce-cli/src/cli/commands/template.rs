//! Template command handler

use std::path::Path;

use anyhow::Result;
use colored::*;

use super::open_store;
use crate::config::Config;
use crate::import::excel::write_template;
use crate::store::options;

pub async fn handle_template_command(out: &Path, config: &Config) -> Result<()> {
    let pool = open_store(config).await?;
    let dropdowns = options::all_options(&pool).await?;

    write_template(out, &dropdowns)?;

    println!(
        "Template written to {} ({} dropdown list(s))",
        out.display().to_string().bright_green(),
        dropdowns.len()
    );
    Ok(())
}

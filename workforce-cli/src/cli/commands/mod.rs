//! Subcommand handlers

pub mod employees;
pub mod export;
pub mod import;
pub mod options;
pub mod template;

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::store;

/// Open the configured store and make sure dropdown options exist
pub(crate) async fn open_store(config: &Config) -> Result<SqlitePool> {
    let pool = store::connect(&config.database_path).await?;
    store::options::seed_defaults(&pool, &config.options).await?;
    Ok(pool)
}

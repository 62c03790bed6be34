//! Configurable dropdown values per category (department, location, ...)

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use sqlx::SqlitePool;

use crate::import::types::FieldKey;

/// Categories that back template dropdowns, in column order
pub static CATEGORIES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    FieldKey::ALL
        .iter()
        .filter_map(|key| key.option_category())
        .collect()
});

/// Check if a category name is known
pub fn is_known_category(category: &str) -> bool {
    CATEGORIES.iter().any(|known| *known == category)
}

/// List the values of one category in insertion order
pub async fn list_options(pool: &SqlitePool, category: &str) -> Result<Vec<String>> {
    let values: Vec<String> = sqlx::query_scalar(
        "SELECT value FROM field_options WHERE category = ? ORDER BY position, value",
    )
    .bind(category)
    .fetch_all(pool)
    .await
    .with_context(|| format!("Failed to list options for '{}'", category))?;

    Ok(values)
}

/// All categories with their values
pub async fn all_options(pool: &SqlitePool) -> Result<BTreeMap<String, Vec<String>>> {
    let rows: Vec<(String, String)> = sqlx::query_as(
        "SELECT category, value FROM field_options ORDER BY category, position, value",
    )
    .fetch_all(pool)
    .await
    .context("Failed to list options")?;

    let mut options: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (category, value) in rows {
        options.entry(category).or_default().push(value);
    }
    Ok(options)
}

/// Add a value to a category. Returns `false` if it was already present.
pub async fn add_option(pool: &SqlitePool, category: &str, value: &str) -> Result<bool> {
    let value = value.trim();
    if value.is_empty() {
        anyhow::bail!("Option value must not be empty");
    }

    let result = sqlx::query(
        "INSERT INTO field_options (category, value, position)
         VALUES (?, ?, (SELECT COALESCE(MAX(position), 0) + 1 FROM field_options WHERE category = ?))
         ON CONFLICT(category, value) DO NOTHING",
    )
    .bind(category)
    .bind(value)
    .bind(category)
    .execute(pool)
    .await
    .with_context(|| format!("Failed to add option '{}' to '{}'", value, category))?;

    Ok(result.rows_affected() > 0)
}

/// Remove a value from a category. Returns `false` if it was not present.
pub async fn remove_option(pool: &SqlitePool, category: &str, value: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM field_options WHERE category = ? AND value = ?")
        .bind(category)
        .bind(value.trim())
        .execute(pool)
        .await
        .with_context(|| format!("Failed to remove option '{}' from '{}'", value, category))?;

    Ok(result.rows_affected() > 0)
}

/// Seed categories that have no values yet. Categories already holding
/// values are left alone so removals stick.
pub async fn seed_defaults(pool: &SqlitePool, defaults: &BTreeMap<String, Vec<String>>) -> Result<usize> {
    let mut seeded = 0;
    for (category, values) in defaults {
        if !is_known_category(category) {
            log::warn!("Ignoring options for unknown category '{}'", category);
            continue;
        }
        if !list_options(pool, category).await?.is_empty() {
            continue;
        }
        for value in values {
            if add_option(pool, category, value).await? {
                seeded += 1;
            }
        }
    }

    if seeded > 0 {
        log::info!("Seeded {} option value(s)", seeded);
    }
    Ok(seeded)
}

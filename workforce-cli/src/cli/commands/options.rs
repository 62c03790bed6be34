//! Dropdown option handlers

use anyhow::Result;
use colored::*;

use super::open_store;
use crate::cli::OptionsCommands;
use crate::config::Config;
use crate::store::options::{self, CATEGORIES};

pub async fn handle_options_command(cmd: OptionsCommands, config: &Config) -> Result<()> {
    let pool = open_store(config).await?;

    match cmd {
        OptionsCommands::List { category } => {
            let all = options::all_options(&pool).await?;
            let categories: Vec<&str> = match category.as_deref() {
                Some(c) => vec![check_category(c)?],
                None => CATEGORIES.to_vec(),
            };

            for category in categories {
                println!("{}", category.bold());
                match all.get(category) {
                    Some(values) if !values.is_empty() => {
                        for value in values {
                            println!("  {}", value);
                        }
                    }
                    _ => println!("  {}", "(none)".dimmed()),
                }
            }
        }
        OptionsCommands::Add { category, value } => {
            let category = check_category(&category)?;
            if options::add_option(&pool, category, &value).await? {
                println!("Added '{}' to {}", value.trim().green(), category);
            } else {
                println!("'{}' already present in {}", value.trim(), category);
            }
        }
        OptionsCommands::Remove { category, value } => {
            let category = check_category(&category)?;
            if options::remove_option(&pool, category, &value).await? {
                println!("Removed '{}' from {}", value.trim().red(), category);
            } else {
                anyhow::bail!("'{}' is not an option of {}", value.trim(), category);
            }
        }
    }

    Ok(())
}

/// Map a user-supplied category onto a known one ("Management Mode" → "management_mode")
fn check_category(category: &str) -> Result<&'static str> {
    let wanted = category.trim().to_lowercase().replace([' ', '-'], "_");
    CATEGORIES
        .iter()
        .copied()
        .find(|known| *known == wanted)
        .ok_or_else(|| {
            anyhow::anyhow!(
                "Unknown option category '{}' (expected one of: {})",
                category,
                CATEGORIES.join(", ")
            )
        })
}

//! List and delete handlers

use anyhow::{Context, Result};
use colored::*;
use dialoguer::Confirm;
use is_terminal::IsTerminal;
use uuid::Uuid;

use super::open_store;
use crate::config::Config;
use crate::import::types::StoredEmployee;
use crate::store::employees;

pub async fn handle_list_command(config: &Config) -> Result<()> {
    let pool = open_store(config).await?;
    let stored = employees::snapshot(&pool).await?;

    if stored.is_empty() {
        println!("No employees stored");
        return Ok(());
    }

    println!(
        "{:<36}  {:<12}  {:<28}  {}",
        "Id".bold(),
        "Employee ID".bold(),
        "Name".bold(),
        "Email".bold()
    );
    for employee in &stored {
        println!("{}", list_line(employee));
    }
    println!();
    println!("{} employee(s)", stored.len().to_string().cyan());
    Ok(())
}

fn list_line(employee: &StoredEmployee) -> String {
    format!(
        "{:<36}  {:<12}  {:<28}  {}",
        employee.id,
        employee.record.external_id,
        employee.record.name,
        employee.record.email.as_deref().unwrap_or("-")
    )
}

pub async fn handle_delete_command(ids: &[Uuid], yes: bool, config: &Config) -> Result<()> {
    let pool = open_store(config).await?;

    let mut found = Vec::new();
    for id in ids {
        match employees::get(&pool, *id).await? {
            Some(employee) => found.push(employee),
            None => println!("{} {} not found", "skip:".yellow(), id),
        }
    }

    if found.is_empty() {
        anyhow::bail!("None of the given ids exist");
    }

    println!("About to delete {} employee(s):", found.len());
    for employee in &found {
        println!("  {}", list_line(employee));
    }

    if !yes {
        if !std::io::stdout().is_terminal() {
            anyhow::bail!("Refusing to delete without confirmation; pass --yes");
        }
        let confirmed = Confirm::new()
            .with_prompt("Delete these employees?")
            .default(false)
            .interact()
            .context("Failed to read confirmation")?;
        if !confirmed {
            println!("Cancelled");
            return Ok(());
        }
    }

    let targets: Vec<Uuid> = found.iter().map(|e| e.id).collect();
    let deleted = employees::delete_many(&pool, &targets).await?;
    println!("{} {} employee(s)", "Deleted".bright_green(), deleted);
    Ok(())
}

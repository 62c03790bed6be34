//! Import command handler

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use colored::*;
use dialoguer::Select;
use is_terminal::IsTerminal;
use serde_json::json;

use super::open_store;
use crate::cli::ImportArgs;
use crate::config::Config;
use crate::import::excel::read_workbook_file;
use crate::import::normalize::normalize_rows;
use crate::import::report::{write_errors_csv, write_violations_csv};
use crate::import::types::{ConflictPolicy, ConflictRecord, Resolution, ResolutionAction};
use crate::import::{BatchResult, ImportError, PendingBatch, PlannedWrite, prepare_batch};

pub async fn handle_import_command(args: ImportArgs, config: &Config) -> Result<()> {
    if !args.file.exists() {
        anyhow::bail!("Workbook does not exist: {}", args.file.display());
    }

    let policy = args.policy.unwrap_or(config.default_policy);
    let options = config.import_options();

    let raw_rows = read_workbook_file(&args.file)?;
    let records = normalize_rows(&raw_rows);
    if !args.json {
        println!(
            "Read {} row(s) from {}",
            raw_rows.len(),
            args.file.display().to_string().cyan()
        );
        println!("Policy: {} ({})", policy.to_string().bold(), describe_policy(policy));
    }

    let pool = open_store(config).await?;
    let mut batch = match prepare_batch(&pool, raw_rows, records, &options).await {
        Ok(batch) => batch,
        Err(ImportError::Validation(err)) => {
            for violation in &err.violations {
                eprintln!("  {} {}", "✗".red(), violation);
            }
            if let Some(path) = &args.errors_csv {
                write_violations_csv(path, &err.violations)?;
            }
            return Err(ImportError::Validation(err).into());
        }
        Err(e) => return Err(e.into()),
    };

    batch.apply_policy(policy);

    if let Some(path) = &args.resolutions {
        let resolutions = load_resolutions(path)?;
        match batch.resolve(&resolutions) {
            Ok(()) | Err(ImportError::ConflictRequiresResolution(_)) => {}
            Err(e) => return Err(e.into()),
        }
    }

    if args.dry_run {
        return print_plan(&batch, args.json);
    }

    if !batch.is_ready() {
        if args.json || !std::io::stdout().is_terminal() {
            anyhow::bail!(
                "Conflicts {:?} need a decision; pass --resolutions with a JSON file or use --policy skip|overwrite",
                batch.pending_ids()
            );
        }
        let resolutions = prompt_resolutions(&batch)?;
        batch.resolve(&resolutions)?;
    }

    let result = batch.apply(&pool, &options.apply).await?;

    if let Some(path) = &args.errors_csv {
        if result.has_errors() {
            write_errors_csv(path, &result.errors)?;
        }
    }

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("Failed to format JSON output")?
        );
    } else {
        print_result(&result);
    }

    Ok(())
}

/// Read resolutions from JSON: an array of resolutions or a single one
pub fn load_resolutions(path: &Path) -> Result<Vec<Resolution>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read resolutions file: {}", path.display()))?;

    let value: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("Resolutions file is not valid JSON: {}", path.display()))?;

    let resolutions = if value.is_array() {
        serde_json::from_value(value)
    } else {
        serde_json::from_value(value).map(|r: Resolution| vec![r])
    }
    .with_context(|| format!("Invalid resolutions in {}", path.display()))?;

    Ok(resolutions)
}

/// The dry-run plan as JSON
pub fn plan_json(batch: &PendingBatch) -> serde_json::Value {
    let writes: Vec<serde_json::Value> = match batch.planned_writes() {
        Ok(writes) => writes.iter().map(write_json).collect(),
        Err(_) => Vec::new(),
    };

    json!({
        "inserts": batch.inserts().len(),
        "conflicts": batch.conflicts(),
        "rejected": batch.rejected().iter().map(|r| &r.error).collect::<Vec<_>>(),
        "pending": batch.pending_ids(),
        "writes": writes,
    })
}

fn write_json(write: &PlannedWrite) -> serde_json::Value {
    let record = write.record();
    match write {
        PlannedWrite::Insert { .. } => json!({
            "row": record.row_number,
            "employeeId": record.external_id,
            "action": "create",
        }),
        PlannedWrite::Overwrite { target, .. } => json!({
            "row": record.row_number,
            "employeeId": record.external_id,
            "action": "update",
            "target": target,
        }),
        PlannedWrite::Keep { reason, .. } => json!({
            "row": record.row_number,
            "employeeId": record.external_id,
            "action": "skip",
            "reason": reason,
        }),
        PlannedWrite::Reject { error, .. } => json!({
            "row": record.row_number,
            "employeeId": record.external_id,
            "action": "fail",
            "reason": error.message,
        }),
    }
}

fn print_plan(batch: &PendingBatch, as_json: bool) -> Result<()> {
    if as_json {
        println!(
            "{}",
            serde_json::to_string_pretty(&plan_json(batch)).context("Failed to format JSON output")?
        );
        return Ok(());
    }

    println!("{}", "Dry run, nothing will be written".yellow().bold());
    println!("  {} new record(s)", batch.inserts().len().to_string().green());
    println!("  {} conflict(s)", batch.conflicts().len().to_string().yellow());
    if !batch.rejected().is_empty() {
        println!("  {} rejected row(s)", batch.rejected().len().to_string().red());
    }

    for conflict in batch.conflicts().iter().filter(|c| c.has_differences()) {
        print_conflict(conflict);
    }

    match batch.planned_writes() {
        Ok(writes) => {
            println!();
            println!("Planned writes:");
            for write in &writes {
                let record = write.record();
                let action = match write {
                    PlannedWrite::Insert { .. } => "create".green(),
                    PlannedWrite::Overwrite { .. } => "update".yellow(),
                    PlannedWrite::Keep { .. } => "skip".dimmed(),
                    PlannedWrite::Reject { .. } => "fail".red(),
                };
                println!("  row {:>4}  {:<8} {}", record.row_number, action, record.external_id);
            }
        }
        Err(_) => {
            println!();
            println!(
                "{} conflict(s) {:?} still need a decision",
                batch.pending_ids().len(),
                batch.pending_ids()
            );
        }
    }
    Ok(())
}

fn print_conflict(conflict: &ConflictRecord) {
    let incoming = &conflict.incoming;
    println!();
    println!(
        "{} #{} row {} {} (matched by {})",
        "Conflict".yellow().bold(),
        conflict.id,
        incoming.row_number,
        incoming.external_id.bold(),
        conflict.kind
    );
    if let Some(owner) = conflict.email_owner {
        println!("  {} email also belongs to {}", "note:".dimmed(), owner);
    }
    for diff in &conflict.differences {
        println!(
            "  {:<28} {} → {}",
            diff.field,
            display_value(&diff.existing).red(),
            display_value(&diff.incoming).green()
        );
    }
}

fn display_value(value: &str) -> String {
    if value.is_empty() {
        "(empty)".to_string()
    } else {
        value.to_string()
    }
}

/// Ask about each pending conflict on the terminal
fn prompt_resolutions(batch: &PendingBatch) -> Result<Vec<Resolution>> {
    let choices = [
        "Keep existing",
        "Use incoming",
        "Keep existing for all remaining",
        "Use incoming for all remaining",
    ];

    let pending: Vec<&ConflictRecord> = batch.conflicts().iter().filter(|c| c.is_pending()).collect();
    println!("{} conflict(s) need a decision", pending.len().to_string().yellow());

    let mut resolutions = Vec::new();
    for conflict in pending {
        print_conflict(conflict);

        let selection = Select::new()
            .with_prompt("Resolve")
            .items(&choices[..])
            .default(0)
            .interact()
            .context("Failed to read selection")?;

        match selection {
            0 | 1 => resolutions.push(Resolution::PerConflict {
                conflict_id: conflict.id,
                action: if selection == 0 {
                    ResolutionAction::KeepExisting
                } else {
                    ResolutionAction::UseIncoming
                },
            }),
            _ => {
                resolutions.push(Resolution::BatchDefault {
                    action: if selection == 2 {
                        ResolutionAction::KeepExisting
                    } else {
                        ResolutionAction::UseIncoming
                    },
                });
                break;
            }
        }
    }
    Ok(resolutions)
}

fn print_result(result: &BatchResult) {
    println!();
    println!("{}", "Import finished".bright_green().bold());
    println!("  created: {}", result.created.to_string().green());
    println!("  updated: {}", result.updated.to_string().yellow());
    println!("  skipped: {}", result.skipped.to_string().dimmed());

    if result.has_errors() {
        println!("  failed:  {}", result.failed().to_string().red());
        for error in &result.errors {
            println!(
                "    row {} ({}): {}: {}",
                error.row_number, error.external_id, error.field, error.message
            );
        }
    }
}

fn describe_policy(policy: ConflictPolicy) -> &'static str {
    match policy {
        ConflictPolicy::Skip => "existing records are kept",
        ConflictPolicy::Overwrite => "existing records are replaced",
        ConflictPolicy::Ask => "each conflict is decided individually",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::types::CanonicalRecord;
    use crate::import::{ImportOptions, submit_batch};
    use crate::store::connect_in_memory;
    use std::io::Write;

    fn record(row: usize, id: &str, name: &str) -> CanonicalRecord {
        CanonicalRecord {
            row_number: row,
            external_id: id.into(),
            name: name.into(),
            department: "Engineering".into(),
            designation: "Engineer".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_load_resolutions_accepts_array_and_single() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"kind":"batchDefault","action":"keepExisting"}},{{"kind":"perConflict","conflictId":2,"action":"useIncoming"}}]"#
        )
        .unwrap();
        let list = load_resolutions(file.path()).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(
            list[1],
            Resolution::PerConflict {
                conflict_id: 2,
                action: ResolutionAction::UseIncoming
            }
        );

        let mut single = tempfile::NamedTempFile::new().unwrap();
        write!(single, r#"{{"kind":"batchDefault","action":"useIncoming"}}"#).unwrap();
        assert_eq!(load_resolutions(single.path()).unwrap().len(), 1);
    }

    #[test]
    fn test_load_resolutions_rejects_unknown_action() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"kind":"batchDefault","action":"merge"}}"#).unwrap();
        assert!(load_resolutions(file.path()).is_err());
    }

    #[tokio::test]
    async fn test_plan_json_lists_pending_and_writes() {
        let pool = connect_in_memory().await.unwrap();
        let options = ImportOptions::default();
        submit_batch(&pool, vec![record(2, "E1", "Asha")], ConflictPolicy::Skip, &options)
            .await
            .unwrap();

        let mut batch = prepare_batch(
            &pool,
            Vec::new(),
            vec![record(2, "E1", "Asha R"), record(3, "E2", "Ravi")],
            &options,
        )
        .await
        .unwrap();

        let plan = plan_json(&batch);
        assert_eq!(plan["inserts"], 1);
        assert_eq!(plan["pending"], json!([0]));
        assert!(plan["writes"].as_array().unwrap().is_empty());

        batch.apply_policy(ConflictPolicy::Overwrite);
        let plan = plan_json(&batch);
        assert_eq!(plan["writes"][0]["action"], "update");
        assert_eq!(plan["writes"][1]["action"], "create");
        assert_eq!(plan["writes"][1]["employeeId"], "E2");
    }

    #[tokio::test]
    async fn test_plan_json_reports_rows_aimed_at_one_employee() {
        let pool = connect_in_memory().await.unwrap();
        let options = ImportOptions::default();
        let mut stored = record(2, "E1", "Asha");
        stored.email = Some("a@x.io".into());
        submit_batch(&pool, vec![stored], ConflictPolicy::Skip, &options)
            .await
            .unwrap();

        let mut by_id = record(2, "E1", "Asha");
        by_id.email = Some("b@x.io".into());
        let mut by_email = record(3, "E9", "Asha R");
        by_email.email = Some("a@x.io".into());
        let mut batch = prepare_batch(&pool, Vec::new(), vec![by_id, by_email], &options)
            .await
            .unwrap();
        batch.apply_policy(ConflictPolicy::Overwrite);

        let plan = plan_json(&batch);
        assert_eq!(plan["rejected"][0]["rowNumber"], 3);
        assert_eq!(plan["rejected"][0]["field"], "email");
        assert_eq!(plan["writes"][1]["action"], "fail");
        assert_eq!(plan["writes"][1]["employeeId"], "E9");
    }
}

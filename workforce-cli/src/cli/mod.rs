//! Command-line interface

pub mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::config::Config;
use crate::import::types::ConflictPolicy;

#[derive(Parser, Debug)]
#[command(name = "workforce-cli")]
#[command(about = "Bulk import of workforce spreadsheets with conflict resolution")]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to $CONFIG_DIR/workforce-cli/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Import employees from an .xlsx workbook
    #[command(after_help = "\
Examples:
  workforce-cli import staff.xlsx
  workforce-cli import staff.xlsx --policy overwrite --json
  workforce-cli import staff.xlsx --policy ask --resolutions decisions.json
  workforce-cli import staff.xlsx --dry-run")]
    Import(ImportArgs),

    /// Write a blank import template with sample rows and dropdowns
    Template {
        /// Output .xlsx path
        out: PathBuf,
    },

    /// Export every stored employee to a workbook in import format
    Export {
        /// Output .xlsx path
        out: PathBuf,
    },

    /// List stored employees
    List,

    /// Delete employees by internal id
    Delete {
        /// Internal ids, as shown by `list`
        #[arg(required = true)]
        ids: Vec<Uuid>,

        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Manage dropdown values used by the template
    #[command(subcommand)]
    Options(OptionsCommands),
}

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// Workbook to import (first worksheet is read)
    pub file: PathBuf,

    /// How conflicts with stored employees are handled: skip, overwrite or ask
    #[arg(long, short = 'p')]
    pub policy: Option<ConflictPolicy>,

    /// JSON file with resolutions for `ask`
    #[arg(long, value_name = "PATH")]
    pub resolutions: Option<PathBuf>,

    /// Validate and match without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Write failed rows to this CSV file
    #[arg(long, value_name = "PATH")]
    pub errors_csv: Option<PathBuf>,

    /// Print the batch result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum OptionsCommands {
    /// Show values, for one category or all of them
    List {
        category: Option<String>,
    },
    /// Add a value to a category
    Add {
        category: String,
        value: String,
    },
    /// Remove a value from a category
    Remove {
        category: String,
        value: String,
    },
}

/// Run a parsed command line
pub async fn run(cli: Cli) -> Result<()> {
    if cli.no_color {
        colored::control::set_override(false);
    }

    let config = Config::load(cli.config.as_deref())?;
    log::debug!("Using database {}", config.database_path.display());

    match cli.command {
        Commands::Import(args) => commands::import::handle_import_command(args, &config).await,
        Commands::Template { out } => commands::template::handle_template_command(&out, &config).await,
        Commands::Export { out } => commands::export::handle_export_command(&out, &config).await,
        Commands::List => commands::employees::handle_list_command(&config).await,
        Commands::Delete { ids, yes } => {
            commands::employees::handle_delete_command(&ids, yes, &config).await
        }
        Commands::Options(cmd) => commands::options::handle_options_command(cmd, &config).await,
    }
}

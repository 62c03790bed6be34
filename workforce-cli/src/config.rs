//! Configuration loaded from a TOML file, with environment overrides
//!
//! Lookup order: built-in defaults, then the config file
//! (`$CONFIG_DIR/workforce-cli/config.toml` or `--config`), then the
//! `WORKFORCE_DB` and `WORKFORCE_ACTOR` environment variables.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::import::apply::ApplyContext;
use crate::import::detect::{CompareOptions, DEFAULT_PROJECT_SUFFIX};
use crate::import::pipeline::ImportOptions;
use crate::import::types::ConflictPolicy;

const APP_DIR: &str = "workforce-cli";
const CONFIG_FILE: &str = "config.toml";
const DATABASE_FILE: &str = "workforce.db";

pub const ENV_DATABASE: &str = "WORKFORCE_DB";
pub const ENV_ACTOR: &str = "WORKFORCE_ACTOR";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid setting {key}: {message}")]
    Invalid { key: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database file
    pub database_path: PathBuf,
    /// Name written to created_by / updated_by
    pub actor: String,
    /// Policy used when `import` is run without `--policy`
    pub default_policy: ConflictPolicy,
    /// Upper bound for a single store write, in seconds
    pub write_timeout_secs: u64,
    /// Suffix of placeholder project names, as in "Acme - Default Project"
    pub default_project_suffix: String,
    /// Dropdown values seeded into the option store on first use
    pub options: BTreeMap<String, Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_path: default_database_path(),
            actor: "import".to_string(),
            default_policy: ConflictPolicy::Skip,
            write_timeout_secs: 10,
            default_project_suffix: DEFAULT_PROJECT_SUFFIX.to_string(),
            options: default_options(),
        }
    }
}

fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(DATABASE_FILE)
}

fn default_options() -> BTreeMap<String, Vec<String>> {
    let lists: [(&str, &[&str]); 6] = [
        (
            "department",
            &["Engineering", "Delivery", "Quality", "Design", "Operations", "Sales"],
        ),
        (
            "designation",
            &[
                "Associate Engineer",
                "Engineer",
                "Senior Engineer",
                "Tech Lead",
                "Project Manager",
                "Delivery Manager",
            ],
        ),
        (
            "location",
            &["Bengaluru", "Mumbai", "Pune", "Hyderabad", "Chennai", "Remote"],
        ),
        ("management_mode", &["Managed", "Self", "Client Managed"]),
        (
            "billability_status",
            &["Billable", "Non-Billable", "Bench", "Shadow"],
        ),
        (
            "experience_band",
            &["0-2 years", "2-5 years", "5-8 years", "8-12 years", "12+ years"],
        ),
    ];

    lists
        .iter()
        .map(|(category, values)| {
            (
                category.to_string(),
                values.iter().map(|v| v.to_string()).collect(),
            )
        })
        .collect()
}

/// `$CONFIG_DIR/workforce-cli/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

impl Config {
    /// Load configuration. An explicit path must exist; the default path may be absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => {
                    log::debug!("No config file found, using defaults");
                    Config::default()
                }
            },
        };

        config.apply_overrides(
            std::env::var(ENV_DATABASE).ok(),
            std::env::var(ENV_ACTOR).ok(),
        );
        config.check()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Apply environment-style overrides; blank values are ignored
    pub fn apply_overrides(&mut self, database: Option<String>, actor: Option<String>) {
        if let Some(db) = database.filter(|v| !v.trim().is_empty()) {
            self.database_path = PathBuf::from(db.trim());
        }
        if let Some(actor) = actor.filter(|v| !v.trim().is_empty()) {
            self.actor = actor.trim().to_string();
        }
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.write_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "write_timeout_secs".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.actor.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "actor".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }

    /// Pipeline settings derived from this configuration
    pub fn import_options(&self) -> ImportOptions {
        ImportOptions {
            apply: ApplyContext {
                actor: self.actor.clone(),
                write_timeout: self.write_timeout(),
            },
            compare: CompareOptions {
                default_project_suffix: self.default_project_suffix.clone(),
            },
        }
    }
}

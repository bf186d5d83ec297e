use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::db::Database;
use crate::error::{TrackerError, TrackerResult};
use crate::models::DEFAULT_LIST_LIMIT;
use crate::tracker::DEFAULT_FOLLOW_UP_DAYS;

/// Overrides the database location from the config file.
pub const DB_PATH_ENV: &str = "JOBTRACK_DB";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// SQLite file; defaults to the platform data directory.
    pub database_path: Option<PathBuf>,

    /// Used when `RUST_LOG` is not set.
    pub log_level: String,

    /// How far ahead follow-up reminders look.
    pub follow_up_days: i64,

    pub list_limit: usize,

    pub agent: AgentConfig,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            log_level: "info".to_string(),
            follow_up_days: DEFAULT_FOLLOW_UP_DAYS,
            list_limit: DEFAULT_LIST_LIMIT,
            agent: AgentConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Maximum discovered applications prepared per run.
    pub daily_limit: usize,

    /// Companies whose listings are marked high priority.
    pub target_companies: Vec<String>,

    /// Model name passed to `ai::resolve_model`.
    pub model: String,

    /// JSON file of job listings read during discovery.
    pub listings_path: Option<PathBuf>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            daily_limit: 5,
            target_companies: Vec::new(),
            model: "template".to_string(),
            listings_path: None,
        }
    }
}

impl TrackerConfig {
    pub fn load_from_file(path: &Path) -> TrackerResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TrackerError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
            .map_err(|e| TrackerError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Loads `explicit` if given, else the default config file if it exists, else defaults.
    /// `JOBTRACK_DB` wins over any configured database path.
    pub fn load(explicit: Option<&Path>) -> TrackerResult<Self> {
        let mut config = match explicit {
            Some(path) => Self::load_from_file(path)?,
            None => match Self::default_file() {
                Some(path) if path.exists() => Self::load_from_file(&path)?,
                _ => Self::default(),
            },
        };

        if let Ok(db_path) = std::env::var(DB_PATH_ENV) {
            if !db_path.trim().is_empty() {
                config.database_path = Some(PathBuf::from(db_path));
            }
        }

        Ok(config)
    }

    pub fn default_file() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "jobtrack")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(Database::default_path)
    }
}

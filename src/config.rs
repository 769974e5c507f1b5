//! Runtime configuration.
//!
//! Resolution order: built-in defaults, then `taskboard.json` (or an explicit
//! `--config` file), then environment variables. CLI flags are applied last by
//! `main`.

use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "taskboard.json";

pub const ENV_DATABASE: &str = "TASKBOARD_DB";
pub const ENV_LOG_FILE: &str = "TASKBOARD_LOG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite file holding users and tasks.
    pub database_path: PathBuf,
    /// Log output file. The terminal belongs to the UI, so logs never go to stdout.
    pub log_path: PathBuf,
    /// Filter directive used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("task_manager.db"),
            log_path: PathBuf::from("taskboard.log"),
            log_filter: "taskboard=info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// With `explicit` set, that file must exist. Otherwise `taskboard.json` in
    /// the working directory is read if present.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&data).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Override fields from environment lookups. Empty values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(db) = lookup(ENV_DATABASE).filter(|v| !v.is_empty()) {
            self.database_path = PathBuf::from(db);
        }
        if let Some(log) = lookup(ENV_LOG_FILE).filter(|v| !v.is_empty()) {
            self.log_path = PathBuf::from(log);
        }
    }
}

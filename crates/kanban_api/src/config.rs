//! Environment-driven configuration for the request layer.
//!
//! # Invariants
//! - Blank variables are treated as unset.
//! - File logging runs only when `KANBAN_LOG_DIR` is set. A relative value is
//!   kept here and rejected by `KanbanApi::start` with
//!   `LoggingError::InvalidDirectory`.

use kanban_core::{LogLevel, LoggingError};
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "KANBAN_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "KANBAN_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "KANBAN_LOG_DIR";

const DEFAULT_DB_FILE_NAME: &str = "kanban.sqlite3";

/// Resolved request-layer settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// SQLite database file opened per request.
    pub db_path: PathBuf,
    pub log_level: LogLevel,
    /// Rolling log directory. `None` keeps file logging disabled.
    pub log_dir: Option<PathBuf>,
}

impl ApiConfig {
    /// Config with defaults and the given database file.
    pub fn with_db_path(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            log_level: LogLevel::default_for_build(),
            log_dir: None,
        }
    }

    /// Reads `KANBAN_DB_PATH`, `KANBAN_LOG_LEVEL` and `KANBAN_LOG_DIR`.
    pub fn from_env() -> Result<Self, LoggingError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves config through `lookup` instead of the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, LoggingError> {
        let read = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let db_path = read(DB_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME));
        let log_level = match read(LOG_LEVEL_ENV) {
            Some(raw) => raw.parse()?,
            None => LogLevel::default_for_build(),
        };

        Ok(Self {
            db_path,
            log_level,
            log_dir: read(LOG_DIR_ENV).map(PathBuf::from),
        })
    }
}

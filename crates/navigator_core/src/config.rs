//! Runtime configuration resolved from the environment.
//!
//! # Invariants
//! - Blank environment values are treated as unset.
//! - Resolution never fails; missing values fall back to defaults.

use crate::logging::default_log_level;
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "NAVIGATOR_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "NAVIGATOR_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "NAVIGATOR_LOG_DIR";

const DEFAULT_DB_FILE_NAME: &str = "domain_navigator.sqlite3";

/// Process configuration for hosts embedding the navigator core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigatorConfig {
    /// Table store file.
    pub db_path: PathBuf,
    /// One of `trace|debug|info|warn|error`; validated by `init_logging`.
    pub log_level: String,
    /// Rolling log directory. `None` keeps file logging off.
    pub log_dir: Option<PathBuf>,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl NavigatorConfig {
    /// Reads `NAVIGATOR_*` variables from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let defaults = Self::default();
        Self {
            db_path: read(DB_PATH_ENV).map_or(defaults.db_path, PathBuf::from),
            log_level: read(LOG_LEVEL_ENV).unwrap_or(defaults.log_level),
            log_dir: read(LOG_DIR_ENV).map(PathBuf::from),
        }
    }
}

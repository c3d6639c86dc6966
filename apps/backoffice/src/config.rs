//! # Backoffice Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Command line (--db)                            (highest priority)  │
//! │                                                                         │
//! │  2. Environment Variables                                              │
//! │     GROCER_DB_PATH=/srv/grocerdesk.db                                  │
//! │     GROCER_MAX_CONNECTIONS=8                                           │
//! │     GROCER_LOW_STOCK_THRESHOLD=5                                       │
//! │     GROCER_REPORT_DAYS=7                                               │
//! │     GROCER_PAGE_SIZE=50                                                │
//! │                                                                         │
//! │  3. TOML Config File (--config, or the platform config dir)            │
//! │     ~/.config/grocerdesk/grocerdesk.toml (Linux)                       │
//! │     ~/Library/Application Support/com.grocerdesk.grocerdesk/… (macOS)  │
//! │                                                                         │
//! │  4. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "/srv/grocerdesk/grocerdesk.db"
//! max_connections = 5
//! acquire_timeout_secs = 30
//! busy_timeout_ms = 5000
//! run_migrations = true
//!
//! [inventory]
//! low_stock_threshold = 10
//!
//! [reports]
//! default_days = 30
//! page_size = 20
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use grocer_core::report::{DEFAULT_REPORT_DAYS, MAX_PAGE_SIZE, MAX_REPORT_DAYS};
use grocer_core::DEFAULT_LOW_STOCK_THRESHOLD;
use grocer_db::DbConfig;

const CONFIG_FILE: &str = "grocerdesk.toml";
const DB_FILE: &str = "grocerdesk.db";

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

/// Database settings. Mapped onto [`DbConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Database file. Defaults to the platform data dir.
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Wait for a free pooled connection (seconds).
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,

    /// Wait for SQLite's write lock (milliseconds).
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,

    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

fn default_max_connections() -> u32 {
    5
}

fn default_acquire_timeout() -> u64 {
    30
}

fn default_busy_timeout() -> u64 {
    5000
}

fn default_true() -> bool {
    true
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout(),
            busy_timeout_ms: default_busy_timeout(),
            run_migrations: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventorySettings {
    /// Stock at or below this level counts as low.
    #[serde(default = "default_threshold")]
    pub low_stock_threshold: i64,
}

fn default_threshold() -> i64 {
    DEFAULT_LOW_STOCK_THRESHOLD
}

impl Default for InventorySettings {
    fn default() -> Self {
        InventorySettings {
            low_stock_threshold: default_threshold(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSettings {
    /// Trailing window used when a report gets no `--days`/`--from`.
    #[serde(default = "default_report_days")]
    pub default_days: u32,

    /// Page size used when a listing gets no `--page-size`.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_report_days() -> u32 {
    DEFAULT_REPORT_DAYS
}

fn default_page_size() -> u32 {
    20
}

impl Default for ReportSettings {
    fn default() -> Self {
        ReportSettings {
            default_days: default_report_days(),
            page_size: default_page_size(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete backoffice configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackofficeConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub inventory: InventorySettings,

    #[serde(default)]
    pub reports: ReportSettings,
}

impl BackofficeConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`--config`, else the platform config dir)
    /// 3. Environment variables
    ///
    /// An explicit `--config` path that does not exist is an error; a
    /// missing default file is not.
    pub fn load(config_path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match config_path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                Some(path) => {
                    debug!(?path, "Config file not found, using defaults");
                    Self::default()
                }
                None => Self::default(),
            },
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Parses one TOML file; absent sections and keys keep their defaults.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        info!(?path, "Loading config from file");

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies `GROCER_*` overrides. Unparseable values are logged and
    /// ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("GROCER_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(value) = lookup("GROCER_MAX_CONNECTIONS") {
            match value.parse() {
                Ok(n) => self.database.max_connections = n,
                Err(_) => warn!(value = %value, "Ignoring invalid GROCER_MAX_CONNECTIONS"),
            }
        }

        if let Some(value) = lookup("GROCER_LOW_STOCK_THRESHOLD") {
            match value.parse() {
                Ok(n) => self.inventory.low_stock_threshold = n,
                Err(_) => warn!(value = %value, "Ignoring invalid GROCER_LOW_STOCK_THRESHOLD"),
            }
        }

        if let Some(value) = lookup("GROCER_REPORT_DAYS") {
            match value.parse() {
                Ok(n) => self.reports.default_days = n,
                Err(_) => warn!(value = %value, "Ignoring invalid GROCER_REPORT_DAYS"),
            }
        }

        if let Some(value) = lookup("GROCER_PAGE_SIZE") {
            match value.parse() {
                Ok(n) => self.reports.page_size = n,
                Err(_) => warn!(value = %value, "Ignoring invalid GROCER_PAGE_SIZE"),
            }
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if self.inventory.low_stock_threshold < 0 {
            return Err(ConfigError::Invalid(
                "inventory.low_stock_threshold must not be negative".into(),
            ));
        }

        if self.reports.default_days == 0 || self.reports.default_days > MAX_REPORT_DAYS {
            return Err(ConfigError::Invalid(format!(
                "reports.default_days must be between 1 and {}",
                MAX_REPORT_DAYS
            )));
        }

        if self.reports.page_size == 0 || self.reports.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::Invalid(format!(
                "reports.page_size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        Ok(())
    }

    /// Configured database path, else `grocerdesk.db` in the platform data
    /// dir, else the working directory.
    pub fn database_path(&self) -> PathBuf {
        if let Some(path) = &self.database.path {
            return path.clone();
        }

        directories::ProjectDirs::from("com", "grocerdesk", "grocerdesk")
            .map(|dirs| dirs.data_dir().join(DB_FILE))
            .unwrap_or_else(|| PathBuf::from(DB_FILE))
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path())
            .max_connections(self.database.max_connections)
            .connect_timeout(Duration::from_secs(self.database.acquire_timeout_secs))
            .busy_timeout(Duration::from_millis(self.database.busy_timeout_ms))
            .run_migrations(self.database.run_migrations)
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "grocerdesk", "grocerdesk")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = BackofficeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.inventory.low_stock_threshold, 10);
        assert_eq!(config.reports.default_days, 30);
        assert_eq!(config.database.max_connections, 5);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[inventory]\nlow_stock_threshold = 3\n\n[database]\npath = \"/tmp/shop.db\"").unwrap();

        let config = BackofficeConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.inventory.low_stock_threshold, 3);
        assert_eq!(config.database_path(), PathBuf::from("/tmp/shop.db"));
        assert_eq!(config.database.busy_timeout_ms, 5000);
        assert_eq!(config.reports, ReportSettings::default());
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            BackofficeConfig::load(Some(&missing)),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_bad_toml_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[reports]\npage_size = \"many\"").unwrap();
        assert!(matches!(
            BackofficeConfig::from_file(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("GROCER_DB_PATH", "/data/store.db"),
            ("GROCER_MAX_CONNECTIONS", "8"),
            ("GROCER_PAGE_SIZE", "50"),
            ("GROCER_REPORT_DAYS", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = BackofficeConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.database_path(), PathBuf::from("/data/store.db"));
        assert_eq!(config.database.max_connections, 8);
        assert_eq!(config.reports.page_size, 50);
        assert_eq!(config.reports.default_days, 30);
    }

    #[test]
    fn test_validation() {
        let mut config = BackofficeConfig::default();
        config.reports.page_size = 500;
        assert!(config.validate().is_err());

        let mut config = BackofficeConfig::default();
        config.inventory.low_stock_threshold = -1;
        assert!(config.validate().is_err());

        let mut config = BackofficeConfig::default();
        config.database.max_connections = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_db_config_mapping() {
        let mut config = BackofficeConfig::default();
        config.database.path = Some(PathBuf::from("/tmp/x.db"));
        config.database.busy_timeout_ms = 250;

        let db = config.db_config();
        assert_eq!(db.database_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(db.busy_timeout, Duration::from_millis(250));
        assert!(db.run_migrations);
    }
}

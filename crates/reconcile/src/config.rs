//! Configuration via `vaultsync.toml` and environment variables
//!
//! Loading order: defaults, then the config file (if any), then environment
//! overrides, then validation. The reconciler itself only ever sees the
//! resulting [`ReconcilerConfig`]; nothing reads the environment at call
//! time.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use vaultsync_backup::validate_table_name;
use vaultsync_core::{Error, Result};
use vaultsync_primary::Endpoint;

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = "vaultsync.toml";

/// Operational collection name override.
pub const ENV_COLLECTION_NAME: &str = "CHROMA_COLLECTION_NAME";
/// Backup table name override.
pub const ENV_BACKUP_TABLE: &str = "BACKUP_TABLE";
/// Restore target collection override.
pub const ENV_RESTORE_COLLECTION: &str = "NEW_COLLECTION_NAME";
/// Primary host override.
pub const ENV_HOST: &str = "CHROMADB_HOST";
/// Primary port override.
pub const ENV_PORT: &str = "CHROMADB_PORT";
/// Primary TLS flag override (`true`, `1` or `yes` enable it).
pub const ENV_USE_TLS: &str = "CHROMADB_USE_SSL";
/// Request timeout override.
pub const ENV_TIMEOUT_MS: &str = "VAULTSYNC_TIMEOUT_MS";
/// Backup database path override.
pub const ENV_BACKUP_PATH: &str = "VAULTSYNC_BACKUP_PATH";
/// Restore cooldown override.
pub const ENV_RESTORE_COOLDOWN_SECS: &str = "VAULTSYNC_RESTORE_COOLDOWN_SECS";
/// Export period override.
pub const ENV_EXPORT_INTERVAL_SECS: &str = "VAULTSYNC_EXPORT_INTERVAL_SECS";
/// Health check period override.
pub const ENV_HEALTH_INTERVAL_SECS: &str = "VAULTSYNC_HEALTH_INTERVAL_SECS";

fn default_collection_name() -> String {
    "my_collection".to_string()
}

fn default_backup_table() -> String {
    "chroma_data".to_string()
}

fn default_restore_collection() -> String {
    "imported_collection".to_string()
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_timeout_ms() -> u64 {
    vaultsync_primary::DEFAULT_TIMEOUT_MS
}

fn default_backup_path() -> PathBuf {
    PathBuf::from("vaultsync.db")
}

fn default_export_interval_secs() -> u64 {
    3600
}

fn default_health_interval_secs() -> u64 {
    1200
}

/// Settings the reconciler is constructed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Operational collection exported from and probed (default: `my_collection`)
    pub collection_name: String,
    /// Backup table name, used in log fields (default: `chroma_data`)
    pub backup_table: String,
    /// Collection restore writes into (default: `imported_collection`)
    pub restore_collection: String,
    /// Minimum spacing between health-triggered restores (default: none)
    pub restore_cooldown: Option<Duration>,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        ReconcilerConfig {
            collection_name: default_collection_name(),
            backup_table: default_backup_table(),
            restore_collection: default_restore_collection(),
            restore_cooldown: None,
        }
    }
}

impl ReconcilerConfig {
    /// Check names are usable and restore never targets the live collection.
    ///
    /// # Errors
    ///
    /// Returns a config error describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        validate_collection_name("collection_name", &self.collection_name)?;
        validate_collection_name("restore_collection", &self.restore_collection)?;
        validate_table_name(&self.backup_table)?;
        if self.collection_name == self.restore_collection {
            return Err(Error::config(format!(
                "restore_collection must differ from collection_name (both '{}')",
                self.collection_name
            )));
        }
        Ok(())
    }
}

fn validate_collection_name(field: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::config(format!("{} must not be empty", field)));
    }
    if name.chars().any(|c| c == '/' || c == '?' || c == '#' || c.is_whitespace()) {
        return Err(Error::config(format!(
            "{} '{}' contains characters not allowed in a collection name",
            field, name
        )));
    }
    Ok(())
}

/// `[primary]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryConfig {
    /// Hostname (default: `localhost`)
    #[serde(default = "default_host")]
    pub host: String,
    /// Port (default: 8000)
    #[serde(default = "default_port")]
    pub port: u16,
    /// Use https (default: false)
    #[serde(default)]
    pub use_tls: bool,
    /// Per-request timeout in milliseconds (default: 30000)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for PrimaryConfig {
    fn default() -> Self {
        PrimaryConfig {
            host: default_host(),
            port: default_port(),
            use_tls: false,
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// `[backup]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupConfig {
    /// SQLite database file (default: `vaultsync.db`)
    #[serde(default = "default_backup_path")]
    pub path: PathBuf,
}

impl Default for BackupConfig {
    fn default() -> Self {
        BackupConfig {
            path: default_backup_path(),
        }
    }
}

/// `[schedule]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Seconds between exports (default: 3600)
    #[serde(default = "default_export_interval_secs")]
    pub export_interval_secs: u64,
    /// Seconds between health checks (default: 1200)
    #[serde(default = "default_health_interval_secs")]
    pub health_interval_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        ScheduleConfig {
            export_interval_secs: default_export_interval_secs(),
            health_interval_secs: default_health_interval_secs(),
        }
    }
}

impl ScheduleConfig {
    /// Export period
    pub fn export_interval(&self) -> Duration {
        Duration::from_secs(self.export_interval_secs)
    }

    /// Health check period
    pub fn health_interval(&self) -> Duration {
        Duration::from_secs(self.health_interval_secs)
    }
}

/// Full configuration loaded from `vaultsync.toml`.
///
/// # Example
///
/// ```toml
/// collection_name = "my_collection"
/// backup_table = "chroma_data"
/// restore_collection = "imported_collection"
///
/// [primary]
/// host = "localhost"
/// port = 8000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Operational collection name
    #[serde(default = "default_collection_name")]
    pub collection_name: String,
    /// Backup table name
    #[serde(default = "default_backup_table")]
    pub backup_table: String,
    /// Restore target collection name
    #[serde(default = "default_restore_collection")]
    pub restore_collection: String,
    /// Minimum seconds between health-triggered restores; unset = no limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restore_cooldown_secs: Option<u64>,
    /// Primary store endpoint
    #[serde(default)]
    pub primary: PrimaryConfig,
    /// Backup store location
    #[serde(default)]
    pub backup: BackupConfig,
    /// Scheduler periods
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            collection_name: default_collection_name(),
            backup_table: default_backup_table(),
            restore_collection: default_restore_collection(),
            restore_cooldown_secs: None,
            primary: PrimaryConfig::default(),
            backup: BackupConfig::default(),
            schedule: ScheduleConfig::default(),
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| {
        Error::config(format!("invalid value '{}' for {}: {}", value, key, e))
    })
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes"
    )
}

impl SyncConfig {
    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# vaultsync configuration
#
# Every value below can also be set through the environment variable
# named in its comment; the environment wins over this file.

# Live collection that is exported and health-checked (CHROMA_COLLECTION_NAME)
collection_name = "my_collection"

# Backup table inside the SQLite database (BACKUP_TABLE)
backup_table = "chroma_data"

# Collection that restore recreates and fills (NEW_COLLECTION_NAME).
# Must differ from collection_name; promoting it is left to the operator.
restore_collection = "imported_collection"

# Minimum seconds between restores triggered by failed health checks
# (VAULTSYNC_RESTORE_COOLDOWN_SECS). Unset = restore on every failed check.
# restore_cooldown_secs = 3600

[primary]
host = "localhost"        # CHROMADB_HOST
port = 8000               # CHROMADB_PORT
use_tls = false           # CHROMADB_USE_SSL
timeout_ms = 30000        # VAULTSYNC_TIMEOUT_MS

[backup]
path = "vaultsync.db"     # VAULTSYNC_BACKUP_PATH

[schedule]
export_interval_secs = 3600   # VAULTSYNC_EXPORT_INTERVAL_SECS
health_interval_secs = 1200   # VAULTSYNC_HEALTH_INTERVAL_SECS
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        toml::from_str(&content).map_err(|e| {
            Error::config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Build the effective configuration.
    ///
    /// Reads `path` if given (a missing file is an error), otherwise starts
    /// from defaults; then applies the process environment and validates.
    ///
    /// # Errors
    ///
    /// Returns a config error on unreadable files, bad values or failed
    /// validation.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_env(std::env::vars())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from `(name, value)` pairs; unknown names are ignored.
    ///
    /// # Errors
    ///
    /// Returns a config error if a numeric value does not parse.
    pub fn apply_env<I, K, V>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let (key, value) = (key.as_ref(), value.as_ref());
            match key {
                ENV_COLLECTION_NAME => self.collection_name = value.to_string(),
                ENV_BACKUP_TABLE => self.backup_table = value.to_string(),
                ENV_RESTORE_COLLECTION => self.restore_collection = value.to_string(),
                ENV_HOST => self.primary.host = value.to_string(),
                ENV_PORT => self.primary.port = parse_env(key, value)?,
                ENV_USE_TLS => self.primary.use_tls = parse_flag(value),
                ENV_TIMEOUT_MS => self.primary.timeout_ms = parse_env(key, value)?,
                ENV_BACKUP_PATH => self.backup.path = PathBuf::from(value),
                ENV_RESTORE_COOLDOWN_SECS => {
                    self.restore_cooldown_secs = if value.trim().is_empty() {
                        None
                    } else {
                        Some(parse_env(key, value)?)
                    }
                }
                ENV_EXPORT_INTERVAL_SECS => {
                    self.schedule.export_interval_secs = parse_env(key, value)?
                }
                ENV_HEALTH_INTERVAL_SECS => {
                    self.schedule.health_interval_secs = parse_env(key, value)?
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns a config error describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        self.reconciler_config().validate()?;
        if self.primary.host.trim().is_empty() {
            return Err(Error::config("primary.host must not be empty"));
        }
        if self.primary.port == 0 {
            return Err(Error::config("primary.port must be non-zero"));
        }
        if self.primary.timeout_ms == 0 {
            return Err(Error::config("primary.timeout_ms must be non-zero"));
        }
        if self.schedule.export_interval_secs == 0 || self.schedule.health_interval_secs == 0 {
            return Err(Error::config("schedule intervals must be non-zero"));
        }
        Ok(())
    }

    /// Settings for the reconciler
    pub fn reconciler_config(&self) -> ReconcilerConfig {
        ReconcilerConfig {
            collection_name: self.collection_name.clone(),
            backup_table: self.backup_table.clone(),
            restore_collection: self.restore_collection.clone(),
            restore_cooldown: self.restore_cooldown_secs.map(Duration::from_secs),
        }
    }

    /// Primary store endpoint
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(
            self.primary.host.clone(),
            self.primary.port,
            self.primary.use_tls,
        )
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(true)` if the file was created.
    pub fn write_default_if_missing(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        std::fs::write(path, Self::default_toml()).map_err(|e| {
            Error::config(format!(
                "Failed to write default config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Ok(true)
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            Error::config(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}

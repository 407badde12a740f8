//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration comes from a small TOML file. Root folder priority:
//! 1. Command-line argument (highest priority)
//! 2. `SORTDESK_ROOT_FOLDER` environment variable
//! 3. TOML config file (`root_folder`)
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or unreadable config file never stops startup: a warning is logged
//! and built-in defaults are used.

use crate::db::DayDefaults;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "SORTDESK_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "sortdesk.db";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Root folder holding the database (optional)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Explicit database path; defaults to `<root_folder>/sortdesk.db`
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub day: DayConfig,

    #[serde(default)]
    pub store: StoreConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Defaults applied to a Day created lazily by an import or a scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayConfig {
    /// Sorting cutoff, `HH:MM`
    #[serde(default = "default_cutoff")]
    pub cutoff: Option<String>,

    #[serde(default = "default_cutoff_enforced")]
    pub cutoff_enforced: bool,
}

impl Default for DayConfig {
    fn default() -> Self {
        Self {
            cutoff: default_cutoff(),
            cutoff_enforced: default_cutoff_enforced(),
        }
    }
}

impl DayConfig {
    /// Validate and convert into the defaults handed to `DayStore::create_day`
    pub fn to_day_defaults(&self) -> Result<DayDefaults> {
        let cutoff = self
            .cutoff
            .as_deref()
            .map(crate::time::parse_cutoff)
            .transpose()
            .map_err(|e| Error::Config(format!("[day] cutoff: {}", e)))?;

        Ok(DayDefaults {
            cutoff,
            cutoff_enforced: cutoff.is_some() && self.cutoff_enforced,
        })
    }
}

/// Store tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Upper bound for retrying writes that hit SQLite lock contention
    #[serde(default = "default_max_lock_wait_ms")]
    pub max_lock_wait_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_lock_wait_ms: default_max_lock_wait_ms(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_cutoff() -> Option<String> {
    Some("22:30".to_string())
}

fn default_cutoff_enforced() -> bool {
    true
}

fn default_max_lock_wait_ms() -> u64 {
    5000
}

/// Load a TOML config from an explicit path
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Load the config file, falling back to defaults when it is absent or invalid
///
/// `explicit` (from `--config`) takes precedence over the platform locations.
pub fn load_or_default(explicit: Option<&Path>) -> TomlConfig {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => default_config_path(),
    };

    match path {
        Some(path) => match load_toml_config(&path) {
            Ok(config) => {
                info!("Loaded configuration from {}", path.display());
                config
            }
            Err(e) => {
                warn!("{}; using built-in defaults", e);
                TomlConfig::default()
            }
        },
        None => {
            info!("No configuration file found; using built-in defaults");
            TomlConfig::default()
        }
    }
}

/// Platform config file location, if one exists
fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("sortdesk").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/sortdesk/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Resolves the root folder following the documented priority order
pub struct RootFolderResolver {
    cli_arg: Option<PathBuf>,
    toml_root: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(cli_arg: Option<PathBuf>, config: &TomlConfig) -> Self {
        Self {
            cli_arg,
            toml_root: config.root_folder.clone(),
        }
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &self.toml_root {
            return path.clone();
        }

        default_root_folder()
    }
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("sortdesk"))
        .unwrap_or_else(|| PathBuf::from("./sortdesk_data"))
}

/// Database location: explicit `database_path`, else `<root>/sortdesk.db`
pub fn database_path(root_folder: &Path, config: &TomlConfig) -> PathBuf {
    config
        .database_path
        .clone()
        .unwrap_or_else(|| root_folder.join(DATABASE_FILE_NAME))
}

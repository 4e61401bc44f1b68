//! Configuration for the grid editor
//!
//! Configuration is loaded in order of precedence:
//! 1. Environment variables (highest priority)
//! 2. Config file (~/.config/gridedit/config.toml)
//! 3. Built-in defaults (lowest priority)

use crate::grid::{FieldSpec, TableSchema};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

// ─────────────────────────────────────────────────────────────────────────────
// Submodules
// ─────────────────────────────────────────────────────────────────────────────

mod grid;
mod logging;
mod persistence;
mod serialization;


// ─────────────────────────────────────────────────────────────────────────────
// Re-exports (maintain public API)
// ─────────────────────────────────────────────────────────────────────────────

pub use grid::{default_columns, FileNotifications, NotificationsConfig};
pub use logging::{FileLogging, LogRotation, LoggingConfig};
pub use persistence::{FilePersistence, HttpMethod, PersistenceConfig, PersistenceMode};

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default table title
const DEFAULT_TITLE: &str = "Records";

// ─────────────────────────────────────────────────────────────────────────────
// Application Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Title shown above the table
    pub title: String,

    /// JSON dataset to load (array of objects); built-in sample when unset
    pub data_path: Option<PathBuf>,

    /// Column definitions, in display order
    pub columns: Vec<FieldSpec>,

    /// Where committed rows are sent
    pub persistence: PersistenceConfig,

    /// Notification overlay settings
    pub notifications: NotificationsConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            data_path: None,
            columns: default_columns(),
            persistence: PersistenceConfig::default(),
            notifications: NotificationsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Column definitions as a table schema
    pub fn schema(&self) -> TableSchema {
        TableSchema::new(self.columns.clone())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File Configuration (deserialization layer)
// ─────────────────────────────────────────────────────────────────────────────

/// Config file structure
#[derive(Debug, Deserialize, Default)]
pub(crate) struct FileConfig {
    pub title: Option<String>,
    pub data_path: Option<String>,

    /// Optional [persistence] section
    pub persistence: Option<FilePersistence>,

    /// Optional [notifications] section
    pub notifications: Option<FileNotifications>,

    /// Optional [logging] section
    pub logging: Option<FileLogging>,

    /// Optional [[columns]] array; replaces the default columns entirely
    pub columns: Option<Vec<FieldSpec>>,
}

/// Config file could not be used
#[derive(Debug)]
pub enum ConfigError {
    /// File exists but cannot be read (permissions, etc.)
    Read { path: PathBuf, source: std::io::Error },
    /// File is not valid TOML for this schema
    Parse { path: PathBuf, source: toml::de::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "cannot read {}: {}", path.display(), source)
            }
            Self::Parse { path, source } => {
                write!(f, "cannot parse {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration Loading
// ─────────────────────────────────────────────────────────────────────────────

impl Config {
    /// Get the config file path: ~/.config/gridedit/config.toml
    /// Uses Unix-style ~/.config on all platforms for consistency
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("gridedit").join("config.toml"))
    }

    /// Create config file with defaults if it doesn't exist
    /// Called during startup to help users discover configuration options
    pub fn ensure_config_exists() {
        let Some(path) = Self::config_path() else {
            return;
        };

        if path.exists() {
            return;
        }

        if let Some(parent) = path.parent() {
            if std::fs::create_dir_all(parent).is_err() {
                return; // Config is optional
            }
        }

        let _ = std::fs::write(&path, Self::default().to_toml());
    }

    /// Read and parse a config file. A missing file yields defaults.
    pub(crate) fn read_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FileConfig::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Load file config if it exists
    ///
    /// # Exits
    /// If the config file exists but cannot be read or parsed. A broken config
    /// should fail fast with a clear error, not silently fall back to defaults.
    fn load_file_config() -> FileConfig {
        let Some(path) = Self::config_path() else {
            return FileConfig::default();
        };

        match Self::read_file_config(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("\n╔══════════════════════════════════════════════════════════════╗");
                eprintln!("║  CONFIG ERROR - Failed to load configuration file            ║");
                eprintln!("╚══════════════════════════════════════════════════════════════╝\n");
                eprintln!("  {}\n", e);
                eprintln!("  Tip: Check for:\n");
                eprintln!("    - Missing quotes around string values");
                eprintln!("    - Invalid boolean values (use true/false)");
                eprintln!("    - [[columns]] entries missing field, name or type");
                eprintln!("    - Typos in section names\n");
                eprintln!("  To reset, run `gridedit config --reset`.\n");
                std::process::exit(1);
            }
        }
    }

    /// Load configuration: env vars > file > defaults
    pub fn from_env() -> Self {
        let file = Self::load_file_config();
        Self::from_sources(file, |key| std::env::var(key).ok())
    }

    /// Merge a parsed file config with an environment lookup
    pub(crate) fn from_sources(file: FileConfig, env: impl Fn(&str) -> Option<String>) -> Self {
        // Title: env > file > default
        let title = env("GRIDEDIT_TITLE")
            .or(file.title)
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());

        // Dataset: env > file > built-in sample
        let data_path = env("GRIDEDIT_DATA")
            .or(file.data_path)
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        // Columns: file > default
        let columns = file.columns.unwrap_or_else(default_columns);

        let persistence = PersistenceConfig::from_file(
            file.persistence,
            env("GRIDEDIT_PERSISTENCE"),
            env("GRIDEDIT_ENDPOINT"),
        );

        let notifications = NotificationsConfig::from_file(
            file.notifications,
            env("GRIDEDIT_TOAST_TTL_MS").and_then(|v| v.parse().ok()),
        );

        let logging = LoggingConfig::from_file(file.logging);

        Self {
            title,
            data_path,
            columns,
            persistence,
            notifications,
            logging,
        }
    }
}

//! # Runtime Configuration
//!
//! Layered configuration, lowest precedence first:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config`)
//! 3. Environment (`TW_DATA_FILE`, `TW_SWEEP_INTERVAL_SECS`, `TW_LOG_LEVEL`, `TW_JSON_LOGS`)
//! 4. Command-line flags

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use terminal_ledger::LedgerConfig;

/// Complete runtime configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Expiry sweep configuration.
    pub sweep: SweepConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
    /// Ledger rules and shelf layout.
    pub ledger: LedgerConfig,
}

/// Storage configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON data file. Without one the state lives in memory only.
    pub data_file: Option<PathBuf>,
}

/// Expiry sweep configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Seconds between sweeps.
    pub interval_secs: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self { interval_secs: 60 }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid value {value:?} for {var}")]
    InvalidEnv { var: &'static str, value: String },

    #[error("Sweep interval must be greater than zero")]
    ZeroSweepInterval,

    #[error("Shelf layout is empty")]
    EmptyLayout,

    #[error("Shelf section {0} is defined more than once")]
    DuplicateSection(String),
}

impl RuntimeConfig {
    /// Reads a TOML file on top of the defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text).map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn from_toml_str(text: &str) -> Result<Self, String> {
        toml::from_str(text).map_err(|e| e.to_string())
    }

    /// Applies `TW_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|var| std::env::var(var).ok())
    }

    /// Applies `TW_*` overrides using `lookup` as the environment.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("TW_DATA_FILE").filter(|v| !v.trim().is_empty()) {
            self.storage.data_file = Some(PathBuf::from(path));
        }
        if let Some(value) = lookup("TW_SWEEP_INTERVAL_SECS") {
            self.sweep.interval_secs =
                value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                    var: "TW_SWEEP_INTERVAL_SECS",
                    value,
                })?;
        }
        if let Some(level) = lookup("TW_LOG_LEVEL").filter(|v| !v.trim().is_empty()) {
            self.logging.level = level;
        }
        if let Some(value) = lookup("TW_JSON_LOGS") {
            self.logging.json = value.eq_ignore_ascii_case("true") || value == "1";
        }
        Ok(())
    }

    /// Rejects configurations the runtime cannot start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sweep.interval_secs == 0 {
            return Err(ConfigError::ZeroSweepInterval);
        }
        if self.ledger.shelf_layout.is_empty() {
            return Err(ConfigError::EmptyLayout);
        }
        let mut seen = HashSet::new();
        for section in &self.ledger.shelf_layout {
            if !seen.insert(section.id.as_str()) {
                return Err(ConfigError::DuplicateSection(section.id.to_string()));
            }
        }
        Ok(())
    }
}

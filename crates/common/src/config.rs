//! Configuration types for the new-trade operation.
//!
//! Configuration is loaded from a TOML file and covers the ledger context the
//! operation runs against, logging, and metrics.
//!
//! # Example Configuration (TOML)
//!
//! ```toml
//! [ledger]
//! ledger_seq = 1200
//! id_pool = 40
//!
//! [logging]
//! level = "debug"
//! format = "json"
//!
//! [metrics]
//! enabled = true
//! prefix = "op-new-trade"
//! ```
//!
//! Every section is optional; missing keys take their defaults.
//!
//! ```rust
//! use newtrade_common::Config;
//!
//! let config = Config::from_toml_str("[ledger]\nledger_seq = 7\n").unwrap();
//! assert_eq!(config.ledger.ledger_seq, 7);
//! assert_eq!(config.ledger.id_pool, 0);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default prefix for metric names.
pub const DEFAULT_METRICS_PREFIX: &str = "op-new-trade";

/// Log levels for filtering log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Filter directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Log output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Ledger context (sequence number and id pool).
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Logging configuration (level and format).
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Metrics configuration.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Ledger context the operation executes in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Sequence number of the ledger being closed.
    ///
    /// Recorded as `last_modified_ledger_seq` on every entry the operation
    /// writes. Default: 1
    #[serde(default = "default_ledger_seq")]
    pub ledger_seq: u32,

    /// Last id handed out by the ledger's id pool.
    ///
    /// The first offer created receives `id_pool + 1`. Default: 0
    #[serde(default)]
    pub id_pool: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            ledger_seq: default_ledger_seq(),
            id_pool: 0,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter.
    ///
    /// Default: `Info`
    #[serde(default)]
    pub level: LogLevel,

    /// Log output format.
    ///
    /// Default: `Text`
    #[serde(default)]
    pub format: LogFormat,
}

/// Metrics configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Whether outcome meters are recorded at all.
    ///
    /// Default: true
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,

    /// First segment of every meter name.
    ///
    /// Default: `"op-new-trade"`
    #[serde(default = "default_metrics_prefix")]
    pub prefix: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
            prefix: default_metrics_prefix(),
        }
    }
}

fn default_ledger_seq() -> u32 {
    1
}

fn default_metrics_enabled() -> bool {
    true
}

fn default_metrics_prefix() -> String {
    DEFAULT_METRICS_PREFIX.to_string()
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid TOML,
    /// or fails [`Config::validate`].
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use newtrade_common::Config;
    /// use std::path::Path;
    ///
    /// let config = Config::from_file(Path::new("/etc/newtrade/config.toml"))?;
    /// # Ok::<(), newtrade_common::Error>(())
    /// ```
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that parse but cannot be used.
    pub fn validate(&self) -> Result<()> {
        if self.ledger.ledger_seq == 0 {
            return Err(Error::Config("ledger.ledger_seq must be non-zero".into()));
        }
        if self.metrics.prefix.trim().is_empty() {
            return Err(Error::Config("metrics.prefix must not be empty".into()));
        }
        Ok(())
    }
}

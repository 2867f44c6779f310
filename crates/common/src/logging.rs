//! Logging setup.
//!
//! Installs the global `tracing` subscriber described by a [`LoggingConfig`].
//! `RUST_LOG` takes precedence over the configured level when it is set.
//!
//! Two output formats are supported:
//!
//! - **Text** ([`LogFormat::Text`]): human-readable, one event per line
//! - **JSON** ([`LogFormat::Json`]): structured output for log aggregation
//!
//! # Example
//!
//! ```no_run
//! use newtrade_common::config::LoggingConfig;
//! use newtrade_common::logging;
//!
//! logging::init(&LoggingConfig::default()).expect("Failed to initialize logging");
//! ```

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};
use crate::{Error, Result};

/// Build the filter for a configuration, preferring `RUST_LOG` when present.
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.level.as_str()))
}

/// Initialize the global logging subscriber.
///
/// # Errors
///
/// Returns [`Error::Config`] if a global subscriber is already installed.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = env_filter(config);

    let result = match config.format {
        LogFormat::Text => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(false);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
        }
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_span_list(true)
                .with_current_span(true);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
        }
    };

    result.map_err(|e| Error::Config(format!("failed to install logger: {e}")))
}

//! Common types and utilities for the new-trade operation.
//!
//! This crate provides the pieces shared by the operation crate: exact
//! 128-bit multiply/divide, asset validation helpers, configuration loading,
//! and logging setup.

pub mod asset;
pub mod config;
pub mod error;
pub mod logging;
pub mod math;

pub use config::{Config, LedgerConfig, LogFormat, LogLevel, LoggingConfig, MetricsConfig};
pub use error::{Error, Result};
pub use math::{mul_div_floor, MathError};

/// Re-export stellar-xdr for convenience
pub use stellar_xdr;

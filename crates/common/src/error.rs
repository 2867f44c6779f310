//! Common error types for newtrade.

use thiserror::Error;

/// Common result type for newtrade utilities.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for newtrade.
#[derive(Error, Debug)]
pub enum Error {
    /// XDR encoding/decoding error.
    #[error("XDR error: {0}")]
    Xdr(#[from] stellar_xdr::curr::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid data.
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

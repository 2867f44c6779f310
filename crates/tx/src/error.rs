//! Error types for operation processing.
//!
//! [`TxError`] covers failures of the execution engine itself: missing
//! accounts, arithmetic that cannot be represented, and malformed state.
//! Trade outcomes such as `Malformed` or `LineFull` are not errors; they are
//! returned as [`OperationResult`](crate::OperationResult) values.

use thiserror::Error;

use newtrade_common::MathError;

/// Errors that can occur while applying an operation.
#[derive(Debug, Error)]
pub enum TxError {
    /// Source account not found.
    #[error("source account not found")]
    SourceAccountNotFound,

    /// Account not found (with context).
    #[error("account not found: {0}")]
    AccountNotFound(String),

    /// Arithmetic could not be carried out.
    #[error("math error: {0}")]
    Math(#[from] MathError),

    /// Error from the common utilities (XDR, configuration, I/O).
    #[error(transparent)]
    Common(#[from] newtrade_common::Error),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

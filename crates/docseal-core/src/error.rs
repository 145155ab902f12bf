//! Error types for docseal core.

use thiserror::Error;

use crate::record::SignatureStatus;

/// Errors raised by core primitives.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid content hash: {0}")]
    InvalidHash(String),

    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: SignatureStatus,
        to: SignatureStatus,
    },

    #[error("unknown signature status: {0}")]
    UnknownStatus(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

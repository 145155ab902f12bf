//! Error types for collaborator calls.

use thiserror::Error;

/// Errors returned by the ledger or the content store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnchorError {
    /// The service could not be reached or did not answer.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// The service answered but refused the request.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// The referenced object does not exist.
    #[error("not found: {0}")]
    NotFound(String),
}

/// Result type for collaborator calls.
pub type Result<T> = std::result::Result<T, AnchorError>;

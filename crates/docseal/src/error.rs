//! Error types for the registry and the scheduler.

use std::path::PathBuf;

use docseal_anchor::AnchorError;
use docseal_core::{ContentHash, CoreError};
use docseal_store::StoreError;
use thiserror::Error;

/// Errors that can occur during registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The document path does not exist or cannot be read.
    #[error("document not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The bytes do not start with the configured format marker.
    #[error("invalid document format: {}", .0.display())]
    InvalidFormat(PathBuf),

    /// A record for this content hash already exists.
    #[error("document already signed: {0}")]
    AlreadySigned(ContentHash),

    /// No record exists for this content hash.
    #[error("document not registered: {0}")]
    NotRegistered(ContentHash),

    /// The ledger reports no anchor for this content hash.
    #[error("document not anchored on the ledger: {0}")]
    NotAnchored(ContentHash),

    /// Ledger or content store failure.
    #[error("external service error: {0}")]
    ExternalService(#[from] AnchorError),

    /// Registry or archive write failure.
    #[error("persistence error: {0}")]
    Persistence(#[from] StoreError),

    /// Status change not allowed by the lifecycle.
    #[error("lifecycle error: {0}")]
    Lifecycle(#[from] CoreError),
}

impl From<std::io::Error> for RegistryError {
    fn from(e: std::io::Error) -> Self {
        Self::Persistence(StoreError::Io(e))
    }
}

/// Coarse classification of a [`RegistryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    InvalidFormat,
    AlreadySigned,
    NotRegistered,
    NotAnchored,
    ExternalService,
    Persistence,
    Lifecycle,
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidFormat(_) => ErrorKind::InvalidFormat,
            Self::AlreadySigned(_) => ErrorKind::AlreadySigned,
            Self::NotRegistered(_) => ErrorKind::NotRegistered,
            Self::NotAnchored(_) => ErrorKind::NotAnchored,
            Self::ExternalService(_) => ErrorKind::ExternalService,
            Self::Persistence(_) => ErrorKind::Persistence,
            Self::Lifecycle(_) => ErrorKind::Lifecycle,
        }
    }
}

/// Errors surfaced by scheduler operations outside of a tick.
///
/// Failures inside a tick are logged and counted, never returned.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        let hash = ContentHash::digest(b"kind");
        assert_eq!(
            RegistryError::AlreadySigned(hash).kind(),
            ErrorKind::AlreadySigned
        );
        assert_eq!(
            RegistryError::from(AnchorError::Unavailable("down".into())).kind(),
            ErrorKind::ExternalService
        );
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert_eq!(RegistryError::from(io).kind(), ErrorKind::Persistence);
    }

    #[test]
    fn test_messages_name_the_subject() {
        let err = RegistryError::NotFound(PathBuf::from("/intake/missing.pdf"));
        assert_eq!(err.to_string(), "document not found: /intake/missing.pdf");

        let hash = ContentHash::digest(b"msg");
        assert!(RegistryError::NotRegistered(hash)
            .to_string()
            .ends_with(&hash.to_hex()));
    }
}

//! Content store abstraction.
//!
//! A content store holds the original document bytes and returns an opaque
//! reference plus a URL to fetch them again.

use async_trait::async_trait;
use bytes::Bytes;
use docseal_core::StoreReference;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Metadata the content store reports for a stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentInfo {
    pub size: u64,
    pub media_type: String,
}

/// Content store trait.
///
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Store `bytes`, returning the reference to retrieve them.
    async fn store(&self, bytes: Bytes) -> Result<StoreReference>;

    /// Fetch the bytes behind `reference`.
    async fn retrieve(&self, reference: &StoreReference) -> Result<Bytes>;

    /// Size and media type, if `reference` exists.
    async fn describe(&self, reference: &StoreReference) -> Result<Option<ContentInfo>>;

    /// Public URL for `reference`.
    fn locate(&self, reference: &StoreReference) -> String;

    /// Cheap reachability probe (e.g. query the node's version).
    async fn ping(&self) -> Result<()>;
}

//! Ledger abstraction.
//!
//! A ledger durably anchors a content hash and can later confirm its presence
//! together with who anchored it and when.

use async_trait::async_trait;
use docseal_core::{ContentHash, LedgerReference};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// What the ledger knows about an anchored hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorInfo {
    /// Account that anchored the hash.
    pub owner: String,
    /// Anchoring time (Unix seconds, as reported by the ledger).
    pub anchored_at: i64,
}

/// Ledger trait for anchoring and confirming content hashes.
///
/// Implementations must be thread-safe (Send + Sync). The registry imposes no
/// timeout on these calls.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Anchor `hash`, returning the ledger's locator (e.g. a transaction id).
    async fn anchor(&self, hash: &ContentHash) -> Result<LedgerReference>;

    /// Whether `hash` is currently anchored.
    async fn is_anchored(&self, hash: &ContentHash) -> Result<bool>;

    /// Owner and anchoring time, if `hash` is anchored.
    async fn lookup(&self, hash: &ContentHash) -> Result<Option<AnchorInfo>>;

    /// Cheap reachability probe (e.g. fetch the latest block number).
    async fn ping(&self) -> Result<()>;
}

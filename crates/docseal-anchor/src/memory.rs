//! In-memory collaborators for tests and offline runs.
//!
//! Both types share their state behind `tokio::sync::RwLock` and expose
//! `set_failing` so callers can simulate an unreachable service.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use docseal_core::{ContentHash, LedgerReference, StoreReference};
use tokio::sync::RwLock;

use crate::content::{ContentInfo, ContentStore};
use crate::error::{AnchorError, Result};
use crate::ledger::{AnchorInfo, Ledger};

/// Configuration for [`MemoryLedger`].
#[derive(Debug, Clone)]
pub struct MemoryLedgerConfig {
    /// Owner reported for every anchor.
    pub owner: String,
}

impl Default for MemoryLedgerConfig {
    fn default() -> Self {
        Self {
            owner: "0x0000000000000000000000000000000000000000".to_string(),
        }
    }
}

/// A ledger that keeps anchors in a map.
///
/// Transaction references are `0x` + BLAKE3(hash || nonce), so they are
/// unique per anchoring call and reproducible across runs.
pub struct MemoryLedger {
    config: MemoryLedgerConfig,
    anchors: RwLock<HashMap<ContentHash, AnchorInfo>>,
    nonce: AtomicU64,
    failing: AtomicBool,
}

impl MemoryLedger {
    pub fn new(config: MemoryLedgerConfig) -> Self {
        Self {
            config,
            anchors: RwLock::new(HashMap::new()),
            nonce: AtomicU64::new(0),
            failing: AtomicBool::new(false),
        }
    }

    /// Make every subsequent call fail with `Unavailable` (or stop failing).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Drop an anchor, as if the ledger no longer confirms it.
    pub async fn forget(&self, hash: &ContentHash) -> bool {
        self.anchors.write().await.remove(hash).is_some()
    }

    /// Number of distinct anchored hashes.
    pub async fn anchored_count(&self) -> usize {
        self.anchors.read().await.len()
    }

    fn check_available(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AnchorError::Unavailable("memory ledger set to fail".into()));
        }
        Ok(())
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new(MemoryLedgerConfig::default())
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn anchor(&self, hash: &ContentHash) -> Result<LedgerReference> {
        self.check_available()?;

        let nonce = self.nonce.fetch_add(1, Ordering::SeqCst);
        let mut hasher = blake3::Hasher::new();
        hasher.update(hash.as_bytes());
        hasher.update(&nonce.to_le_bytes());
        let digest = hasher.finalize();
        let reference = LedgerReference::new(format!("0x{}", hex::encode(digest.as_bytes())));

        // Re-anchoring keeps the first owner and time.
        self.anchors
            .write()
            .await
            .entry(*hash)
            .or_insert_with(|| AnchorInfo {
                owner: self.config.owner.clone(),
                anchored_at: now_secs(),
            });

        tracing::debug!(hash = %hash.short(), tx = %reference, "anchored in memory ledger");
        Ok(reference)
    }

    async fn is_anchored(&self, hash: &ContentHash) -> Result<bool> {
        self.check_available()?;
        Ok(self.anchors.read().await.contains_key(hash))
    }

    async fn lookup(&self, hash: &ContentHash) -> Result<Option<AnchorInfo>> {
        self.check_available()?;
        Ok(self.anchors.read().await.get(hash).cloned())
    }

    async fn ping(&self) -> Result<()> {
        self.check_available()
    }
}

/// A content store that keeps objects in a map.
///
/// References are CIDv1 strings of the stored bytes, so storing the same
/// bytes twice yields the same reference.
pub struct MemoryContentStore {
    gateway_url: String,
    objects: RwLock<HashMap<StoreReference, Bytes>>,
    failing: AtomicBool,
}

impl MemoryContentStore {
    /// Create a store whose `locate` URLs point at `gateway_url`.
    pub fn new(gateway_url: impl Into<String>) -> Self {
        Self {
            gateway_url: gateway_url.into(),
            objects: RwLock::new(HashMap::new()),
            failing: AtomicBool::new(false),
        }
    }

    /// Make every subsequent call fail with `Unavailable` (or stop failing).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Replace the bytes behind an existing reference.
    pub async fn overwrite(&self, reference: &StoreReference, bytes: Bytes) -> bool {
        match self.objects.write().await.get_mut(reference) {
            Some(slot) => {
                *slot = bytes;
                true
            }
            None => false,
        }
    }

    /// Number of stored objects.
    pub async fn object_count(&self) -> usize {
        self.objects.read().await.len()
    }

    fn check_available(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AnchorError::Unavailable(
                "memory content store set to fail".into(),
            ));
        }
        Ok(())
    }
}

impl Default for MemoryContentStore {
    fn default() -> Self {
        Self::new("http://localhost:8080")
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn store(&self, bytes: Bytes) -> Result<StoreReference> {
        self.check_available()?;

        let reference = StoreReference::new(ContentHash::digest(&bytes).to_cid());
        self.objects
            .write()
            .await
            .insert(reference.clone(), bytes);

        tracing::debug!(reference = %reference, "stored in memory content store");
        Ok(reference)
    }

    async fn retrieve(&self, reference: &StoreReference) -> Result<Bytes> {
        self.check_available()?;
        self.objects
            .read()
            .await
            .get(reference)
            .cloned()
            .ok_or_else(|| AnchorError::NotFound(reference.to_string()))
    }

    async fn describe(&self, reference: &StoreReference) -> Result<Option<ContentInfo>> {
        self.check_available()?;
        Ok(self.objects.read().await.get(reference).map(|bytes| ContentInfo {
            size: bytes.len() as u64,
            media_type: sniff_media_type(bytes).to_string(),
        }))
    }

    fn locate(&self, reference: &StoreReference) -> String {
        format!("{}/ipfs/{}", self.gateway_url.trim_end_matches('/'), reference)
    }

    async fn ping(&self) -> Result<()> {
        self.check_available()
    }
}

fn sniff_media_type(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(b"%PDF") {
        "application/pdf"
    } else {
        "application/octet-stream"
    }
}

fn now_secs() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

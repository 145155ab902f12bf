//! The signature registry.
//!
//! The registry ties together content addressing, the two external
//! collaborators and the durable store:
//!
//! 1. Digest the document bytes (SHA-256)
//! 2. Reject duplicates by content hash
//! 3. Upload the bytes to the content store
//! 4. Anchor the hash on the ledger
//! 5. Archive a renamed copy and persist the record
//!
//! All mutations run under a single writer lock, so the duplicate check and
//! the insert are atomic with respect to each other.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use docseal_anchor::{AnchorError, AnchorInfo, ContentInfo, ContentStore, Ledger};
use docseal_core::{ContentHash, SignatureRecord, SignatureStatus, SignatureToken};
use docseal_store::{InsertResult, Store, StoreExt};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::config::RegistryConfig;
use crate::error::{RegistryError, Result};

/// Counts reported by [`Registry::stats`].
///
/// `pending` counts discoverable unsigned documents plus stored records that
/// have not yet been signed or verified, so `total` equals `signed +
/// verified + failed` plus the stored share of `pending`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    pub total: usize,
    pub signed: usize,
    pub verified: usize,
    pub failed: usize,
    pub pending: usize,
}

/// Outcome of signing one discovered document.
#[derive(Debug)]
pub struct SignOutcome {
    pub path: PathBuf,
    pub result: Result<SignatureRecord>,
}

/// Result of [`Registry::sign_all_pending`].
#[derive(Debug, Default)]
pub struct SignReport {
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<SignOutcome>,
}

/// Outcome of re-verifying one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyOutcome {
    pub content_hash: ContentHash,
    pub status: SignatureStatus,
    /// Why the record did not verify, or why its new status was not saved.
    pub error: Option<String>,
}

/// Result of [`Registry::verify_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyReport {
    pub verified: usize,
    pub failed: usize,
    pub results: Vec<VerifyOutcome>,
}

/// Everything known about one signed document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentInfo {
    pub content_hash: ContentHash,
    pub record: SignatureRecord,
    /// Ledger view of the anchor, if the ledger still has it.
    pub anchor: Option<AnchorInfo>,
    /// Content store view of the stored copy, if it still has it.
    pub content: Option<ContentInfo>,
    /// Public location of the stored copy.
    pub url: String,
}

/// Read-only integrity check of one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub content_hash: ContentHash,
    /// The content store's copy digests to the record's hash.
    pub content_intact: bool,
    /// The token recomputed from the record matches the stored token.
    pub token_intact: bool,
    /// The archived copy digests to the record's hash.
    pub archive_intact: bool,
    /// The ledger still reports the hash as anchored.
    pub anchored: bool,
}

/// Reachability of the two collaborators, from [`Registry::check_services`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceHealth {
    pub ledger: bool,
    pub content_store: bool,
    /// Why each unreachable service failed its ping.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl ServiceHealth {
    pub fn all_reachable(&self) -> bool {
        self.ledger && self.content_store
    }
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.content_intact && self.token_intact && self.archive_intact && self.anchored
    }
}

/// The signature registry.
pub struct Registry<S: Store> {
    store: S,
    ledger: Arc<dyn Ledger>,
    content: Arc<dyn ContentStore>,
    config: RegistryConfig,
    writer: Mutex<()>,
}

impl<S: Store> Registry<S> {
    /// Create a registry over the given store and collaborators.
    pub fn new(
        store: S,
        ledger: Arc<dyn Ledger>,
        content: Arc<dyn ContentStore>,
        config: RegistryConfig,
    ) -> Self {
        Self {
            store,
            ledger,
            content,
            config,
            writer: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Discovery
    // ─────────────────────────────────────────────────────────────────────────

    /// Unsigned documents in the intake directory, sorted by path.
    ///
    /// Only regular files with the configured extension are considered.
    /// Files that cannot be read are skipped. A missing intake directory
    /// yields an empty list.
    pub async fn discover_candidates(&self) -> Result<Vec<PathBuf>> {
        let dir = &self.config.intake_dir;
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "intake directory unreadable");
                return Err(RegistryError::NotFound(dir.clone()));
            }
        };

        let mut candidates = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|_| RegistryError::NotFound(dir.clone()))?
        {
            let path = entry.path();
            if !self.config.format.matches_extension(&path) {
                continue;
            }
            match tokio::fs::metadata(&path).await {
                Ok(meta) if meta.is_file() => {}
                _ => continue,
            }
            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "skipping unreadable document"
                    );
                    continue;
                }
            };
            if !self.store.has_record(&ContentHash::digest(&bytes)).await? {
                candidates.push(path);
            }
        }

        candidates.sort();
        Ok(candidates)
    }

    /// Whether the document's current bytes have a record.
    pub async fn is_registered(&self, path: impl AsRef<Path>) -> Result<bool> {
        let hash = self.digest(path.as_ref()).await?;
        Ok(self.store.has_record(&hash).await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Signing
    // ─────────────────────────────────────────────────────────────────────────

    /// Sign one document.
    ///
    /// On any error before the record is persisted, no record exists. The
    /// content store upload and the ledger anchor are not rolled back.
    pub async fn sign(&self, path: impl AsRef<Path>) -> Result<SignatureRecord> {
        let path = path.as_ref();
        let bytes = self.read_document(path).await?;
        if !self.config.format.is_well_formed(&bytes) {
            return Err(RegistryError::InvalidFormat(path.to_path_buf()));
        }
        let hash = ContentHash::digest(&bytes);

        let _writer = self.writer.lock().await;
        if self.store.has_record(&hash).await? {
            return Err(RegistryError::AlreadySigned(hash));
        }

        let bytes = Bytes::from(bytes);
        let store_reference = self.content.store(bytes.clone()).await.map_err(|e| {
            tracing::warn!(path = %path.display(), error = %e, "content store upload failed");
            RegistryError::ExternalService(e)
        })?;
        let ledger_reference = self.ledger.anchor(&hash).await.map_err(|e| {
            tracing::warn!(hash = %hash.short(), error = %e, "ledger anchoring failed");
            RegistryError::ExternalService(e)
        })?;

        let created_at = Utc::now().timestamp_millis();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let signature_token =
            SignatureToken::derive(&file_name, &hash, &store_reference, created_at);
        let archived_path = self.archive(path, &signature_token, &bytes).await?;

        let record = SignatureRecord {
            content_hash: hash,
            source_path: path.to_path_buf(),
            archived_path,
            store_reference,
            ledger_reference,
            signature_token,
            created_at,
            status: SignatureStatus::Signed,
        };

        match self.store.insert_record(&record).await? {
            InsertResult::Inserted => {}
            InsertResult::AlreadyExists => return Err(RegistryError::AlreadySigned(hash)),
        }

        tracing::info!(
            path = %path.display(),
            hash = %hash.short(),
            token = %record.signature_token,
            "document signed"
        );
        Ok(record)
    }

    /// Sign every discovered candidate, one at a time.
    ///
    /// A failure on one document does not stop the batch.
    pub async fn sign_all_pending(&self) -> Result<SignReport> {
        let candidates = self.discover_candidates().await?;
        Ok(self.sign_batch(candidates).await)
    }

    /// Sign each of `paths` in order, for callers that already ran discovery.
    ///
    /// A failure on one document does not stop the batch.
    pub async fn sign_batch(&self, paths: impl IntoIterator<Item = PathBuf>) -> SignReport {
        let mut report = SignReport::default();

        for path in paths {
            let result = self.sign(&path).await;
            match &result {
                Ok(_) => report.succeeded += 1,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "signing failed");
                    report.failed += 1;
                }
            }
            report.results.push(SignOutcome { path, result });
        }

        report
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Verification
    // ─────────────────────────────────────────────────────────────────────────

    /// Verify one document against the ledger.
    ///
    /// If the ledger says the hash is not anchored, returns `NotAnchored`
    /// and leaves the status untouched.
    pub async fn verify(&self, path: impl AsRef<Path>) -> Result<SignatureRecord> {
        let hash = self.digest(path.as_ref()).await?;

        let _writer = self.writer.lock().await;
        let mut record = self
            .store
            .get_record(&hash)
            .await?
            .ok_or(RegistryError::NotRegistered(hash))?;

        if !self.ledger.is_anchored(&hash).await? {
            return Err(RegistryError::NotAnchored(hash));
        }

        record.transition(SignatureStatus::Verified)?;
        self.store.update_status(&hash, record.status).await?;

        tracing::info!(hash = %hash.short(), "document verified");
        Ok(record)
    }

    /// Re-verify every record by its hash.
    ///
    /// Each record ends `Verified` or `Failed`. A ledger error counts as a
    /// failed verification. A status that cannot be saved is reported in
    /// the outcome and does not stop the sweep.
    pub async fn verify_all(&self) -> Result<VerifyReport> {
        let _writer = self.writer.lock().await;
        let records = self.store.list_records().await?;
        let mut report = VerifyReport::default();

        for record in records {
            let outcome = self.reverify(record).await;
            if outcome.status == SignatureStatus::Verified {
                report.verified += 1;
            } else {
                report.failed += 1;
            }
            report.results.push(outcome);
        }

        tracing::debug!(
            verified = report.verified,
            failed = report.failed,
            "verification sweep finished"
        );
        Ok(report)
    }

    async fn reverify(&self, mut record: SignatureRecord) -> VerifyOutcome {
        let hash = record.content_hash;
        let (next, mut error) = match self.ledger.is_anchored(&hash).await {
            Ok(true) => (SignatureStatus::Verified, None),
            Ok(false) => (
                SignatureStatus::Failed,
                Some(RegistryError::NotAnchored(hash).to_string()),
            ),
            Err(e) => (
                SignatureStatus::Failed,
                Some(RegistryError::ExternalService(e).to_string()),
            ),
        };

        if let Err(e) = record.transition(next) {
            tracing::warn!(hash = %hash.short(), error = %e, "record cannot be re-verified");
            return VerifyOutcome {
                content_hash: hash,
                status: record.status,
                error: Some(e.to_string()),
            };
        }

        if let Err(e) = self.store.update_status(&hash, next).await {
            tracing::error!(hash = %hash.short(), error = %e, "failed to save verification status");
            error = Some(RegistryError::Persistence(e).to_string());
        }

        VerifyOutcome {
            content_hash: hash,
            status: next,
            error,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Record counts by status, plus the discoverable pending count.
    pub async fn stats(&self) -> Result<RegistryStats> {
        let tally = self.store.tally().await?;
        let discovered = self.discover_candidates().await?.len();
        Ok(RegistryStats {
            total: tally.total,
            signed: tally.signed,
            verified: tally.verified,
            failed: tally.failed,
            pending: discovered + tally.pending,
        })
    }

    /// Ping the ledger and the content store.
    ///
    /// Never fails; an unreachable service is reported in the result.
    pub async fn check_services(&self) -> ServiceHealth {
        let mut health = ServiceHealth::default();

        match self.ledger.ping().await {
            Ok(()) => health.ledger = true,
            Err(e) => health.errors.push(format!("ledger: {e}")),
        }
        match self.content.ping().await {
            Ok(()) => health.content_store = true,
            Err(e) => health.errors.push(format!("content store: {e}")),
        }

        if !health.all_reachable() {
            tracing::warn!(errors = ?health.errors, "collaborator health check failed");
        }
        health
    }

    pub async fn record(&self, hash: &ContentHash) -> Result<Option<SignatureRecord>> {
        Ok(self.store.get_record(hash).await?)
    }

    /// All records in insertion order.
    pub async fn records(&self) -> Result<Vec<SignatureRecord>> {
        Ok(self.store.list_records().await?)
    }

    /// Record plus what the ledger and content store report about it.
    pub async fn document_info(&self, path: impl AsRef<Path>) -> Result<DocumentInfo> {
        let hash = self.digest(path.as_ref()).await?;
        let record = self.registered(&hash).await?;

        let anchor = self.ledger.lookup(&hash).await?;
        let content = self.content.describe(&record.store_reference).await?;
        let url = self.content.locate(&record.store_reference);

        Ok(DocumentInfo {
            content_hash: hash,
            record,
            anchor,
            content,
            url,
        })
    }

    /// Fetch the stored copy back from the content store into `output`.
    pub async fn retrieve(&self, hash: &ContentHash, output: impl AsRef<Path>) -> Result<PathBuf> {
        let output = output.as_ref();
        let record = self.registered(hash).await?;

        let bytes = self.content.retrieve(&record.store_reference).await?;
        if ContentHash::digest(&bytes) != *hash {
            return Err(RegistryError::ExternalService(AnchorError::Rejected(format!(
                "content store returned bytes that do not match {hash}"
            ))));
        }

        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(output, &bytes).await?;

        tracing::debug!(hash = %hash.short(), output = %output.display(), "document retrieved");
        Ok(output.to_path_buf())
    }

    /// Check one record against its token, both stored copies and the ledger.
    pub async fn audit(&self, hash: &ContentHash) -> Result<AuditReport> {
        let record = self.registered(hash).await?;

        let token_intact = record.expected_token() == record.signature_token;

        let content_intact = match self.content.retrieve(&record.store_reference).await {
            Ok(bytes) => ContentHash::digest(&bytes) == *hash,
            Err(AnchorError::NotFound(_)) => false,
            Err(e) => return Err(e.into()),
        };

        let archive_intact = match tokio::fs::read(&record.archived_path).await {
            Ok(bytes) => ContentHash::digest(&bytes) == *hash,
            Err(_) => false,
        };

        let anchored = self.ledger.is_anchored(hash).await?;

        Ok(AuditReport {
            content_hash: *hash,
            content_intact,
            token_intact,
            archive_intact,
            anchored,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────────

    async fn read_document(&self, path: &Path) -> Result<Vec<u8>> {
        tokio::fs::read(path).await.map_err(|e| {
            tracing::debug!(path = %path.display(), error = %e, "document unreadable");
            RegistryError::NotFound(path.to_path_buf())
        })
    }

    async fn digest(&self, path: &Path) -> Result<ContentHash> {
        Ok(ContentHash::digest(&self.read_document(path).await?))
    }

    async fn registered(&self, hash: &ContentHash) -> Result<SignatureRecord> {
        self.store
            .get_record(hash)
            .await?
            .ok_or(RegistryError::NotRegistered(*hash))
    }

    /// Write `{stem}_SIGNED_{token}.{ext}` into the archive directory.
    async fn archive(
        &self,
        source: &Path,
        token: &SignatureToken,
        bytes: &[u8],
    ) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.config.archive_dir).await?;

        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        let name = match source.extension() {
            Some(ext) => format!("{stem}_SIGNED_{token}.{}", ext.to_string_lossy()),
            None => format!("{stem}_SIGNED_{token}"),
        };

        let archived = self.config.archive_dir.join(name);
        tokio::fs::write(&archived, bytes).await?;
        Ok(archived)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docseal_anchor::memory::{MemoryContentStore, MemoryLedger};
    use docseal_store::MemoryStore;

    struct Setup {
        _dir: tempfile::TempDir,
        intake: PathBuf,
        registry: Registry<MemoryStore>,
        ledger: Arc<MemoryLedger>,
    }

    fn setup() -> Setup {
        let dir = tempfile::tempdir().unwrap();
        let intake = dir.path().join("intake");
        std::fs::create_dir_all(&intake).unwrap();
        let ledger = Arc::new(MemoryLedger::default());
        let registry = Registry::new(
            MemoryStore::new(),
            ledger.clone(),
            Arc::new(MemoryContentStore::default()),
            RegistryConfig::new(&intake, dir.path().join("archive")),
        );
        Setup {
            _dir: dir,
            intake,
            registry,
            ledger,
        }
    }

    fn write(dir: &Path, name: &str, body: &[u8]) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[tokio::test]
    async fn test_archive_name_keeps_stem_and_extension() {
        let s = setup();
        let path = write(&s.intake, "deed.v2.PDF", b"%PDF-1.7 deed");
        let record = s.registry.sign(&path).await.unwrap();

        let name = record.archived_path.file_name().unwrap().to_string_lossy();
        assert_eq!(name, format!("deed.v2_SIGNED_{}.PDF", record.signature_token));
        assert_eq!(std::fs::read(&record.archived_path).unwrap(), b"%PDF-1.7 deed");
    }

    #[tokio::test]
    async fn test_discovery_filters_and_sorts() {
        let s = setup();
        write(&s.intake, "b.pdf", b"%PDF b");
        write(&s.intake, "a.pdf", b"%PDF a");
        write(&s.intake, "notes.txt", b"%PDF but wrong extension");
        std::fs::create_dir(s.intake.join("folder.pdf")).unwrap();

        let found = s.registry.discover_candidates().await.unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.pdf", "b.pdf"]);
    }

    #[tokio::test]
    async fn test_sign_batch_uses_given_paths() {
        let s = setup();
        let a = write(&s.intake, "a.pdf", b"%PDF a");
        let twin = write(&s.intake, "twin.pdf", b"%PDF a");
        let skipped = write(&s.intake, "skipped.pdf", b"%PDF not in batch");

        let report = s.registry.sign_batch(vec![a, twin]).await;
        assert_eq!((report.succeeded, report.failed), (1, 1));
        assert!(matches!(
            report.results[1].result,
            Err(RegistryError::AlreadySigned(_))
        ));
        assert_eq!(s.registry.discover_candidates().await.unwrap(), vec![skipped]);
    }

    #[tokio::test]
    async fn test_verify_leaves_status_when_not_anchored() {
        let s = setup();
        let path = write(&s.intake, "lost.pdf", b"%PDF lost anchor");
        let record = s.registry.sign(&path).await.unwrap();
        s.ledger.forget(&record.content_hash).await;

        let err = s.registry.verify(&path).await.unwrap_err();
        assert!(matches!(err, RegistryError::NotAnchored(_)));
        let stored = s.registry.record(&record.content_hash).await.unwrap().unwrap();
        assert_eq!(stored.status, SignatureStatus::Signed);
    }

    fn pending_record(s: &Setup, body: &[u8]) -> SignatureRecord {
        SignatureRecord {
            content_hash: ContentHash::digest(body),
            source_path: s.intake.join("pending.pdf"),
            archived_path: PathBuf::new(),
            store_reference: docseal_core::StoreReference::new("ref"),
            ledger_reference: docseal_core::LedgerReference::new("0x0"),
            signature_token: SignatureToken("SIG_0000000000000000".into()),
            created_at: 0,
            status: SignatureStatus::Pending,
        }
    }

    #[tokio::test]
    async fn test_reverify_settles_pending_records() {
        let s = setup();
        let anchored = pending_record(&s, b"%PDF anchored");
        let unknown = pending_record(&s, b"%PDF never anchored");
        s.ledger.anchor(&anchored.content_hash).await.unwrap();
        s.registry.store().insert_record(&anchored).await.unwrap();
        s.registry.store().insert_record(&unknown).await.unwrap();

        let before = s.registry.stats().await.unwrap();
        assert_eq!(before.total, 2);
        assert_eq!(before.pending, 2);

        let report = s.registry.verify_all().await.unwrap();
        assert_eq!((report.verified, report.failed), (1, 1));
        assert_eq!(report.results[0].status, SignatureStatus::Verified);
        assert_eq!(report.results[0].error, None);
        assert_eq!(report.results[1].status, SignatureStatus::Failed);

        let stored = s.registry.record(&anchored.content_hash).await.unwrap().unwrap();
        assert_eq!(stored.status, SignatureStatus::Verified);

        let after = s.registry.stats().await.unwrap();
        assert_eq!(after.total, after.signed + after.verified + after.failed);
        assert_eq!(after.pending, 0);
    }
}

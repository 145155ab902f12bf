//! Store trait: the abstract interface for registry persistence.
//!
//! This trait keeps the registry storage-agnostic. Implementations
//! include a JSON file (primary), SQLite, and in-memory (for tests).

use async_trait::async_trait;
use docseal_core::{ContentHash, SignatureRecord, SignatureStatus};
use serde::Serialize;

use crate::error::Result;

/// Result of inserting a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertResult {
    /// Record was inserted.
    Inserted,
    /// A record with this content hash already exists; nothing changed.
    AlreadyExists,
}

/// The Store trait: async interface for registry persistence.
///
/// # Design Notes
///
/// - **Idempotent inserts**: Inserting a record whose hash is already present
///   returns `AlreadyExists` and leaves the stored record untouched.
/// - **Ordered listing**: `list_records` yields insertion order.
/// - **Status only**: after insert, the status is the only mutable field.
///   Lifecycle rules are enforced by the caller.
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert a new record keyed by its content hash.
    async fn insert_record(&self, record: &SignatureRecord) -> Result<InsertResult>;

    /// Get a record by content hash.
    async fn get_record(&self, hash: &ContentHash) -> Result<Option<SignatureRecord>>;

    /// Check if a record exists.
    async fn has_record(&self, hash: &ContentHash) -> Result<bool>;

    /// Overwrite the status of an existing record.
    ///
    /// Returns `NotFound` if no record has this hash.
    async fn update_status(&self, hash: &ContentHash, status: SignatureStatus) -> Result<()>;

    /// All records in insertion order.
    async fn list_records(&self) -> Result<Vec<SignatureRecord>>;

    /// Number of records.
    async fn count(&self) -> Result<usize>;
}

/// Per-status record counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusTally {
    pub total: usize,
    pub signed: usize,
    pub verified: usize,
    pub failed: usize,
    pub pending: usize,
}

impl StatusTally {
    /// Count one record status.
    pub fn add(&mut self, status: SignatureStatus) {
        self.total += 1;
        match status {
            SignatureStatus::Pending => self.pending += 1,
            SignatureStatus::Signed => self.signed += 1,
            SignatureStatus::Verified => self.verified += 1,
            SignatureStatus::Failed => self.failed += 1,
        }
    }
}

/// Extension trait for common store patterns.
pub trait StoreExt: Store {
    /// Tally stored records by status.
    fn tally(&self) -> impl std::future::Future<Output = Result<StatusTally>> + Send;
}

impl<S: Store + ?Sized> StoreExt for S {
    async fn tally(&self) -> Result<StatusTally> {
        let mut tally = StatusTally::default();
        for record in self.list_records().await? {
            tally.add(record.status);
        }
        Ok(tally)
    }
}

//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as the file
//! and SQLite backends but keeps everything in memory with no persistence.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use docseal_core::{ContentHash, SignatureRecord, SignatureStatus};

use crate::error::{Result, StoreError};
use crate::traits::{InsertResult, Store};

/// Insertion-ordered record map shared by the memory and file backends.
#[derive(Debug, Default, Clone)]
pub(crate) struct RecordTable {
    /// Content hashes in insertion order.
    order: Vec<ContentHash>,
    /// Records indexed by content hash.
    records: HashMap<ContentHash, SignatureRecord>,
}

impl RecordTable {
    /// Build from ordered pairs, rejecting mismatched or duplicate keys.
    pub(crate) fn from_pairs(pairs: Vec<(ContentHash, SignatureRecord)>) -> Result<Self> {
        let mut table = Self::default();
        for (hash, record) in pairs {
            if hash != record.content_hash {
                return Err(StoreError::InvalidData(format!(
                    "key {hash} does not match record hash {}",
                    record.content_hash
                )));
            }
            if table.insert(record) == InsertResult::AlreadyExists {
                return Err(StoreError::InvalidData(format!("duplicate key {hash}")));
            }
        }
        Ok(table)
    }

    pub(crate) fn insert(&mut self, record: SignatureRecord) -> InsertResult {
        if self.records.contains_key(&record.content_hash) {
            return InsertResult::AlreadyExists;
        }
        self.order.push(record.content_hash);
        self.records.insert(record.content_hash, record);
        InsertResult::Inserted
    }

    pub(crate) fn get(&self, hash: &ContentHash) -> Option<&SignatureRecord> {
        self.records.get(hash)
    }

    pub(crate) fn contains(&self, hash: &ContentHash) -> bool {
        self.records.contains_key(hash)
    }

    pub(crate) fn set_status(&mut self, hash: &ContentHash, status: SignatureStatus) -> Result<()> {
        let record = self
            .records
            .get_mut(hash)
            .ok_or_else(|| StoreError::NotFound(hash.to_hex()))?;
        record.status = status;
        Ok(())
    }

    /// Records in insertion order.
    pub(crate) fn ordered(&self) -> impl Iterator<Item = &SignatureRecord> {
        self.order.iter().filter_map(|hash| self.records.get(hash))
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }
}

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<RecordTable>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RecordTable::default()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::InvalidData(format!("lock poisoned: {e}"))
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_record(&self, record: &SignatureRecord) -> Result<InsertResult> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        Ok(inner.insert(record.clone()))
    }

    async fn get_record(&self, hash: &ContentHash) -> Result<Option<SignatureRecord>> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner.get(hash).cloned())
    }

    async fn has_record(&self, hash: &ContentHash) -> Result<bool> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner.contains(hash))
    }

    async fn update_status(&self, hash: &ContentHash, status: SignatureStatus) -> Result<()> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        inner.set_status(hash, status)
    }

    async fn list_records(&self) -> Result<Vec<SignatureRecord>> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner.ordered().cloned().collect())
    }

    async fn count(&self) -> Result<usize> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner.len())
    }
}

//! JSON file implementation of the Store trait.
//!
//! The whole registry lives in one structured-text document: an array of
//! `[contentHash, record]` pairs in insertion order. Every mutation rewrites
//! the file (temp sibling + rename) while holding the store's single writer
//! lock, so writes are never reordered or interleaved.
//!
//! If the write fails after the in-memory table was updated, the store is
//! marked dirty, the failure is logged, and the error is returned. The next
//! successful write (or [`FileStore::flush`]) brings the file back in line.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use docseal_core::{ContentHash, SignatureRecord, SignatureStatus};
use tokio::sync::Mutex;

use crate::error::Result;
use crate::memory::RecordTable;
use crate::traits::{InsertResult, Store};

/// File-backed store implementation.
pub struct FileStore {
    path: PathBuf,
    inner: Mutex<FileStoreInner>,
}

struct FileStoreInner {
    table: RecordTable,
    /// In-memory state is ahead of the file.
    dirty: bool,
}

impl FileStore {
    /// Open the registry file at `path`, loading any existing records.
    ///
    /// A missing file is an empty registry; it is created on first write.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let table = match std::fs::read(&path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => RecordTable::default(),
            Ok(bytes) => {
                let pairs: Vec<(ContentHash, SignatureRecord)> = serde_json::from_slice(&bytes)?;
                RecordTable::from_pairs(pairs)?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => RecordTable::default(),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(path = %path.display(), records = table.len(), "opened registry file");

        Ok(Self {
            path,
            inner: Mutex::new(FileStoreInner {
                table,
                dirty: false,
            }),
        })
    }

    /// Location of the registry file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the last write failed and memory is ahead of the file.
    pub async fn is_dirty(&self) -> bool {
        self.inner.lock().await.dirty
    }

    /// Rewrite the file from the in-memory table.
    pub async fn flush(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        self.persist(&mut inner).await
    }

    async fn persist(&self, inner: &mut FileStoreInner) -> Result<()> {
        match self.write_table(&inner.table).await {
            Ok(()) => {
                if inner.dirty {
                    tracing::info!(path = %self.path.display(), "registry file back in sync");
                }
                inner.dirty = false;
                Ok(())
            }
            Err(e) => {
                inner.dirty = true;
                tracing::error!(
                    path = %self.path.display(),
                    error = %e,
                    "registry write failed; in-memory state is ahead of the file"
                );
                Err(e)
            }
        }
    }

    async fn write_table(&self, table: &RecordTable) -> Result<()> {
        let pairs: Vec<(&ContentHash, &SignatureRecord)> =
            table.ordered().map(|r| (&r.content_hash, r)).collect();
        let json = serde_json::to_vec_pretty(&pairs)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tmp = temp_path(&self.path);
        tokio::fs::write(&tmp, &json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[async_trait]
impl Store for FileStore {
    async fn insert_record(&self, record: &SignatureRecord) -> Result<InsertResult> {
        let mut inner = self.inner.lock().await;
        let result = inner.table.insert(record.clone());
        if result == InsertResult::Inserted {
            self.persist(&mut inner).await?;
        }
        Ok(result)
    }

    async fn get_record(&self, hash: &ContentHash) -> Result<Option<SignatureRecord>> {
        let inner = self.inner.lock().await;
        Ok(inner.table.get(hash).cloned())
    }

    async fn has_record(&self, hash: &ContentHash) -> Result<bool> {
        let inner = self.inner.lock().await;
        Ok(inner.table.contains(hash))
    }

    async fn update_status(&self, hash: &ContentHash, status: SignatureStatus) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.table.set_status(hash, status)?;
        self.persist(&mut inner).await
    }

    async fn list_records(&self) -> Result<Vec<SignatureRecord>> {
        let inner = self.inner.lock().await;
        Ok(inner.table.ordered().cloned().collect())
    }

    async fn count(&self) -> Result<usize> {
        let inner = self.inner.lock().await;
        Ok(inner.table.len())
    }
}

//! SQLite implementation of the Store trait.
//!
//! Uses rusqlite with bundled SQLite, wrapped in async via
//! tokio::spawn_blocking. Insertion order is rowid order.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};

use docseal_core::{
    ContentHash, LedgerReference, SignatureRecord, SignatureStatus, SignatureToken,
    StoreReference,
};

use crate::error::{Result, StoreError};
use crate::migration::{self, now_millis};
use crate::traits::{InsertResult, Store};

const SELECT_RECORD: &str = "SELECT content_hash, source_path, archived_path, store_reference,
        ledger_reference, signature_token, created_at, status
 FROM signature_records";

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|e| {
                StoreError::Database(rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
                    Some(format!("mutex poisoned: {}", e)),
                ))
            })?;
            f(&conn)
        })
        .await
        .map_err(|e| {
            StoreError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
                Some(format!("spawn_blocking failed: {}", e)),
            ))
        })?
    }
}

// Helper to convert a row to SignatureRecord
fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<SignatureRecord> {
    let hash_hex: String = row.get("content_hash")?;
    let status_str: String = row.get("status")?;

    let content_hash = ContentHash::from_hex(&hash_hex)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?;
    let status = status_str
        .parse::<SignatureStatus>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e)))?;

    Ok(SignatureRecord {
        content_hash,
        source_path: PathBuf::from(row.get::<_, String>("source_path")?),
        archived_path: PathBuf::from(row.get::<_, String>("archived_path")?),
        store_reference: StoreReference(row.get("store_reference")?),
        ledger_reference: LedgerReference(row.get("ledger_reference")?),
        signature_token: SignatureToken(row.get("signature_token")?),
        created_at: row.get("created_at")?,
        status,
    })
}

#[async_trait]
impl Store for SqliteStore {
    async fn insert_record(&self, record: &SignatureRecord) -> Result<InsertResult> {
        let record = record.clone();

        self.blocking(move |conn| {
            let changed = conn.execute(
                "INSERT OR IGNORE INTO signature_records (
                    content_hash, source_path, archived_path, store_reference,
                    ledger_reference, signature_token, created_at, status, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    record.content_hash.to_hex(),
                    record.source_path.to_string_lossy().into_owned(),
                    record.archived_path.to_string_lossy().into_owned(),
                    record.store_reference.as_str(),
                    record.ledger_reference.as_str(),
                    record.signature_token.as_str(),
                    record.created_at,
                    record.status.as_str(),
                    now_millis(),
                ],
            )?;

            Ok(if changed == 0 {
                InsertResult::AlreadyExists
            } else {
                InsertResult::Inserted
            })
        })
        .await
    }

    async fn get_record(&self, hash: &ContentHash) -> Result<Option<SignatureRecord>> {
        let hash = *hash;

        self.blocking(move |conn| {
            conn.query_row(
                &format!("{SELECT_RECORD} WHERE content_hash = ?1"),
                params![hash.to_hex()],
                row_to_record,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn has_record(&self, hash: &ContentHash) -> Result<bool> {
        let hash = *hash;

        self.blocking(move |conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM signature_records WHERE content_hash = ?1",
                    params![hash.to_hex()],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
        .await
    }

    async fn update_status(&self, hash: &ContentHash, status: SignatureStatus) -> Result<()> {
        let hash = *hash;

        self.blocking(move |conn| {
            let changed = conn.execute(
                "UPDATE signature_records SET status = ?1, updated_at = ?2 WHERE content_hash = ?3",
                params![status.as_str(), now_millis(), hash.to_hex()],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound(hash.to_hex()));
            }
            Ok(())
        })
        .await
    }

    async fn list_records(&self) -> Result<Vec<SignatureRecord>> {
        self.blocking(|conn| {
            let mut stmt = conn.prepare(&format!("{SELECT_RECORD} ORDER BY rowid"))?;
            let records = stmt
                .query_map([], row_to_record)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(records)
        })
        .await
    }

    async fn count(&self) -> Result<usize> {
        self.blocking(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM signature_records", [], |row| {
                    row.get(0)
                })?;
            Ok(count as usize)
        })
        .await
    }
}

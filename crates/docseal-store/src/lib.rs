//! # Docseal Store
//!
//! Persistence for the signature registry. Provides a trait-based interface
//! with a structured-text file backend, a SQLite backend and an in-memory
//! backend for tests.
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for all registry persistence
//! - [`FileStore`] - JSON document rewritten on every mutation
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`InsertResult`] - Result of inserting a record
//!
//! ## Usage
//!
//! ```rust,no_run
//! use docseal_store::{FileStore, Store};
//!
//! async fn example() {
//!     let store = FileStore::open("signed-documents/signatures.json").unwrap();
//!     let records = store.list_records().await.unwrap();
//!     println!("{} records", records.len());
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Keyed by content**: at most one record per content hash; a second
//!   insert for the same hash returns `AlreadyExists` and changes nothing
//! - **Insertion order**: `list_records` returns records in the order they
//!   were first inserted, in every backend
//! - **Durable before done**: a mutating call returns only after the durable
//!   write finished (or failed, in which case the error says so)

pub mod error;
pub mod file;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{InsertResult, StatusTally, Store, StoreExt};

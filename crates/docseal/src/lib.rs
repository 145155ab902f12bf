//! # docseal
//!
//! A document signature registry: fingerprint documents, anchor the
//! fingerprint on a ledger, keep a copy in a content-addressed store, and
//! reconcile the whole registry on a schedule.
//!
//! ## Overview
//!
//! - **Registry**: signs and verifies documents. One record per unique
//!   content hash, never removed.
//! - **Scheduler**: periodically signs whatever is pending and re-verifies
//!   every record, keeping counters, a stats snapshot and an event log.
//!
//! ## Lifecycle
//!
//! A record is created `signed`. Verification moves it to `verified` or
//! `failed`, and later sweeps may move it between those two. A record stored
//! as `pending` is settled by the next sweep. No record goes back to
//! `pending`.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use docseal::anchor::memory::{MemoryContentStore, MemoryLedger};
//! use docseal::store::FileStore;
//! use docseal::{Registry, RegistryConfig, Scheduler, SchedulerConfig};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let store = FileStore::open("signatures.json")?;
//!     let registry = Arc::new(Registry::new(
//!         store,
//!         Arc::new(MemoryLedger::default()),
//!         Arc::new(MemoryContentStore::default()),
//!         RegistryConfig::new("documents", "signed-documents"),
//!     ));
//!
//!     // Sign one document directly
//!     let record = registry.sign("documents/contract.pdf").await?;
//!     println!("signed as {}", record.signature_token);
//!
//!     // Or let the scheduler reconcile the intake directory
//!     let scheduler = Scheduler::new(registry, SchedulerConfig::default());
//!     scheduler.start();
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `docseal::core` - Content hashes, records, tokens
//! - `docseal::store` - Registry persistence (memory, JSON file, SQLite)
//! - `docseal::anchor` - Ledger and content store interfaces

pub mod config;
pub mod error;
pub mod eventlog;
pub mod registry;
pub mod scheduler;
pub mod stats;

// Re-export component crates
pub use docseal_anchor as anchor;
pub use docseal_core as core;
pub use docseal_store as store;

// Re-export main types for convenience
pub use config::{LogLevel, RegistryConfig, SchedulerConfig, SchedulerConfigUpdate};
pub use error::{ErrorKind, RegistryError, Result, SchedulerError};
pub use eventlog::EventLog;
pub use registry::{
    AuditReport, DocumentInfo, Registry, RegistryStats, ServiceHealth, SignOutcome, SignReport,
    VerifyOutcome, VerifyReport,
};
pub use scheduler::{Scheduler, SchedulerStatus, TickReport};
pub use stats::{MonitoringStats, StatsSnapshot};

// Re-export commonly used core types
pub use docseal_core::{
    ContentHash, DocumentFormat, LedgerReference, SignatureRecord, SignatureStatus,
    SignatureToken, StoreReference,
};

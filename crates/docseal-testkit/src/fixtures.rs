//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use docseal::{Registry, RegistryConfig, Scheduler, SchedulerConfig};
use docseal_anchor::memory::{MemoryContentStore, MemoryLedger};
use docseal_store::{MemoryStore, Store};
use tempfile::TempDir;

/// Header prepended by [`pdf_bytes`].
pub const PDF_HEADER: &[u8] = b"%PDF-1.4\n";

/// A minimal well-formed document around `body`.
pub fn pdf_bytes(body: &[u8]) -> Vec<u8> {
    let mut bytes = PDF_HEADER.to_vec();
    bytes.extend_from_slice(body);
    bytes
}

/// A temporary intake/archive tree and a registry wired to in-memory
/// collaborators.
///
/// The collaborators are shared with the registry, so tests can inject
/// failures or tamper with them after setup.
pub struct TestHarness<S: Store + 'static = MemoryStore> {
    pub dir: TempDir,
    pub intake: PathBuf,
    pub archive: PathBuf,
    pub ledger: Arc<MemoryLedger>,
    pub content: Arc<MemoryContentStore>,
    pub registry: Arc<Registry<S>>,
}

impl TestHarness {
    /// Harness backed by a [`MemoryStore`].
    pub fn new() -> Self {
        Self::build(|_| MemoryStore::new())
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Store + 'static> TestHarness<S> {
    /// Harness with a store built from the temporary root directory.
    pub fn build(make_store: impl FnOnce(&Path) -> S) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let intake = dir.path().join("documents");
        let archive = dir.path().join("signed-documents");
        std::fs::create_dir_all(&intake).expect("create intake dir");

        let ledger = Arc::new(MemoryLedger::default());
        let content = Arc::new(MemoryContentStore::default());
        let registry = Arc::new(Registry::new(
            make_store(dir.path()),
            ledger.clone(),
            content.clone(),
            RegistryConfig::new(&intake, &archive),
        ));

        Self {
            dir,
            intake,
            archive,
            ledger,
            content,
            registry,
        }
    }

    /// Write a well-formed document (PDF header + `body`) into the intake.
    pub fn write_document(&self, name: &str, body: &[u8]) -> PathBuf {
        self.write_raw(name, &pdf_bytes(body))
    }

    /// Write arbitrary bytes into the intake.
    pub fn write_raw(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.intake.join(name);
        std::fs::write(&path, bytes).expect("write intake document");
        path
    }

    /// Scheduler config with every output file inside the temp tree and an
    /// interval long enough that only the immediate first tick fires.
    pub fn scheduler_config(&self) -> SchedulerConfig {
        let root = self.dir.path();
        SchedulerConfig {
            interval: Duration::from_secs(3600),
            log_file: root.join("monitoring.log"),
            stats_file: root.join("monitoring-status.json"),
            export_dir: root.join("exports"),
            ..SchedulerConfig::default()
        }
    }

    pub fn scheduler(&self, config: SchedulerConfig) -> Scheduler<S> {
        Scheduler::new(self.registry.clone(), config)
    }

    /// Number of files in the archive directory.
    pub fn archived_count(&self) -> usize {
        std::fs::read_dir(&self.archive)
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

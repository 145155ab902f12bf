//! The reconciliation scheduler.
//!
//! On each tick the scheduler signs whatever is pending, re-verifies every
//! record, folds the results into its counters and writes a stats snapshot.
//! Ticks come from a timer task owned by the scheduler or from
//! [`Scheduler::force_check`].
//!
//! At most one tick runs at a time. A timer tick that finds another tick in
//! flight is skipped and counted; a forced check waits its turn.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use docseal_store::Store;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::{SchedulerConfig, SchedulerConfigUpdate};
use crate::error::SchedulerError;
use crate::eventlog::EventLog;
use crate::registry::{Registry, RegistryStats, ServiceHealth};
use crate::stats::{MonitoringStats, StatsSnapshot};

/// Shortest interval the timer accepts.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// What happened during one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tick number (1-based).
    pub tick: u64,
    /// Unsigned documents found at the start of the tick.
    pub pending: usize,
    pub signatures_created: usize,
    pub sign_failures: usize,
    pub verified: usize,
    pub verify_failures: usize,
    /// Set when the tick ended early.
    pub error: Option<String>,
}

/// Snapshot returned by [`Scheduler::status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerStatus {
    pub running: bool,
    pub config: SchedulerConfig,
    pub stats: MonitoringStats,
    pub registry: RegistryStats,
    pub services: ServiceHealth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Timer,
    Forced,
}

struct Timer {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

struct SchedulerInner<S: Store> {
    registry: Arc<Registry<S>>,
    config: RwLock<SchedulerConfig>,
    stats: Mutex<MonitoringStats>,
    log: EventLog,
    in_flight: tokio::sync::Mutex<()>,
}

/// Periodically reconciles a [`Registry`].
///
/// Dropping the scheduler stops its timer after any in-flight tick.
pub struct Scheduler<S: Store + 'static> {
    inner: Arc<SchedulerInner<S>>,
    timer: Mutex<Option<Timer>>,
}

impl<S: Store + 'static> Scheduler<S> {
    pub fn new(registry: Arc<Registry<S>>, config: SchedulerConfig) -> Self {
        let log = EventLog::new(&config.log_file, config.log_level);
        Self {
            inner: Arc::new(SchedulerInner {
                registry,
                config: RwLock::new(config),
                stats: Mutex::new(MonitoringStats::new()),
                log,
                in_flight: tokio::sync::Mutex::new(()),
            }),
            timer: Mutex::new(None),
        }
    }

    pub fn registry(&self) -> &Arc<Registry<S>> {
        &self.inner.registry
    }

    pub fn config(&self) -> SchedulerConfig {
        self.inner.config()
    }

    /// Current counters.
    pub fn stats(&self) -> MonitoringStats {
        self.inner.stats().clone()
    }

    pub fn is_running(&self) -> bool {
        lock(&self.timer).is_some()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Start the timer. The first tick runs immediately.
    ///
    /// Returns false (and logs a warning) if already running. Must be called
    /// from within a tokio runtime.
    pub fn start(&self) -> bool {
        let mut timer = lock(&self.timer);
        if timer.is_some() {
            self.inner.log.warn("scheduler already running");
            return false;
        }

        let interval = self.inner.config().interval.max(MIN_INTERVAL);
        self.inner.log.info(format!(
            "scheduler started (interval {}ms)",
            interval.as_millis()
        ));

        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => break,
                    _ = ticker.tick() => {}
                }
                inner.run_tick(Trigger::Timer).await;
            }
        });

        *timer = Some(Timer { shutdown, task });
        true
    }

    /// Signal the timer to stop. A tick already running completes.
    ///
    /// Returns false (and logs a warning) if not running.
    pub fn stop(&self) -> bool {
        match self.take_timer() {
            Some(timer) => {
                let _ = timer.shutdown.send(true);
                true
            }
            None => false,
        }
    }

    /// Like [`stop`](Self::stop), but waits for the timer task to exit.
    pub async fn stop_and_wait(&self) -> bool {
        let Some(timer) = self.take_timer() else {
            return false;
        };
        let _ = timer.shutdown.send(true);
        if let Err(e) = timer.task.await {
            tracing::error!(error = %e, "scheduler task ended abnormally");
        }
        true
    }

    fn take_timer(&self) -> Option<Timer> {
        let timer = lock(&self.timer).take();
        match timer {
            Some(_) => self.inner.log.info("scheduler stopped"),
            None => self.inner.log.warn("scheduler is not running"),
        }
        timer
    }

    /// Run one tick now, waiting for any tick in flight to finish first.
    pub async fn force_check(&self) -> TickReport {
        self.inner.log.info("forced check requested");
        self.inner.run_tick(Trigger::Forced).await.unwrap_or_default()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reporting
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn status(&self) -> Result<SchedulerStatus, SchedulerError> {
        let registry = self.inner.registry.stats().await?;
        let services = self.inner.registry.check_services().await;
        Ok(SchedulerStatus {
            running: self.is_running(),
            config: self.inner.config(),
            stats: self.stats(),
            registry,
            services,
        })
    }

    /// Write a snapshot to a new timestamped file in the export directory.
    ///
    /// Never overwrites an existing file.
    pub async fn export_stats(&self) -> Result<PathBuf, SchedulerError> {
        let snapshot = self.inner.snapshot().await?;
        let json = serde_json::to_vec_pretty(&snapshot)?;
        let dir = self.inner.config().export_dir;
        tokio::fs::create_dir_all(&dir).await?;

        let stamp = snapshot.timestamp.format("%Y%m%dT%H%M%S%.3fZ").to_string();
        let mut attempt = 0u32;
        loop {
            let name = match attempt {
                0 => format!("monitoring-export-{stamp}.json"),
                n => format!("monitoring-export-{stamp}-{n}.json"),
            };
            let path = dir.join(name);
            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(mut file) => {
                    file.write_all(&json).await?;
                    file.flush().await?;
                    self.inner
                        .log
                        .info(format!("stats exported to {}", path.display()));
                    return Ok(path);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Merge a partial config update. A new interval applies on the next
    /// [`start`](Self::start).
    pub fn update_config(&self, update: &SchedulerConfigUpdate) -> SchedulerConfig {
        let (changed, config) = {
            let mut config = self
                .inner
                .config
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            (config.apply(update), config.clone())
        };

        if changed {
            self.inner.log.set_min_level(config.log_level);
            let summary = serde_json::to_string(update).unwrap_or_else(|_| format!("{update:?}"));
            self.inner.log.info(format!("configuration updated: {summary}"));
        }
        config
    }

    /// The last `lines` event log lines, oldest first.
    pub fn log_history(&self, lines: usize) -> Result<Vec<String>, SchedulerError> {
        Ok(self.inner.log.history(lines)?)
    }

    /// Truncate the event log to its last `max_lines` lines.
    pub fn clean_old_logs(&self, max_lines: usize) -> Result<usize, SchedulerError> {
        let removed = self.inner.log.truncate(max_lines)?;
        if removed > 0 {
            tracing::info!(removed, kept = max_lines, "event log truncated");
        }
        Ok(removed)
    }

    pub fn log_path(&self) -> &Path {
        self.inner.log.path()
    }
}

impl<S: Store + 'static> Drop for Scheduler<S> {
    fn drop(&mut self) {
        if let Some(timer) = lock(&self.timer).take() {
            let _ = timer.shutdown.send(true);
        }
    }
}

impl<S: Store + 'static> SchedulerInner<S> {
    fn config(&self) -> SchedulerConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn stats(&self) -> std::sync::MutexGuard<'_, MonitoringStats> {
        lock(&self.stats)
    }

    /// Run one tick under the in-flight guard. Returns `None` if skipped.
    async fn run_tick(&self, trigger: Trigger) -> Option<TickReport> {
        let _guard = match trigger {
            Trigger::Forced => self.in_flight.lock().await,
            Trigger::Timer => match self.in_flight.try_lock() {
                Ok(guard) => guard,
                Err(_) => {
                    self.stats().skipped_ticks += 1;
                    self.log.warn("previous check still running; tick skipped");
                    return None;
                }
            },
        };

        let tick = {
            let mut stats = self.stats();
            stats.total_ticks += 1;
            stats.last_check_at = Some(Utc::now());
            stats.total_ticks
        };

        let mut report = TickReport {
            tick,
            ..TickReport::default()
        };
        if let Err(e) = self.reconcile(&mut report).await {
            self.stats().errors += 1;
            self.log.error(format!("check #{tick} failed: {e:#}"));
            report.error = Some(format!("{e:#}"));
        }
        Some(report)
    }

    async fn reconcile(&self, report: &mut TickReport) -> anyhow::Result<()> {
        let config = self.config();
        self.log.info(format!("check #{} started", report.tick));

        let pending = self
            .registry
            .discover_candidates()
            .await
            .context("discovering pending documents")?;
        report.pending = pending.len();
        self.log.info(format!("pending documents: {}", pending.len()));

        if config.auto_sign && !pending.is_empty() {
            let signed = self.registry.sign_batch(pending).await;
            for outcome in &signed.results {
                match &outcome.result {
                    Ok(record) => self.log.debug(format!(
                        "signed {} as {}",
                        outcome.path.display(),
                        record.signature_token
                    )),
                    Err(e) => self
                        .log
                        .warn(format!("could not sign {}: {e}", outcome.path.display())),
                }
            }

            report.signatures_created = signed.succeeded;
            report.sign_failures = signed.failed;
            {
                let mut stats = self.stats();
                stats.signatures_created += signed.succeeded as u64;
                stats.documents_processed += (signed.succeeded + signed.failed) as u64;
            }
            self.log.info(format!(
                "signatures created: {}, failed: {}",
                signed.succeeded, signed.failed
            ));
        }

        if config.auto_verify {
            let verified = self
                .registry
                .verify_all()
                .await
                .context("verifying signed documents")?;
            report.verified = verified.verified;
            report.verify_failures = verified.failed;
            self.stats().verifications_completed += 1;
            self.log.info(format!(
                "verification sweep: {} verified, {} failed",
                verified.verified, verified.failed
            ));
        }

        let snapshot = self.snapshot().await.context("collecting registry stats")?;
        let registry = &snapshot.registry;
        self.log.info(format!(
            "registry: total {}, signed {}, verified {}, failed {}, pending {}",
            registry.total, registry.signed, registry.verified, registry.failed, registry.pending
        ));
        let monitoring = &snapshot.monitoring;
        self.log.info(format!(
            "monitoring: ticks {}, processed {}, signatures {}, verifications {}, errors {}",
            monitoring.total_ticks,
            monitoring.documents_processed,
            monitoring.signatures_created,
            monitoring.verifications_completed,
            monitoring.errors
        ));

        write_snapshot(&config.stats_file, &snapshot)
            .await
            .with_context(|| format!("writing stats to {}", config.stats_file.display()))?;
        Ok(())
    }

    async fn snapshot(&self) -> Result<StatsSnapshot, SchedulerError> {
        let registry = self.registry.stats().await?;
        Ok(StatsSnapshot {
            timestamp: Utc::now(),
            monitoring: self.stats().clone(),
            registry,
            config: self.config(),
        })
    }
}

async fn write_snapshot(path: &Path, snapshot: &StatsSnapshot) -> Result<(), SchedulerError> {
    let json = serde_json::to_vec_pretty(snapshot)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(path, json).await?;
    Ok(())
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

//! Monitoring counters and the snapshot written after each tick.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::SchedulerConfig;
use crate::registry::RegistryStats;

/// Counters kept by the scheduler for its whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringStats {
    pub started_at: DateTime<Utc>,
    pub last_check_at: Option<DateTime<Utc>>,
    /// Ticks that ran, timer and forced.
    pub total_ticks: u64,
    /// Sign attempts, successful or not.
    pub documents_processed: u64,
    pub signatures_created: u64,
    /// Completed verification sweeps.
    pub verifications_completed: u64,
    /// Ticks that ended in an error.
    pub errors: u64,
    /// Timer ticks dropped because another tick was running.
    pub skipped_ticks: u64,
}

impl MonitoringStats {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            last_check_at: None,
            total_ticks: 0,
            documents_processed: 0,
            signatures_created: 0,
            verifications_completed: 0,
            errors: 0,
            skipped_ticks: 0,
        }
    }
}

impl Default for MonitoringStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view written to the stats file and to exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub monitoring: MonitoringStats,
    pub registry: RegistryStats,
    pub config: SchedulerConfig,
}

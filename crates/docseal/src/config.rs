//! Configuration for the registry and the reconciliation scheduler.
//!
//! Plain structs with `Default` impls. Loading them from files or the
//! environment is left to the embedding application.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use docseal_core::DocumentFormat;
use serde::{Deserialize, Serialize};

/// Where the registry looks for documents and where it archives them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryConfig {
    /// Directory scanned for unsigned documents.
    pub intake_dir: PathBuf,
    /// Directory receiving renamed copies of signed documents.
    pub archive_dir: PathBuf,
    /// Accepted document format.
    #[serde(default)]
    pub format: DocumentFormat,
}

impl RegistryConfig {
    pub fn new(intake_dir: impl Into<PathBuf>, archive_dir: impl Into<PathBuf>) -> Self {
        Self {
            intake_dir: intake_dir.into(),
            archive_dir: archive_dir.into(),
            format: DocumentFormat::default(),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self::new("documents", "signed-documents")
    }
}

/// Severity of an event-log line. Ordered from least to most severe.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Label written inside the brackets of a log line.
    pub fn label(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

/// Scheduler configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerConfig {
    /// Time between ticks.
    #[serde(with = "duration_millis")]
    pub interval: Duration,

    /// Sign pending documents on each tick.
    pub auto_sign: bool,

    /// Re-verify every record on each tick.
    pub auto_verify: bool,

    /// Minimum level written to the event log.
    pub log_level: LogLevel,

    /// Append-only event log.
    pub log_file: PathBuf,

    /// Stats snapshot rewritten after every successful tick.
    pub stats_file: PathBuf,

    /// Directory for timestamped stats exports.
    pub export_dir: PathBuf,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10 * 60),
            auto_sign: true,
            auto_verify: true,
            log_level: LogLevel::Info,
            log_file: PathBuf::from("monitoring.log"),
            stats_file: PathBuf::from("monitoring-status.json"),
            export_dir: PathBuf::from("."),
        }
    }
}

impl SchedulerConfig {
    /// Merge a partial update. Returns true if anything changed.
    pub fn apply(&mut self, update: &SchedulerConfigUpdate) -> bool {
        let before = self.clone();
        if let Some(interval) = update.interval {
            self.interval = interval;
        }
        if let Some(auto_sign) = update.auto_sign {
            self.auto_sign = auto_sign;
        }
        if let Some(auto_verify) = update.auto_verify {
            self.auto_verify = auto_verify;
        }
        if let Some(log_level) = update.log_level {
            self.log_level = log_level;
        }
        *self != before
    }
}

/// Partial update for [`SchedulerConfig`]. `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerConfigUpdate {
    #[serde(default, with = "option_duration_millis")]
    pub interval: Option<Duration>,
    #[serde(default)]
    pub auto_sign: Option<bool>,
    #[serde(default)]
    pub auto_verify: Option<bool>,
    #[serde(default)]
    pub log_level: Option<LogLevel>,
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

mod option_duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match d {
            Some(d) => s.serialize_some(&(d.as_millis() as u64)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduler_defaults() {
        let config = SchedulerConfig::default();
        assert_eq!(config.interval, Duration::from_secs(600));
        assert!(config.auto_sign && config.auto_verify);
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.log_file, PathBuf::from("monitoring.log"));
        assert_eq!(config.stats_file, PathBuf::from("monitoring-status.json"));
    }

    #[test]
    fn test_interval_serializes_as_millis() {
        let json = serde_json::to_value(SchedulerConfig::default()).unwrap();
        assert_eq!(json["interval"], 600_000);
        assert_eq!(json["autoSign"], true);
        assert_eq!(json["logLevel"], "info");

        let back: SchedulerConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, SchedulerConfig::default());
    }

    #[test]
    fn test_partial_update() {
        let mut config = SchedulerConfig::default();
        assert!(!config.apply(&SchedulerConfigUpdate::default()));

        let update: SchedulerConfigUpdate =
            serde_json::from_str(r#"{"interval": 5000, "autoVerify": false}"#).unwrap();
        assert!(config.apply(&update));
        assert_eq!(config.interval, Duration::from_secs(5));
        assert!(!config.auto_verify);
        assert!(config.auto_sign);
    }

    #[test]
    fn test_log_level_order_and_parse() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Warn < LogLevel::Error);
        assert_eq!("WARNING".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert!("loud".parse::<LogLevel>().is_err());
    }
}

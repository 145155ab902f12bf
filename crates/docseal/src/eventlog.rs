//! Append-only, human-readable event log.
//!
//! Each accepted event becomes one line, `[<RFC3339>] [<LEVEL>] <message>`,
//! appended to a file and mirrored to `tracing` at the same level.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use chrono::{SecondsFormat, Utc};

use crate::config::LogLevel;

/// A line-oriented log file with a minimum level.
#[derive(Debug)]
pub struct EventLog {
    path: PathBuf,
    min_level: RwLock<LogLevel>,
}

impl EventLog {
    pub fn new(path: impl Into<PathBuf>, min_level: LogLevel) -> Self {
        Self {
            path: path.into(),
            min_level: RwLock::new(min_level),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn min_level(&self) -> LogLevel {
        *self.min_level.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_min_level(&self, level: LogLevel) {
        *self.min_level.write().unwrap_or_else(PoisonError::into_inner) = level;
    }

    /// Record `message` at `level`. Lines below the minimum level are dropped.
    ///
    /// A failed append is reported through `tracing` and otherwise ignored.
    pub fn log(&self, level: LogLevel, message: impl AsRef<str>) {
        if level < self.min_level() {
            return;
        }
        let message = message.as_ref();

        match level {
            LogLevel::Debug => tracing::debug!(target: "docseal::events", "{message}"),
            LogLevel::Info => tracing::info!(target: "docseal::events", "{message}"),
            LogLevel::Warn => tracing::warn!(target: "docseal::events", "{message}"),
            LogLevel::Error => tracing::error!(target: "docseal::events", "{message}"),
        }

        let line = format!(
            "[{}] [{}] {}\n",
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            level.label(),
            message
        );
        if let Err(e) = self.append(&line) {
            tracing::error!(path = %self.path.display(), error = %e, "event log append failed");
        }
    }

    pub fn debug(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Warn, message);
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Error, message);
    }

    /// The last `lines` non-empty lines, oldest first. A missing file has none.
    pub fn history(&self, lines: usize) -> io::Result<Vec<String>> {
        let all = self.read_lines()?;
        let skip = all.len().saturating_sub(lines);
        Ok(all.into_iter().skip(skip).collect())
    }

    /// Keep only the last `max_lines` lines. Returns how many were removed.
    pub fn truncate(&self, max_lines: usize) -> io::Result<usize> {
        let all = self.read_lines()?;
        if all.len() <= max_lines {
            return Ok(0);
        }
        let removed = all.len() - max_lines;
        let mut kept = all[removed..].join("\n");
        if !kept.is_empty() {
            kept.push('\n');
        }
        std::fs::write(&self.path, kept)?;
        Ok(removed)
    }

    fn append(&self, line: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())
    }

    fn read_lines(&self) -> io::Result<Vec<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(content
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(str::to_string)
                .collect()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }
}

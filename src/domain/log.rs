//! Per-run structured log.
//!
//! Every entry is also emitted through `tracing`. The entries themselves
//! live only as long as the outcome that carries them, so nothing
//! accumulates across requests.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::stage::Stage;

/// Severity of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Info,
    Warn,
}

/// A single log line captured during a pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// When the entry was recorded
    pub timestamp: DateTime<Utc>,

    /// Stage the entry relates to (None for validation)
    pub stage: Option<Stage>,

    pub level: LogLevel,

    /// Human-readable message (NO secrets)
    pub message: String,

    /// Wall-clock duration of the stage call, if one was made
    pub duration_ms: Option<u64>,
}

/// Whole milliseconds in `elapsed`, saturating at `u64::MAX`
pub fn duration_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

/// Append-only log owned by a single run
#[derive(Debug, Clone, Default)]
pub struct RunLog {
    entries: Vec<LogEntry>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed stage call
    pub fn stage_completed(&mut self, stage: Stage, summary: &str, elapsed: Duration) {
        let duration_ms = duration_ms(elapsed);
        info!(%stage, duration_ms, summary, "Stage completed");
        self.push(
            Some(stage),
            LogLevel::Info,
            format!("{} completed in {}ms: {}", stage, duration_ms, summary),
            Some(duration_ms),
        );
    }

    /// Record a failed stage call
    pub fn stage_failed(&mut self, stage: Stage, summary: &str, elapsed: Duration, error: &str) {
        let duration_ms = duration_ms(elapsed);
        warn!(%stage, duration_ms, summary, error, "Stage failed");
        self.push(
            Some(stage),
            LogLevel::Warn,
            format!("{} failed after {}ms: {}: {}", stage, duration_ms, summary, error),
            Some(duration_ms),
        );
    }

    /// Record a problem that was not tied to a stage call
    pub fn warn(&mut self, stage: Option<Stage>, message: impl Into<String>) {
        let message = message.into();
        warn!(stage = ?stage, %message, "Pipeline warning");
        self.push(stage, LogLevel::Warn, message, None);
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<LogEntry> {
        self.entries
    }

    fn push(
        &mut self,
        stage: Option<Stage>,
        level: LogLevel,
        message: String,
        duration_ms: Option<u64>,
    ) {
        self.entries.push(LogEntry {
            timestamp: Utc::now(),
            stage,
            level,
            message,
            duration_ms,
        });
    }
}

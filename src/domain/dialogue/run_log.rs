use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::Level;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub message: String,
}

impl LogEntry {
    /// Render as `2024-01-01 12:00:00,000 - INFO - message`
    pub fn render(&self) -> String {
        format!(
            "{} - {} - {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S,%3f"),
            self.level,
            self.message
        )
    }
}

/// Diagnostic trail for a single narration run.
///
/// Cloning yields another handle onto the same trail, so one run can hand it
/// to every component (including concurrently resolving batches) and read the
/// full trail back once the run has finished, whatever the outcome.
/// Every entry is mirrored to `tracing` tagged with the run id.
#[derive(Debug, Clone)]
pub struct RunLog {
    run_id: Uuid,
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl RunLog {
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.record(Level::DEBUG, message.into());
    }

    pub fn info(&self, message: impl Into<String>) {
        self.record(Level::INFO, message.into());
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.record(Level::WARN, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.record(Level::ERROR, message.into());
    }

    fn record(&self, level: Level, message: String) {
        let run_id = self.run_id;
        match level {
            Level::ERROR => tracing::error!(run_id = %run_id, "{}", message),
            Level::WARN => tracing::warn!(run_id = %run_id, "{}", message),
            Level::INFO => tracing::info!(run_id = %run_id, "{}", message),
            _ => tracing::debug!(run_id = %run_id, "{}", message),
        }

        self.entries.lock().push(LogEntry {
            timestamp: Utc::now(),
            level,
            message,
        });
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().clone()
    }

    /// Whole trail as newline-separated lines, oldest first
    pub fn render(&self) -> String {
        self.entries
            .lock()
            .iter()
            .map(LogEntry::render)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

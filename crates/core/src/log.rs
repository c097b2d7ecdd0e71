//! Bounded activity log (FIFO eviction).

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::id::LogEntryId;

/// Default number of retained entries.
pub const DEFAULT_LOG_CAPACITY: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// One human-readable event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: LogEntryId,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub severity: Severity,
}

impl LogEntry {
    pub fn new(severity: Severity, message: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: LogEntryId::new(),
            timestamp,
            message: message.into(),
            severity,
        }
    }

    pub fn info(message: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self::new(Severity::Info, message, timestamp)
    }

    pub fn warning(message: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self::new(Severity::Warning, message, timestamp)
    }

    pub fn error(message: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self::new(Severity::Error, message, timestamp)
    }

    /// Wall-clock time for display (`HH:MM:SS`, UTC).
    pub fn display_time(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }
}

/// Append-only ring of the most recent entries.
///
/// Invariant: `len() <= capacity()`. When full, the oldest entry is evicted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self {
            entries: VecDeque::with_capacity(DEFAULT_LOG_CAPACITY + 1),
            capacity: DEFAULT_LOG_CAPACITY,
        }
    }
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> CoreResult<Self> {
        if capacity == 0 {
            return Err(CoreError::validation("activity log capacity must be at least 1"));
        }
        Ok(Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
        })
    }

    pub fn append(&mut self, entry: LogEntry) {
        self.entries.push_back(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Build and append an entry; returns its id.
    pub fn record(
        &mut self,
        severity: Severity,
        message: impl Into<String>,
        at: DateTime<Utc>,
    ) -> LogEntryId {
        let entry = LogEntry::new(severity, message, at);
        let id = entry.id;
        self.append(entry);
        id
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Owned copy of the retained entries, oldest first.
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

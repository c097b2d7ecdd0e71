//! Polled resource state with stale-while-error semantics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Last known state of one remotely polled value.
///
/// - `value` stays `None` until the first successful fetch.
/// - A failed fetch keeps the last good `value` and sets `error`.
/// - `is_loading` is the single in-flight guard: a refresh may only start
///   when no other refresh is running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceState<T> {
    pub value: Option<T>,
    pub last_updated: Option<DateTime<Utc>>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl<T> Default for ResourceState<T> {
    fn default() -> Self {
        Self {
            value: None,
            last_updated: None,
            is_loading: false,
            error: None,
        }
    }
}

impl<T> ResourceState<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a fetch as in flight.
    ///
    /// Returns `false` (and changes nothing) if one is already running.
    pub fn begin_refresh(&mut self) -> bool {
        if self.is_loading {
            return false;
        }
        self.is_loading = true;
        true
    }

    /// Record a successful fetch.
    pub fn apply_success(&mut self, value: T, at: DateTime<Utc>) {
        self.value = Some(value);
        self.last_updated = Some(at);
        self.error = None;
        self.is_loading = false;
    }

    /// Record a failed fetch. The previous value is retained.
    pub fn apply_failure(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.is_loading = false;
    }

    /// Drop the in-flight marker without recording an outcome.
    pub fn abandon_refresh(&mut self) {
        self.is_loading = false;
    }

    /// True when a value exists but the latest fetch failed.
    pub fn is_stale(&self) -> bool {
        self.value.is_some() && self.error.is_some()
    }
}

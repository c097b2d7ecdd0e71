//! Additive metric counters driven by the activity simulator.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Increment range (and optional ceiling) for one simulated counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSpec {
    pub name: String,
    /// Smallest increment per tick (inclusive).
    pub min: u64,
    /// Largest increment per tick (inclusive).
    pub max: u64,
    /// Counter saturates at this value when set (percentage-style gauges).
    pub ceiling: Option<u64>,
}

impl CounterSpec {
    pub fn new(name: impl Into<String>, min: u64, max: u64) -> Self {
        Self {
            name: name.into(),
            min,
            max,
            ceiling: None,
        }
    }

    pub fn with_ceiling(mut self, ceiling: u64) -> Self {
        self.ceiling = Some(ceiling);
        self
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::validation("counter name must not be empty"));
        }
        if self.min > self.max {
            return Err(CoreError::validation(format!(
                "counter '{}': min {} exceeds max {}",
                self.name, self.min, self.max
            )));
        }
        Ok(())
    }
}

/// Named non-negative counters.
///
/// The only mutation is [`CounterSet::add`], so every counter is
/// non-decreasing for the lifetime of the set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CounterSet {
    counters: BTreeMap<String, u64>,
}

impl CounterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// A set with every named counter present at zero.
    pub fn zeroed<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            counters: names.into_iter().map(|n| (n.into(), 0)).collect(),
        }
    }

    /// Add `delta` to `name`, creating it at zero if missing.
    ///
    /// Saturates at `ceiling` (or `u64::MAX`). Returns the increment actually
    /// applied, which can be smaller than `delta` once saturated.
    pub fn add(&mut self, name: &str, delta: u64, ceiling: Option<u64>) -> u64 {
        let slot = self.counters.entry(name.to_string()).or_insert(0);
        let before = *slot;
        let mut next = before.saturating_add(delta);
        if let Some(cap) = ceiling {
            // Never lowers a counter that already sits above a newly configured cap.
            next = next.min(cap.max(before));
        }
        *slot = next;
        next - before
    }

    pub fn get(&self, name: &str) -> Option<u64> {
        self.counters.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counters.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// Sum across all counters (saturating).
    pub fn total(&self) -> u64 {
        self.counters.values().fold(0u64, |acc, v| acc.saturating_add(*v))
    }
}

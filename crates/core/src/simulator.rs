//! Synthetic background activity: task rotation and counter bumps.
//!
//! A tick is synchronous and deterministic given its [`RandomSource`]:
//! pick a task, add one bounded increment per counter, log the task.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::counters::{CounterSet, CounterSpec};
use crate::error::{CoreError, CoreResult};
use crate::log::{ActivityLog, Severity};
use crate::random::RandomSource;

/// Task catalog plus counter increment ranges for one widget flavor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatorProfile {
    pub tasks: Vec<String>,
    pub counters: Vec<CounterSpec>,
}

impl SimulatorProfile {
    pub fn new<I, S>(tasks: I, counters: Vec<CounterSpec>) -> CoreResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let profile = Self {
            tasks: tasks.into_iter().map(Into::into).collect(),
            counters,
        };
        profile.validate()?;
        Ok(profile)
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.tasks.is_empty() {
            return Err(CoreError::validation("task catalog must not be empty"));
        }
        for (i, spec) in self.counters.iter().enumerate() {
            spec.validate()?;
            if self.counters[..i].iter().any(|s| s.name == spec.name) {
                return Err(CoreError::validation(format!(
                    "duplicate counter '{}'",
                    spec.name
                )));
            }
        }
        Ok(())
    }

    /// Counter set with every configured counter at zero.
    pub fn zeroed_counters(&self) -> CounterSet {
        CounterSet::zeroed(self.counters.iter().map(|s| s.name.clone()))
    }

    /// Affiliate marketing dashboard: slow, small increments.
    pub fn affiliate_marketing() -> Self {
        Self {
            tasks: [
                "Analyzing market trends...",
                "Generating affiliate content...",
                "Optimizing campaign performance...",
                "Scheduled email dispatch...",
                "Updating social channels...",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            counters: vec![
                CounterSpec::new("content", 1, 5),
                CounterSpec::new("emails", 25, 150),
                CounterSpec::new("posts", 0, 1),
                CounterSpec::new("leads", 0, 2),
                CounterSpec::new("conversions", 0, 1),
            ],
        }
    }

    /// Commerce ecosystem dashboard: large increments, capped reach and
    /// percentage gauges.
    pub fn neural_commerce() -> Self {
        Self {
            tasks: [
                "Creating pre-market demand for upcoming products...",
                "Deploying autonomous sellers across new regions...",
                "Engineering sentiment cascades across social platforms...",
                "Predicting consumer demand ahead of the season...",
                "Executing commerce matches across time zones...",
                "Optimizing price points from live market data...",
                "Preempting competitor strategies through market prediction...",
                "Creating autonomous revenue streams...",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            counters: vec![
                CounterSpec::new("content", 3, 10),
                CounterSpec::new("emails", 75, 224),
                CounterSpec::new("posts", 6, 17),
                CounterSpec::new("leads", 10, 34),
                CounterSpec::new("conversions", 5, 14),
                CounterSpec::new("click_through", 15, 49),
                CounterSpec::new("global_reach", 0, 3).with_ceiling(195),
                CounterSpec::new("market_influence", 0, 2).with_ceiling(100),
                CounterSpec::new("cultural_trends", 1, 3),
            ],
        }
    }
}

/// What one tick did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickReport {
    pub task: String,
    /// Increment actually applied per counter, in profile order.
    pub deltas: Vec<(String, u64)>,
}

/// Drives the simulated activity for one widget.
#[derive(Debug)]
pub struct ActivitySimulator<R> {
    profile: SimulatorProfile,
    random: R,
    current_task: Option<String>,
    ticks: u64,
}

impl<R: RandomSource> ActivitySimulator<R> {
    pub fn new(profile: SimulatorProfile, random: R) -> CoreResult<Self> {
        profile.validate()?;
        Ok(Self {
            profile,
            random,
            current_task: None,
            ticks: 0,
        })
    }

    pub fn profile(&self) -> &SimulatorProfile {
        &self.profile
    }

    /// Task chosen by the most recent tick.
    pub fn current_task(&self) -> Option<&str> {
        self.current_task.as_deref()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Run one tick against the given counters and log.
    pub fn tick(
        &mut self,
        counters: &mut CounterSet,
        log: &mut ActivityLog,
        at: DateTime<Utc>,
    ) -> TickReport {
        let idx = self.random.index(self.profile.tasks.len());
        // `index` is trusted to stay below `len`; clamp anyway so a faulty
        // source cannot panic the widget.
        let idx = idx.min(self.profile.tasks.len() - 1);
        let task = self.profile.tasks[idx].clone();

        let mut deltas = Vec::with_capacity(self.profile.counters.len());
        for spec in &self.profile.counters {
            let drawn = self.random.between(spec.min, spec.max).clamp(spec.min, spec.max);
            let applied = counters.add(&spec.name, drawn, spec.ceiling);
            deltas.push((spec.name.clone(), applied));
        }

        log.record(Severity::Info, task.clone(), at);
        self.current_task = Some(task.clone());
        self.ticks += 1;

        TickReport { task, deltas }
    }
}

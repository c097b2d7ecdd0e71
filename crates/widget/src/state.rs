//! Per-widget owned state and its read-only snapshot.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use pulseboard_client::{BackendError, Currency, DashboardBackend};
use pulseboard_core::{
    ActivationMachine, ActivationState, ActivityLog, ActivitySimulator, CounterSet, LogEntry,
    RandomSource, ResourceState, Severity, TickReport, WidgetId,
};
use serde::Serialize;

use crate::config::WidgetConfig;
use crate::error::WidgetError;

pub(crate) type BoxedRandom = Box<dyn RandomSource + Send>;

/// Everything one widget owns. Only reachable through [`WidgetCell::lock`].
pub(crate) struct WidgetState {
    pub(crate) resource: ResourceState<f64>,
    pub(crate) counters: CounterSet,
    pub(crate) log: ActivityLog,
    pub(crate) activation: ActivationMachine,
    pub(crate) simulator: ActivitySimulator<BoxedRandom>,
    pub(crate) currency: Currency,
    pub(crate) mounted: bool,
}

impl WidgetState {
    pub(crate) fn record(&mut self, severity: Severity, message: impl Into<String>) {
        self.log.record(severity, message, Utc::now());
    }
}

/// Shared handle to a widget's state, backend and configuration.
///
/// The state mutex is never held across an `.await`.
pub(crate) struct WidgetCell {
    pub(crate) id: WidgetId,
    pub(crate) config: WidgetConfig,
    pub(crate) backend: Arc<dyn DashboardBackend>,
    state: Mutex<WidgetState>,
}

impl WidgetCell {
    pub(crate) fn new(
        config: WidgetConfig,
        backend: Arc<dyn DashboardBackend>,
        random: BoxedRandom,
    ) -> Result<Self, WidgetError> {
        config.validate()?;

        let simulator = ActivitySimulator::new(config.profile.clone(), random)?;
        let state = WidgetState {
            resource: ResourceState::new(),
            counters: config.profile.zeroed_counters(),
            log: ActivityLog::with_capacity(config.log_capacity)?,
            activation: ActivationMachine::new(),
            simulator,
            currency: config.currency,
            mounted: true,
        };

        Ok(Self {
            id: WidgetId::new(),
            config,
            backend,
            state: Mutex::new(state),
        })
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, WidgetState> {
        // A panic while holding the lock cannot leave the plain-data state
        // half-written in a way later readers care about.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Await a backend call, failing with `BackendError::Timeout` once
    /// `request_timeout` has elapsed.
    pub(crate) async fn bounded<T, F>(&self, call: F) -> Result<T, BackendError>
    where
        F: Future<Output = Result<T, BackendError>>,
    {
        tokio::time::timeout(self.config.request_timeout, call)
            .await
            .unwrap_or_else(|_| Err(BackendError::Timeout))
    }

    /// Run one simulator tick if the widget is mounted and active.
    pub(crate) fn tick(&self) -> Option<TickReport> {
        let mut guard = self.lock();
        let state = &mut *guard;
        if !state.mounted || !state.activation.is_active() {
            return None;
        }
        Some(
            state
                .simulator
                .tick(&mut state.counters, &mut state.log, Utc::now()),
        )
    }

    pub(crate) fn snapshot(&self) -> WidgetSnapshot {
        let state = self.lock();
        WidgetSnapshot {
            id: self.id,
            name: self.config.name.clone(),
            state: state.activation.state(),
            failure: state.activation.failure().map(str::to_string),
            currency: state.currency,
            resource: state.resource.clone(),
            counters: state.counters.clone(),
            current_task: state.simulator.current_task().map(str::to_string),
            ticks: state.simulator.ticks(),
            log: state.log.snapshot(),
            mounted: state.mounted,
        }
    }
}

/// Point-in-time copy of a widget for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WidgetSnapshot {
    pub id: WidgetId,
    pub name: String,
    pub state: ActivationState,
    /// Reason of the last failed activation while in `Error`.
    pub failure: Option<String>,
    pub currency: Currency,
    pub resource: ResourceState<f64>,
    pub counters: CounterSet,
    pub current_task: Option<String>,
    pub ticks: u64,
    pub log: Vec<LogEntry>,
    pub mounted: bool,
}

impl WidgetSnapshot {
    /// Resource value formatted in the widget's currency, or `--` before the
    /// first successful fetch.
    pub fn display_value(&self) -> String {
        match self.resource.value {
            Some(v) => self.currency.format(v),
            None => "--".to_string(),
        }
    }
}

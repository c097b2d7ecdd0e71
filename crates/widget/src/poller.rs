//! Keeps a widget's `ResourceState` in sync with the backend.

use std::sync::Arc;

use chrono::Utc;
use pulseboard_core::Severity;
use serde::Serialize;

use crate::state::WidgetCell;

/// What a single `refresh()` call did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum RefreshOutcome {
    /// Fetched and stored a new value.
    Updated(f64),
    /// Fetch failed; previous value kept, error recorded.
    Failed(String),
    /// Another refresh was already in flight.
    Skipped,
    /// The widget was stopped or unmounted while the request was in flight;
    /// nothing was written.
    Discarded,
}

/// Clears the in-flight flag if a refresh future is dropped mid-request.
struct InFlight<'a> {
    cell: &'a WidgetCell,
    armed: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.cell.lock().resource.abandon_refresh();
        }
    }
}

/// Polls one numeric resource.
///
/// Cheap to clone; clones share the same widget.
#[derive(Clone)]
pub struct PollingStateController {
    cell: Arc<WidgetCell>,
}

impl PollingStateController {
    pub(crate) fn new(cell: Arc<WidgetCell>) -> Self {
        Self { cell }
    }

    /// Fetch the resource once.
    ///
    /// Never fails: transport and payload errors are folded into the
    /// resource state and the activity log.
    pub async fn refresh(&self) -> RefreshOutcome {
        self.run(None).await
    }

    /// Scheduled refresh belonging to the run identified by `epoch`.
    ///
    /// Does nothing unless that run is still the current one and active.
    pub(crate) async fn refresh_for_epoch(&self, epoch: u64) -> RefreshOutcome {
        self.run(Some(epoch)).await
    }

    async fn run(&self, run_epoch: Option<u64>) -> RefreshOutcome {
        let name = &self.cell.config.name;

        let (epoch, currency) = {
            let mut state = self.cell.lock();
            if !state.mounted {
                return RefreshOutcome::Discarded;
            }
            if let Some(expected) = run_epoch {
                if state.activation.epoch() != expected || !state.activation.is_active() {
                    tracing::debug!(widget = %name, "scheduled refresh outlived its run; dropping");
                    return RefreshOutcome::Discarded;
                }
            }
            if !state.resource.begin_refresh() {
                tracing::debug!(widget = %name, "refresh already in flight; skipping");
                return RefreshOutcome::Skipped;
            }
            (state.activation.epoch(), state.currency)
        };

        // Only the refresh that set the flag clears it, so overlap stays
        // impossible even across a stop.
        let mut in_flight = InFlight {
            cell: &self.cell,
            armed: true,
        };

        let result = self
            .cell
            .bounded(
                self.cell
                    .backend
                    .fetch_total(&self.cell.config.resource_path, currency),
            )
            .await;

        let mut state = self.cell.lock();
        in_flight.armed = false;

        if !state.mounted || state.activation.epoch() != epoch {
            state.resource.abandon_refresh();
            tracing::debug!(widget = %name, "run ended during refresh; discarding result");
            return RefreshOutcome::Discarded;
        }

        match result {
            Ok(total) => {
                state.resource.apply_success(total, Utc::now());
                state.record(
                    Severity::Info,
                    format!("Revenue updated: {}", currency.format(total)),
                );
                tracing::info!(widget = %name, total, %currency, "resource refreshed");
                RefreshOutcome::Updated(total)
            }
            Err(e) => {
                let message = e.to_string();
                state.resource.apply_failure(message.clone());
                let entry = if e.is_transient() {
                    format!("Revenue fetch failed ({message}); using cached data")
                } else {
                    format!("Revenue fetch refused ({message}); using cached data")
                };
                state.record(Severity::Warning, entry);
                tracing::warn!(widget = %name, error = %message, transient = e.is_transient(), "resource refresh failed");
                RefreshOutcome::Failed(message)
            }
        }
    }
}

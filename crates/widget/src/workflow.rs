//! One-shot activation workflow: gates the scheduler of a widget.

use std::sync::Arc;

use pulseboard_client::ActivationRequest;
use pulseboard_core::{ActivationState, Severity, Transition};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::poller::{PollingStateController, RefreshOutcome};
use crate::scheduler::{SchedulerHandle, WidgetScheduler};
use crate::state::WidgetCell;

/// Result of `activate()` / `retry()`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ActivationOutcome {
    /// Now `Active`; carries the result of the immediate refresh.
    Activated { initial_refresh: RefreshOutcome },
    /// Now `Error`; the reason is also kept on the machine.
    Failed { reason: String },
    /// Another activation is pending; this call did nothing.
    AlreadyInProgress,
    /// Already `Active`; this call did nothing.
    AlreadyActive,
    /// Not valid in `state` (e.g. stopping, or unmounted).
    Ignored { state: ActivationState },
}

/// Result of `deactivate()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeactivationOutcome {
    Stopped,
    Ignored { state: ActivationState },
}

/// Drives the activation machine of one widget and owns its scheduler.
pub struct ActivationWorkflow {
    cell: Arc<WidgetCell>,
    poller: PollingStateController,
    scheduler: Mutex<Option<SchedulerHandle>>,
}

impl ActivationWorkflow {
    pub(crate) fn new(cell: Arc<WidgetCell>, poller: PollingStateController) -> Self {
        Self {
            cell,
            poller,
            scheduler: Mutex::new(None),
        }
    }

    pub fn state(&self) -> ActivationState {
        self.cell.lock().activation.state()
    }

    /// `Idle | Error → Activating → Active | Error`.
    ///
    /// Calls while `Activating` or `Active` are no-ops.
    pub async fn activate(&self) -> ActivationOutcome {
        let name = &self.cell.config.name;

        let (ticket, currency) = {
            let mut state = self.cell.lock();
            if !state.mounted {
                return ActivationOutcome::Ignored {
                    state: state.activation.state(),
                };
            }
            match state.activation.begin_activation() {
                Some(ticket) => (ticket, state.currency),
                None => {
                    return match state.activation.state() {
                        ActivationState::Activating => ActivationOutcome::AlreadyInProgress,
                        ActivationState::Active => ActivationOutcome::AlreadyActive,
                        other => ActivationOutcome::Ignored { state: other },
                    };
                }
            }
        };

        tracing::info!(widget = %name, attempt = ticket.attempt(), "activating widget");

        let result = self
            .cell
            .bounded(
                self.cell
                    .backend
                    .activate(&self.cell.config.activation_path, &ActivationRequest::start(currency)),
            )
            .await;

        if let Err(e) = result {
            let reason = e.to_string();
            let mut state = self.cell.lock();
            let transition = state.activation.fail_activation(ticket, reason.clone());
            if !transition.is_applied() {
                return ActivationOutcome::Ignored {
                    state: state.activation.state(),
                };
            }
            let entry = if e.is_transient() {
                format!("Activation failed: {reason}; retry once the backend is reachable")
            } else {
                format!("Activation failed: {reason}")
            };
            state.record(Severity::Error, entry);
            tracing::error!(widget = %name, error = %reason, transient = e.is_transient(), "widget activation failed");
            return ActivationOutcome::Failed { reason };
        }

        {
            // Hold the scheduler slot across the transition so a concurrent
            // `deactivate()` always finds the scheduler it has to stop.
            let mut slot = self.scheduler.lock().await;
            {
                let mut state = self.cell.lock();
                let transition = if state.mounted {
                    state.activation.complete_activation(ticket)
                } else {
                    Transition::Ignored {
                        state: state.activation.state(),
                    }
                };
                if !transition.is_applied() {
                    return ActivationOutcome::Ignored {
                        state: state.activation.state(),
                    };
                }
                state.record(Severity::Info, "Automation started");
            }
            if let Some(previous) = slot.take() {
                previous.stop().await;
            }
            *slot = Some(WidgetScheduler::new(self.cell.clone(), self.poller.clone()).start());
        }

        tracing::info!(widget = %name, "widget active");
        let initial_refresh = self.poller.refresh().await;
        ActivationOutcome::Activated { initial_refresh }
    }

    /// Re-run activation after a failure. Ignored unless in `Error`.
    pub async fn retry(&self) -> ActivationOutcome {
        let state = self.state();
        if state != ActivationState::Error {
            return ActivationOutcome::Ignored { state };
        }
        self.activate().await
    }

    /// `Active → Stopping → Idle`.
    ///
    /// When this returns, the scheduler has exited and any in-flight refresh
    /// will discard its result. That refresh still counts as in flight until
    /// it completes.
    pub async fn deactivate(&self) -> DeactivationOutcome {
        let name = &self.cell.config.name;

        let currency = {
            let mut state = self.cell.lock();
            match state.activation.begin_deactivation() {
                Transition::Applied { .. } => {}
                Transition::Ignored { state } => return DeactivationOutcome::Ignored { state },
            }
            state.currency
        };

        tracing::info!(widget = %name, "stopping widget");

        let handle = self.scheduler.lock().await.take();
        if let Some(handle) = handle {
            handle.stop().await;
        }

        let stop_result = self
            .cell
            .bounded(
                self.cell
                    .backend
                    .activate(&self.cell.config.activation_path, &ActivationRequest::stop(currency)),
            )
            .await;

        let mut state = self.cell.lock();
        if let Err(e) = stop_result {
            tracing::warn!(widget = %name, error = %e, "backend stop notification failed");
            state.record(Severity::Warning, format!("Stop notification failed: {e}"));
        }
        state.activation.finish_deactivation();
        state.record(Severity::Info, "Automation stopped");
        tracing::info!(widget = %name, "widget idle");
        DeactivationOutcome::Stopped
    }

    /// `Error → Idle`, clearing the failure reason.
    pub fn dismiss(&self) -> Transition {
        self.cell.lock().activation.dismiss()
    }

    /// Stop the scheduler without touching the activation state (unmount).
    pub(crate) async fn halt(&self) {
        let handle = self.scheduler.lock().await.take();
        if let Some(handle) = handle {
            handle.stop().await;
        }
    }
}

//! Composition root: one widget wires its own poller, simulator and workflow.

use std::sync::Arc;

use pulseboard_client::{CheckoutRequest, CheckoutSession, Currency, DashboardBackend};
use pulseboard_core::{ActivationState, RandomSource, Severity, Transition, WidgetId};

use crate::config::WidgetConfig;
use crate::error::WidgetError;
use crate::poller::{PollingStateController, RefreshOutcome};
use crate::state::{WidgetCell, WidgetSnapshot};
use crate::workflow::{ActivationOutcome, ActivationWorkflow, DeactivationOutcome};

/// One dashboard widget instance.
///
/// Owns exactly one resource state, counter set, activity log and activation
/// machine. Nothing is shared with other widgets; state is only reachable
/// through the methods below.
pub struct Widget {
    cell: Arc<WidgetCell>,
    poller: PollingStateController,
    workflow: ActivationWorkflow,
}

impl Widget {
    pub fn new<R>(
        config: WidgetConfig,
        backend: Arc<dyn DashboardBackend>,
        random: R,
    ) -> Result<Self, WidgetError>
    where
        R: RandomSource + Send + 'static,
    {
        let cell = Arc::new(WidgetCell::new(config, backend, Box::new(random))?);
        let poller = PollingStateController::new(cell.clone());
        let workflow = ActivationWorkflow::new(cell.clone(), poller.clone());

        tracing::debug!(widget = %cell.config.name, id = %cell.id, "widget created");
        Ok(Self {
            cell,
            poller,
            workflow,
        })
    }

    pub fn id(&self) -> WidgetId {
        self.cell.id
    }

    pub fn name(&self) -> &str {
        &self.cell.config.name
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.cell.config
    }

    pub fn state(&self) -> ActivationState {
        self.workflow.state()
    }

    pub fn poller(&self) -> &PollingStateController {
        &self.poller
    }

    pub fn workflow(&self) -> &ActivationWorkflow {
        &self.workflow
    }

    pub async fn activate(&self) -> ActivationOutcome {
        self.workflow.activate().await
    }

    pub async fn retry(&self) -> ActivationOutcome {
        self.workflow.retry().await
    }

    pub async fn deactivate(&self) -> DeactivationOutcome {
        self.workflow.deactivate().await
    }

    pub fn dismiss(&self) -> Transition {
        self.workflow.dismiss()
    }

    /// Manual refresh; allowed in any state while mounted.
    pub async fn refresh(&self) -> RefreshOutcome {
        self.poller.refresh().await
    }

    /// Switch the reporting currency. Refreshes immediately when active.
    pub async fn set_currency(&self, currency: Currency) -> Option<RefreshOutcome> {
        let active = {
            let mut state = self.cell.lock();
            if !state.mounted || state.currency == currency {
                return None;
            }
            state.currency = currency;
            state.record(Severity::Info, format!("Currency switched to {currency}"));
            state.activation.is_active()
        };

        if active {
            Some(self.poller.refresh().await)
        } else {
            None
        }
    }

    pub fn clear_log(&self) {
        self.cell.lock().log.clear();
    }

    /// Start an external checkout and return its payment page URL.
    ///
    /// Independent of the activation state; the outcome is logged either way.
    pub async fn checkout(
        &self,
        email: impl Into<String>,
        amount: u64,
    ) -> Result<CheckoutSession, WidgetError> {
        let currency = {
            let state = self.cell.lock();
            if !state.mounted {
                return Err(WidgetError::Unmounted);
            }
            state.currency
        };

        let request = CheckoutRequest::new(email, amount, currency)
            .with_metadata(serde_json::json!({ "source": self.cell.config.name }));
        let result = self.cell.bounded(self.cell.backend.checkout(&request)).await;

        let mut state = self.cell.lock();
        match result {
            Ok(session) => {
                state.record(Severity::Info, "Payment initiated");
                tracing::info!(widget = %self.cell.config.name, "checkout session created");
                Ok(session)
            }
            Err(e) => {
                state.record(Severity::Error, format!("Payment failed: {e}"));
                tracing::warn!(widget = %self.cell.config.name, error = %e, "checkout failed");
                Err(e.into())
            }
        }
    }

    pub fn snapshot(&self) -> WidgetSnapshot {
        self.cell.snapshot()
    }

    /// Unmount: stop all timers and turn every later callback into a no-op.
    pub async fn shutdown(&self) {
        {
            let mut state = self.cell.lock();
            if !state.mounted {
                return;
            }
            state.mounted = false;
            state.activation.invalidate();
        }
        self.workflow.halt().await;
        tracing::info!(widget = %self.cell.config.name, "widget unmounted");
    }
}

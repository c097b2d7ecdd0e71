//! `pulseboard-widget`
//!
//! **Responsibility:** the async runtime side of a dashboard widget.
//!
//! - `PollingStateController`: fetches the resource and folds failures into state
//! - `ActivationWorkflow`: start/stop gate for the background scheduler
//! - `Widget`: composition root owning one isolated set of state
//!
//! Timers run on tokio; tests drive them with a paused clock.

pub mod config;
pub mod error;
pub mod poller;
mod scheduler;
mod state;
pub mod widget;
pub mod workflow;

pub use config::{DEFAULT_POLL_INTERVAL, DEFAULT_TICK_INTERVAL, DashboardConfig, WidgetConfig};
pub use error::WidgetError;
pub use poller::{PollingStateController, RefreshOutcome};
pub use state::WidgetSnapshot;
pub use widget::Widget;
pub use workflow::{ActivationOutcome, ActivationWorkflow, DeactivationOutcome};

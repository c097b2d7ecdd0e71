//! Widget-level errors.

use pulseboard_client::BackendError;
use pulseboard_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WidgetError {
    #[error("invalid widget configuration: {0}")]
    Config(#[from] CoreError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("widget has been shut down")]
    Unmounted,
}

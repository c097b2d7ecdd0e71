//! Core error model.

use thiserror::Error;

/// Result type used across the core layer.
pub type CoreResult<T> = Result<T, CoreError>;

/// Core-level error.
///
/// Only configuration failures surface as errors. Invalid state
/// machine calls are ignored transitions, not errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A configuration value failed validation (empty catalog, bad range, ...).
    #[error("validation failed: {0}")]
    Validation(String),
}

impl CoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

//! Backend error model.

use thiserror::Error;

/// Failure talking to the dashboard backend.
///
/// `Display` is kept short: it is shown verbatim in the widget's resource
/// error and activity log.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BackendError {
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("HTTP {0}")]
    Status(u16),
    #[error("parse error: {0}")]
    Parse(String),
    /// The backend answered but refused the operation (`success: false`).
    #[error("{0}")]
    Rejected(String),
}

impl BackendError {
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }

    /// Transient failures are worth polling again; rejections are not.
    pub fn is_transient(&self) -> bool {
        !matches!(self, BackendError::Rejected(_))
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            BackendError::Timeout
        } else if let Some(status) = e.status() {
            BackendError::Status(status.as_u16())
        } else if e.is_decode() {
            BackendError::Parse(e.to_string())
        } else {
            BackendError::Network(e.to_string())
        }
    }
}

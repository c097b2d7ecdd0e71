//! `pulseboard-client`
//!
//! **Responsibility:** the HTTP contract between dashboard widgets and the
//! external backend.
//!
//! - `DashboardBackend`: the trait widgets depend on
//! - `HttpBackend`: reqwest implementation with a bounded request timeout
//! - `InMemoryBackend`: scripted backend for tests/dev
//! - wire types (`Currency`, activation and checkout DTOs)

pub mod backend;
pub mod error;
pub mod http;
pub mod memory;
pub mod types;

pub use backend::DashboardBackend;
pub use error::BackendError;
pub use http::{DEFAULT_REQUEST_TIMEOUT, HttpBackend};
pub use memory::InMemoryBackend;
pub use types::{
    ActivationAction, ActivationReceipt, ActivationRequest, CheckoutRequest, CheckoutSession,
    Currency, parse_total,
};

//! The backend contract consumed by dashboard widgets.

use async_trait::async_trait;

use crate::error::BackendError;
use crate::types::{ActivationReceipt, ActivationRequest, CheckoutRequest, CheckoutSession, Currency};

/// Remote dashboard backend.
///
/// Implementations own transport concerns (timeouts, auth). Widgets depend on
/// this trait only, so tests can substitute scripted fakes.
#[async_trait]
pub trait DashboardBackend: Send + Sync + 'static {
    /// `GET <base>/<resource>?currency=<code>`, returning the numeric `total`.
    async fn fetch_total(&self, resource: &str, currency: Currency) -> Result<f64, BackendError>;

    /// `POST <base>/<endpoint>`. A `success: false` body is an error.
    async fn activate(
        &self,
        endpoint: &str,
        request: &ActivationRequest,
    ) -> Result<ActivationReceipt, BackendError>;

    /// `POST <base>/checkout`.
    async fn checkout(&self, request: &CheckoutRequest) -> Result<CheckoutSession, BackendError>;
}

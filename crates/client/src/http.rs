//! reqwest-backed implementation of [`DashboardBackend`].

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::backend::DashboardBackend;
use crate::error::BackendError;
use crate::types::{
    ActivationReceipt, ActivationRequest, CheckoutRequest, CheckoutSession, Currency, parse_total,
};

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP client for the dashboard backend.
///
/// Cheap to clone; the underlying `reqwest::Client` shares its pool.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

impl HttpBackend {
    pub fn new(api_url: impl Into<String>) -> Result<Self, BackendError> {
        Self::build(api_url.into(), None, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_token(api_url: impl Into<String>, token: impl Into<String>) -> Result<Self, BackendError> {
        Self::build(api_url.into(), Some(token.into()), DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, BackendError> {
        self.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::network(e.to_string()))?;
        Ok(self)
    }

    fn build(api_url: String, token: Option<String>, timeout: Duration) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::network(e.to_string()))?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Best-effort `message` from an error body.
    async fn error_message(resp: reqwest::Response) -> Option<String> {
        let body: Value = resp.json().await.ok()?;
        body.get("message")
            .or_else(|| body.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

#[async_trait]
impl DashboardBackend for HttpBackend {
    async fn fetch_total(&self, resource: &str, currency: Currency) -> Result<f64, BackendError> {
        let url = self.url(resource);
        let req = self
            .authorize(self.client.get(&url))
            .query(&[("currency", currency.code())]);

        let resp = req.send().await?;
        if !resp.status().is_success() {
            tracing::debug!(url = %url, status = %resp.status(), "resource fetch rejected");
            return Err(BackendError::Status(resp.status().as_u16()));
        }

        let body: Value = resp.json().await.map_err(|e| BackendError::parse(e.to_string()))?;
        parse_total(&body)
    }

    async fn activate(
        &self,
        endpoint: &str,
        request: &ActivationRequest,
    ) -> Result<ActivationReceipt, BackendError> {
        let url = self.url(endpoint);
        let resp = self.authorize(self.client.post(&url)).json(request).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(match Self::error_message(resp).await {
                Some(message) => BackendError::Rejected(message),
                None => BackendError::Status(status.as_u16()),
            });
        }

        let receipt: ActivationReceipt =
            resp.json().await.map_err(|e| BackendError::parse(e.to_string()))?;
        if !receipt.success {
            return Err(BackendError::rejected(
                receipt
                    .message
                    .unwrap_or_else(|| "activation rejected by backend".to_string()),
            ));
        }

        Ok(receipt)
    }

    async fn checkout(&self, request: &CheckoutRequest) -> Result<CheckoutSession, BackendError> {
        let url = self.url("checkout");
        let resp = self.authorize(self.client.post(&url)).json(request).send().await?;

        if !resp.status().is_success() {
            return Err(BackendError::Status(resp.status().as_u16()));
        }

        let body: Value = resp.json().await.map_err(|e| BackendError::parse(e.to_string()))?;
        match body.get("authorization_url").and_then(Value::as_str) {
            Some(url) if !url.is_empty() => Ok(CheckoutSession {
                authorization_url: url.to_string(),
            }),
            _ => Err(BackendError::parse("missing field `authorization_url`")),
        }
    }
}

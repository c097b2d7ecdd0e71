//! In-memory backend for tests/dev.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::backend::DashboardBackend;
use crate::error::BackendError;
use crate::types::{
    ActivationAction, ActivationReceipt, ActivationRequest, CheckoutRequest, CheckoutSession,
    Currency,
};

#[derive(Debug)]
struct Script {
    /// One-shot fetch results, consumed front to back.
    queued_totals: VecDeque<Result<f64, BackendError>>,
    /// Result once the queue is empty.
    total: Result<f64, BackendError>,
    activation: Result<(), BackendError>,
    checkout: Result<String, BackendError>,
    fetch_delay: Duration,
    activation_delay: Duration,
    last_currency: Option<Currency>,
}

/// Scripted [`DashboardBackend`].
///
/// - No network; responses come from the script
/// - Delays use `tokio::time`, so they follow a paused test clock
/// - Counts every call for assertions
#[derive(Debug)]
pub struct InMemoryBackend {
    script: Mutex<Script>,
    fetch_calls: AtomicUsize,
    start_calls: AtomicUsize,
    stop_calls: AtomicUsize,
    checkout_calls: AtomicUsize,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self {
            script: Mutex::new(Script {
                queued_totals: VecDeque::new(),
                total: Ok(0.0),
                activation: Ok(()),
                checkout: Ok("https://checkout.invalid/session".to_string()),
                fetch_delay: Duration::ZERO,
                activation_delay: Duration::ZERO,
                last_currency: None,
            }),
            fetch_calls: AtomicUsize::new(0),
            start_calls: AtomicUsize::new(0),
            stop_calls: AtomicUsize::new(0),
            checkout_calls: AtomicUsize::new(0),
        }
    }
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Result returned by every fetch once queued results run out.
    pub fn set_total(&self, result: Result<f64, BackendError>) -> &Self {
        self.script().total = result;
        self
    }

    /// Queue a result for the next fetch only.
    pub fn push_total(&self, result: Result<f64, BackendError>) -> &Self {
        self.script().queued_totals.push_back(result);
        self
    }

    pub fn set_activation(&self, result: Result<(), BackendError>) -> &Self {
        self.script().activation = result;
        self
    }

    pub fn set_checkout(&self, result: Result<String, BackendError>) -> &Self {
        self.script().checkout = result;
        self
    }

    pub fn set_fetch_delay(&self, delay: Duration) -> &Self {
        self.script().fetch_delay = delay;
        self
    }

    pub fn set_activation_delay(&self, delay: Duration) -> &Self {
        self.script().activation_delay = delay;
        self
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }

    pub fn checkout_calls(&self) -> usize {
        self.checkout_calls.load(Ordering::SeqCst)
    }

    /// Currency of the most recent fetch.
    pub fn last_currency(&self) -> Option<Currency> {
        self.script().last_currency
    }
}

#[async_trait]
impl DashboardBackend for InMemoryBackend {
    async fn fetch_total(&self, _resource: &str, currency: Currency) -> Result<f64, BackendError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let (delay, result) = {
            let mut script = self.script();
            script.last_currency = Some(currency);
            let result = match script.queued_totals.pop_front() {
                Some(queued) => queued,
                None => script.total.clone(),
            };
            (script.fetch_delay, result)
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result
    }

    async fn activate(
        &self,
        _endpoint: &str,
        request: &ActivationRequest,
    ) -> Result<ActivationReceipt, BackendError> {
        match request.action {
            ActivationAction::Start => self.start_calls.fetch_add(1, Ordering::SeqCst),
            ActivationAction::Stop => self.stop_calls.fetch_add(1, Ordering::SeqCst),
        };
        let (delay, result) = {
            let script = self.script();
            (script.activation_delay, script.activation.clone())
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result.map(|()| ActivationReceipt {
            success: true,
            message: None,
        })
    }

    async fn checkout(&self, _request: &CheckoutRequest) -> Result<CheckoutSession, BackendError> {
        self.checkout_calls.fetch_add(1, Ordering::SeqCst);
        self.script()
            .checkout
            .clone()
            .map(|authorization_url| CheckoutSession { authorization_url })
    }
}

//! Wire types for the dashboard backend.

use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BackendError;

/// Reporting currency passed as `?currency=<code>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Ngn,
    Usd,
    Gbp,
    Eur,
}

impl Currency {
    pub const ALL: [Currency; 4] = [Currency::Ngn, Currency::Usd, Currency::Gbp, Currency::Eur];

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Ngn => "NGN",
            Currency::Usd => "USD",
            Currency::Gbp => "GBP",
            Currency::Eur => "EUR",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Ngn => "₦",
            Currency::Usd => "$",
            Currency::Gbp => "£",
            Currency::Eur => "€",
        }
    }

    /// Format an amount for display, e.g. `₦1,234.50`.
    pub fn format(&self, amount: f64) -> String {
        let negative = amount < 0.0;
        let cents = (amount.abs() * 100.0).round() as u64;
        let whole = (cents / 100).to_string();

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, ch) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        format!(
            "{}{}{}.{:02}",
            if negative { "-" } else { "" },
            self.symbol(),
            grouped,
            cents % 100
        )
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = BackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| BackendError::parse(format!("unknown currency: {s}")))
    }
}

/// Whether the activation endpoint should start or stop automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivationAction {
    Start,
    Stop,
}

/// Body of `POST <base>/<activation-endpoint>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivationRequest {
    pub action: ActivationAction,
    pub currency: Currency,
    pub timestamp: DateTime<Utc>,
}

impl ActivationRequest {
    pub fn start(currency: Currency) -> Self {
        Self {
            action: ActivationAction::Start,
            currency,
            timestamp: Utc::now(),
        }
    }

    pub fn stop(currency: Currency) -> Self {
        Self {
            action: ActivationAction::Stop,
            currency,
            timestamp: Utc::now(),
        }
    }
}

/// Response of the activation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivationReceipt {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of `POST <base>/checkout`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub email: String,
    /// Amount in the currency's minor unit (kobo, cents, ...).
    pub amount: u64,
    pub currency: Currency,
    #[serde(default)]
    pub metadata: Value,
}

impl CheckoutRequest {
    pub fn new(email: impl Into<String>, amount: u64, currency: Currency) -> Self {
        Self {
            email: email.into(),
            amount,
            currency,
            metadata: Value::Null,
        }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Response of the checkout endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub authorization_url: String,
}

/// Extract the numeric `total` from a resource response body.
///
/// Accepts a JSON number or a numeric string (backends that serialize with
/// fixed decimals send `"1234.50"`).
pub fn parse_total(body: &Value) -> Result<f64, BackendError> {
    let total = body
        .get("total")
        .ok_or_else(|| BackendError::parse("missing field `total`"))?;

    let value = match total {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match value {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(BackendError::parse(format!("field `total` is not numeric: {total}"))),
    }
}

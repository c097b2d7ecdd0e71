//! Widget and process configuration.

use std::time::Duration;

use anyhow::Context;
use pulseboard_client::{Currency, DEFAULT_REQUEST_TIMEOUT};
use pulseboard_core::{CoreError, CoreResult, DEFAULT_LOG_CAPACITY, SimulatorProfile};

/// Default period between scheduled refreshes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(20);

/// Default period between simulator ticks.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(3);

/// Per-widget configuration.
#[derive(Debug, Clone)]
pub struct WidgetConfig {
    /// Name for logging
    pub name: String,
    /// Resource path polled for `total`
    pub resource_path: String,
    /// Endpoint receiving start/stop activation calls
    pub activation_path: String,
    pub currency: Currency,
    pub poll_interval: Duration,
    pub tick_interval: Duration,
    /// Upper bound on every backend call the widget makes
    pub request_timeout: Duration,
    pub log_capacity: usize,
    pub profile: SimulatorProfile,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self::affiliate_marketing()
    }
}

impl WidgetConfig {
    /// Revenue panel of the affiliate marketing dashboard.
    pub fn affiliate_marketing() -> Self {
        Self {
            name: "affiliate-marketing".to_string(),
            resource_path: "paystack/revenue".to_string(),
            activation_path: "affiliate/automation".to_string(),
            currency: Currency::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            tick_interval: DEFAULT_TICK_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            log_capacity: DEFAULT_LOG_CAPACITY,
            profile: SimulatorProfile::affiliate_marketing(),
        }
    }

    /// Revenue panel of the commerce ecosystem dashboard.
    pub fn neural_commerce() -> Self {
        Self {
            name: "neural-commerce".to_string(),
            resource_path: "paystack/neural-revenue".to_string(),
            activation_path: "neural/commerce/activate".to_string(),
            profile: SimulatorProfile::neural_commerce(),
            ..Self::affiliate_marketing()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_resource(mut self, path: impl Into<String>) -> Self {
        self.resource_path = path.into();
        self
    }

    pub fn with_activation_endpoint(mut self, path: impl Into<String>) -> Self {
        self.activation_path = path.into();
        self
    }

    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_log_capacity(mut self, capacity: usize) -> Self {
        self.log_capacity = capacity;
        self
    }

    pub fn with_profile(mut self, profile: SimulatorProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.poll_interval.is_zero()
            || self.tick_interval.is_zero()
            || self.request_timeout.is_zero()
        {
            return Err(CoreError::validation(format!(
                "widget '{}': intervals and timeout must be non-zero",
                self.name
            )));
        }
        if self.resource_path.trim().is_empty() || self.activation_path.trim().is_empty() {
            return Err(CoreError::validation(format!(
                "widget '{}': endpoint paths must not be empty",
                self.name
            )));
        }
        if self.log_capacity == 0 {
            return Err(CoreError::validation(format!(
                "widget '{}': log capacity must be at least 1",
                self.name
            )));
        }
        self.profile.validate()
    }
}

/// Process-level settings shared by every widget on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub api_url: String,
    pub auth_token: Option<String>,
    pub currency: Currency,
    pub poll_interval: Duration,
    pub tick_interval: Duration,
    pub request_timeout: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080".to_string(),
            auth_token: None,
            currency: Currency::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            tick_interval: DEFAULT_TICK_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl DashboardConfig {
    /// Read `PULSEBOARD_*` variables from the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (unset keys keep their defaults).
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(url) = lookup("PULSEBOARD_API_URL").filter(|v| !v.trim().is_empty()) {
            cfg.api_url = url.trim().to_string();
        }
        cfg.auth_token = lookup("PULSEBOARD_AUTH_TOKEN").filter(|v| !v.trim().is_empty());

        if let Some(code) = lookup("PULSEBOARD_CURRENCY") {
            cfg.currency = code
                .parse::<Currency>()
                .with_context(|| format!("PULSEBOARD_CURRENCY={code:?}"))?;
        }
        if let Some(secs) = lookup("PULSEBOARD_POLL_SECS") {
            cfg.poll_interval = parse_secs("PULSEBOARD_POLL_SECS", &secs)?;
        }
        if let Some(secs) = lookup("PULSEBOARD_TICK_SECS") {
            cfg.tick_interval = parse_secs("PULSEBOARD_TICK_SECS", &secs)?;
        }
        if let Some(secs) = lookup("PULSEBOARD_TIMEOUT_SECS") {
            cfg.request_timeout = parse_secs("PULSEBOARD_TIMEOUT_SECS", &secs)?;
        }

        Ok(cfg)
    }

    /// Apply the process-level settings to a widget preset.
    pub fn apply(&self, widget: WidgetConfig) -> WidgetConfig {
        widget
            .with_currency(self.currency)
            .with_poll_interval(self.poll_interval)
            .with_tick_interval(self.tick_interval)
            .with_request_timeout(self.request_timeout)
    }
}

fn parse_secs(key: &str, raw: &str) -> anyhow::Result<Duration> {
    let secs: f64 = raw
        .trim()
        .parse()
        .with_context(|| format!("{key}={raw:?} is not a number"))?;
    if !secs.is_finite() || secs <= 0.0 {
        anyhow::bail!("{key}={raw:?} must be a positive number of seconds");
    }
    Ok(Duration::from_secs_f64(secs))
}

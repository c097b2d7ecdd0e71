mod report;

use std::sync::Arc;

use anyhow::Context;
use pulseboard_client::{DashboardBackend, HttpBackend};
use pulseboard_core::ThreadRandom;
use pulseboard_observability::LogFormat;
use pulseboard_widget::{ActivationOutcome, DashboardConfig, Widget, WidgetConfig};
use tokio::time::{MissedTickBehavior, interval};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let format = std::env::var("PULSEBOARD_LOG_FORMAT")
        .ok()
        .and_then(|raw| raw.parse::<LogFormat>().ok())
        .unwrap_or_default();
    pulseboard_observability::init_with(format);

    let config = DashboardConfig::from_env().context("invalid dashboard configuration")?;
    tracing::info!(api_url = %config.api_url, currency = %config.currency, "starting dashboard");

    let http = match &config.auth_token {
        Some(token) => HttpBackend::with_token(&config.api_url, token),
        None => {
            tracing::warn!("PULSEBOARD_AUTH_TOKEN not set; calling backend unauthenticated");
            HttpBackend::new(&config.api_url)
        }
    }
    .and_then(|backend| backend.with_timeout(config.request_timeout))
    .context("failed to build HTTP backend")?;
    let backend: Arc<dyn DashboardBackend> = Arc::new(http);

    let widgets = [
        WidgetConfig::affiliate_marketing(),
        WidgetConfig::neural_commerce(),
    ]
    .into_iter()
    .map(|preset| Widget::new(config.apply(preset), backend.clone(), ThreadRandom::default()))
    .collect::<Result<Vec<_>, _>>()
    .context("invalid widget configuration")?;

    for widget in &widgets {
        match widget.activate().await {
            ActivationOutcome::Activated { initial_refresh } => {
                tracing::info!(widget = %widget.name(), ?initial_refresh, "widget activated");
            }
            ActivationOutcome::Failed { reason } => {
                tracing::error!(widget = %widget.name(), %reason, "widget failed to activate");
            }
            other => tracing::warn!(widget = %widget.name(), ?other, "unexpected activation outcome"),
        }
    }

    let mut report = interval(config.poll_interval);
    report.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    tracing::error!(error = %e, "failed to listen for shutdown signal");
                }
                break;
            }
            _ = report.tick() => {
                for widget in &widgets {
                    let snapshot = widget.snapshot();
                    tracing::info!(
                        widget = %snapshot.name,
                        state = %snapshot.state,
                        snapshot = %serde_json::to_string(&snapshot).unwrap_or_default(),
                        "{}",
                        report::summary(&snapshot)
                    );
                }
            }
        }
    }

    tracing::info!("shutting down");
    for widget in &widgets {
        widget.deactivate().await;
        widget.shutdown().await;
    }
    Ok(())
}

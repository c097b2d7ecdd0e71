//! Widget lifecycle against a scripted backend on a paused tokio clock.

use std::sync::Arc;
use std::time::Duration;

use pulseboard_client::{BackendError, Currency, DashboardBackend, InMemoryBackend};
use pulseboard_core::{ActivationState, RandomSource, ResourceState, SeededRandom, Severity, Transition};
use pulseboard_widget::{
    ActivationOutcome, DeactivationOutcome, RefreshOutcome, Widget, WidgetConfig, WidgetError,
};
use tokio::time::sleep;

const TICK: Duration = Duration::from_secs(3);

fn build(backend: &Arc<InMemoryBackend>, config: WidgetConfig) -> Widget {
    let backend: Arc<dyn DashboardBackend> = backend.clone();
    Widget::new(config, backend, SeededRandom::new(7)).unwrap()
}

fn affiliate(backend: &Arc<InMemoryBackend>) -> Widget {
    build(backend, WidgetConfig::affiliate_marketing())
}

/// Always picks the first task and draws `value`, clamped into each range.
struct Fixed(u64);

impl RandomSource for Fixed {
    fn index(&mut self, _len: usize) -> usize {
        0
    }

    fn between(&mut self, min: u64, max: u64) -> u64 {
        self.0.clamp(min, max)
    }
}

#[tokio::test(start_paused = true)]
async fn refresh_stores_total_and_logs_one_info_entry() {
    let backend = Arc::new(InMemoryBackend::new());
    backend.set_total(Ok(1000.0));
    let widget = affiliate(&backend);

    assert_eq!(widget.snapshot().display_value(), "--");
    assert_eq!(widget.refresh().await, RefreshOutcome::Updated(1000.0));

    let snap = widget.snapshot();
    assert_eq!(snap.resource.value, Some(1000.0));
    assert_eq!(snap.resource.error, None);
    assert!(!snap.resource.is_loading);
    assert!(snap.resource.last_updated.is_some());
    assert_eq!(snap.log.len(), 1);
    assert_eq!(snap.log[0].severity, Severity::Info);
    assert!(snap.log[0].message.contains("₦1,000.00"));
    assert_eq!(snap.display_value(), "₦1,000.00");
}

#[tokio::test(start_paused = true)]
async fn failed_refresh_keeps_stale_value() {
    let backend = Arc::new(InMemoryBackend::new());
    backend
        .push_total(Ok(1000.0))
        .set_total(Err(BackendError::Status(500)));
    let widget = affiliate(&backend);

    widget.refresh().await;
    let outcome = widget.refresh().await;
    assert_eq!(outcome, RefreshOutcome::Failed("HTTP 500".to_string()));

    let snap = widget.snapshot();
    assert_eq!(snap.resource.value, Some(1000.0));
    assert_eq!(snap.resource.error.as_deref(), Some("HTTP 500"));
    assert_eq!(snap.log.len(), 2);
    assert_eq!(snap.log[1].severity, Severity::Warning);

    // A later success clears the error again.
    backend.set_total(Ok(1200.0));
    widget.refresh().await;
    let snap = widget.snapshot();
    assert_eq!(snap.resource.value, Some(1200.0));
    assert_eq!(snap.resource.error, None);
}

#[tokio::test(start_paused = true)]
async fn overlapping_refresh_is_skipped() {
    let backend = Arc::new(InMemoryBackend::new());
    backend.set_total(Ok(10.0)).set_fetch_delay(Duration::from_secs(1));
    let widget = affiliate(&backend);

    let (first, second) = tokio::join!(widget.refresh(), widget.refresh());
    assert_eq!(first, RefreshOutcome::Updated(10.0));
    assert_eq!(second, RefreshOutcome::Skipped);
    assert_eq!(backend.fetch_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn activation_starts_ticks_and_polling() {
    let backend = Arc::new(InMemoryBackend::new());
    backend.push_total(Ok(1000.0)).set_total(Ok(1500.0));
    let widget = affiliate(&backend);

    let outcome = widget.activate().await;
    assert_eq!(
        outcome,
        ActivationOutcome::Activated {
            initial_refresh: RefreshOutcome::Updated(1000.0)
        }
    );
    assert_eq!(widget.state(), ActivationState::Active);
    assert_eq!(backend.start_calls(), 1);
    assert_eq!(backend.fetch_calls(), 1);

    // Ticks at 3s..18s, one scheduled poll at 20s.
    sleep(Duration::from_millis(20_500)).await;

    let snap = widget.snapshot();
    assert_eq!(snap.ticks, 6);
    assert!(snap.current_task.is_some());
    assert_eq!(backend.fetch_calls(), 2);
    assert_eq!(snap.resource.value, Some(1500.0));
    assert!(snap.counters.get("emails").unwrap() >= 6 * 25);
    assert!(snap.log.len() <= 15);
}

#[tokio::test(start_paused = true)]
async fn tick_applies_injected_draws() {
    let backend = Arc::new(InMemoryBackend::new());
    let backend_dyn: Arc<dyn DashboardBackend> = backend.clone();
    let widget = Widget::new(WidgetConfig::affiliate_marketing(), backend_dyn, Fixed(3)).unwrap();

    widget.activate().await;
    widget.clear_log();
    sleep(TICK + Duration::from_millis(100)).await;

    let snap = widget.snapshot();
    assert_eq!(snap.ticks, 1);
    assert_eq!(snap.counters.get("content"), Some(3));
    assert_eq!(snap.counters.get("emails"), Some(25));
    assert_eq!(snap.counters.get("posts"), Some(1));
    assert_eq!(snap.log.len(), 1);
    assert_eq!(snap.log[0].message, "Analyzing market trends...");
}

#[tokio::test(start_paused = true)]
async fn rejected_activation_leaves_state_untouched() {
    let backend = Arc::new(InMemoryBackend::new());
    backend
        .set_total(Ok(1000.0))
        .set_activation(Err(BackendError::rejected("daily quota reached")));
    let widget = affiliate(&backend);
    let before = widget.snapshot();

    let outcome = widget.activate().await;
    assert_eq!(
        outcome,
        ActivationOutcome::Failed {
            reason: "daily quota reached".to_string()
        }
    );

    sleep(TICK * 3).await;

    let snap = widget.snapshot();
    assert_eq!(snap.state, ActivationState::Error);
    assert_eq!(snap.failure.as_deref(), Some("daily quota reached"));
    assert_eq!(snap.resource, before.resource);
    assert_eq!(snap.resource, ResourceState::new());
    assert_eq!(snap.counters, before.counters);
    assert_eq!(snap.ticks, 0);
    assert_eq!(backend.fetch_calls(), 0);
    let last = snap.log.last().unwrap();
    assert_eq!(last.severity, Severity::Error);
    assert_eq!(last.message, "Activation failed: daily quota reached");
}

#[tokio::test(start_paused = true)]
async fn nothing_changes_after_deactivate() {
    let backend = Arc::new(InMemoryBackend::new());
    backend.set_total(Ok(50.0));
    let widget = affiliate(&backend);

    widget.activate().await;
    sleep(TICK * 2 + Duration::from_millis(500)).await;
    assert_eq!(widget.snapshot().ticks, 2);

    assert_eq!(widget.deactivate().await, DeactivationOutcome::Stopped);
    assert_eq!(widget.state(), ActivationState::Idle);
    assert_eq!(backend.stop_calls(), 1);

    let after_stop = widget.snapshot();
    sleep(TICK * 10).await;
    assert_eq!(widget.snapshot(), after_stop);
    assert_eq!(backend.fetch_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn concurrent_activations_make_one_setup_call() {
    let backend = Arc::new(InMemoryBackend::new());
    backend
        .set_total(Ok(1.0))
        .set_activation_delay(Duration::from_secs(1));
    let widget = affiliate(&backend);

    let (first, second) = tokio::join!(widget.activate(), widget.activate());
    assert!(matches!(first, ActivationOutcome::Activated { .. }));
    assert_eq!(second, ActivationOutcome::AlreadyInProgress);
    assert_eq!(backend.start_calls(), 1);
    assert_eq!(widget.state(), ActivationState::Active);

    assert_eq!(widget.activate().await, ActivationOutcome::AlreadyActive);
    assert_eq!(backend.start_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn refresh_in_flight_during_deactivate_is_discarded() {
    let backend = Arc::new(InMemoryBackend::new());
    backend.set_total(Ok(1000.0));
    let widget = affiliate(&backend);
    widget.activate().await;

    backend
        .set_total(Ok(2000.0))
        .set_fetch_delay(Duration::from_secs(4));

    let (outcome, (stopped, loading_after_stop)) = tokio::join!(widget.refresh(), async {
        sleep(Duration::from_secs(1)).await;
        let stopped = widget.deactivate().await;
        (stopped, widget.snapshot().resource.is_loading)
    });

    assert_eq!(stopped, DeactivationOutcome::Stopped);
    assert_eq!(outcome, RefreshOutcome::Discarded);
    // The old request is still outstanding right after the stop.
    assert!(loading_after_stop);

    let snap = widget.snapshot();
    assert_eq!(snap.resource.value, Some(1000.0));
    assert!(!snap.resource.is_loading);
}

#[tokio::test(start_paused = true)]
async fn refresh_after_deactivate_waits_for_the_outstanding_request() {
    let backend = Arc::new(InMemoryBackend::new());
    backend.set_total(Ok(1.0));
    let widget = affiliate(&backend);
    widget.activate().await;
    assert_eq!(backend.fetch_calls(), 1);

    backend.set_fetch_delay(Duration::from_secs(4));
    let (first, (second, calls)) = tokio::join!(widget.refresh(), async {
        sleep(Duration::from_secs(1)).await;
        widget.deactivate().await;
        let second = widget.refresh().await;
        (second, backend.fetch_calls())
    });

    assert_eq!(first, RefreshOutcome::Discarded);
    assert_eq!(second, RefreshOutcome::Skipped);
    assert_eq!(calls, 2);

    backend.set_fetch_delay(Duration::ZERO);
    assert_eq!(widget.refresh().await, RefreshOutcome::Updated(1.0));
    assert_eq!(backend.fetch_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn slow_backend_is_cut_off_at_request_timeout() {
    let backend = Arc::new(InMemoryBackend::new());
    backend.push_total(Ok(80.0)).set_total(Ok(90.0));
    let widget = affiliate(&backend);
    assert_eq!(widget.config().request_timeout, Duration::from_secs(5));

    widget.refresh().await;
    backend.set_fetch_delay(Duration::from_secs(600));

    let started = tokio::time::Instant::now();
    let outcome = widget.refresh().await;
    let elapsed = started.elapsed();

    assert_eq!(outcome, RefreshOutcome::Failed("request timed out".to_string()));
    assert!(elapsed >= Duration::from_secs(5));
    assert!(elapsed <= Duration::from_secs(6));

    let snap = widget.snapshot();
    assert_eq!(snap.resource.value, Some(80.0));
    assert_eq!(snap.resource.error.as_deref(), Some("request timed out"));
    assert!(!snap.resource.is_loading);
}

#[tokio::test(start_paused = true)]
async fn slow_activation_fails_at_request_timeout() {
    let backend = Arc::new(InMemoryBackend::new());
    backend.set_activation_delay(Duration::from_secs(600));
    let widget = build(
        &backend,
        WidgetConfig::affiliate_marketing().with_request_timeout(Duration::from_secs(2)),
    );

    let started = tokio::time::Instant::now();
    let outcome = widget.activate().await;
    assert!(started.elapsed() <= Duration::from_secs(3));
    assert_eq!(
        outcome,
        ActivationOutcome::Failed {
            reason: "request timed out".to_string()
        }
    );
    assert_eq!(widget.state(), ActivationState::Error);
}

#[tokio::test(start_paused = true)]
async fn deactivate_is_ignored_unless_active() {
    let backend = Arc::new(InMemoryBackend::new());
    let widget = affiliate(&backend);

    assert_eq!(
        widget.deactivate().await,
        DeactivationOutcome::Ignored {
            state: ActivationState::Idle
        }
    );
    assert_eq!(backend.stop_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn stop_notification_failure_does_not_block_deactivate() {
    let backend = Arc::new(InMemoryBackend::new());
    let widget = affiliate(&backend);
    widget.activate().await;

    backend.set_activation(Err(BackendError::Timeout));
    assert_eq!(widget.deactivate().await, DeactivationOutcome::Stopped);
    assert_eq!(widget.state(), ActivationState::Idle);

    let log = widget.snapshot().log;
    assert!(log.iter().any(|e| e.severity == Severity::Warning));
}

#[tokio::test(start_paused = true)]
async fn dismiss_and_retry_from_error() {
    let backend = Arc::new(InMemoryBackend::new());
    backend.set_activation(Err(BackendError::Status(503)));
    let widget = affiliate(&backend);

    assert_eq!(
        widget.retry().await,
        ActivationOutcome::Ignored {
            state: ActivationState::Idle
        }
    );

    widget.activate().await;
    assert_eq!(widget.state(), ActivationState::Error);
    let last = widget.snapshot().log.last().cloned().unwrap();
    assert!(last.message.starts_with("Activation failed: HTTP 503"));
    assert!(last.message.contains("retry"));

    assert_eq!(
        widget.dismiss(),
        Transition::Applied {
            from: ActivationState::Error,
            to: ActivationState::Idle
        }
    );
    assert_eq!(widget.snapshot().failure, None);
    assert!(!widget.dismiss().is_applied());

    widget.activate().await;
    backend.set_activation(Ok(()));
    assert!(matches!(widget.retry().await, ActivationOutcome::Activated { .. }));
    assert_eq!(widget.state(), ActivationState::Active);
    assert_eq!(backend.start_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn currency_switch_refreshes_when_active() {
    let backend = Arc::new(InMemoryBackend::new());
    backend.set_total(Ok(5.0));
    let widget = affiliate(&backend);

    // Idle: stored, no fetch.
    assert_eq!(widget.set_currency(Currency::Gbp).await, None);
    assert_eq!(widget.snapshot().currency, Currency::Gbp);
    assert_eq!(backend.fetch_calls(), 0);

    widget.activate().await;
    assert_eq!(backend.last_currency(), Some(Currency::Gbp));

    let outcome = widget.set_currency(Currency::Usd).await;
    assert_eq!(outcome, Some(RefreshOutcome::Updated(5.0)));
    assert_eq!(backend.last_currency(), Some(Currency::Usd));
    assert_eq!(widget.snapshot().display_value(), "$5.00");

    assert_eq!(widget.set_currency(Currency::Usd).await, None);
}

#[tokio::test(start_paused = true)]
async fn checkout_logs_outcome() {
    let backend = Arc::new(InMemoryBackend::new());
    backend.set_checkout(Ok("https://pay.example.test/s/abc".to_string()));
    let widget = affiliate(&backend);

    let session = widget.checkout("buyer@example.test", 500_000).await.unwrap();
    assert_eq!(session.authorization_url, "https://pay.example.test/s/abc");
    assert_eq!(widget.snapshot().log.last().unwrap().message, "Payment initiated");
    assert_eq!(widget.state(), ActivationState::Idle);

    backend.set_checkout(Err(BackendError::Status(502)));
    let err = widget.checkout("buyer@example.test", 500_000).await.unwrap_err();
    assert!(matches!(err, WidgetError::Backend(BackendError::Status(502))));
    assert_eq!(widget.snapshot().log.last().unwrap().severity, Severity::Error);
    assert_eq!(backend.checkout_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn shutdown_silences_everything() {
    let backend = Arc::new(InMemoryBackend::new());
    backend.set_total(Ok(9.0));
    let widget = affiliate(&backend);
    widget.activate().await;

    widget.shutdown().await;
    let frozen = widget.snapshot();
    assert!(!frozen.mounted);

    sleep(Duration::from_secs(60)).await;
    assert_eq!(widget.snapshot(), frozen);
    assert_eq!(backend.fetch_calls(), 1);

    assert_eq!(widget.refresh().await, RefreshOutcome::Discarded);
    assert!(matches!(widget.activate().await, ActivationOutcome::Ignored { .. }));
    assert!(matches!(
        widget.checkout("a@example.test", 1).await,
        Err(WidgetError::Unmounted)
    ));
    assert_eq!(widget.set_currency(Currency::Eur).await, None);

    // Second shutdown is a no-op.
    widget.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn widgets_do_not_share_state() {
    let backend = Arc::new(InMemoryBackend::new());
    backend.set_total(Ok(100.0));
    let affiliate = affiliate(&backend);
    let neural = build(&backend, WidgetConfig::neural_commerce());
    assert_ne!(affiliate.id(), neural.id());

    affiliate.activate().await;
    sleep(TICK * 2 + Duration::from_millis(100)).await;

    let snap = neural.snapshot();
    assert_eq!(snap.state, ActivationState::Idle);
    assert_eq!(snap.ticks, 0);
    assert_eq!(snap.counters.total(), 0);
    assert!(snap.log.is_empty());
    assert_eq!(snap.resource.value, None);
    assert_eq!(affiliate.snapshot().ticks, 2);
}

#[tokio::test]
async fn invalid_config_is_rejected() {
    let backend = Arc::new(InMemoryBackend::new());
    let backend_dyn: Arc<dyn DashboardBackend> = backend;
    let config = WidgetConfig::affiliate_marketing().with_log_capacity(0);
    let err = Widget::new(config, backend_dyn, SeededRandom::new(1)).err();
    assert!(matches!(err, Some(WidgetError::Config(_))));
}

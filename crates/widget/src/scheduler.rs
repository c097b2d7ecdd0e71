//! Background timers for one active widget.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use crate::poller::PollingStateController;
use crate::state::WidgetCell;

/// Handle to a running scheduler task.
///
/// Dropping the handle aborts the task; [`SchedulerHandle::stop`] shuts it
/// down gracefully and waits for it.
pub(crate) struct SchedulerHandle {
    shutdown: Arc<Notify>,
    join: Option<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Request shutdown and wait until the task has exited.
    ///
    /// Once this returns, no further tick or scheduled refresh will start.
    pub(crate) async fn stop(mut self) {
        self.shutdown.notify_one();
        if let Some(join) = self.join.take() {
            if let Err(e) = join.await {
                if e.is_panic() {
                    tracing::error!("widget scheduler panicked: {}", e);
                }
            }
        }
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        if let Some(join) = self.join.take() {
            join.abort();
        }
    }
}

/// Drives the poll and tick timers of one widget.
///
/// The first scheduled refresh fires one poll interval after start (the
/// activation itself performs the immediate one); the first tick fires one
/// tick interval after start.
pub(crate) struct WidgetScheduler {
    cell: Arc<WidgetCell>,
    poller: PollingStateController,
}

impl WidgetScheduler {
    pub(crate) fn new(cell: Arc<WidgetCell>, poller: PollingStateController) -> Self {
        Self { cell, poller }
    }

    pub(crate) fn start(self) -> SchedulerHandle {
        let shutdown = Arc::new(Notify::new());
        let signal = shutdown.clone();
        let poll_every = self.cell.config.poll_interval;
        let tick_every = self.cell.config.tick_interval;

        let join = tokio::spawn(async move {
            let name = self.cell.config.name.clone();
            tracing::info!(widget = %name, ?poll_every, ?tick_every, "widget scheduler started");

            let mut poll = periodic(poll_every);
            let mut ticks = periodic(tick_every);

            loop {
                tokio::select! {
                    biased;
                    _ = signal.notified() => {
                        tracing::debug!(widget = %name, "widget scheduler received shutdown signal");
                        break;
                    }
                    _ = ticks.tick() => {
                        if let Some(report) = self.cell.tick() {
                            tracing::debug!(widget = %name, task = %report.task, "simulator tick");
                        }
                    }
                    _ = poll.tick() => {
                        let epoch = {
                            let state = self.cell.lock();
                            if !state.activation.is_active() {
                                continue;
                            }
                            state.activation.epoch()
                        };
                        // Refreshes run detached so network latency never delays ticks.
                        // The epoch is pinned here: a task first polled after a stop
                        // must not adopt the next run's epoch.
                        let poller = self.poller.clone();
                        tokio::spawn(async move {
                            poller.refresh_for_epoch(epoch).await;
                        });
                    }
                }
            }

            tracing::info!(widget = %name, "widget scheduler stopped");
        });

        SchedulerHandle {
            shutdown,
            join: Some(join),
        }
    }
}

fn periodic(every: Duration) -> tokio::time::Interval {
    let mut interval = interval_at(Instant::now() + every, every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

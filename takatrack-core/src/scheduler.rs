//! Fixed-cadence refresh loop driving fetch, apply, and publish.
//!
//! Cycles start on a fixed grid measured from the start of the first cycle.
//! A tick that comes due while the previous cycle is still running is skipped
//! rather than queued, so at most one fetch is ever in flight.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{Instant, MissedTickBehavior};

use crate::bounds::BoundsSettings;
use crate::config::SyncConfig;
use crate::ports::{AlertSink, RenderSink, SnapshotPort};
use crate::service::SyncEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Lifecycle state of the refresh loop.
pub enum SchedulerState {
    /// Waiting for the next tick.
    Idle,
    /// A fetch is in flight.
    Fetching,
    /// A fetched snapshot is being classified and published.
    Applying,
    /// Stopped for good.
    Stopped,
}

/// Refresh loop owning the sync engine and its collaborators.
pub struct RefreshScheduler {
    port: Arc<dyn SnapshotPort>,
    render: Arc<dyn RenderSink>,
    alerts: Arc<dyn AlertSink>,
    interval: Duration,
    engine: SyncEngine,
}

impl RefreshScheduler {
    /// Create a scheduler with an explicit interval and bounds settings.
    #[must_use]
    pub fn new(
        port: Arc<dyn SnapshotPort>,
        render: Arc<dyn RenderSink>,
        alerts: Arc<dyn AlertSink>,
        interval: Duration,
        bounds: BoundsSettings,
    ) -> Self {
        Self {
            port,
            render,
            alerts,
            interval,
            engine: SyncEngine::new(bounds),
        }
    }

    /// Create a scheduler using the interval and bounds from `config`.
    #[must_use]
    pub fn from_config(
        config: &SyncConfig,
        port: Arc<dyn SnapshotPort>,
        render: Arc<dyn RenderSink>,
        alerts: Arc<dyn AlertSink>,
    ) -> Self {
        Self::new(port, render, alerts, config.refresh_interval, config.bounds)
    }

    /// Spawn the loop on the current tokio runtime. Cycle 0 runs immediately.
    ///
    /// Dropping the returned handle stops the loop as well.
    #[must_use]
    pub fn start(self) -> SchedulerHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let (state_tx, state_rx) = watch::channel(SchedulerState::Idle);
        let task = tokio::spawn(self.run(stop_rx, state_tx));
        SchedulerHandle {
            stop_tx,
            state_rx,
            task,
        }
    }

    async fn run(
        mut self,
        mut stop_rx: watch::Receiver<bool>,
        state_tx: watch::Sender<SchedulerState>,
    ) -> SyncEngine {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut last_finished: Option<Instant> = None;
        let mut attempt: u64 = 0;

        tracing::info!(
            source = %self.port.describe(),
            interval_secs = self.interval.as_secs_f64(),
            "scheduler: started"
        );

        loop {
            let due = tokio::select! {
                biased;
                _ = stop_rx.changed() => break,
                due = ticker.tick() => due,
            };
            if stop_requested(&stop_rx) {
                break;
            }

            if last_finished.is_some_and(|finished| due < finished) {
                tracing::warn!(
                    attempt,
                    "scheduler: previous cycle overran its slot; skipping cycle"
                );
                continue;
            }

            self.cycle(attempt, &stop_rx, &state_tx).await;
            last_finished = Some(Instant::now());
            attempt += 1;
        }

        state_tx.send_replace(SchedulerState::Stopped);
        tracing::info!(cycles = attempt, "scheduler: stopped");
        self.engine
    }

    async fn cycle(
        &mut self,
        attempt: u64,
        stop_rx: &watch::Receiver<bool>,
        state_tx: &watch::Sender<SchedulerState>,
    ) {
        state_tx.send_replace(SchedulerState::Fetching);
        tracing::debug!(attempt, "scheduler: fetching snapshot");
        let result = self.port.fetch().await;

        if stop_requested(stop_rx) {
            tracing::debug!(attempt, "scheduler: stopped during fetch; discarding result");
            return;
        }

        let snapshot = match result {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!(
                    attempt,
                    kind = err.kind(),
                    error = %err,
                    "scheduler: fetch failed; keeping last known state"
                );
                self.render.fetch_failed(&err);
                state_tx.send_replace(SchedulerState::Idle);
                return;
            }
        };

        state_tx.send_replace(SchedulerState::Applying);
        let outcome = self.engine.apply(&snapshot, Utc::now());
        tracing::debug!(
            attempt,
            cycle = outcome.frame.cycle,
            bins = outcome.frame.entities.len(),
            dropped = outcome.frame.dropped,
            alerts = outcome.alerts.len(),
            "scheduler: cycle applied"
        );

        for alert in &outcome.alerts {
            tracing::info!(id = %alert.id, area = %alert.area, "scheduler: bin is full");
            self.alerts.alert(alert);
        }
        self.render.render(&outcome.frame);
        state_tx.send_replace(SchedulerState::Idle);
    }
}

/// A dropped handle counts as a stop request.
fn stop_requested(stop_rx: &watch::Receiver<bool>) -> bool {
    *stop_rx.borrow() || stop_rx.has_changed().is_err()
}

/// Handle to a running refresh loop.
pub struct SchedulerHandle {
    stop_tx: watch::Sender<bool>,
    state_rx: watch::Receiver<SchedulerState>,
    task: JoinHandle<SyncEngine>,
}

impl SchedulerHandle {
    /// Ask the loop to stop. Returns `false` if it had already been asked.
    ///
    /// A fetch in flight is allowed to finish; its result is discarded.
    pub fn stop(&self) -> bool {
        !self.stop_tx.send_replace(true)
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SchedulerState {
        *self.state_rx.borrow()
    }

    /// Receiver that observes lifecycle changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SchedulerState> {
        self.state_rx.clone()
    }

    /// Wait for the loop to exit and hand back its engine.
    ///
    /// Call [`SchedulerHandle::stop`] first, otherwise this waits forever.
    ///
    /// # Errors
    ///
    /// Returns a [`JoinError`] if the loop task panicked or was aborted.
    pub async fn join(self) -> Result<SyncEngine, JoinError> {
        self.task.await
    }
}

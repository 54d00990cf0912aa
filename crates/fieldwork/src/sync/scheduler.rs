//! Periodic and event-driven outbox draining.
//!
//! A drain runs on every interval tick while online, immediately when
//! connectivity is restored, and on manual trigger. At most one drain is in
//! flight at any time.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::net::Connectivity;
use crate::outbox::{DrainReport, PendingQueue};

struct Inner {
    queue: PendingQueue,
    connectivity: Connectivity,
    /// Held for the whole duration of a drain.
    drain_lock: Mutex<()>,
    shutdown: CancellationToken,
}

impl Inner {
    async fn drain_once(&self, reason: &str) -> Option<DrainReport> {
        if !self.connectivity.is_online() {
            log::debug!("Drain ({}) skipped: offline", reason);
            return None;
        }

        // Try to acquire the lock; skip if already draining
        let _guard = match self.drain_lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                log::info!("Drain ({}) skipped: another drain is already in progress", reason);
                return None;
            }
        };

        log::debug!("Drain started ({})", reason);
        match self.queue.drain(&self.shutdown).await {
            Ok(report) => Some(report),
            Err(e) => {
                log::error!("Drain ({}) failed: {}", reason, e);
                None
            }
        }
    }
}

/// Drives [`PendingQueue::drain`] without overlap.
pub struct SyncScheduler {
    inner: Arc<Inner>,
    interval: Duration,
    trigger_tx: broadcast::Sender<()>,
}

impl SyncScheduler {
    pub fn new(queue: PendingQueue, connectivity: Connectivity, interval: Duration) -> Self {
        let (trigger_tx, _) = broadcast::channel(16);
        Self {
            inner: Arc::new(Inner {
                queue,
                connectivity,
                drain_lock: Mutex::new(()),
                shutdown: CancellationToken::new(),
            }),
            interval,
            trigger_tx,
        }
    }

    /// Starts the drain loop on the current tokio runtime.
    ///
    /// The first tick fires immediately, so a pending backlog is drained at
    /// startup when online.
    pub fn start(&self) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        let mut trigger_rx = self.trigger_tx.subscribe();
        let mut online_rx = inner.connectivity.subscribe();
        let period = self.interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                let reason = tokio::select! {
                    biased;
                    _ = inner.shutdown.cancelled() => break,
                    changed = online_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        if !*online_rx.borrow_and_update() {
                            continue;
                        }
                        "connectivity restored"
                    }
                    Ok(()) = trigger_rx.recv() => "manual",
                    _ = ticker.tick() => "interval",
                };

                inner.drain_once(reason).await;
            }
            log::info!("Sync scheduler stopped");
        })
    }

    /// Asks the running loop for an out-of-cycle drain.
    pub fn trigger(&self) {
        if self.trigger_tx.send(()).is_err() {
            log::debug!("Drain trigger ignored: scheduler not running");
        }
    }

    /// Drains now on the caller's task. Returns `None` when offline or when
    /// another drain is already in flight.
    pub async fn drain_now(&self) -> Option<DrainReport> {
        self.inner.drain_once("direct").await
    }

    /// Stops the loop and cancels any in-flight drain.
    pub fn stop(&self) {
        self.inner.shutdown.cancel();
    }
}

impl Drop for SyncScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

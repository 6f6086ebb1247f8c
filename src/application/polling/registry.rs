//! Registry of live poll workers, one per subscriber.
//!
//! A job's map entry lives exactly as long as its worker: it is inserted by
//! `start` and removed by the worker itself on exit, never by `stop`. While
//! the entry exists `start` is refused, so a stopping worker and a fresh one
//! can never overlap.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::config::PollingConfig;
use super::poller::{AdaptivePoller, PollerDeps, StopReason};
use super::signal::StopSignal;
use crate::domain::id::SubscriberId;
use crate::error::Result;
use crate::port::inbound::polling::PollingControl;

struct JobHandle {
    generation: u64,
    stop_tx: watch::Sender<bool>,
    /// Closes when the worker has exited and left the map.
    done: watch::Receiver<()>,
    stopping: bool,
    /// `start` was called while this worker was live.
    start_requested: bool,
}

struct Shared {
    deps: PollerDeps,
    config: PollingConfig,
    jobs: Mutex<HashMap<SubscriberId, JobHandle>>,
    shutdown: watch::Sender<bool>,
    next_generation: AtomicU64,
}

impl Shared {
    fn is_shut_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    fn next_generation(&self) -> u64 {
        self.next_generation.fetch_add(1, Ordering::Relaxed)
    }

    /// Spawn a worker. The caller holds the job map lock and inserts the
    /// returned handle before releasing it.
    fn spawn(self: &Arc<Self>, subscriber: SubscriberId) -> JobHandle {
        let generation = self.next_generation();
        let (stop_tx, stop_rx) = watch::channel(false);
        let (done_tx, done) = watch::channel(());
        let signal = StopSignal::new(stop_rx, self.shutdown.subscribe());
        let slot = Slot {
            shared: Arc::clone(self),
            subscriber,
            generation,
            _done: done_tx,
        };
        tokio::spawn(supervise(slot, signal));

        JobHandle {
            generation,
            stop_tx,
            done,
            stopping: false,
            start_requested: false,
        }
    }
}

/// A worker's claim on its map entry. Dropping it removes the entry (if
/// still owned) and then closes `done`, also when the worker panics.
struct Slot {
    shared: Arc<Shared>,
    subscriber: SubscriberId,
    generation: u64,
    _done: watch::Sender<()>,
}

impl Slot {
    /// After a self-stop on an unreachable recipient: keep the job alive
    /// under a new generation if notifications were switched back on while
    /// the worker was exiting.
    async fn resume(&mut self) -> Option<StopSignal> {
        {
            let mut jobs = self.shared.jobs.lock();
            let job = jobs
                .get_mut(&self.subscriber)
                .filter(|job| job.generation == self.generation && !job.stopping)?;
            if !std::mem::take(&mut job.start_requested) {
                return None;
            }
        }

        match self.shared.deps.ledger.subscriber(self.subscriber).await {
            Ok(Some(subscriber)) if subscriber.active => {}
            Ok(_) => return None,
            Err(e) => {
                warn!(subscriber = %self.subscriber, error = %e, "Failed to re-check subscriber state");
                return None;
            }
        }

        let mut jobs = self.shared.jobs.lock();
        if self.shared.is_shut_down() {
            return None;
        }
        let job = jobs
            .get_mut(&self.subscriber)
            .filter(|job| job.generation == self.generation && !job.stopping)?;

        let generation = self.shared.next_generation();
        let (stop_tx, stop_rx) = watch::channel(false);
        job.generation = generation;
        job.stop_tx = stop_tx;
        self.generation = generation;

        info!(subscriber = %self.subscriber, "Notifications re-enabled during exit, resuming");
        Some(StopSignal::new(stop_rx, self.shared.shutdown.subscribe()))
    }
}

impl Drop for Slot {
    fn drop(&mut self) {
        let mut jobs = self.shared.jobs.lock();
        if jobs
            .get(&self.subscriber)
            .is_some_and(|job| job.generation == self.generation)
        {
            jobs.remove(&self.subscriber);
        }
    }
}

async fn supervise(mut slot: Slot, mut signal: StopSignal) {
    loop {
        let mut poller = AdaptivePoller::new(
            slot.subscriber,
            slot.shared.deps.clone(),
            slot.shared.config.clone(),
        );
        let reason = poller.run(signal).await;
        debug!(subscriber = %slot.subscriber, reason = ?reason, "Worker exited");

        if reason != StopReason::RecipientUnreachable {
            break;
        }
        match slot.resume().await {
            Some(next) => signal = next,
            None => break,
        }
    }
}

/// Owns the worker task of every polled subscriber.
///
/// The job map lock is never held across an await.
pub struct JobRegistry {
    shared: Arc<Shared>,
}

impl JobRegistry {
    pub fn new(deps: PollerDeps, config: PollingConfig) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared {
                deps,
                config,
                jobs: Mutex::new(HashMap::new()),
                shutdown,
                next_generation: AtomicU64::new(1),
            }),
        }
    }

    /// Whether `stop_all` has been called.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shared.is_shut_down()
    }

    /// Number of live jobs, including ones that are stopping.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.jobs.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shared.jobs.lock().is_empty()
    }
}

#[async_trait]
impl PollingControl for JobRegistry {
    fn start(&self, subscriber: SubscriberId) -> bool {
        let mut jobs = self.shared.jobs.lock();
        if self.shared.is_shut_down() {
            debug!(subscriber = %subscriber, "Registry shut down, not starting");
            return false;
        }
        if let Some(job) = jobs.get_mut(&subscriber) {
            if job.stopping {
                debug!(subscriber = %subscriber, "Previous worker still stopping, not starting");
            } else {
                job.start_requested = true;
            }
            return false;
        }

        let job = self.shared.spawn(subscriber);
        jobs.insert(subscriber, job);
        true
    }

    async fn stop(&self, subscriber: SubscriberId) -> bool {
        let mut done = {
            let mut jobs = self.shared.jobs.lock();
            let Some(job) = jobs.get_mut(&subscriber) else {
                return false;
            };
            job.stopping = true;
            job.stop_tx.send_replace(true);
            job.done.clone()
        };

        // Resolves when the worker drops its slot, after it left the map.
        let _ = done.changed().await;
        true
    }

    async fn stop_all(&self) {
        let pending: Vec<watch::Receiver<()>> = {
            let jobs = self.shared.jobs.lock();
            self.shared.shutdown.send_replace(true);
            jobs.values()
                .map(|job| {
                    job.stop_tx.send_replace(true);
                    job.done.clone()
                })
                .collect()
        };

        let count = pending.len();
        for mut done in pending {
            let _ = done.changed().await;
        }
        info!(workers = count, "All pollers stopped");
    }

    async fn reconcile(&self) -> Result<usize> {
        let active = self.shared.deps.ledger.active_subscribers().await?;
        let started = active.into_iter().filter(|id| self.start(*id)).count();
        info!(started, "Resumed polling for active subscribers");
        Ok(started)
    }

    fn is_running(&self, subscriber: SubscriberId) -> bool {
        self.shared.jobs.lock().contains_key(&subscriber)
    }

    fn running(&self) -> Vec<SubscriberId> {
        let mut ids: Vec<_> = self.shared.jobs.lock().keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

impl Drop for JobRegistry {
    fn drop(&mut self) {
        self.shared.shutdown.send_replace(true);
    }
}

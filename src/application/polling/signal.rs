//! Cooperative cancellation for poll workers.

use tokio::sync::watch;

/// A worker's view of its two stop sources: its own job signal and the
/// registry-wide shutdown signal.
///
/// A dropped sender counts as a stop request, so a worker never outlives
/// the registry that spawned it.
#[derive(Debug, Clone)]
pub struct StopSignal {
    job: watch::Receiver<bool>,
    shutdown: watch::Receiver<bool>,
}

impl StopSignal {
    #[must_use]
    pub fn new(job: watch::Receiver<bool>, shutdown: watch::Receiver<bool>) -> Self {
        Self { job, shutdown }
    }

    /// Non-blocking check, used at the top of each cycle and before each
    /// delivery.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        *self.job.borrow() || *self.shutdown.borrow() || self.senders_gone()
    }

    /// Resolves once either source requests a stop.
    pub async fn stopped(&mut self) {
        tokio::select! {
            _ = self.job.wait_for(|stop| *stop) => {}
            _ = self.shutdown.wait_for(|stop| *stop) => {}
        }
    }

    fn senders_gone(&self) -> bool {
        self.job.has_changed().is_err() || self.shutdown.has_changed().is_err()
    }
}

/// A standalone signal for driving a poller by hand, with the job and
/// shutdown senders that control it.
#[must_use]
pub fn manual() -> (StopSignal, watch::Sender<bool>, watch::Sender<bool>) {
    let (job_tx, job_rx) = watch::channel(false);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    (StopSignal::new(job_rx, shutdown_rx), job_tx, shutdown_tx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn job_stop_is_observed() {
        let (mut signal, job, _shutdown) = manual();
        assert!(!signal.is_stopped());

        job.send_replace(true);
        assert!(signal.is_stopped());
        tokio::time::timeout(Duration::from_secs(1), signal.stopped())
            .await
            .expect("stopped() should resolve");
    }

    #[tokio::test]
    async fn shutdown_is_observed() {
        let (mut signal, _job, shutdown) = manual();
        shutdown.send_replace(true);
        assert!(signal.is_stopped());
        tokio::time::timeout(Duration::from_secs(1), signal.stopped())
            .await
            .expect("stopped() should resolve");
    }

    #[tokio::test]
    async fn dropped_sender_counts_as_stop() {
        let (mut signal, job, _shutdown) = manual();
        drop(job);
        assert!(signal.is_stopped());
        tokio::time::timeout(Duration::from_secs(1), signal.stopped())
            .await
            .expect("stopped() should resolve");
    }

    #[tokio::test]
    async fn stopped_pends_while_running() {
        let (mut signal, _job, _shutdown) = manual();
        let result = tokio::time::timeout(Duration::from_millis(20), signal.stopped()).await;
        assert!(result.is_err());
    }
}

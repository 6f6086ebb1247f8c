//! Control surface for per-subscriber polling jobs.
//!
//! Implemented by [`JobRegistry`](crate::application::polling::registry::JobRegistry)
//! and consumed by the Telegram command handler and the CLI.

use async_trait::async_trait;

use crate::domain::id::SubscriberId;
use crate::error::Result;

#[async_trait]
pub trait PollingControl: Send + Sync {
    /// Start polling a subscriber. Returns `false` if a job for it still
    /// exists (running or stopping) or the registry has been shut down.
    fn start(&self, subscriber: SubscriberId) -> bool;

    /// Stop a subscriber's job and wait for its worker to exit. The job
    /// keeps its entry until then, so `start` cannot overlap it.
    ///
    /// Returns `false` if no job was running.
    async fn stop(&self, subscriber: SubscriberId) -> bool;

    /// Stop every job. Used at shutdown.
    async fn stop_all(&self);

    /// Start a job for every subscriber marked active in the ledger.
    ///
    /// Returns the number of jobs started.
    async fn reconcile(&self) -> Result<usize>;

    fn is_running(&self, subscriber: SubscriberId) -> bool;

    /// Subscribers with a live job, sorted.
    fn running(&self) -> Vec<SubscriberId>;
}

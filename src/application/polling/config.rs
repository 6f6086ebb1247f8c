//! Runtime polling parameters.

use std::time::Duration;

/// Timing parameters shared by every poll job.
///
/// Built from the `[polling]` section of the configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollingConfig {
    /// Interval while the gateway is healthy.
    pub base_interval: Duration,
    /// Interval once `error_threshold` consecutive cycles failed.
    pub degraded_interval: Duration,
    /// Consecutive failed cycles before switching to `degraded_interval`.
    pub error_threshold: u32,
    /// Upper bound on one gateway fetch.
    pub fetch_timeout: Duration,
    /// Upper bound on one delivery attempt.
    pub delivery_timeout: Duration,
    /// Wait before retrying a subscriber whose credentials are missing.
    pub credentials_retry: Duration,
    /// Minimum spacing between two `update_last_poll` writes.
    pub last_poll_refresh: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            base_interval: Duration::from_secs(2),
            degraded_interval: Duration::from_secs(30),
            error_threshold: 10,
            fetch_timeout: Duration::from_secs(20),
            delivery_timeout: Duration::from_secs(20),
            credentials_retry: Duration::from_secs(60),
            last_poll_refresh: Duration::from_secs(300),
        }
    }
}

//! Canonical test configurations.

use std::time::Duration;

use crate::application::polling::PollingConfig;

/// Polling config with millisecond intervals for fast tests.
pub fn polling() -> PollingConfig {
    PollingConfig {
        base_interval: Duration::from_millis(5),
        degraded_interval: Duration::from_millis(50),
        error_threshold: 3,
        fetch_timeout: Duration::from_millis(500),
        delivery_timeout: Duration::from_millis(500),
        credentials_retry: Duration::from_millis(20),
        last_poll_refresh: Duration::from_secs(300),
    }
}

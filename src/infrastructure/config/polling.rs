//! `[polling]` section: cadence and timeouts of the per-subscriber jobs.

use std::time::Duration;

use serde::Deserialize;

use crate::application::polling::PollingConfig;
use crate::error::ConfigError;

/// Polling settings as written in the configuration file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PollingSettings {
    #[serde(default = "default_base_interval_ms")]
    pub base_interval_ms: u64,
    #[serde(default = "default_degraded_interval_ms")]
    pub degraded_interval_ms: u64,
    /// Consecutive failed cycles before the job slows down.
    #[serde(default = "default_error_threshold")]
    pub error_threshold: u32,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_delivery_timeout_secs")]
    pub delivery_timeout_secs: u64,
    #[serde(default = "default_credentials_retry_secs")]
    pub credentials_retry_secs: u64,
    #[serde(default = "default_last_poll_refresh_secs")]
    pub last_poll_refresh_secs: u64,
}

const fn default_base_interval_ms() -> u64 {
    2_000
}

const fn default_degraded_interval_ms() -> u64 {
    30_000
}

const fn default_error_threshold() -> u32 {
    10
}

const fn default_fetch_timeout_secs() -> u64 {
    20
}

const fn default_delivery_timeout_secs() -> u64 {
    20
}

const fn default_credentials_retry_secs() -> u64 {
    60
}

const fn default_last_poll_refresh_secs() -> u64 {
    300
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            base_interval_ms: default_base_interval_ms(),
            degraded_interval_ms: default_degraded_interval_ms(),
            error_threshold: default_error_threshold(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            delivery_timeout_secs: default_delivery_timeout_secs(),
            credentials_retry_secs: default_credentials_retry_secs(),
            last_poll_refresh_secs: default_last_poll_refresh_secs(),
        }
    }
}

impl PollingSettings {
    /// Reject settings that would spin or never degrade.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let nonzero = [
            ("polling.base_interval_ms", self.base_interval_ms),
            ("polling.degraded_interval_ms", self.degraded_interval_ms),
            ("polling.fetch_timeout_secs", self.fetch_timeout_secs),
            ("polling.delivery_timeout_secs", self.delivery_timeout_secs),
            ("polling.credentials_retry_secs", self.credentials_retry_secs),
        ];
        for (field, value) in nonzero {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "must be greater than 0".to_string(),
                });
            }
        }
        if self.degraded_interval_ms < self.base_interval_ms {
            return Err(ConfigError::InvalidValue {
                field: "polling.degraded_interval_ms",
                reason: "must be >= base_interval_ms".to_string(),
            });
        }
        if self.error_threshold == 0 {
            return Err(ConfigError::InvalidValue {
                field: "polling.error_threshold",
                reason: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    #[must_use]
    pub const fn to_polling_config(&self) -> PollingConfig {
        PollingConfig {
            base_interval: Duration::from_millis(self.base_interval_ms),
            degraded_interval: Duration::from_millis(self.degraded_interval_ms),
            error_threshold: self.error_threshold,
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
            delivery_timeout: Duration::from_secs(self.delivery_timeout_secs),
            credentials_retry: Duration::from_secs(self.credentials_retry_secs),
            last_poll_refresh: Duration::from_secs(self.last_poll_refresh_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_runtime_defaults() {
        assert_eq!(
            PollingSettings::default().to_polling_config(),
            PollingConfig::default()
        );
    }

    #[test]
    fn rejects_zero_base_interval() {
        let settings = PollingSettings {
            base_interval_ms: 0,
            ..PollingSettings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidValue {
                field: "polling.base_interval_ms",
                ..
            })
        ));
    }

    #[test]
    fn rejects_degraded_faster_than_base() {
        let settings = PollingSettings {
            base_interval_ms: 5_000,
            degraded_interval_ms: 1_000,
            ..PollingSettings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidValue {
                field: "polling.degraded_interval_ms",
                ..
            })
        ));
    }

    #[test]
    fn rejects_zero_threshold() {
        let settings = PollingSettings {
            error_threshold: 0,
            ..PollingSettings::default()
        };
        assert!(settings.validate().is_err());
    }
}

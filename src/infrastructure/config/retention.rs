//! `[retention]` section: lifetime of notification records.

use std::time::Duration;

use serde::Deserialize;

use crate::application::retention::RetentionPolicy;
use crate::error::ConfigError;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RetentionConfig {
    /// Run the background sweeper.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_keep_days")]
    pub keep_days: u32,
    #[serde(default = "default_sweep_interval_hours")]
    pub sweep_interval_hours: u64,
}

const fn default_enabled() -> bool {
    true
}

const fn default_keep_days() -> u32 {
    730
}

const fn default_sweep_interval_hours() -> u64 {
    24
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            keep_days: default_keep_days(),
            sweep_interval_hours: default_sweep_interval_hours(),
        }
    }
}

impl RetentionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.keep_days == 0 {
            return Err(ConfigError::InvalidValue {
                field: "retention.keep_days",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.sweep_interval_hours == 0 {
            return Err(ConfigError::InvalidValue {
                field: "retention.sweep_interval_hours",
                reason: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    #[must_use]
    pub const fn policy(&self) -> RetentionPolicy {
        RetentionPolicy {
            keep_days: self.keep_days,
            sweep_interval: Duration::from_secs(self.sweep_interval_hours * 60 * 60),
        }
    }
}

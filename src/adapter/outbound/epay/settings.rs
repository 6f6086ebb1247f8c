//! Epay gateway client configuration.

use serde::Deserialize;

use crate::error::ConfigError;

/// `[gateway]` section of the configuration file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct EpayConfig {
    /// URL scheme used to reach merchant domains.
    #[serde(default = "default_scheme")]
    pub scheme: String,
    /// Per-request timeout enforced by the HTTP client.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// `limit` query parameter: number of most recent items per fetch.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_scheme() -> String {
    "https".into()
}

const fn default_request_timeout_secs() -> u64 {
    15
}

const fn default_page_size() -> u32 {
    50
}

fn default_user_agent() -> String {
    "EpayWatch/1.0 (Monitoring Orders & Settlements)".into()
}

impl Default for EpayConfig {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
            request_timeout_secs: default_request_timeout_secs(),
            page_size: default_page_size(),
            user_agent: default_user_agent(),
        }
    }
}

impl EpayConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scheme != "https" && self.scheme != "http" {
            return Err(ConfigError::InvalidValue {
                field: "gateway.scheme",
                reason: format!("expected http or https, got {:?}", self.scheme),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "gateway.request_timeout_secs",
                reason: "must be greater than 0".into(),
            });
        }
        if self.page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "gateway.page_size",
                reason: "must be greater than 0".into(),
            });
        }
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "gateway.user_agent",
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(EpayConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_page_size() {
        let config = EpayConfig {
            page_size: 0,
            ..EpayConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "gateway.page_size",
                ..
            })
        ));
    }

    #[test]
    fn rejects_unknown_scheme() {
        let config = EpayConfig {
            scheme: "ftp".into(),
            ..EpayConfig::default()
        };
        assert!(config.validate().is_err());
    }
}

//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all application settings.
//! Secrets stay out of the file: the bot token comes from `TELEGRAM_BOT_TOKEN`
//! and merchant keys live in the ledger.
//!
//! # Example
//!
//! ```no_run
//! use epaywatch::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;

use serde::Deserialize;

use super::logging::LoggingConfig;
use super::polling::PollingSettings;
use super::retention::RetentionConfig;
use super::telegram::TelegramAppConfig;
use crate::adapter::outbound::epay::EpayConfig;
use crate::error::{ConfigError, Result};

/// `[database]` section.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// SQLite file path, or `:memory:`.
    #[serde(default = "default_database_path")]
    pub path: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    "epaywatch.db".to_string()
}

const fn default_max_connections() -> u32 {
    1
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Main application configuration.
///
/// Every section is optional; an empty file yields the defaults.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub polling: PollingSettings,
    #[serde(default)]
    pub gateway: EpayConfig,
    #[serde(default)]
    pub telegram: TelegramAppConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation fails.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// A missing file is an error; defaults are never assumed silently.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.database.path.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "database.path",
            });
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                field: "database.max_connections",
                reason: "must be greater than 0".to_string(),
            });
        }
        self.polling.validate()?;
        self.gateway.validate()?;
        self.retention.validate()?;
        Ok(())
    }

    /// Initialize logging based on configuration.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.database.path, "epaywatch.db");
        assert_eq!(config.gateway.page_size, 50);
        assert!(!config.telegram.enabled);
    }

    #[test]
    fn sections_override_defaults() {
        let config = Config::parse_toml(
            r#"
            [database]
            path = "/var/lib/epaywatch/ledger.db"

            [polling]
            base_interval_ms = 1000
            degraded_interval_ms = 10000
            error_threshold = 5

            [gateway]
            scheme = "http"
            page_size = 20

            [telegram]
            enabled = true
            pin_settlements = false

            [retention]
            keep_days = 30
            "#,
        )
        .unwrap();

        assert_eq!(config.database.path, "/var/lib/epaywatch/ledger.db");
        assert_eq!(config.polling.error_threshold, 5);
        assert_eq!(config.gateway.scheme, "http");
        assert!(config.telegram.enabled);
        assert!(!config.telegram.pin_settlements);
        assert_eq!(config.retention.keep_days, 30);
        assert_eq!(config.retention.sweep_interval_hours, 24);
    }

    #[test]
    fn invalid_polling_is_rejected() {
        let err = Config::parse_toml("[polling]\nerror_threshold = 0\n").unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue {
                field: "polling.error_threshold",
                ..
            })
        ));
    }

    #[test]
    fn invalid_gateway_is_rejected() {
        let err = Config::parse_toml("[gateway]\npage_size = 0\n").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = Config::parse_toml("[polling\n").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::Parse(_))));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = Config::load("/nonexistent/epaywatch.toml").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::ReadFile(_))));
    }
}

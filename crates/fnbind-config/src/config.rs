//! Root configuration.

use crate::schema::{DecoderSection, LogFormat, LoggingSection, MetricsSection, ServerSection};
use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Complete configuration for an fnbind service.
///
/// Every section falls back to its defaults when absent.
///
/// # Example
///
/// ```
/// use fnbind_config::FnbindConfig;
///
/// let config: FnbindConfig = toml::from_str(r#"
///     [server]
///     http_addr = "127.0.0.1:3000"
///
///     [decoder]
///     max_body_bytes = 1024
/// "#).unwrap();
///
/// assert_eq!(config.server.http_addr, "127.0.0.1:3000");
/// assert_eq!(config.decoder.max_body_bytes, 1024);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FnbindConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerSection,

    /// JSON decoder settings.
    #[serde(default)]
    pub decoder: DecoderSection,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingSection,

    /// Metrics settings.
    #[serde(default)]
    pub metrics: MetricsSection,
}

impl FnbindConfig {
    /// Checks values that deserialize fine but cannot be used.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.http_addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::invalid_value(
                "server.http_addr",
                format!("'{}' is not a valid socket address", self.server.http_addr),
            ));
        }

        if self.server.request_timeout_ms == 0 {
            return Err(ConfigError::invalid_value(
                "server.request_timeout_ms",
                "must be greater than zero",
            ));
        }

        if self.decoder.max_body_bytes == 0 {
            return Err(ConfigError::invalid_value(
                "decoder.max_body_bytes",
                "must be greater than zero",
            ));
        }

        if fnbind_telemetry::logging::create_env_filter(&self.logging.level).is_err() {
            return Err(ConfigError::invalid_value(
                "logging.level",
                format!("'{}' is not a valid filter directive", self.logging.level),
            ));
        }

        if self.metrics.enabled && self.metrics.addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::invalid_value(
                "metrics.addr",
                format!("'{}' is not a valid socket address", self.metrics.addr),
            ));
        }

        Ok(())
    }

    /// Preset for local development: loopback address, pretty debug logs.
    #[must_use]
    pub fn development() -> Self {
        Self {
            server: ServerSection {
                http_addr: "127.0.0.1:8080".to_string(),
                shutdown_timeout_secs: 5,
                ..ServerSection::default()
            },
            logging: LoggingSection {
                level: "debug".to_string(),
                format: LogFormat::Pretty,
                ..LoggingSection::default()
            },
            ..Self::default()
        }
    }
}

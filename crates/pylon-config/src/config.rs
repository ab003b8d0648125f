//! The root configuration type.

use pylon_i18n::{Locale, LocaleNegotiator};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::{ConfigError, CorsConfig, LocaleConfig, LoggingConfig, MetricsConfig, ServerConfig};

/// Complete Pylon service configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use pylon_config::PylonConfig;
///
/// let config = PylonConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:8080");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct PylonConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Supported and default locales.
    #[serde(default)]
    pub locale: LocaleConfig,

    /// CORS headers.
    #[serde(default)]
    pub cors: CorsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Metrics configuration.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl PylonConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if:
    /// - the server or metrics address does not parse
    /// - the body cap is zero
    /// - no supported locale is configured, or one is unknown
    /// - the default locale is not among the supported ones
    /// - the log level is not a valid filter
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.http_addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            ));
        }

        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::invalid_value(
                "server.max_body_bytes",
                "must be greater than zero",
            ));
        }

        self.locales()?;

        if let Err(e) = pylon_telemetry::create_env_filter(&self.logging.level) {
            return Err(ConfigError::invalid_value("logging.level", e.to_string()));
        }

        if self.metrics.enabled && self.metrics.addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::invalid_value(
                "metrics.addr",
                format!("invalid socket address: {}", self.metrics.addr),
            ));
        }

        Ok(())
    }

    /// Resolves the locale section into supported locales and the default.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for an empty list, an unknown tag, or a
    /// default outside the list.
    pub fn locales(&self) -> Result<(Vec<Locale>, Locale), ConfigError> {
        if self.locale.supported.is_empty() {
            return Err(ConfigError::invalid_value(
                "locale.supported",
                "at least one locale is required",
            ));
        }

        let supported = self
            .locale
            .supported
            .iter()
            .map(|tag| {
                Locale::parse(tag).ok_or_else(|| {
                    ConfigError::invalid_value("locale.supported", format!("unsupported locale: {tag}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let default = Locale::parse(&self.locale.default)
            .filter(|locale| supported.contains(locale))
            .ok_or_else(|| {
                ConfigError::invalid_value(
                    "locale.default",
                    format!("{} is not a supported locale", self.locale.default),
                )
            })?;

        Ok((supported, default))
    }

    /// Builds the locale negotiator for this configuration.
    ///
    /// # Errors
    ///
    /// See [`PylonConfig::locales`].
    pub fn negotiator(&self) -> Result<LocaleNegotiator, ConfigError> {
        let (supported, default) = self.locales()?;
        Ok(LocaleNegotiator::new(supported, default))
    }

    /// Development preset: debug level, pretty output, loopback address.
    ///
    /// # Example
    ///
    /// ```
    /// use pylon_config::PylonConfig;
    ///
    /// let config = PylonConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.server.http_addr = "127.0.0.1:8080".to_string();
        config.logging.level = "debug".to_string();
        config.logging.format = pylon_telemetry::LogFormat::Pretty;
        config.logging.include_location = true;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(PylonConfig::default().validate().is_ok());
        assert!(PylonConfig::development().validate().is_ok());
    }

    #[test]
    fn test_invalid_http_addr() {
        let mut config = PylonConfig::default();
        config.server.http_addr = "localhost".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("server.http_addr"));
    }

    #[test]
    fn test_zero_body_cap() {
        let mut config = PylonConfig::default();
        config.server.max_body_bytes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_supported_locales() {
        let mut config = PylonConfig::default();
        config.locale.supported.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_locale() {
        let mut config = PylonConfig::default();
        config.locale.supported.push("de".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("de"));
    }

    #[test]
    fn test_default_locale_must_be_supported() {
        let mut config = PylonConfig::default();
        config.locale.supported = vec!["en".to_string()];
        config.locale.default = "fr".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("locale.default"));
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = PylonConfig::default();
        config.logging.level = "pylon=verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_metrics_addr_checked_only_when_enabled() {
        let mut config = PylonConfig::default();
        config.metrics.addr = "nowhere".to_string();
        assert!(config.validate().is_ok());
        config.metrics.enabled = true;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negotiator_uses_configured_default() {
        let mut config = PylonConfig::default();
        config.locale.default = "fr".to_string();
        let negotiator = config.negotiator().unwrap();
        assert_eq!(negotiator.default_locale(), Locale::Fr);
    }
}

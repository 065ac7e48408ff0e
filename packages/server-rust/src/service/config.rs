use serde::Deserialize;

use crate::logging::LoggingConfig;
use crate::traversal::DEFAULT_MAX_ACQUISITION_DEPTH;

/// Publisher-level configuration.
///
/// Controls the published module, request timeouts, concurrency limits, and
/// the acquisition depth bound. Loading it from files or flags is left to
/// the embedding process.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PublisherConfig {
    /// Module published when a service is built without an explicit one.
    pub default_module: String,
    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// Maximum number of in-flight requests before load shedding.
    pub max_concurrent_requests: u32,
    /// Maximum number of ancestors walked by acquisition.
    pub max_acquisition_depth: usize,
    /// Modules whose publication context is built at startup.
    pub warm_modules: Vec<String>,
    pub logging: LoggingConfig,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            default_module: "app".to_string(),
            request_timeout_ms: 30_000,
            max_concurrent_requests: 1000,
            max_acquisition_depth: DEFAULT_MAX_ACQUISITION_DEPTH,
            warm_modules: Vec::new(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Rejected configuration values.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("request_timeout_ms must be greater than zero")]
    ZeroTimeout,
    #[error("max_concurrent_requests must be greater than zero")]
    ZeroConcurrency,
    #[error("max_acquisition_depth must be greater than zero")]
    ZeroAcquisitionDepth,
}

impl PublisherConfig {
    /// Checks that limits are usable.
    ///
    /// # Errors
    ///
    /// Returns the first zero-valued limit found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.max_concurrent_requests == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.max_acquisition_depth == 0 {
            return Err(ConfigError::ZeroAcquisitionDepth);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = PublisherConfig::default();
        assert_eq!(config.default_module, "app");
        assert_eq!(config.request_timeout_ms, 30_000);
        assert_eq!(config.max_acquisition_depth, DEFAULT_MAX_ACQUISITION_DEPTH);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: PublisherConfig =
            serde_json::from_str(r#"{"default_module":"site","warm_modules":["site"]}"#).unwrap();
        assert_eq!(config.default_module, "site");
        assert_eq!(config.warm_modules, vec!["site".to_string()]);
        assert_eq!(config.max_concurrent_requests, 1000);
    }

    #[test]
    fn zero_limits_are_rejected() {
        let config = PublisherConfig {
            request_timeout_ms: 0,
            ..PublisherConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroTimeout));

        let config = PublisherConfig {
            max_concurrent_requests: 0,
            ..PublisherConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroConcurrency));

        let config = PublisherConfig {
            max_acquisition_depth: 0,
            ..PublisherConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroAcquisitionDepth));
    }
}

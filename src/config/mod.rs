//! Configuration module for the conformance harness
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`OPENAI_API_BASE`, `OPENAI_API_KEY`, `CONFORMANCE_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! The resulting [`HarnessConfig`] is built once at startup and handed to every
//! component by reference. Nothing below this module reads the environment.
//!
//! # Example
//!
//! ```rust
//! use conformance::config::HarnessConfig;
//!
//! let config = HarnessConfig::default();
//! assert_eq!(config.bridge.base_url, "http://localhost:3000/v1");
//!
//! let toml = r#"
//! [bridge]
//! model = "gpt-4o-mini"
//! "#;
//! let config: HarnessConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.bridge.model, "gpt-4o-mini");
//! ```

pub mod bridge;
pub mod error;
pub mod logging;
pub mod suite;

pub use bridge::BridgeConfig;
pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use suite::SuiteConfig;

use crate::scenario::Scenario;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable overriding the bridge base URL.
pub const ENV_API_BASE: &str = "OPENAI_API_BASE";
/// Environment variable overriding the bearer token.
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
/// Environment variable overriding the chat model.
pub const ENV_MODEL: &str = "CONFORMANCE_MODEL";
/// Environment variable overriding the log level.
pub const ENV_LOG_LEVEL: &str = "CONFORMANCE_LOG_LEVEL";
/// Environment variable overriding the log format.
pub const ENV_LOG_FORMAT: &str = "CONFORMANCE_LOG_FORMAT";

/// Unified configuration for a conformance run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HarnessConfig {
    /// Bridge location, credentials and timeouts
    pub bridge: BridgeConfig,
    /// Scenario selection and execution
    pub suite: SuiteConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl HarnessConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// Invalid values are ignored and the previous value kept.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base) = lookup(ENV_API_BASE) {
            self.bridge.base_url = base;
        }
        if let Some(key) = lookup(ENV_API_KEY) {
            self.bridge.api_key = key;
        }
        if let Some(model) = lookup(ENV_MODEL) {
            self.bridge.model = model;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.logging.level = level;
        }
        if let Some(format) = lookup(ENV_LOG_FORMAT) {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = &self.bridge.base_url;
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::Validation {
                field: "bridge.base_url".to_string(),
                message: format!("expected an http(s) URL, got '{}'", base),
            });
        }
        if self.bridge.model.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "bridge.model".to_string(),
                message: "model cannot be empty".to_string(),
            });
        }
        if self.bridge.request_timeout_secs == 0 {
            return Err(ConfigError::Validation {
                field: "bridge.request_timeout_secs".to_string(),
                message: "timeout must be non-zero".to_string(),
            });
        }
        if self.bridge.stream_read_timeout_secs == 0 {
            return Err(ConfigError::Validation {
                field: "bridge.stream_read_timeout_secs".to_string(),
                message: "timeout must be non-zero".to_string(),
            });
        }
        if self.suite.concurrency == 0 {
            return Err(ConfigError::Validation {
                field: "suite.concurrency".to_string(),
                message: "concurrency must be at least 1".to_string(),
            });
        }
        if self.suite.header_limit_bytes == 0 {
            return Err(ConfigError::Validation {
                field: "suite.header_limit_bytes".to_string(),
                message: "limit must be non-zero".to_string(),
            });
        }
        for name in &self.suite.scenarios {
            if Scenario::from_name(name).is_none() {
                return Err(ConfigError::UnknownScenario(name.clone()));
            }
        }

        Ok(())
    }
}

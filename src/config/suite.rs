//! Suite execution configuration

use serde::{Deserialize, Serialize};

/// Response header ceiling commonly enforced by reverse proxies (nginx).
pub const DEFAULT_HEADER_LIMIT_BYTES: usize = 4096;

/// How scenarios are executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Scenarios in flight at once; each owns its own client
    pub concurrency: usize,
    /// Upper bound (exclusive) on serialized response header bytes
    pub header_limit_bytes: usize,
    /// Scenario names to run; empty means the whole catalogue
    pub scenarios: Vec<String>,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            header_limit_bytes: DEFAULT_HEADER_LIMIT_BYTES,
            scenarios: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suite_config_defaults() {
        let config = SuiteConfig::default();
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.header_limit_bytes, 4096);
        assert!(config.scenarios.is_empty());
    }
}

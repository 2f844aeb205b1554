//! Logging configuration

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable logs on stderr
    #[default]
    Pretty,
    /// JSON logs for CI log collectors
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: {}", s)),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    /// Module-specific log levels (e.g., {"sse": "debug", "validate": "trace"})
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_levels: Option<HashMap<String, String>>,
    /// Log the raw JSON of every decoded stream frame at debug level.
    /// Frames contain model output, so this is off unless asked for.
    #[serde(default)]
    pub log_frames: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            component_levels: None,
            log_frames: false,
        }
    }
}

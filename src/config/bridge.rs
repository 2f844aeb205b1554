//! Bridge connection configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default base URL, including the `/v1` prefix.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/v1";

/// Default API key sent as the bearer token.
pub const DEFAULT_API_KEY: &str = "test-key";

/// Default model used by chat scenarios.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-lite";

/// Where the bridge lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    /// Deadline for a non-streaming request, and for stream response headers
    pub request_timeout_secs: u64,
    /// Longest wait for the next line of an open stream
    pub stream_read_timeout_secs: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: DEFAULT_API_KEY.to_string(),
            model: DEFAULT_MODEL.to_string(),
            request_timeout_secs: 60,
            stream_read_timeout_secs: 60,
        }
    }
}

impl BridgeConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn stream_read_timeout(&self) -> Duration {
        Duration::from_secs(self.stream_read_timeout_secs)
    }
}

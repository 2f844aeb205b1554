//! Error types for transport operations.

use thiserror::Error;

/// Errors raised below the protocol layer.
///
/// These are never retried: a conformance run must observe the bridge's
/// behavior on the first attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Network connectivity error (DNS, connection refused, reset mid-body).
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded deadline.
    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    /// A stream could not be opened because the bridge answered with an error.
    #[error("Bridge error {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// The configured base URL and path do not form a usable URL.
    #[error("Invalid URL '{0}'")]
    InvalidUrl(String),
}

impl TransportError {
    /// Map a reqwest failure, keeping timeouts distinguishable.
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(timeout_ms)
        } else if err.is_builder() {
            TransportError::InvalidUrl(err.to_string())
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            TransportError::Timeout(5000).to_string(),
            "Request timeout after 5000ms"
        );
        assert_eq!(
            TransportError::UnexpectedStatus {
                status: 502,
                body: "upstream down".to_string()
            }
            .to_string(),
            "Bridge error 502: upstream down"
        );
    }
}

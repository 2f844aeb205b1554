//! Response header checks.

use crate::validate::Violation;
use reqwest::header::{HeaderMap, CONTENT_TYPE};

/// Sum of key and value bytes over every header.
pub fn header_bytes(headers: &HeaderMap) -> usize {
    headers
        .iter()
        .map(|(name, value)| name.as_str().len() + value.as_bytes().len())
        .sum()
}

/// Serialized headers must stay strictly under `limit` bytes; reverse
/// proxies reject responses that reach it.
pub fn check_header_budget(headers: &HeaderMap, limit: usize) -> Result<usize, Violation> {
    let bytes = header_bytes(headers);
    if bytes >= limit {
        return Err(Violation::HeaderBudget { bytes, limit });
    }
    Ok(bytes)
}

/// An opened stream must be served as `text/event-stream`.
pub fn assert_event_stream(headers: &HeaderMap) -> Result<(), Violation> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if content_type.starts_with("text/event-stream") {
        Ok(())
    } else {
        Err(Violation::schema(
            "content-type",
            format!("expected 'text/event-stream', got '{}'", content_type),
        ))
    }
}

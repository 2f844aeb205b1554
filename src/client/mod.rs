//! Transport client for the bridge under test.
//!
//! Issues JSON requests, multipart uploads and SSE stream opens against the
//! configured base URL with bearer authentication. HTTP-layer failures surface
//! as [`TransportError`], separate from the protocol violations raised by the
//! validators.
//!
//! Connections are owned by the values returned here: a [`BridgeResponse`] has
//! already drained its body, and an [`EventStream`] closes its connection when
//! dropped, whichever path (success, violation, timeout) drops it.

pub mod error;

pub use error::TransportError;

use crate::config::BridgeConfig;
use futures_util::stream::{BoxStream, Stream, StreamExt};
use reqwest::header::{HeaderMap, ACCEPT, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Header used to correlate harness requests in bridge logs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Lines read from an open SSE response, in arrival order.
pub type LineStream = BoxStream<'static, Result<String, TransportError>>;

/// HTTP client bound to one bridge.
///
/// Each scenario builds its own instance, so no connection state is shared
/// across concurrently running scenarios.
#[derive(Debug, Clone)]
pub struct BridgeClient {
    /// Base URL including the API prefix (e.g., "http://localhost:3000/v1")
    base_url: String,
    /// API key for Bearer authentication
    api_key: String,
    /// Deadline for non-streaming requests and for stream headers
    request_timeout: Duration,
    /// Correlation id sent with every request, if set
    request_id: Option<String>,
    client: Client,
}

/// Fully read response to a non-streaming request.
#[derive(Debug, Clone)]
pub struct BridgeResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl BridgeResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Parse the body as untyped JSON.
    pub fn json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_slice(&self.body)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// An open SSE response whose body is consumed line by line.
pub struct EventStream {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub lines: LineStream,
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

impl BridgeClient {
    pub fn new(config: &BridgeConfig) -> Result<Self, TransportError> {
        let request_timeout = config.request_timeout();
        let client = Client::builder()
            .connect_timeout(request_timeout)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            request_timeout,
            request_id: None,
            client,
        })
    }

    /// Attach a correlation id sent as `x-request-id` on every request.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn timeout_ms(&self) -> u64 {
        self.request_timeout.as_millis() as u64
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(method, self.url(path))
            .bearer_auth(&self.api_key);
        if let Some(ref id) = self.request_id {
            builder = builder.header(REQUEST_ID_HEADER, id);
        }
        builder
    }

    /// Send a request and read the whole response body.
    ///
    /// Non-2xx statuses are returned, not raised: rejection is often the
    /// behavior under test.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        json: Option<&serde_json::Value>,
        headers: &[(&str, &str)],
    ) -> Result<BridgeResponse, TransportError> {
        let mut builder = self.request(method.clone(), path);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        if let Some(body) = json {
            builder = builder.json(body);
        }
        self.execute(method, path, builder).await
    }

    pub async fn get(&self, path: &str) -> Result<BridgeResponse, TransportError> {
        self.send(Method::GET, path, None, &[]).await
    }

    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<BridgeResponse, TransportError> {
        let builder = self.request(Method::POST, path).json(body);
        self.execute(Method::POST, path, builder).await
    }

    /// Upload a file as multipart form data (`file` part plus `purpose`).
    pub async fn upload_file(
        &self,
        path: &str,
        filename: &str,
        contents: Vec<u8>,
        purpose: &str,
    ) -> Result<BridgeResponse, TransportError> {
        let mime = mime_guess::from_path(filename).first_or_octet_stream();
        let part = Part::bytes(contents)
            .file_name(filename.to_string())
            .mime_str(mime.essence_str())
            .map_err(|e| TransportError::from_reqwest(e, self.timeout_ms()))?;
        let form = Form::new()
            .text("purpose", purpose.to_string())
            .part("file", part);

        let builder = self.request(Method::POST, path).multipart(form);
        self.execute(Method::POST, path, builder).await
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        builder: reqwest::RequestBuilder,
    ) -> Result<BridgeResponse, TransportError> {
        let timeout_ms = self.timeout_ms();
        let response = builder
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(e, timeout_ms))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::from_reqwest(e, timeout_ms))?
            .to_vec();

        tracing::debug!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            bytes = body.len(),
            "bridge request completed"
        );

        Ok(BridgeResponse {
            status,
            headers,
            body,
        })
    }

    /// POST a JSON body and open the response as a line stream.
    ///
    /// Only the wait for response headers is bounded by the request timeout;
    /// reads of the body are bounded per line by the stream consumer.
    pub async fn open_stream<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<EventStream, TransportError> {
        let timeout_ms = self.timeout_ms();
        let pending = self
            .request(Method::POST, path)
            .header(ACCEPT, "text/event-stream")
            .json(body)
            .send();

        let response = tokio::time::timeout(self.request_timeout, pending)
            .await
            .map_err(|_| TransportError::Timeout(timeout_ms))?
            .map_err(|e| TransportError::from_reqwest(e, timeout_ms))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::info!(path = %path, status = %status, "stream open rejected");
            return Err(TransportError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        let headers = response.headers().clone();
        tracing::debug!(
            path = %path,
            content_type = ?headers.get(CONTENT_TYPE),
            "stream opened"
        );

        Ok(EventStream {
            status,
            headers,
            lines: Box::pin(split_lines(response.bytes_stream())),
        })
    }
}

/// Re-split an arbitrary byte-chunk stream on `\n`.
///
/// Network chunk boundaries do not align with SSE lines, so bytes are buffered
/// until a newline arrives. A trailing `\r` is removed. A final unterminated
/// line is flushed when the body ends.
pub fn split_lines<S, B, E>(bytes: S) -> impl Stream<Item = Result<String, TransportError>> + Send
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: fmt::Display + Send,
{
    async_stream::stream! {
        let mut buffer: Vec<u8> = Vec::new();
        futures_util::pin_mut!(bytes);

        while let Some(item) = bytes.next().await {
            match item {
                Ok(chunk) => {
                    buffer.extend_from_slice(chunk.as_ref());
                    while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                        let line: Vec<u8> = buffer.drain(..=pos).collect();
                        yield Ok(line_to_string(&line));
                    }
                }
                Err(e) => {
                    yield Err(TransportError::Network(e.to_string()));
                    return;
                }
            }
        }

        if !buffer.is_empty() {
            yield Ok(line_to_string(&buffer));
        }
    }
}

fn line_to_string(line: &[u8]) -> String {
    String::from_utf8_lossy(line)
        .trim_end_matches(['\n', '\r'])
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    fn chunks(parts: &[&str]) -> Vec<Result<Vec<u8>, String>> {
        parts.iter().map(|p| Ok(p.as_bytes().to_vec())).collect()
    }

    async fn collect(parts: Vec<Result<Vec<u8>, String>>) -> Vec<Result<String, TransportError>> {
        split_lines(stream::iter(parts)).collect().await
    }

    #[tokio::test]
    async fn test_split_lines_across_chunk_boundaries() {
        let lines = collect(chunks(&["data: {\"a\"", ":1}\n\nda", "ta: [DONE]\n\n"])).await;
        let lines: Vec<String> = lines.into_iter().map(Result::unwrap).collect();
        assert_eq!(lines, vec!["data: {\"a\":1}", "", "data: [DONE]", ""]);
    }

    #[tokio::test]
    async fn test_split_lines_strips_crlf() {
        let lines = collect(chunks(&["data: x\r\n\r\n"])).await;
        let lines: Vec<String> = lines.into_iter().map(Result::unwrap).collect();
        assert_eq!(lines, vec!["data: x", ""]);
    }

    #[tokio::test]
    async fn test_split_lines_flushes_unterminated_tail() {
        let lines = collect(chunks(&["data: a\n", "data: b"])).await;
        let lines: Vec<String> = lines.into_iter().map(Result::unwrap).collect();
        assert_eq!(lines, vec!["data: a", "data: b"]);
    }

    #[tokio::test]
    async fn test_split_lines_propagates_network_error() {
        let parts = vec![Ok(b"data: a\n".to_vec()), Err("connection reset".to_string())];
        let lines = collect(parts).await;
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], Ok("data: a".to_string()));
        assert_eq!(
            lines[1],
            Err(TransportError::Network("connection reset".to_string()))
        );
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = BridgeConfig {
            base_url: "http://localhost:3000/v1/".to_string(),
            ..BridgeConfig::default()
        };
        let client = BridgeClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000/v1");
        assert_eq!(client.url("/models"), "http://localhost:3000/v1/models");
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let config = BridgeConfig {
            base_url: "http://127.0.0.1:1/v1".to_string(),
            ..BridgeConfig::default()
        };
        let client = BridgeClient::new(&config).unwrap();
        let result = client.get("/models").await;
        assert!(matches!(result, Err(TransportError::Network(_))));
    }
}

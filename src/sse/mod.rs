//! Server-Sent Events frame decoder.
//!
//! Turns raw SSE lines into ordered [`Frame`]s. Only `data:` lines matter;
//! blank separators, comments and `event:`/`id:` fields are skipped. The
//! literal `[DONE]` payload is the only well-formed end of stream: a body that
//! ends without it is an [`SseError::IncompleteStream`].

use crate::api::StreamChunk;
use crate::client::TransportError;
use futures_util::stream::{Stream, StreamExt};
use thiserror::Error;

/// Payload marking the end of a chat completion stream.
pub const DONE_SENTINEL: &str = "[DONE]";

const DATA_FIELD: &str = "data:";

/// Errors produced while decoding a stream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SseError {
    /// A `data:` payload was not a valid stream chunk.
    #[error("Malformed frame {index}: {message} (payload: {payload})")]
    Decode {
        index: usize,
        payload: String,
        message: String,
    },

    /// The bridge sent an OpenAI error object in place of a chunk.
    #[error("Error frame {index}: {message}")]
    ErrorFrame { index: usize, message: String },

    /// The peer closed the stream before `[DONE]`.
    #[error("Stream closed after {frames} frames without [DONE]")]
    IncompleteStream { frames: usize },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// One decoded `data:` frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Position among data frames, starting at 0
    pub index: usize,
    /// Literal JSON payload as received, for diagnostics
    pub raw: String,
    pub chunk: StreamChunk,
}

/// Result of decoding a single line.
#[derive(Debug, Clone)]
pub enum SseEvent {
    Frame(Frame),
    Done,
}

/// Decode one SSE line.
///
/// Returns `Ok(None)` for lines that carry no data. `index` is assigned to the
/// frame if the line holds one.
pub fn decode_line(line: &str, index: usize) -> Result<Option<SseEvent>, SseError> {
    let Some(rest) = line.strip_prefix(DATA_FIELD) else {
        return Ok(None);
    };
    let payload = rest.trim();
    if payload == DONE_SENTINEL {
        return Ok(Some(SseEvent::Done));
    }

    let decode_error = |message: String| SseError::Decode {
        index,
        payload: payload.to_string(),
        message,
    };

    let value: serde_json::Value =
        serde_json::from_str(payload).map_err(|e| decode_error(e.to_string()))?;

    if let Some(error) = value.get("error").filter(|e| e.is_object()) {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("unspecified error")
            .to_string();
        return Err(SseError::ErrorFrame { index, message });
    }

    let chunk: StreamChunk =
        serde_json::from_value(value).map_err(|e| decode_error(e.to_string()))?;

    Ok(Some(SseEvent::Frame(Frame {
        index,
        raw: payload.to_string(),
        chunk,
    })))
}

/// Decode a complete, already-buffered sequence of lines.
pub fn decode_lines<I, L>(lines: I) -> Result<Vec<Frame>, SseError>
where
    I: IntoIterator<Item = L>,
    L: AsRef<str>,
{
    let mut frames = Vec::new();
    for line in lines {
        match decode_line(line.as_ref(), frames.len())? {
            Some(SseEvent::Frame(frame)) => frames.push(frame),
            Some(SseEvent::Done) => return Ok(frames),
            None => {}
        }
    }
    Err(SseError::IncompleteStream {
        frames: frames.len(),
    })
}

/// Decode a live line stream lazily.
///
/// Frames are yielded one at a time in arrival order; the stream ends cleanly
/// at `[DONE]` and anything after it is never read. The first error ends the
/// stream.
pub fn decode_stream<S>(lines: S) -> impl Stream<Item = Result<Frame, SseError>> + Send
where
    S: Stream<Item = Result<String, TransportError>> + Send,
{
    async_stream::stream! {
        futures_util::pin_mut!(lines);
        let mut index = 0;

        while let Some(line) = lines.next().await {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    yield Err(SseError::from(e));
                    return;
                }
            };

            match decode_line(&line, index) {
                Ok(Some(SseEvent::Frame(frame))) => {
                    index += 1;
                    yield Ok(frame);
                }
                Ok(Some(SseEvent::Done)) => {
                    tracing::debug!(frames = index, "stream reached [DONE]");
                    return;
                }
                Ok(None) => {}
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }

        tracing::debug!(frames = index, "stream closed without [DONE]");
        yield Err(SseError::IncompleteStream { frames: index });
    }
}

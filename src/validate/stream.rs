//! Streaming session validator.
//!
//! A [`StreamSession`] folds decoded frames, strictly in arrival order, into
//! the state a real OpenAI client would observe:
//!
//! ```text
//! AWAITING_ROLE --first content/tool_calls delta--> STREAMING --finish_reason--> TERMINATED
//! ```
//!
//! Violations are collected against the session instead of being raised, so
//! the stream is always read to `[DONE]` (or a timeout) before anything is
//! asserted. [`StreamSession::finalize`] then reports the first hard violation.

use crate::api::{ChunkDelta, FinishReason, Role, ToolCallDelta, Usage};
use crate::client::TransportError;
use crate::error::ConformanceError;
use crate::sse::{decode_stream, Frame};
use crate::validate::Violation;
use futures_util::stream::{Stream, StreamExt};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

/// Longest function name OpenAI accepts.
const MAX_FUNCTION_NAME_LEN: usize = 64;

/// Position of a session in the stream lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StreamPhase {
    AwaitingRole,
    Streaming,
    Terminated,
}

impl fmt::Display for StreamPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StreamPhase::AwaitingRole => "AWAITING_ROLE",
            StreamPhase::Streaming => "STREAMING",
            StreamPhase::Terminated => "TERMINATED",
        };
        f.write_str(s)
    }
}

/// A tool call reassembled from fragments sharing one index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolCallFragment {
    pub id: Option<String>,
    pub name: String,
    pub arguments: String,
    /// Frame that opened this index
    pub first_frame: usize,
}

impl ToolCallFragment {
    pub fn parsed_arguments(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_str(&self.arguments)
    }
}

/// Accumulated state of one streamed request.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamSession {
    include_usage: bool,
    phase: StreamPhase,
    role_announced: bool,
    content: String,
    tool_calls: BTreeMap<u32, ToolCallFragment>,
    terminal_reason: Option<FinishReason>,
    terminal_frame: Option<usize>,
    usage: Option<Usage>,
    frames: usize,
    content_frames: usize,
    violations: Vec<Violation>,
    finalized: bool,
}

impl StreamSession {
    /// Start a session; `include_usage` mirrors `stream_options.include_usage`.
    pub fn new(include_usage: bool) -> Self {
        Self {
            include_usage,
            phase: StreamPhase::AwaitingRole,
            role_announced: false,
            content: String::new(),
            tool_calls: BTreeMap::new(),
            terminal_reason: None,
            terminal_frame: None,
            usage: None,
            frames: 0,
            content_frames: 0,
            violations: Vec::new(),
            finalized: false,
        }
    }

    pub fn phase(&self) -> StreamPhase {
        self.phase
    }

    pub fn role_announced(&self) -> bool {
        self.role_announced
    }

    /// Text reassembled from `delta.content` in arrival order.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Tool calls keyed by their stream index.
    pub fn tool_calls(&self) -> &BTreeMap<u32, ToolCallFragment> {
        &self.tool_calls
    }

    pub fn terminal_reason(&self) -> Option<&FinishReason> {
        self.terminal_reason.as_ref()
    }

    pub fn usage(&self) -> Option<&Usage> {
        self.usage.as_ref()
    }

    /// Number of frames fed so far.
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Number of frames that carried `delta.content`.
    pub fn content_frames(&self) -> usize {
        self.content_frames
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| v.is_soft())
    }

    pub fn first_error(&self) -> Option<&Violation> {
        self.violations.iter().find(|v| !v.is_soft())
    }

    fn record(&mut self, violation: Violation) {
        debug!(violation = %violation, frame = self.frames, "stream violation recorded");
        self.violations.push(violation);
    }

    /// Fold one frame into the session.
    pub fn feed(&mut self, frame: &Frame) {
        self.frames += 1;
        let chunk = &frame.chunk;

        if let Some(terminal_frame) = self.terminal_frame {
            if chunk.is_usage_only() {
                if let Some(usage) = chunk.usage {
                    self.record_usage(usage);
                }
            } else {
                self.record(Violation::PostTerminalFrame {
                    frame: frame.index,
                    terminal_frame,
                    raw: frame.raw.clone(),
                });
            }
            return;
        }

        if chunk.choices.len() > 1 {
            self.record(Violation::ambiguity(format!(
                "frame {} carries {} choices; only index 0 is folded",
                frame.index,
                chunk.choices.len()
            )));
        }

        if let Some(usage) = chunk.usage {
            self.record_usage(usage);
        }

        let Some(choice) = chunk
            .choices
            .iter()
            .find(|c| c.index == 0)
            .or_else(|| chunk.choices.first())
        else {
            return;
        };

        self.fold_delta(frame, &choice.delta);

        if let Some(ref reason) = choice.finish_reason {
            self.terminate(frame, reason.clone());
        }
    }

    fn fold_delta(&mut self, frame: &Frame, delta: &ChunkDelta) {
        if !delta.carries_payload() {
            // Role-only preamble or keep-alive; only a wrong role matters here.
            if let Some(ref role) = delta.role {
                if *role != Role::Assistant {
                    self.record_wrong_role(frame, Some(role));
                }
            }
            return;
        }

        match self.phase {
            StreamPhase::AwaitingRole => {
                self.phase = StreamPhase::Streaming;
                if delta.role == Some(Role::Assistant) {
                    self.role_announced = true;
                } else {
                    self.record_wrong_role(frame, delta.role.as_ref());
                }
            }
            StreamPhase::Streaming => {
                if let Some(ref role) = delta.role {
                    if *role != Role::Assistant {
                        self.record_wrong_role(frame, Some(role));
                    }
                }
            }
            StreamPhase::Terminated => {}
        }

        if let Some(ref text) = delta.content {
            self.content.push_str(text);
            self.content_frames += 1;
        }

        if let Some(ref calls) = delta.tool_calls {
            for (position, call) in calls.iter().enumerate() {
                self.merge_tool_call(frame, position, call);
            }
        }
    }

    fn record_wrong_role(&mut self, frame: &Frame, found: Option<&Role>) {
        let found = match found {
            Some(role) => format!("'{}'", role),
            None => "no role".to_string(),
        };
        self.record(Violation::RoleAnnouncement {
            frame: frame.index,
            found,
            raw: frame.raw.clone(),
        });
    }

    fn merge_tool_call(&mut self, frame: &Frame, position: usize, call: &ToolCallDelta) {
        let index = match call.index {
            Some(index) => index,
            None => {
                self.record(Violation::ambiguity(format!(
                    "frame {}: tool call delta without index, folded at position {}",
                    frame.index, position
                )));
                position as u32
            }
        };

        let fragment = self
            .tool_calls
            .entry(index)
            .or_insert_with(|| ToolCallFragment {
                first_frame: frame.index,
                ..ToolCallFragment::default()
            });

        if fragment.id.is_none() {
            fragment.id = call.id.clone();
        }
        if let Some(ref function) = call.function {
            if let Some(ref name) = function.name {
                fragment.name.push_str(name);
            }
            if let Some(ref arguments) = function.arguments {
                fragment.arguments.push_str(arguments);
            }
        }
    }

    fn record_usage(&mut self, usage: Usage) {
        if let Some(violation) = usage_totals_violation(&usage) {
            self.record(violation);
        }
        let missing = usage.missing_counts();
        if !missing.is_empty() {
            self.record(Violation::ambiguity(format!(
                "usage block lacks {}",
                missing.join(", ")
            )));
        }
        self.usage = Some(usage);
    }

    fn terminate(&mut self, frame: &Frame, reason: FinishReason) {
        debug!(frame = frame.index, reason = %reason, "stream terminated");
        self.phase = StreamPhase::Terminated;
        self.terminal_frame = Some(frame.index);

        match reason {
            FinishReason::Stop => {
                if self.content.is_empty() {
                    self.record(Violation::schema(
                        "choices[0].delta.content",
                        format!(
                            "finish_reason 'stop' at frame {} but no content was streamed",
                            frame.index
                        ),
                    ));
                }
                if !self.tool_calls.is_empty() {
                    self.record(Violation::ambiguity(format!(
                        "finish_reason 'stop' at frame {} after {} streamed tool call(s)",
                        frame.index,
                        self.tool_calls.len()
                    )));
                }
            }
            FinishReason::ToolCalls => self.check_tool_calls(frame),
            FinishReason::Length => {}
            ref other => {
                self.record(Violation::ambiguity(format!(
                    "finish_reason '{}' at frame {} is outside stop|tool_calls|length",
                    other, frame.index
                )));
            }
        }

        self.terminal_reason = Some(reason);
    }

    fn check_tool_calls(&mut self, frame: &Frame) {
        if self.tool_calls.is_empty() {
            self.record(Violation::schema(
                "choices[0].delta.tool_calls",
                format!(
                    "finish_reason 'tool_calls' at frame {} but no tool call was streamed",
                    frame.index
                ),
            ));
            return;
        }

        let mut found = Vec::new();
        for (index, fragment) in &self.tool_calls {
            if !is_well_formed_name(&fragment.name) {
                found.push(Violation::schema(
                    format!("tool_calls[{}].function.name", index),
                    format!("malformed function name '{}'", fragment.name),
                ));
            }
            if let Err(e) = fragment.parsed_arguments() {
                found.push(Violation::schema(
                    format!("tool_calls[{}].function.arguments", index),
                    format!("not valid JSON ({}): {}", e, fragment.arguments),
                ));
            }
        }
        for violation in found {
            self.record(violation);
        }
    }

    /// Close the session at `[DONE]`.
    ///
    /// Records a missing finish_reason (hard) and missing requested usage
    /// (soft), then returns the first hard violation seen over the whole
    /// stream. Calling it again does not record anything twice.
    pub fn finalize(&mut self) -> Result<(), Violation> {
        if !self.finalized {
            self.finalized = true;
            if self.phase != StreamPhase::Terminated {
                self.record(Violation::MissingFinishReason {
                    phase: self.phase.to_string(),
                });
            }
            if self.include_usage && self.usage.is_none() {
                self.record(Violation::missing_usage(
                    "include_usage was requested but no frame carried usage",
                ));
            }
            for warning in self.warnings() {
                warn!(violation = %warning, "soft stream violation");
            }
        }

        match self.first_error() {
            Some(violation) => Err(violation.clone()),
            None => Ok(()),
        }
    }

    pub fn assert_role_announced(&self) -> Result<(), Violation> {
        if self.role_announced {
            return Ok(());
        }
        let role_violation = self
            .violations
            .iter()
            .find(|v| matches!(v, Violation::RoleAnnouncement { .. }));
        match role_violation {
            Some(v) => Err(v.clone()),
            None => Err(Violation::schema(
                "choices[0].delta",
                "no content-bearing frame was received",
            )),
        }
    }

    pub fn assert_terminal_reason(&self, expected: &FinishReason) -> Result<(), Violation> {
        match self.terminal_reason {
            Some(ref reason) if reason == expected => Ok(()),
            Some(ref reason) => Err(Violation::schema(
                "choices[0].finish_reason",
                format!("expected '{}', got '{}'", expected, reason),
            )),
            None => Err(Violation::MissingFinishReason {
                phase: self.phase.to_string(),
            }),
        }
    }

    pub fn assert_content_contains(&self, needle: &str) -> Result<(), Violation> {
        if self.content.contains(needle) {
            Ok(())
        } else {
            Err(Violation::schema(
                "choices[0].delta.content",
                format!(
                    "expected streamed content to contain {:?}, got {:?}",
                    needle, self.content
                ),
            ))
        }
    }

    /// Find a reassembled tool call by function name.
    pub fn assert_tool_call(&self, name: &str) -> Result<&ToolCallFragment, Violation> {
        self.tool_calls
            .values()
            .find(|f| f.name == name)
            .ok_or_else(|| {
                let seen: Vec<&str> = self.tool_calls.values().map(|f| f.name.as_str()).collect();
                Violation::schema(
                    "choices[0].delta.tool_calls",
                    format!("no tool call named '{}' (saw {:?})", name, seen),
                )
            })
    }

    /// Absent usage is the soft `MissingUsage`; present usage must have
    /// positive, consistent counts.
    pub fn assert_usage_positive(&self) -> Result<&Usage, Violation> {
        let usage = self
            .usage
            .as_ref()
            .ok_or_else(|| Violation::missing_usage("no frame carried usage"))?;
        check_usage_positive(usage)?;
        Ok(usage)
    }
}

/// All three counts present, positive and consistent.
pub fn check_usage_positive(usage: &Usage) -> Result<(), Violation> {
    for (name, value) in usage.counts() {
        match value {
            None => {
                return Err(Violation::schema(
                    format!("usage.{}", name),
                    "token count is missing",
                ))
            }
            Some(0) => {
                return Err(Violation::schema(
                    format!("usage.{}", name),
                    "expected a positive token count",
                ))
            }
            Some(_) => {}
        }
    }
    match usage_totals_violation(usage) {
        Some(violation) => Err(violation),
        None => Ok(()),
    }
}

/// `total != prompt + completion` when all three counts are present.
pub(crate) fn usage_totals_violation(usage: &Usage) -> Option<Violation> {
    if usage.is_consistent() {
        return None;
    }
    let show = |v: Option<u64>| v.map_or_else(|| "null".to_string(), |n| n.to_string());
    Some(Violation::schema(
        "usage.total_tokens",
        format!(
            "{} != prompt_tokens {} + completion_tokens {}",
            show(usage.total_tokens),
            show(usage.prompt_tokens),
            show(usage.completion_tokens)
        ),
    ))
}

/// OpenAI function names: 1-64 of `[A-Za-z0-9_-]`.
pub(crate) fn is_well_formed_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_FUNCTION_NAME_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Drive a session over a live line stream.
///
/// Each read of the next frame is bounded by `read_timeout`. On timeout the
/// stream (and its connection) is dropped and the partial session discarded.
/// On success the session has seen every frame up to `[DONE]` and still needs
/// [`StreamSession::finalize`].
pub async fn consume_stream<S>(
    lines: S,
    mut session: StreamSession,
    read_timeout: Duration,
    log_frames: bool,
) -> Result<StreamSession, ConformanceError>
where
    S: Stream<Item = Result<String, TransportError>> + Send,
{
    let frames = decode_stream(lines);
    futures_util::pin_mut!(frames);

    loop {
        let next = match tokio::time::timeout(read_timeout, frames.next()).await {
            Ok(next) => next,
            Err(_) => {
                warn!(
                    frames = session.frames(),
                    timeout_ms = read_timeout.as_millis() as u64,
                    "stream read timed out"
                );
                return Err(ConformanceError::StreamTimeout {
                    after_ms: read_timeout.as_millis() as u64,
                    frames: session.frames(),
                });
            }
        };

        match next {
            Some(Ok(frame)) => {
                if log_frames {
                    debug!(frame = frame.index, raw = %frame.raw, "stream frame");
                }
                session.feed(&frame);
            }
            Some(Err(e)) => {
                // A violation already seen outranks the error that ended the read
                if let Some(violation) = session.first_error() {
                    warn!(error = %e, violation = %violation, "stream ended after a violation");
                    return Err(violation.clone().into());
                }
                return Err(e.into());
            }
            None => return Ok(session),
        }
    }
}

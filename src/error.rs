//! Top-level error for a scenario run.

use crate::client::TransportError;
use crate::config::ConfigError;
use crate::sse::SseError;
use crate::validate::Violation;
use thiserror::Error;

/// Everything that can stop a scenario.
#[derive(Error, Debug)]
pub enum ConformanceError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Stream(#[from] SseError),

    #[error(transparent)]
    Violation(#[from] Violation),

    /// No stream line arrived within the read timeout. Partial session state
    /// is discarded.
    #[error("Stream read timed out after {after_ms}ms ({frames} frames received)")]
    StreamTimeout { after_ms: u64, frames: usize },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ConformanceError {
    /// Short label for reports and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ConformanceError::Transport(_) => "transport",
            ConformanceError::Stream(SseError::Decode { .. }) => "decode",
            ConformanceError::Stream(SseError::ErrorFrame { .. }) => "error_frame",
            ConformanceError::Stream(SseError::IncompleteStream { .. }) => "incomplete_stream",
            ConformanceError::Stream(SseError::Transport(_)) => "transport",
            ConformanceError::Violation(v) => match v {
                Violation::Schema { .. } => "schema",
                Violation::RoleAnnouncement { .. } => "role_announcement",
                Violation::PostTerminalFrame { .. } => "post_terminal_frame",
                Violation::MissingFinishReason { .. } => "missing_finish_reason",
                Violation::MissingUsage { .. } => "missing_usage",
                Violation::ContractAmbiguity { .. } => "contract_ambiguity",
                Violation::HeaderBudget { .. } => "header_budget",
                Violation::UnexpectedSuccess { .. } => "unexpected_success",
            },
            ConformanceError::StreamTimeout { .. } => "timeout",
            ConformanceError::Config(_) => "config",
        }
    }
}

//! Protocol violations detected by the validators.

use serde::Serialize;
use thiserror::Error;

/// Whether a violation fails the scenario or is only reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

/// A breach of the OpenAI wire contract.
///
/// Frame-level variants quote the literal payload that caused them.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// A required field is missing or holds the wrong value.
    #[error("Schema violation at '{field}': {detail}")]
    Schema { field: String, detail: String },

    /// The first content-bearing delta did not announce `role: assistant`,
    /// or a later delta carried another role.
    #[error("Role announcement violation at frame {frame}: expected 'assistant', found {found} ({raw})")]
    RoleAnnouncement {
        frame: usize,
        found: String,
        raw: String,
    },

    /// A frame other than trailing usage arrived after the finish_reason.
    #[error("Frame {frame} arrived after the terminal frame {terminal_frame}: {raw}")]
    PostTerminalFrame {
        frame: usize,
        terminal_frame: usize,
        raw: String,
    },

    /// `[DONE]` arrived before any finish_reason.
    #[error("Stream ended in state {phase} without a finish_reason")]
    MissingFinishReason { phase: String },

    /// Usage metrics were requested but never delivered.
    #[error("Usage metrics missing: {context}")]
    MissingUsage { context: String },

    /// A plausible shape the OpenAI contract does not pin down.
    #[error("Contract ambiguity: {detail}")]
    ContractAmbiguity { detail: String },

    /// Serialized response headers reached the proxy ceiling.
    #[error("Response headers take {bytes} bytes, limit is {limit}")]
    HeaderBudget { bytes: usize, limit: usize },

    /// A request that must be rejected was accepted.
    #[error("Expected a rejection, bridge answered HTTP {status}")]
    UnexpectedSuccess { status: u16 },
}

impl Violation {
    pub fn schema(field: impl Into<String>, detail: impl Into<String>) -> Self {
        Violation::Schema {
            field: field.into(),
            detail: detail.into(),
        }
    }

    pub fn ambiguity(detail: impl Into<String>) -> Self {
        Violation::ContractAmbiguity {
            detail: detail.into(),
        }
    }

    pub fn missing_usage(context: impl Into<String>) -> Self {
        Violation::MissingUsage {
            context: context.into(),
        }
    }

    /// Missing usage and ambiguities are reported but never fail a scenario.
    pub fn severity(&self) -> Severity {
        match self {
            Violation::MissingUsage { .. } | Violation::ContractAmbiguity { .. } => {
                Severity::Warning
            }
            _ => Severity::Error,
        }
    }

    pub fn is_soft(&self) -> bool {
        self.severity() == Severity::Warning
    }
}

/// A validated value plus the soft violations found on the way.
#[derive(Debug, Clone)]
pub struct Validated<T> {
    pub value: T,
    pub warnings: Vec<Violation>,
}

impl<T> Validated<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    pub(crate) fn warn(&mut self, violation: Violation) {
        tracing::warn!(violation = %violation, "soft contract violation");
        self.warnings.push(violation);
    }
}

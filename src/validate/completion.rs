//! Non-streaming chat completion validator.

use crate::api::{ChatCompletionResponse, FinishReason};
use crate::validate::stream::{check_usage_positive, usage_totals_violation};
use crate::validate::{Validated, Violation};
use serde_json::Value;

const CHAT_COMPLETION_OBJECT: &str = "chat.completion";

/// What a scenario expects from a single completion.
#[derive(Debug, Clone)]
pub struct CompletionExpectation {
    /// `None` accepts any non-null reason
    pub finish_reason: Option<FinishReason>,
    /// Function name the first tool call must carry
    pub tool_call: Option<String>,
    pub content_contains: Option<String>,
    /// Content must parse as JSON (`response_format: json_object`)
    pub json_content: bool,
    /// Report missing usage (soft) and require present usage to be complete
    /// and positive
    pub require_usage: bool,
}

impl CompletionExpectation {
    /// A plain text answer ending in `stop`.
    pub fn text() -> Self {
        Self {
            finish_reason: Some(FinishReason::Stop),
            tool_call: None,
            content_contains: None,
            json_content: false,
            require_usage: false,
        }
    }

    /// A tool call to `name` ending in `tool_calls`.
    pub fn tool_call(name: impl Into<String>) -> Self {
        Self {
            finish_reason: Some(FinishReason::ToolCalls),
            tool_call: Some(name.into()),
            content_contains: None,
            json_content: false,
            require_usage: false,
        }
    }

    /// Any non-null content; the reason may be `length` under a token cap.
    pub fn any_text() -> Self {
        Self {
            finish_reason: None,
            ..Self::text()
        }
    }

    pub fn containing(mut self, needle: impl Into<String>) -> Self {
        self.content_contains = Some(needle.into());
        self
    }

    pub fn json_object(mut self) -> Self {
        self.json_content = true;
        self
    }

    pub fn with_usage(mut self) -> Self {
        self.require_usage = true;
        self
    }
}

/// Validate a complete `chat.completion` body against an expectation.
///
/// Returns the decoded response with any soft violations, or the first hard
/// violation.
pub fn validate_completion(
    body: &Value,
    expect: &CompletionExpectation,
) -> Result<Validated<ChatCompletionResponse>, Violation> {
    let response: ChatCompletionResponse = serde_json::from_value(body.clone())
        .map_err(|e| Violation::schema("$", format!("not a chat completion: {}", e)))?;
    let mut validated = Validated::new(response);

    match validated.value.object.as_deref() {
        Some(CHAT_COMPLETION_OBJECT) => {}
        Some(other) => {
            return Err(Violation::schema(
                "object",
                format!("expected '{}', got '{}'", CHAT_COMPLETION_OBJECT, other),
            ))
        }
        None => validated.warn(Violation::ambiguity("response has no 'object' field")),
    }

    let choice_count = validated.value.choices.len();
    if choice_count == 0 {
        return Err(Violation::schema("choices", "expected at least one choice"));
    }
    if choice_count > 1 {
        validated.warn(Violation::ambiguity(format!(
            "{} choices returned for n=1",
            choice_count
        )));
    }

    let choice = &validated.value.choices[0];
    let message = &choice.message;

    match expect.tool_call {
        Some(ref name) => {
            let calls = message
                .tool_calls
                .as_ref()
                .filter(|c| !c.is_empty())
                .ok_or_else(|| {
                    Violation::schema("choices[0].message.tool_calls", "expected a tool call")
                })?;
            let call = &calls[0];
            if call.function.name != *name {
                return Err(Violation::schema(
                    "choices[0].message.tool_calls[0].function.name",
                    format!("expected '{}', got '{}'", name, call.function.name),
                ));
            }
            if let Err(e) = serde_json::from_str::<Value>(&call.function.arguments) {
                return Err(Violation::schema(
                    "choices[0].message.tool_calls[0].function.arguments",
                    format!("not valid JSON ({}): {}", e, call.function.arguments),
                ));
            }
        }
        None => match message.text() {
            None => {
                return Err(Violation::schema(
                    "choices[0].message.content",
                    "expected non-null content",
                ))
            }
            Some(text) if text.is_empty() => {
                return Err(Violation::schema(
                    "choices[0].message.content",
                    "expected non-empty content",
                ))
            }
            Some(_) => {}
        },
    }

    if expect.json_content {
        let text = message.text().unwrap_or_default();
        if let Err(e) = serde_json::from_str::<Value>(&text) {
            return Err(Violation::schema(
                "choices[0].message.content",
                format!("expected JSON content ({}): {:?}", e, text),
            ));
        }
    }

    if let Some(ref needle) = expect.content_contains {
        let text = message.text().unwrap_or_default();
        if !text.contains(needle.as_str()) {
            return Err(Violation::schema(
                "choices[0].message.content",
                format!("expected content to contain {:?}, got {:?}", needle, text),
            ));
        }
    }

    match (&choice.finish_reason, &expect.finish_reason) {
        (Some(_), None) => {}
        (Some(reason), Some(expected)) if reason == expected => {}
        (Some(reason), Some(expected)) => {
            return Err(Violation::schema(
                "choices[0].finish_reason",
                format!("expected '{}', got '{}'", expected, reason),
            ))
        }
        (None, _) => {
            return Err(Violation::schema(
                "choices[0].finish_reason",
                "expected a finish_reason, got null",
            ))
        }
    }

    let usage = validated.value.usage;
    match usage {
        Some(usage) => {
            if let Some(violation) = usage_totals_violation(&usage) {
                return Err(violation);
            }
            if expect.require_usage {
                check_usage_positive(&usage)?;
            } else {
                let missing = usage.missing_counts();
                if !missing.is_empty() {
                    validated.warn(Violation::ambiguity(format!(
                        "usage block lacks {}",
                        missing.join(", ")
                    )));
                }
            }
        }
        None if expect.require_usage => {
            validated.warn(Violation::missing_usage("completion has no usage block"))
        }
        None => {}
    }

    Ok(validated)
}

//! Scenario library.
//!
//! Each [`Scenario`] builds one or more requests from [`payloads`], sends them
//! through a [`BridgeClient`] and hands the responses to the validators. A
//! scenario either passes (possibly with soft warnings) or stops at the first
//! hard failure.

pub mod payloads;
pub mod runner;

pub use runner::{run_scenario, run_suite, selected_scenarios, ScenarioReport, SuiteReport, Verdict};

use crate::api::{
    ChatCompletionRequest, ChatCompletionResponse, FinishReason, CHAT_COMPLETIONS_PATH, FILES_PATH, MODELS_PATH,
    RESPONSES_PATH,
};
use crate::client::{BridgeClient, BridgeResponse, TransportError};
use crate::config::HarnessConfig;
use crate::error::ConformanceError;
use crate::validate::{
    assert_event_stream, check_header_budget, classify_rejection, consume_stream,
    validate_completion, validate_error_envelope, validate_file_object, validate_model_list,
    validate_responses_object, CompletionExpectation, StreamSession, Violation,
};
use reqwest::Method;
use serde_json::Value;
use std::fmt;
use tracing::{debug, info};

/// Named conformance scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scenario {
    ListModels,
    ChatSimple,
    ChatSystemMessage,
    ChatMultipartContent,
    ChatMultiTurn,
    ChatJsonMode,
    ChatUsage,
    ChatToolCall,
    StreamText,
    StreamToolCall,
    StreamUsage,
    FileAttachment,
    VisionDataUrl,
    VisionRemoteUrl,
    ResponsesEndpoint,
    HeaderBudget,
    InvalidModelRejected,
    ErrorEnvelope,
}

impl Scenario {
    /// Full catalogue, in run order.
    pub const ALL: [Scenario; 18] = [
        Scenario::ListModels,
        Scenario::ChatSimple,
        Scenario::ChatSystemMessage,
        Scenario::ChatMultipartContent,
        Scenario::ChatMultiTurn,
        Scenario::ChatJsonMode,
        Scenario::ChatUsage,
        Scenario::ChatToolCall,
        Scenario::StreamText,
        Scenario::StreamToolCall,
        Scenario::StreamUsage,
        Scenario::FileAttachment,
        Scenario::VisionDataUrl,
        Scenario::VisionRemoteUrl,
        Scenario::ResponsesEndpoint,
        Scenario::HeaderBudget,
        Scenario::InvalidModelRejected,
        Scenario::ErrorEnvelope,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Scenario::ListModels => "list-models",
            Scenario::ChatSimple => "chat-simple",
            Scenario::ChatSystemMessage => "chat-system-message",
            Scenario::ChatMultipartContent => "chat-multipart-content",
            Scenario::ChatMultiTurn => "chat-multi-turn",
            Scenario::ChatJsonMode => "chat-json-mode",
            Scenario::ChatUsage => "chat-usage",
            Scenario::ChatToolCall => "chat-tool-call",
            Scenario::StreamText => "stream-text",
            Scenario::StreamToolCall => "stream-tool-call",
            Scenario::StreamUsage => "stream-usage",
            Scenario::FileAttachment => "file-attachment",
            Scenario::VisionDataUrl => "vision-data-url",
            Scenario::VisionRemoteUrl => "vision-remote-url",
            Scenario::ResponsesEndpoint => "responses-endpoint",
            Scenario::HeaderBudget => "header-budget",
            Scenario::InvalidModelRejected => "invalid-model-rejected",
            Scenario::ErrorEnvelope => "error-envelope",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Scenario::ListModels => "GET /models lists the configured model",
            Scenario::ChatSimple => "Non-streaming reply repeats the verification phrase",
            Scenario::ChatSystemMessage => "System plus user message yields content",
            Scenario::ChatMultipartContent => "Array of text parts is accepted",
            Scenario::ChatMultiTurn => "Second turn recalls a name given in the first",
            Scenario::ChatJsonMode => "json_object response format yields parseable JSON",
            Scenario::ChatUsage => "Non-streaming reply carries positive usage",
            Scenario::ChatToolCall => "Non-streaming tool call with finish_reason tool_calls",
            Scenario::StreamText => "Streamed text: role, ordering, single stop",
            Scenario::StreamToolCall => "Streamed tool call fragments reassemble to JSON",
            Scenario::StreamUsage => "include_usage delivers positive token counts",
            Scenario::FileAttachment => "Uploaded file id works inline and as image_url",
            Scenario::VisionDataUrl => "Base64 data URL image part is accepted",
            Scenario::VisionRemoteUrl => "Remote https image URL part is accepted",
            Scenario::ResponsesEndpoint => "POST /responses returns the response schema",
            Scenario::HeaderBudget => "Response headers stay under the proxy limit",
            Scenario::InvalidModelRejected => "Unknown model is rejected",
            Scenario::ErrorEnvelope => "Malformed request gets an OpenAI error envelope",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.name() == name)
    }

    /// Run against the bridge.
    ///
    /// Soft violations are pushed onto `warnings` as they are found, so a
    /// scenario that later fails still hands back what it collected.
    pub async fn run(
        &self,
        client: &BridgeClient,
        config: &HarnessConfig,
        warnings: &mut Vec<Violation>,
    ) -> Result<(), ConformanceError> {
        let model = config.bridge.model.as_str();
        match self {
            Scenario::ListModels => {
                let response = client.get(MODELS_PATH).await?;
                let body = expect_ok(&response)?;
                let validated = validate_model_list(&body, Some(model))?;
                debug!(models = validated.value.data.len(), "models listed");
                warnings.extend(validated.warnings);
            }
            Scenario::ChatSimple => {
                let expect =
                    CompletionExpectation::text().containing(payloads::VERIFICATION_PHRASE);
                chat(client, &payloads::simple_chat(model), &expect, warnings).await?;
            }
            Scenario::ChatSystemMessage => {
                chat(
                    client,
                    &payloads::system_message_chat(model),
                    &CompletionExpectation::text(),
                    warnings,
                )
                .await?;
            }
            Scenario::ChatMultipartContent => {
                chat(
                    client,
                    &payloads::multipart_chat(model),
                    &CompletionExpectation::text(),
                    warnings,
                )
                .await?;
            }
            Scenario::ChatMultiTurn => {
                let first = chat(
                    client,
                    &payloads::introduction_chat(model),
                    &CompletionExpectation::text(),
                    warnings,
                )
                .await?;
                let reply = first
                    .choices
                    .into_iter()
                    .next()
                    .map(|choice| choice.message)
                    .ok_or_else(|| Violation::schema("choices", "expected at least one choice"))?;
                let expect = CompletionExpectation::text().containing(payloads::REMEMBERED_NAME);
                chat(client, &payloads::recall_chat(model, reply), &expect, warnings).await?;
            }
            Scenario::ChatJsonMode => {
                chat(
                    client,
                    &payloads::json_mode_chat(model),
                    &CompletionExpectation::text().json_object(),
                    warnings,
                )
                .await?;
            }
            Scenario::ChatUsage => {
                let response = chat(
                    client,
                    &payloads::usage_chat(model),
                    &CompletionExpectation::text().with_usage(),
                    warnings,
                )
                .await?;
                if let Some(usage) = response.usage {
                    debug!(total_tokens = ?usage.total_tokens, "usage reported");
                }
            }
            Scenario::ChatToolCall => {
                chat(
                    client,
                    &payloads::tool_call_chat(model),
                    &CompletionExpectation::tool_call(payloads::WEATHER_TOOL),
                    warnings,
                )
                .await?;
            }
            Scenario::StreamText => {
                let session =
                    stream(client, config, &payloads::counting_stream(model), warnings).await?;
                session.assert_role_announced()?;
                session.assert_terminal_reason(&FinishReason::Stop)?;
                if session.frames() < 2 {
                    return Err(Violation::schema(
                        "stream",
                        format!("expected multiple frames, got {}", session.frames()),
                    )
                    .into());
                }
                session.assert_content_contains("1")?;
                session.assert_content_contains("5")?;
            }
            Scenario::StreamToolCall => {
                let req = payloads::streaming(payloads::tool_call_chat(model));
                let session = stream(client, config, &req, warnings).await?;
                session.assert_terminal_reason(&FinishReason::ToolCalls)?;
                let call = session.assert_tool_call(payloads::WEATHER_TOOL)?;
                debug!(arguments = %call.arguments, "tool call reassembled");
            }
            Scenario::StreamUsage => {
                let session =
                    stream(client, config, &payloads::usage_stream(model), warnings).await?;
                session.assert_role_announced()?;
                match session.assert_usage_positive() {
                    Ok(usage) => debug!(total_tokens = ?usage.total_tokens, "usage reported"),
                    // Already recorded by finalize
                    Err(v) if v.is_soft() => {}
                    Err(v) => return Err(v.into()),
                }
            }
            Scenario::FileAttachment => {
                let response = client
                    .upload_file(
                        FILES_PATH,
                        payloads::UPLOAD_FILENAME,
                        payloads::UPLOAD_CONTENTS.to_vec(),
                        payloads::UPLOAD_PURPOSE,
                    )
                    .await?;
                let file = validate_file_object(&expect_ok(&response)?)?;
                info!(file_id = %file, "file uploaded");

                let expect = CompletionExpectation::any_text();
                let inline = payloads::file_text_chat(model, file.as_str());
                chat(client, &inline, &expect, warnings).await?;
                let part = payloads::file_part_chat(model, file.as_str());
                chat(client, &part, &expect, warnings).await?;
            }
            Scenario::VisionDataUrl => {
                chat(
                    client,
                    &payloads::vision_chat(model),
                    &CompletionExpectation::any_text(),
                    warnings,
                )
                .await?;
            }
            Scenario::VisionRemoteUrl => {
                chat(
                    client,
                    &payloads::vision_url_chat(model),
                    &CompletionExpectation::any_text(),
                    warnings,
                )
                .await?;
            }
            Scenario::ResponsesEndpoint => {
                let response = client
                    .post_json(RESPONSES_PATH, &payloads::responses_request(model))
                    .await?;
                let validated = validate_responses_object(&expect_ok(&response)?)?;
                warnings.extend(validated.warnings);
            }
            Scenario::HeaderBudget => {
                let limit = config.suite.header_limit_bytes;
                let response = client.get(MODELS_PATH).await?;
                let bytes = check_header_budget(&response.headers, limit)?;
                let response = client
                    .post_json(CHAT_COMPLETIONS_PATH, &payloads::simple_chat(model))
                    .await?;
                let chat_bytes = check_header_budget(&response.headers, limit)?;
                debug!(models = bytes, chat = chat_bytes, limit, "header sizes");
            }
            Scenario::InvalidModelRejected => {
                let response = client
                    .post_json(CHAT_COMPLETIONS_PATH, &payloads::invalid_model_chat())
                    .await?;
                let (status, message) =
                    classify_rejection(response.status.as_u16(), &response.body).into_result()?;
                info!(status, message = %message, "invalid model rejected");
            }
            Scenario::ErrorEnvelope => {
                let body = payloads::malformed_chat(model);
                let response = client
                    .send(Method::POST, CHAT_COMPLETIONS_PATH, Some(&body), &[])
                    .await?;
                let status = response.status.as_u16();
                if response.is_success() {
                    return Err(Violation::UnexpectedSuccess { status }.into());
                }
                let json = response.json().map_err(|e| {
                    Violation::schema("error", format!("error body is not JSON: {}", e))
                })?;
                let error = validate_error_envelope(status, &json)?;
                debug!(status, message = %error.error.message, "error envelope");
            }
        }
        Ok(())
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn status_violation(status: u16, body: &str) -> Violation {
    Violation::schema("status", format!("expected HTTP 200, got {}: {}", status, body))
}

/// Require HTTP 2xx and a JSON body.
fn expect_ok(response: &BridgeResponse) -> Result<Value, Violation> {
    if !response.is_success() {
        return Err(status_violation(response.status.as_u16(), &response.text()));
    }
    response
        .json()
        .map_err(|e| Violation::schema("$", format!("body is not JSON: {}", e)))
}

async fn chat(
    client: &BridgeClient,
    request: &ChatCompletionRequest,
    expect: &CompletionExpectation,
    warnings: &mut Vec<Violation>,
) -> Result<ChatCompletionResponse, ConformanceError> {
    let response = client.post_json(CHAT_COMPLETIONS_PATH, request).await?;
    let validated = validate_completion(&expect_ok(&response)?, expect)?;
    warnings.extend(validated.warnings);
    Ok(validated.value)
}

/// Open, consume and finalize one streamed completion.
async fn stream(
    client: &BridgeClient,
    config: &HarnessConfig,
    request: &ChatCompletionRequest,
    warnings: &mut Vec<Violation>,
) -> Result<StreamSession, ConformanceError> {
    let opened = match client.open_stream(CHAT_COMPLETIONS_PATH, request).await {
        Ok(opened) => opened,
        // Non-2xx on open is the bridge's answer
        Err(TransportError::UnexpectedStatus { status, body }) => {
            return Err(status_violation(status, &body).into())
        }
        Err(e) => return Err(e.into()),
    };
    assert_event_stream(&opened.headers)?;

    let mut session = consume_stream(
        opened.lines,
        StreamSession::new(request.includes_usage()),
        config.bridge.stream_read_timeout(),
        config.logging.log_frames,
    )
    .await?;
    let finalized = session.finalize();
    warnings.extend(session.warnings().cloned());
    finalized?;
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_scenario_names_round_trip() {
        for scenario in Scenario::ALL {
            assert_eq!(Scenario::from_name(scenario.name()), Some(scenario));
        }
        assert_eq!(Scenario::from_name("teleport"), None);
    }

    #[test]
    fn test_scenario_names_unique() {
        let names: HashSet<_> = Scenario::ALL.iter().map(|s| s.name()).collect();
        assert_eq!(names.len(), Scenario::ALL.len());
    }

    #[test]
    fn test_expect_ok_rejects_error_status() {
        let response = BridgeResponse {
            status: reqwest::StatusCode::BAD_GATEWAY,
            headers: Default::default(),
            body: b"upstream down".to_vec(),
        };
        let err = expect_ok(&response).unwrap_err();
        assert!(matches!(err, Violation::Schema { ref field, .. } if field == "status"));
        assert!(err.to_string().contains("502"));
        assert!(err.to_string().contains("upstream down"));
    }
}

//! Shared test utilities for conformance integration tests.
//!
//! Provides SSE body builders and a wiremock bridge that answers every
//! scenario the way a conformant bridge would.

#![allow(dead_code)]

use conformance::config::HarnessConfig;
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_MODEL: &str = "gemini-2.5-flash-lite";

// =============================================================================
// Frame Builders
// =============================================================================

/// Serialize frames as an SSE body terminated by `[DONE]`.
pub fn sse_body(frames: &[Value]) -> String {
    let mut body = sse_body_without_done(frames);
    body.push_str("data: [DONE]\n\n");
    body
}

/// Serialize frames as an SSE body that never sends `[DONE]`.
pub fn sse_body_without_done(frames: &[Value]) -> String {
    let mut body = String::new();
    for frame in frames {
        body.push_str(&format!("data: {}\n\n", frame));
    }
    body
}

pub fn chunk(delta: Value, finish_reason: Option<&str>) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion.chunk",
        "created": 1699999999,
        "model": TEST_MODEL,
        "choices": [{"index": 0, "delta": delta, "finish_reason": finish_reason}]
    })
}

/// Text deltas: role on the first, then a bare `stop` frame.
pub fn text_frames(parts: &[&str]) -> Vec<Value> {
    let mut frames: Vec<Value> = parts
        .iter()
        .enumerate()
        .map(|(i, text)| {
            if i == 0 {
                chunk(json!({"role": "assistant", "content": text}), None)
            } else {
                chunk(json!({"content": text}), None)
            }
        })
        .collect();
    frames.push(chunk(json!({}), Some("stop")));
    frames
}

/// A tool call split into argument fragments, ending in `tool_calls`.
pub fn tool_call_frames(name: &str, fragments: &[&str]) -> Vec<Value> {
    let mut frames = vec![chunk(
        json!({
            "role": "assistant",
            "content": null,
            "tool_calls": [{
                "index": 0,
                "id": "call_abc",
                "type": "function",
                "function": {"name": name, "arguments": ""}
            }]
        }),
        None,
    )];
    for fragment in fragments {
        frames.push(chunk(
            json!({"tool_calls": [{"index": 0, "function": {"arguments": fragment}}]}),
            None,
        ));
    }
    frames.push(chunk(json!({}), Some("tool_calls")));
    frames
}

pub fn usage_frame(prompt: u64, completion: u64) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion.chunk",
        "choices": [],
        "usage": {
            "prompt_tokens": prompt,
            "completion_tokens": completion,
            "total_tokens": prompt + completion
        }
    })
}

// =============================================================================
// Body Builders
// =============================================================================

pub fn completion_body(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1699999999,
        "model": TEST_MODEL,
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 8, "completion_tokens": 3, "total_tokens": 11}
    })
}

/// Completion whose usage block is replaced wholesale.
pub fn completion_body_with_usage(content: &str, usage: Value) -> Value {
    let mut body = completion_body(content);
    body["usage"] = usage;
    body
}

pub fn tool_completion_body(name: &str, arguments: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "model": TEST_MODEL,
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_abc",
                    "type": "function",
                    "function": {"name": name, "arguments": arguments}
                }]
            },
            "finish_reason": "tool_calls"
        }]
    })
}

pub fn error_body(message: &str) -> Value {
    json!({"error": {"message": message, "type": "invalid_request_error", "code": null}})
}

pub fn models_body(ids: &[&str]) -> Value {
    let data: Vec<Value> = ids
        .iter()
        .map(|id| json!({"id": id, "object": "model", "owned_by": "bridge"}))
        .collect();
    json!({"object": "list", "data": data})
}

pub fn responses_body(text: &str) -> Value {
    json!({
        "id": "resp_test",
        "object": "response",
        "status": "completed",
        "output": [{
            "type": "message",
            "role": "assistant",
            "content": [{"type": "output_text", "text": text}]
        }]
    })
}

pub fn sse_response(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/event-stream")
}

// =============================================================================
// Harness Config
// =============================================================================

/// Config pointing at a mock server with short timeouts.
pub fn config_for(server: &MockServer) -> HarnessConfig {
    let mut config = HarnessConfig::default();
    config.bridge.base_url = format!("{}/v1", server.uri());
    config.bridge.model = TEST_MODEL.to_string();
    config.bridge.request_timeout_secs = 5;
    config.bridge.stream_read_timeout_secs = 5;
    config
}

pub fn config_with_scenarios(server: &MockServer, scenarios: &[&str]) -> HarnessConfig {
    let mut config = config_for(server);
    config.suite.scenarios = scenarios.iter().map(|s| s.to_string()).collect();
    config
}

// =============================================================================
// Mock Bridges
// =============================================================================

/// Mount routes answering every scenario like a conformant bridge.
///
/// More specific chat routes carry a higher priority (lower number) so tests
/// can mount an override at priority 0 to break one behavior.
pub async fn mount_conformant_bridge(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(models_body(&[TEST_MODEL])))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/files"))
        .and(body_string_contains("user_data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "file-abc123",
            "object": "file",
            "filename": "test_data.txt",
            "bytes": 18,
            "purpose": "user_data"
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(responses_body("Hello!")))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"model": "invalid-model-name-12345"})))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(error_body("Model invalid-model-name-12345 not found")),
        )
        .with_priority(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"messages": "not-an-array"})))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(error_body("messages must be an array")),
        )
        .with_priority(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"stream": true})))
        .and(body_string_contains("get_weather"))
        .respond_with(sse_response(sse_body(&tool_call_frames(
            "get_weather",
            &["{\"loc\":", " \"Tokyo\"}"],
        ))))
        .with_priority(2)
        .mount(server)
        .await;

    let mut usage_frames = text_frames(&["1", ", 2", ", 3"]);
    usage_frames.push(usage_frame(9, 5));
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"stream_options": {"include_usage": true}})))
        .respond_with(sse_response(sse_body(&usage_frames)))
        .with_priority(2)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"stream": true})))
        .respond_with(sse_response(sse_body(&text_frames(&[
            "1\n", "2\n", "3\n", "4\n", "5",
        ]))))
        .with_priority(3)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("get_weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tool_completion_body(
            "get_weather",
            "{\"loc\": \"Tokyo\"}",
        )))
        .with_priority(3)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("What is my name"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Antigravity")))
        .with_priority(3)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"response_format": {"type": "json_object"}})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(completion_body("{\"mood\": \"curious\"}")),
        )
        .with_priority(3)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Bridge verified")))
        .mount(server)
        .await;
}

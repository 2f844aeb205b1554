//! Contract checks for the non-chat endpoints.

use crate::api::{ApiError, FileObject, ModelList, ResponsesObject};
use crate::validate::{Validated, Violation};
use serde_json::Value;
use std::fmt;

const FILE_ID_PREFIX: &str = "file-";

/// Opaque attachment id returned by `POST /files`.
///
/// Only constructed from a validated upload; used once to embed the
/// attachment in a later chat request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef(String);

impl FileRef {
    /// Parse `file-<nonempty>`.
    pub fn parse(id: &str) -> Option<Self> {
        match id.strip_prefix(FILE_ID_PREFIX) {
            Some(rest) if !rest.is_empty() => Some(FileRef(id.to_string())),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `GET /models`: non-empty `data`, every entry with a non-empty `id`.
///
/// When `expected_model` is given it must be listed.
pub fn validate_model_list(
    body: &Value,
    expected_model: Option<&str>,
) -> Result<Validated<ModelList>, Violation> {
    let list: ModelList = serde_json::from_value(body.clone())
        .map_err(|e| Violation::schema("data", format!("not a model list: {}", e)))?;
    let mut validated = Validated::new(list);

    if validated.value.object.as_deref() != Some("list") {
        validated.warn(Violation::ambiguity(format!(
            "model list 'object' is {:?}, expected \"list\"",
            validated.value.object
        )));
    }

    if validated.value.data.is_empty() {
        return Err(Violation::schema("data", "expected at least one model"));
    }

    for (i, model) in validated.value.data.iter().enumerate() {
        match model.id.as_deref() {
            Some(id) if !id.is_empty() => {}
            _ => {
                return Err(Violation::schema(
                    format!("data[{}].id", i),
                    "expected a non-empty model id",
                ))
            }
        }
    }

    if let Some(expected) = expected_model {
        let listed = validated
            .value
            .data
            .iter()
            .any(|m| m.id.as_deref() == Some(expected));
        if !listed {
            return Err(Violation::schema(
                "data",
                format!("configured model '{}' is not listed", expected),
            ));
        }
    }

    Ok(validated)
}

/// `POST /files`: the body must carry an id shaped `file-<nonempty>`.
pub fn validate_file_object(body: &Value) -> Result<FileRef, Violation> {
    let file: FileObject = serde_json::from_value(body.clone())
        .map_err(|e| Violation::schema("id", format!("not a file object: {}", e)))?;
    FileRef::parse(&file.id).ok_or_else(|| {
        Violation::schema(
            "id",
            format!("expected 'file-<id>', got '{}'", file.id),
        )
    })
}

/// `POST /responses`: `object == "response"` and a first output message
/// whose first content part is `output_text` with text.
pub fn validate_responses_object(body: &Value) -> Result<Validated<ResponsesObject>, Violation> {
    let response: ResponsesObject = serde_json::from_value(body.clone())
        .map_err(|e| Violation::schema("$", format!("not a response object: {}", e)))?;

    if response.object != "response" {
        return Err(Violation::schema(
            "object",
            format!("expected 'response', got '{}'", response.object),
        ));
    }

    let item = response
        .output
        .first()
        .ok_or_else(|| Violation::schema("output", "expected at least one output item"))?;
    if item.kind != "message" {
        return Err(Violation::schema(
            "output[0].type",
            format!("expected 'message', got '{}'", item.kind),
        ));
    }

    let part = item
        .content
        .first()
        .ok_or_else(|| Violation::schema("output[0].content", "expected at least one part"))?;
    if part.kind != "output_text" {
        return Err(Violation::schema(
            "output[0].content[0].type",
            format!("expected 'output_text', got '{}'", part.kind),
        ));
    }
    if part.text.is_none() {
        return Err(Violation::schema(
            "output[0].content[0].text",
            "expected a text field",
        ));
    }

    let mut validated = Validated::new(response);
    match validated.value.status.clone() {
        Some(status) if status == "completed" => {}
        status => validated.warn(Violation::ambiguity(format!(
            "response status is {:?}, expected \"completed\"",
            status
        ))),
    }
    Ok(validated)
}

/// A rejected request must answer 4xx with `{error: {message}}`.
pub fn validate_error_envelope(status: u16, body: &Value) -> Result<ApiError, Violation> {
    if !(400..500).contains(&status) {
        return Err(Violation::schema(
            "status",
            format!("expected a 4xx rejection, got HTTP {}", status),
        ));
    }
    let error: ApiError = serde_json::from_value(body.clone())
        .map_err(|e| Violation::schema("error", format!("not an OpenAI error envelope: {}", e)))?;
    if error.error.message.is_empty() {
        return Err(Violation::schema("error.message", "expected a message"));
    }
    Ok(error)
}

/// How the bridge answered a request that must be refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionOutcome {
    Rejected { status: u16, message: String },
    UnexpectedSuccess { status: u16 },
}

impl RejectionOutcome {
    pub fn into_result(self) -> Result<(u16, String), Violation> {
        match self {
            RejectionOutcome::Rejected { status, message } => Ok((status, message)),
            RejectionOutcome::UnexpectedSuccess { status } => {
                Err(Violation::UnexpectedSuccess { status })
            }
        }
    }
}

/// Classify a response to a request that should have been refused.
///
/// The message comes from the error envelope when there is one, otherwise
/// from the raw body.
pub fn classify_rejection(status: u16, body: &[u8]) -> RejectionOutcome {
    if (200..300).contains(&status) {
        return RejectionOutcome::UnexpectedSuccess { status };
    }
    let message = serde_json::from_slice::<ApiError>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| String::from_utf8_lossy(body).into_owned());
    RejectionOutcome::Rejected { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_model_list_valid() {
        let body = json!({"object": "list", "data": [{"id": "gemini-2.5-flash-lite", "object": "model"}]});
        let validated = validate_model_list(&body, Some("gemini-2.5-flash-lite")).unwrap();
        assert!(validated.warnings.is_empty());
        assert_eq!(validated.value.data.len(), 1);
    }

    #[test]
    fn test_model_list_empty_data() {
        let body = json!({"object": "list", "data": []});
        assert!(validate_model_list(&body, None).is_err());
    }

    #[test]
    fn test_model_list_null_id() {
        let body = json!({"object": "list", "data": [{"id": "a"}, {"id": null}]});
        let err = validate_model_list(&body, None).unwrap_err();
        assert_eq!(err, Violation::schema("data[1].id", "expected a non-empty model id"));
    }

    #[test]
    fn test_model_list_missing_configured_model() {
        let body = json!({"object": "list", "data": [{"id": "a"}]});
        assert!(validate_model_list(&body, Some("b")).is_err());
    }

    #[test]
    fn test_model_list_object_ambiguity() {
        let body = json!({"data": [{"id": "a"}]});
        let validated = validate_model_list(&body, None).unwrap();
        assert_eq!(validated.warnings.len(), 1);
    }

    #[test]
    fn test_file_ref_parse() {
        assert_eq!(FileRef::parse("file-abc").unwrap().as_str(), "file-abc");
        assert!(FileRef::parse("file-").is_none());
        assert!(FileRef::parse("abc").is_none());
    }

    #[test]
    fn test_file_object_validation() {
        let file = validate_file_object(&json!({"id": "file-123", "object": "file"})).unwrap();
        assert_eq!(file.to_string(), "file-123");
        assert!(validate_file_object(&json!({"id": "upload-1"})).is_err());
        assert!(validate_file_object(&json!({"object": "file"})).is_err());
    }

    fn response_body() -> Value {
        json!({
            "id": "resp_1",
            "object": "response",
            "status": "completed",
            "output": [{
                "type": "message",
                "role": "assistant",
                "content": [{"type": "output_text", "text": "Hello"}]
            }]
        })
    }

    #[test]
    fn test_responses_object_valid() {
        let validated = validate_responses_object(&response_body()).unwrap();
        assert!(validated.warnings.is_empty());
        assert_eq!(
            validated.value.output[0].content[0].text.as_deref(),
            Some("Hello")
        );
    }

    #[test]
    fn test_responses_object_wrong_discriminator() {
        let mut body = response_body();
        body["object"] = json!("chat.completion");
        assert!(matches!(
            validate_responses_object(&body),
            Err(Violation::Schema { ref field, .. }) if field == "object"
        ));
    }

    #[test]
    fn test_responses_object_empty_output() {
        let mut body = response_body();
        body["output"] = json!([]);
        assert!(validate_responses_object(&body).is_err());
    }

    #[test]
    fn test_responses_object_wrong_part_type() {
        let mut body = response_body();
        body["output"][0]["content"][0]["type"] = json!("text");
        let err = validate_responses_object(&body).unwrap_err();
        assert!(err.to_string().contains("output_text"));
    }

    #[test]
    fn test_responses_object_missing_text() {
        let mut body = response_body();
        body["output"][0]["content"][0] = json!({"type": "output_text"});
        assert!(validate_responses_object(&body).is_err());
    }

    #[test]
    fn test_responses_status_ambiguity() {
        let mut body = response_body();
        body["status"] = json!("in_progress");
        let validated = validate_responses_object(&body).unwrap();
        assert!(validated.warnings[0].is_soft());
    }

    #[test]
    fn test_error_envelope() {
        let body = json!({"error": {"message": "messages must be an array", "type": "invalid_request_error"}});
        let err = validate_error_envelope(400, &body).unwrap();
        assert_eq!(err.error.message, "messages must be an array");
        assert!(validate_error_envelope(200, &body).is_err());
        assert!(validate_error_envelope(500, &body).is_err());
        assert!(validate_error_envelope(400, &json!({"detail": "bad"})).is_err());
    }

    #[test]
    fn test_classify_rejection() {
        let body = br#"{"error":{"message":"model not found"}}"#;
        assert_eq!(
            classify_rejection(404, body),
            RejectionOutcome::Rejected {
                status: 404,
                message: "model not found".to_string()
            }
        );
        assert_eq!(
            classify_rejection(500, b"boom"),
            RejectionOutcome::Rejected {
                status: 500,
                message: "boom".to_string()
            }
        );
        let outcome = classify_rejection(200, b"{}");
        assert_eq!(outcome, RejectionOutcome::UnexpectedSuccess { status: 200 });
        assert_eq!(
            outcome.into_result(),
            Err(Violation::UnexpectedSuccess { status: 200 })
        );
    }
}

//! Request payloads sent by the scenarios.

use crate::api::{
    ChatCompletionRequest, ChatMessage, ContentPart, ResponseFormat, ResponsesRequest,
    StreamOptions, ToolSpec,
};
use serde_json::{json, Value};

/// Phrase the simple chat scenario asks the model to repeat.
pub const VERIFICATION_PHRASE: &str = "Bridge verified";

/// Function offered by the tool-call scenarios.
pub const WEATHER_TOOL: &str = "get_weather";

/// Model name no bridge should serve.
pub const INVALID_MODEL: &str = "invalid-model-name-12345";

pub const UPLOAD_FILENAME: &str = "test_data.txt";
pub const UPLOAD_CONTENTS: &[u8] = b"Hello from a file!";
pub const UPLOAD_PURPOSE: &str = "user_data";

/// 1x1 red PNG.
pub const RED_PIXEL_DATA_URL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8BQDwAEhQGAhKmMIQAAAABJRU5ErkJggg==";

/// Publicly reachable PNG for the remote image scenario.
pub const REMOTE_IMAGE_URL: &str =
    "https://www.google.com/images/branding/googlelogo/2x/googlelogo_color_272x92dp.png";

/// Name introduced in the first turn and asked back in the second.
pub const REMEMBERED_NAME: &str = "Antigravity";

const ATTACHMENT_MAX_TOKENS: u32 = 10;

pub fn simple_chat(model: &str) -> ChatCompletionRequest {
    let mut req = ChatCompletionRequest::new(
        model,
        vec![ChatMessage::user(format!("Say '{}'", VERIFICATION_PHRASE))],
    );
    req.temperature = Some(0.0);
    req
}

pub fn system_message_chat(model: &str) -> ChatCompletionRequest {
    ChatCompletionRequest::new(
        model,
        vec![
            ChatMessage::system("You are a helpful assistant that only speaks in JSON."),
            ChatMessage::user("What is 2+2?"),
        ],
    )
}

/// Several text parts in one user message, as IDE agents send them.
pub fn multipart_chat(model: &str) -> ChatCompletionRequest {
    ChatCompletionRequest::new(
        model,
        vec![ChatMessage::user_parts(vec![
            ContentPart::text("<user_message>\nhello\n</user_message>"),
            ContentPart::text(
                "<environment_details>\n# VSCode Visible Files\nroo-diagnostics.json\n\n\
                 # Current Time\n2026-02-19T04:55:08.424Z\n</environment_details>",
            ),
        ])],
    )
}

/// Non-streaming request whose reply must carry usage.
pub fn usage_chat(model: &str) -> ChatCompletionRequest {
    ChatCompletionRequest::new(model, vec![ChatMessage::user("Say OK")])
}

fn introduction() -> ChatMessage {
    ChatMessage::user(format!("My name is {}. Remember it.", REMEMBERED_NAME))
}

/// First turn of the history round-trip.
pub fn introduction_chat(model: &str) -> ChatCompletionRequest {
    ChatCompletionRequest::new(model, vec![introduction()])
}

/// Second turn: the full history, including the bridge's own first reply.
pub fn recall_chat(model: &str, first_reply: ChatMessage) -> ChatCompletionRequest {
    ChatCompletionRequest::new(
        model,
        vec![
            introduction(),
            first_reply,
            ChatMessage::user("What is my name? Answer in one word."),
        ],
    )
}

pub fn json_mode_chat(model: &str) -> ChatCompletionRequest {
    let mut req = ChatCompletionRequest::new(
        model,
        vec![ChatMessage::user("Return a JSON with your current mood.")],
    );
    req.response_format = Some(ResponseFormat::json_object());
    req
}

pub fn weather_tool() -> ToolSpec {
    ToolSpec::function(
        WEATHER_TOOL,
        "Get weather",
        json!({
            "type": "object",
            "properties": {"loc": {"type": "string"}},
            "required": ["loc"]
        }),
    )
}

pub fn tool_call_chat(model: &str) -> ChatCompletionRequest {
    let mut req = ChatCompletionRequest::new(
        model,
        vec![ChatMessage::user(
            "What is the weather in Tokyo? Respond ONLY with a tool call.",
        )],
    );
    req.tools = Some(vec![weather_tool()]);
    req
}

pub fn streaming(mut req: ChatCompletionRequest) -> ChatCompletionRequest {
    req.stream = true;
    req
}

pub fn counting_stream(model: &str) -> ChatCompletionRequest {
    streaming(ChatCompletionRequest::new(
        model,
        vec![ChatMessage::user("Count from 1 to 5, one number per line.")],
    ))
}

pub fn usage_stream(model: &str) -> ChatCompletionRequest {
    let mut req = streaming(ChatCompletionRequest::new(
        model,
        vec![ChatMessage::user("Count to 3")],
    ));
    req.stream_options = Some(StreamOptions {
        include_usage: true,
    });
    req.max_tokens = Some(50);
    req
}

/// The uploaded file id inline in the message text.
pub fn file_text_chat(model: &str, file_id: &str) -> ChatCompletionRequest {
    let mut req = ChatCompletionRequest::new(
        model,
        vec![ChatMessage::user(format!("Please read this file: {}", file_id))],
    );
    req.max_tokens = Some(ATTACHMENT_MAX_TOKENS);
    req
}

/// The uploaded file id as an `image_url` part.
pub fn file_part_chat(model: &str, file_id: &str) -> ChatCompletionRequest {
    let mut req = ChatCompletionRequest::new(
        model,
        vec![ChatMessage::user_parts(vec![
            ContentPart::text("What is this?"),
            ContentPart::image_url(file_id),
        ])],
    );
    req.max_tokens = Some(ATTACHMENT_MAX_TOKENS);
    req
}

pub fn vision_chat(model: &str) -> ChatCompletionRequest {
    ChatCompletionRequest::new(
        model,
        vec![ChatMessage::user_parts(vec![
            ContentPart::text("What color is this pixel?"),
            ContentPart::image_url(RED_PIXEL_DATA_URL),
        ])],
    )
}

pub fn vision_url_chat(model: &str) -> ChatCompletionRequest {
    ChatCompletionRequest::new(
        model,
        vec![ChatMessage::user_parts(vec![
            ContentPart::text("What logo is in this image?"),
            ContentPart::image_url(REMOTE_IMAGE_URL),
        ])],
    )
}

pub fn responses_request(model: &str) -> ResponsesRequest {
    ResponsesRequest {
        model: model.to_string(),
        input: "Hello".to_string(),
    }
}

pub fn invalid_model_chat() -> ChatCompletionRequest {
    ChatCompletionRequest::new(INVALID_MODEL, vec![ChatMessage::user("Hi")])
}

/// `messages` is a string; no typed request can express this.
pub fn malformed_chat(model: &str) -> Value {
    json!({"model": model, "messages": "not-an-array"})
}

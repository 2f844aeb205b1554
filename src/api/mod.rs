//! # Bridge API surface
//!
//! Wire types and endpoint paths for the OpenAI-compatible bridge under test.
//!
//! ## Endpoints
//!
//! - `GET /models` - Model listing
//! - `POST /chat/completions` - Chat completion (JSON or SSE stream)
//! - `POST /files` - Multipart file upload returning a `file-...` reference
//! - `POST /responses` - Responses API
//!
//! Paths are relative to the configured base URL, which already carries the
//! `/v1` prefix (e.g. `http://localhost:3000/v1`).

pub mod types;

pub use types::*;

/// Model listing endpoint.
pub const MODELS_PATH: &str = "/models";

/// Chat completions endpoint.
pub const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

/// File upload endpoint.
pub const FILES_PATH: &str = "/files";

/// Responses API endpoint.
pub const RESPONSES_PATH: &str = "/responses";

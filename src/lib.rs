//! Conformance harness for OpenAI-compatible chat completion bridges.
//!
//! The harness drives a bridge over HTTP and checks that what comes back is
//! what an unmodified OpenAI client expects: response schemas, streamed
//! frame ordering, tool-call reassembly, usage accounting and error
//! envelopes.
//!
//! - [`client`] sends requests and opens SSE streams
//! - [`sse`] decodes stream lines into frames
//! - [`validate`] checks frames and bodies against the contract
//! - [`scenario`] wires named scenarios through the above

pub mod api;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod scenario;
pub mod sse;
pub mod validate;

pub use error::ConformanceError;

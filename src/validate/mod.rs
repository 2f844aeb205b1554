//! Protocol validators.
//!
//! Validators take decoded wire data and return either the validated value
//! (plus soft warnings) or the first hard [`Violation`]. They never touch the
//! network or the environment.

pub mod completion;
pub mod endpoints;
pub mod headers;
pub mod stream;
pub mod violation;

pub use completion::{validate_completion, CompletionExpectation};
pub use endpoints::{
    classify_rejection, validate_error_envelope, validate_file_object, validate_model_list,
    validate_responses_object, FileRef, RejectionOutcome,
};
pub use headers::{assert_event_stream, check_header_budget, header_bytes};
pub use stream::{consume_stream, StreamPhase, StreamSession, ToolCallFragment};
pub use violation::{Severity, Validated, Violation};

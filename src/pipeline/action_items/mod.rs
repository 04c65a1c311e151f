//! Action item extraction from meeting notes and other free-form text.
//!
//! Two interchangeable extractors:
//! - `RuleBasedExtractor`: line classifier (bullets, numbering, checkboxes,
//!   keyword prefixes) with an imperative-sentence fallback. Deterministic, no I/O.
//! - `ModelExtractor`: schema-constrained chat call with fixed linear backoff,
//!   composed with the rule-based extractor as its fallback.
//!
//! ```text
//! caller → ModelExtractor → ChatClient → parsed items
//!                     └──(failure)──→ RuleBasedExtractor → items | []
//! ```

pub mod types;
pub mod rules;
pub mod prompt;
pub mod parser;
pub mod ollama;
pub mod orchestrator;

pub use types::*;
pub use rules::*;
pub use prompt::*;
pub use parser::*;
pub use ollama::*;
pub use orchestrator::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Ollama is not running at {0}")]
    OllamaConnection(String),

    #[error("Ollama returned error (status {status}): {body}")]
    OllamaError { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("JSON parsing error: {0}")]
    JsonParsing(String),

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("action_items is not a list: {0}")]
    InvalidItems(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Check if an error is worth another chat call.
///
/// Transport failures, upstream status errors and malformed content are all
/// treated as transient. Only a well-formed response with the wrong item shape
/// and client construction problems are not.
pub fn is_retryable_error(e: &ExtractionError) -> bool {
    matches!(
        e,
        ExtractionError::OllamaConnection(_)
            | ExtractionError::OllamaError { .. }
            | ExtractionError::HttpClient(_)
            | ExtractionError::ResponseParsing(_)
            | ExtractionError::JsonParsing(_)
            | ExtractionError::MalformedResponse(_)
    )
}

/// A response that parsed as JSON but carries `action_items` of the wrong type.
pub fn is_fatal_parse_error(e: &ExtractionError) -> bool {
    matches!(e, ExtractionError::InvalidItems(_))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_and_parse_errors_are_retryable() {
        assert!(is_retryable_error(&ExtractionError::OllamaConnection(
            "http://localhost:11434".into()
        )));
        assert!(is_retryable_error(&ExtractionError::OllamaError {
            status: 503,
            body: "busy".into(),
        }));
        assert!(is_retryable_error(&ExtractionError::HttpClient("timeout".into())));
        assert!(is_retryable_error(&ExtractionError::JsonParsing("eof".into())));
        assert!(is_retryable_error(&ExtractionError::MalformedResponse(
            "missing action_items".into()
        )));
    }

    #[test]
    fn invalid_items_is_fatal_not_retryable() {
        let e = ExtractionError::InvalidItems("\"none\"".into());
        assert!(is_fatal_parse_error(&e));
        assert!(!is_retryable_error(&e));
    }

    #[test]
    fn config_error_is_neither() {
        let e = ExtractionError::Config("tls backend".into());
        assert!(!is_retryable_error(&e));
        assert!(!is_fatal_parse_error(&e));
    }

    #[test]
    fn error_messages_name_the_upstream() {
        let e = ExtractionError::OllamaError {
            status: 500,
            body: "model not loaded".into(),
        };
        assert_eq!(
            e.to_string(),
            "Ollama returned error (status 500): model not loaded"
        );
    }
}

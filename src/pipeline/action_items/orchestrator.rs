use std::time::Duration;

use super::parser::parse_action_items_response;
use super::prompt::{build_action_items_messages, ACTION_ITEMS_SCHEMA};
use super::rules::RuleBasedExtractor;
use super::types::{ActionItemExtractor, ActionItemList, ChatClient, ChatMessage};
use super::{is_fatal_parse_error, is_retryable_error, ExtractionError};

/// Chat calls per extraction before giving up on the model.
pub const MAX_ATTEMPTS: u32 = 3;

/// Linear backoff unit: attempt N failing waits N × 1.5s.
pub const BACKOFF_STEP: Duration = Duration::from_millis(1500);

/// Fixed attempt budget with linear, jitter-free backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            backoff_step: BACKOFF_STEP,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_step: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_step,
        }
    }

    /// Same attempt budget, no sleeping between attempts.
    pub fn no_backoff() -> Self {
        Self::new(MAX_ATTEMPTS, Duration::ZERO)
    }

    /// Sleep after failed attempt `attempt` (1-indexed).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff_step * attempt
    }
}

/// Result of one chat call plus parse.
#[derive(Debug)]
pub enum AttemptOutcome {
    /// Well-formed response; final even when empty.
    Items(ActionItemList),
    /// Transport, status or shape problem worth another call.
    Retryable(ExtractionError),
    /// Response can't be salvaged by asking again.
    Fatal(ExtractionError),
}

impl From<Result<ActionItemList, ExtractionError>> for AttemptOutcome {
    fn from(result: Result<ActionItemList, ExtractionError>) -> Self {
        match result {
            Ok(items) => Self::Items(items),
            Err(e) if is_fatal_parse_error(&e) => Self::Fatal(e),
            Err(e) if is_retryable_error(&e) => Self::Retryable(e),
            // Client construction problems won't improve on a second call either.
            Err(e) => Self::Fatal(e),
        }
    }
}

/// Model-backed extraction: prompt → chat (schema-constrained) → parse,
/// with retries, composed with the rule-based extractor as fallback.
pub struct ModelExtractor {
    client: Box<dyn ChatClient + Send + Sync>,
    model_name: String,
    policy: RetryPolicy,
    fallback: RuleBasedExtractor,
}

impl ModelExtractor {
    pub fn new(client: Box<dyn ChatClient + Send + Sync>, model_name: &str) -> Self {
        Self {
            client,
            model_name: model_name.to_string(),
            policy: RetryPolicy::default(),
            fallback: RuleBasedExtractor::new(),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn attempt(&self, messages: &[ChatMessage]) -> AttemptOutcome {
        self.client
            .chat(&self.model_name, messages, &ACTION_ITEMS_SCHEMA)
            .and_then(|response| parse_action_items_response(response.content()))
            .into()
    }

    /// Ask the model only. Errors carry the last failure seen.
    pub fn try_model(&self, text: &str) -> Result<ActionItemList, ExtractionError> {
        let messages = build_action_items_messages(text);
        let mut last_error: Option<ExtractionError> = None;

        for attempt in 1..=self.policy.max_attempts {
            match self.attempt(&messages) {
                AttemptOutcome::Items(items) => {
                    tracing::info!(attempt, items = items.len(), "model extraction succeeded");
                    return Ok(items);
                }
                AttemptOutcome::Fatal(e) => {
                    tracing::warn!(attempt, error = %e, "model response unusable, not retrying");
                    return Err(e);
                }
                AttemptOutcome::Retryable(e) => {
                    tracing::warn!(attempt, error = %e, "model extraction attempt failed");
                    last_error = Some(e);

                    if attempt < self.policy.max_attempts {
                        let delay = self.policy.delay_for(attempt);
                        if !delay.is_zero() {
                            std::thread::sleep(delay);
                        }
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ExtractionError::MalformedResponse("All retry attempts exhausted".into())
        }))
    }
}

impl ActionItemExtractor for ModelExtractor {
    /// `try_model` or else the rule-based result. Never fails.
    fn extract(&self, text: &str) -> ActionItemList {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let _span =
            tracing::info_span!("extract_action_items_via_model", model = %self.model_name)
                .entered();

        self.try_model(text).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "model extraction failed, using rule-based extraction");
            self.fallback.extract(text)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::action_items::ollama::{MockChatClient, MockReply};
    use crate::pipeline::action_items::prompt::ACTION_ITEMS_SYSTEM_PROMPT;
    use crate::pipeline::action_items::rules::strip_markers;
    use crate::pipeline::action_items::types::ChatRole;
    use std::sync::Arc;
    use std::time::Instant;

    const NOTES: &str = "- [ ] Set up database\n* implement API extract endpoint\n1. Write tests\nSome narrative sentence.";

    fn extractor_with(client: &Arc<MockChatClient>) -> ModelExtractor {
        ModelExtractor::new(Box::new(Arc::clone(client)), "llama3.2-vision")
            .with_retry_policy(RetryPolicy::no_backoff())
    }

    fn content(json: &str) -> MockReply {
        MockReply::Content(json.to_string())
    }

    #[test]
    fn empty_input_makes_no_call() {
        let client = Arc::new(MockChatClient::responding(r#"{"action_items": ["x"]}"#));
        let extractor = extractor_with(&client);

        assert!(extractor.extract("").is_empty());
        assert_eq!(client.calls(), 0);
    }

    #[test]
    fn whitespace_input_makes_no_call() {
        let client = Arc::new(MockChatClient::unreachable());
        let extractor = extractor_with(&client);

        assert!(extractor.extract("   \n\n\t  ").is_empty());
        assert_eq!(client.calls(), 0);
    }

    #[test]
    fn first_success_is_returned() {
        let client = Arc::new(MockChatClient::responding(
            r#"{"action_items": ["Set up database", " Write tests "]}"#,
        ));
        let extractor = extractor_with(&client);

        assert_eq!(extractor.extract(NOTES), vec!["Set up database", "Write tests"]);
        assert_eq!(client.calls(), 1);
    }

    #[test]
    fn model_items_come_back_cleaned() {
        let client = Arc::new(MockChatClient::responding(
            r#"{"action_items": ["- Fix it", "[ ] Book room", "1. Write tests"]}"#,
        ));
        let extractor = extractor_with(&client);

        let items = extractor.extract("notes");
        assert_eq!(items, vec!["Fix it", "Book room", "Write tests"]);
        for item in &items {
            assert_eq!(item.as_str(), strip_markers(item));
        }
    }

    #[test]
    fn empty_model_answer_is_final() {
        let client = Arc::new(MockChatClient::responding(r#"{"action_items": []}"#));
        let extractor = extractor_with(&client);

        // The rule-based pass would find three items here; the model's answer wins.
        assert!(extractor.extract(NOTES).is_empty());
        assert_eq!(client.calls(), 1);
    }

    #[test]
    fn transient_failures_are_retried() {
        let client = Arc::new(MockChatClient::new(vec![
            MockReply::Unreachable,
            MockReply::Status(503, "loading model".into()),
            content(r#"{"action_items": ["Deploy to staging"]}"#),
        ]));
        let extractor = extractor_with(&client);

        assert_eq!(extractor.extract(NOTES), vec!["Deploy to staging"]);
        assert_eq!(client.calls(), 3);
    }

    #[test]
    fn malformed_content_is_retried() {
        let client = Arc::new(MockChatClient::new(vec![
            content("not json at all"),
            content(r#"{"tasks": []}"#),
            content(r#"{"action_items": ["Email client"]}"#),
        ]));
        let extractor = extractor_with(&client);

        assert_eq!(extractor.extract(NOTES), vec!["Email client"]);
        assert_eq!(client.calls(), 3);
    }

    #[test]
    fn total_failure_equals_rule_based_result() {
        let client = Arc::new(MockChatClient::unreachable());
        let extractor = extractor_with(&client);

        let expected = RuleBasedExtractor::new().extract(NOTES);
        assert_eq!(extractor.extract(NOTES), expected);
        assert_eq!(
            expected,
            vec!["Set up database", "implement API extract endpoint", "Write tests"]
        );
        assert_eq!(client.calls(), 3);
    }

    #[test]
    fn total_failure_with_nothing_to_fall_back_on_is_empty() {
        let client = Arc::new(MockChatClient::new(vec![content("garbage")]));
        let extractor = extractor_with(&client);

        assert!(extractor.extract("The weather was nice today.").is_empty());
        assert_eq!(client.calls(), 3);
    }

    #[test]
    fn non_array_items_skip_remaining_attempts() {
        let client = Arc::new(MockChatClient::new(vec![
            content(r#"{"action_items": "Write tests"}"#),
            content(r#"{"action_items": ["never reached"]}"#),
        ]));
        let extractor = extractor_with(&client);

        assert_eq!(
            extractor.extract(NOTES),
            RuleBasedExtractor::new().extract(NOTES)
        );
        assert_eq!(client.calls(), 1);
    }

    #[test]
    fn try_model_surfaces_last_error() {
        let client = Arc::new(MockChatClient::new(vec![
            MockReply::Unreachable,
            MockReply::Unreachable,
            MockReply::Status(500, "boom".into()),
        ]));
        let extractor = extractor_with(&client);

        match extractor.try_model(NOTES) {
            Err(ExtractionError::OllamaError { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("expected OllamaError, got {other:?}"),
        }
    }

    #[test]
    fn request_carries_model_prompt_and_schema() {
        let client = Arc::new(MockChatClient::responding(r#"{"action_items": []}"#));
        let extractor = ModelExtractor::new(Box::new(Arc::clone(&client)), "qwen2.5:7b");

        extractor.extract(NOTES);

        let recorded = client.recorded();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].model, "qwen2.5:7b");
        assert_eq!(recorded[0].format, *ACTION_ITEMS_SCHEMA);
        assert_eq!(recorded[0].messages.len(), 2);
        assert_eq!(recorded[0].messages[0].role, ChatRole::System);
        assert_eq!(recorded[0].messages[0].content, ACTION_ITEMS_SYSTEM_PROMPT);
        assert_eq!(recorded[0].messages[1].role, ChatRole::User);
        assert!(recorded[0].messages[1].content.ends_with(NOTES));
    }

    #[test]
    fn single_attempt_policy_does_not_retry() {
        let client = Arc::new(MockChatClient::unreachable());
        let extractor = ModelExtractor::new(Box::new(Arc::clone(&client)), "m")
            .with_retry_policy(RetryPolicy::new(1, Duration::from_secs(60)));

        let started = Instant::now();
        extractor.extract(NOTES);
        assert_eq!(client.calls(), 1);
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn backoff_sleeps_between_attempts_only() {
        let client = Arc::new(MockChatClient::unreachable());
        let extractor = ModelExtractor::new(Box::new(Arc::clone(&client)), "m")
            .with_retry_policy(RetryPolicy::new(3, Duration::from_millis(20)));

        let started = Instant::now();
        extractor.extract(NOTES);
        // 20ms after attempt 1, 40ms after attempt 2, nothing after attempt 3.
        assert!(started.elapsed() >= Duration::from_millis(60));
        assert_eq!(client.calls(), 3);
    }

    #[test]
    fn default_policy_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay_for(1), Duration::from_millis(1500));
        assert_eq!(policy.delay_for(2), Duration::from_millis(3000));
    }

    #[test]
    fn policy_never_allows_zero_attempts() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
        assert_eq!(RetryPolicy::no_backoff().delay_for(2), Duration::ZERO);
    }

    #[test]
    fn outcome_classification() {
        assert!(matches!(
            AttemptOutcome::from(Ok(vec!["a".to_string()])),
            AttemptOutcome::Items(_)
        ));
        assert!(matches!(
            AttemptOutcome::from(Err(ExtractionError::JsonParsing("eof".into()))),
            AttemptOutcome::Retryable(_)
        ));
        assert!(matches!(
            AttemptOutcome::from(Err(ExtractionError::InvalidItems("1".into()))),
            AttemptOutcome::Fatal(_)
        ));
        assert!(matches!(
            AttemptOutcome::from(Err(ExtractionError::Config("tls".into()))),
            AttemptOutcome::Fatal(_)
        ));
    }

    #[test]
    fn usable_through_trait_object() {
        let client = Arc::new(MockChatClient::unreachable());
        let model = extractor_with(&client);
        let rules = RuleBasedExtractor::new();
        let extractors: [&dyn ActionItemExtractor; 2] = [&model, &rules];

        let results: Vec<ActionItemList> = extractors.iter().map(|e| e.extract(NOTES)).collect();
        assert_eq!(results[0], results[1]);
    }
}

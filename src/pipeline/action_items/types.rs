use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::ExtractionError;

/// Ordered, case-insensitively deduplicated list of cleaned action items.
///
/// Sole output type of both extractors.
pub type ActionItemList = Vec<String>;

/// Role tag on a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// A single role-tagged message in a chat request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Chat completion result. `message.content` holds the JSON-encoded payload
/// matching the requested format.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatResponse {
    pub message: ChatMessage,
}

impl ChatResponse {
    /// Assistant response with the given content (used by fakes).
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            message: ChatMessage {
                role: ChatRole::Assistant,
                content: content.into(),
            },
        }
    }

    pub fn content(&self) -> &str {
        &self.message.content
    }
}

/// Chat-completion client abstraction (allows mocking).
pub trait ChatClient {
    /// Send `messages` to `model`, constraining the reply to the JSON schema `format`.
    fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        format: &serde_json::Value,
    ) -> Result<ChatResponse, ExtractionError>;
}

impl<T: ChatClient + ?Sized> ChatClient for Arc<T> {
    fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        format: &serde_json::Value,
    ) -> Result<ChatResponse, ExtractionError> {
        (**self).chat(model, messages, format)
    }
}

/// Anything that turns free-form text into action items. Never fails.
pub trait ActionItemExtractor {
    fn extract(&self, text: &str) -> ActionItemList;
}

/// Drop case-insensitive duplicates, keeping the first occurrence's casing and position.
pub fn dedupe_case_insensitive<I>(items: I) -> ActionItemList
where
    I: IntoIterator<Item = String>,
{
    let mut seen: HashSet<String> = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.to_lowercase()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedupe_keeps_first_casing_and_order() {
        let items = vec![
            "Write tests".to_string(),
            "Ship it".to_string(),
            "WRITE TESTS".to_string(),
            "write tests".to_string(),
            "ship IT".to_string(),
        ];
        assert_eq!(dedupe_case_insensitive(items), vec!["Write tests", "Ship it"]);
    }

    #[test]
    fn dedupe_empty() {
        assert!(dedupe_case_insensitive(Vec::<String>::new()).is_empty());
    }

    #[test]
    fn chat_message_serializes_lowercase_role() {
        let json = serde_json::to_value(ChatMessage::system("be brief")).unwrap();
        assert_eq!(json["role"], "system");
        assert_eq!(json["content"], "be brief");
    }

    #[test]
    fn chat_response_deserializes_ollama_envelope() {
        let raw = r#"{
            "model": "llama3.2-vision",
            "created_at": "2026-01-01T00:00:00Z",
            "message": {"role": "assistant", "content": "{\"action_items\": []}"},
            "done": true
        }"#;
        let response: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.message.role, ChatRole::Assistant);
        assert_eq!(response.content(), r#"{"action_items": []}"#);
    }

    #[test]
    fn traits_are_object_safe() {
        fn _assert_client(_: &dyn ChatClient) {}
        fn _assert_extractor(_: &dyn ActionItemExtractor) {}
    }
}

use std::sync::LazyLock;

use serde_json::json;

use super::types::ChatMessage;

pub const ACTION_ITEMS_SYSTEM_PROMPT: &str = "You are a helpful assistant that extracts action items from meeting notes or text. \
Return ONLY the actionable tasks. Each action item should be a concise, \
imperative sentence (e.g. 'Set up database', 'Write tests'). \
Do not include narrative or non-actionable sentences. \
Respond with a JSON object whose \"action_items\" field is an array of strings.";

/// JSON schema the chat response must conform to: `{"action_items": [string]}`.
pub static ACTION_ITEMS_SCHEMA: LazyLock<serde_json::Value> = LazyLock::new(|| {
    json!({
        "type": "object",
        "properties": {
            "action_items": {
                "type": "array",
                "items": {"type": "string"}
            }
        },
        "required": ["action_items"]
    })
});

/// Build the user message embedding the verbatim input text.
pub fn build_action_items_prompt(text: &str) -> String {
    format!("Extract all action items from the following text:\n\n{text}")
}

/// The fixed two-message conversation (system instruction + user text).
pub fn build_action_items_messages(text: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(ACTION_ITEMS_SYSTEM_PROMPT),
        ChatMessage::user(build_action_items_prompt(text)),
    ]
}

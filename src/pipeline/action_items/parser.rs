use super::rules::strip_markers;
use super::types::{dedupe_case_insensitive, ActionItemList};
use super::ExtractionError;

/// Parse the model's message content into action items.
///
/// - not JSON → `JsonParsing`
/// - JSON but not an object, or no `action_items` → `MalformedResponse`
/// - `action_items` present but not an array → `InvalidItems`
///
/// An empty array is a valid, final answer.
pub fn parse_action_items_response(content: &str) -> Result<ActionItemList, ExtractionError> {
    let json_str = strip_code_fence(content);

    let value: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| ExtractionError::JsonParsing(e.to_string()))?;

    let object = value.as_object().ok_or_else(|| {
        ExtractionError::MalformedResponse(format!(
            "expected a JSON object, got {}",
            value_kind(&value)
        ))
    })?;

    match object.get("action_items") {
        None => Err(ExtractionError::MalformedResponse(
            "missing action_items".into(),
        )),
        Some(serde_json::Value::Array(arr)) => {
            Ok(dedupe_case_insensitive(arr.iter().filter_map(coerce_item)))
        }
        Some(other) => Err(ExtractionError::InvalidItems(truncate(
            &other.to_string(),
            120,
        ))),
    }
}

fn value_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// Coerce one array element to a cleaned, non-empty string.
///
/// Strings are taken as-is, `null` is dropped, anything else uses its JSON text.
/// Leading bullets, numbering and checkboxes are stripped like rule-based lines.
fn coerce_item(value: &serde_json::Value) -> Option<String> {
    let raw = match value {
        serde_json::Value::Null => return None,
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let text = strip_markers(&raw);
    (!text.is_empty()).then(|| text.to_string())
}

/// Some models wrap JSON in a ```json fence even when a format is requested.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let cut: String = s.chars().take(max_chars).collect();
    format!("{cut}…")
}

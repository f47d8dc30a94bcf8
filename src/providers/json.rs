//! JSON helpers shared by the provider decoders.

use serde_json::Value;

/// Tool input keys that carry the argument worth showing, in priority order.
const DETAIL_KEYS: &[&str] = &["path", "pattern", "command", "url", "query"];

/// Decodes a line holding a single JSON object.
///
/// Lines that look like an object but fail to decode are logged under `provider`.
pub(super) fn decode_object(line: &[u8], provider: &str) -> Option<Value> {
    let trimmed = line.trim_ascii();
    if !trimmed.starts_with(b"{") {
        return None;
    }
    match serde_json::from_slice::<Value>(trimmed) {
        Ok(json) if json.is_object() => Some(json),
        Ok(_) => None,
        Err(err) => {
            tracing::warn!(provider, error = %err, "failed to parse stream event");
            None
        }
    }
}

/// Returns a string field, or `""` when absent or not a string.
pub(super) fn str_field<'a>(json: &'a Value, key: &str) -> &'a str {
    json.get(key).and_then(Value::as_str).unwrap_or_default()
}

/// Returns a nested string field, e.g. `delta.text`.
pub(super) fn nested_str<'a>(json: &'a Value, outer: &str, inner: &str) -> &'a str {
    json.get(outer).map_or("", |value| str_field(value, inner))
}

/// Joins the `text` of every block in `message.content`.
pub(super) fn message_text(json: &Value) -> String {
    json.get("message")
        .and_then(|message| message.get("content"))
        .map(content_text)
        .unwrap_or_default()
}

/// Joins the text blocks of a content value, which may also be a plain string.
pub(super) fn content_text(content: &Value) -> String {
    match content {
        Value::String(text) => text.clone(),
        Value::Array(blocks) => blocks
            .iter()
            .filter_map(|block| block.get("text").and_then(Value::as_str))
            .collect(),
        _ => String::new(),
    }
}

/// Returns the most relevant human text anywhere in a decoded line.
pub(super) fn event_text(json: &Value) -> Option<String> {
    [
        nested_str(json, "delta", "text"),
        str_field(json, "text"),
        str_field(json, "content"),
    ]
    .into_iter()
    .map(str::trim)
    .find(|text| !text.is_empty())
    .map(String::from)
    .or_else(|| {
        let text = message_text(json);
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    })
}

/// Picks the primary argument out of a tool input object.
pub(super) fn tool_detail(input: Option<&Value>) -> String {
    let Some(input) = input.and_then(Value::as_object) else {
        return String::new();
    };
    DETAIL_KEYS
        .iter()
        .find_map(|key| input.get(*key))
        .map(display_value)
        .unwrap_or_default()
}

/// Renders a scalar as plain text and anything else as compact JSON.
pub(super) fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Returns `Some(trimmed)` for non-blank text.
pub(super) fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

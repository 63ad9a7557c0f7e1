//! Turning raw model replies into records.

use crate::core::PipelineStage;
use crate::errors::StageParseError;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[A-Za-z]*\s*\n?(.*?)```").expect("fenced block pattern is valid")
});

/// The trimmed body of the first fenced code block, if any.
#[must_use]
pub fn fenced_body(raw: &str) -> Option<&str> {
    FENCED_BLOCK
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

/// Finds the JSON payload inside a model reply.
///
/// Prefers the first fenced code block; otherwise takes the span from the
/// first `{` or `[` to the last matching closer. Returns `None` if the reply
/// holds nothing that looks like JSON.
#[must_use]
pub fn extract_json(raw: &str) -> Option<&str> {
    if let Some(body) = fenced_body(raw).filter(|body| body.starts_with('{') || body.starts_with('['))
    {
        return Some(body);
    }

    let start = raw.find(['{', '['])?;
    let closer = if raw[start..].starts_with('{') { '}' } else { ']' };
    let end = raw.rfind(closer)?;
    (end > start).then(|| &raw[start..=end])
}

fn reject(stage: PipelineStage, raw: &str, reason: impl Into<String>) -> StageParseError {
    StageParseError::new(stage, reason, raw)
}

/// Parses the JSON payload and strips the envelopes models like to add.
///
/// A `{"status": "failed", "error": ...}` reply is a parse failure carrying
/// the model's own message. A `{"document": ...}` wrapper is removed. A bare
/// array is wrapped as `{list_key: [...]}` when a list key is given.
fn payload(stage: PipelineStage, raw: &str, list_key: Option<&str>) -> Result<Value, StageParseError> {
    let json = extract_json(raw).ok_or_else(|| reject(stage, raw, "reply contains no JSON"))?;
    let mut value: Value = serde_json::from_str(json)
        .map_err(|e| reject(stage, raw, format!("invalid JSON: {e}")))?;

    if let Some(status) = value.get("status").and_then(Value::as_str) {
        if status.eq_ignore_ascii_case("failed") || status.eq_ignore_ascii_case("error") {
            let message = value
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("no error message given");
            return Err(reject(stage, raw, format!("model reported failure: {message}")));
        }
    }

    let wrapped = list_key.map_or(true, |key| value.get(key).is_none());
    if wrapped && value.get("document").is_some_and(|d| d.is_object() || d.is_array()) {
        value = value["document"].take();
    }

    if let (Some(key), true) = (list_key, value.is_array()) {
        let mut object = serde_json::Map::new();
        object.insert(key.to_string(), value);
        value = Value::Object(object);
    }

    if !value.is_object() {
        return Err(reject(stage, raw, "expected a JSON object"));
    }
    Ok(value)
}

/// Parses a reply that should be a single JSON object.
pub fn parse_object_reply<T: DeserializeOwned>(
    stage: PipelineStage,
    raw: &str,
) -> Result<T, StageParseError> {
    let value = payload(stage, raw, None)?;
    serde_json::from_value(value).map_err(|e| reject(stage, raw, format!("schema mismatch: {e}")))
}

/// Parses a reply that should be an object holding a list under `key`.
///
/// A bare JSON array is accepted as the list itself.
pub fn parse_list_reply<T: DeserializeOwned>(
    stage: PipelineStage,
    raw: &str,
    key: &str,
) -> Result<T, StageParseError> {
    let value = payload(stage, raw, Some(key))?;
    if !value.get(key).is_some_and(Value::is_array) {
        return Err(reject(stage, raw, format!("expected a '{key}' list")));
    }
    serde_json::from_value(value).map_err(|e| reject(stage, raw, format!("schema mismatch: {e}")))
}

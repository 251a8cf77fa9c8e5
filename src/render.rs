//! Display logic for the history list, shared by the window and the CLI.

use serde_json::Value;
use time::{OffsetDateTime, UtcOffset};

use crate::domains::history::{HistoryItem, HistoryList, ResponsePayload};

/// Fields checked, in order, for a human-readable reply inside an object.
pub const RESPONSE_TEXT_FIELDS: [&str; 4] = ["message", "text", "content", "data"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntryView {
    pub id: String,
    pub prompt: String,
    pub time: String,
    pub response: Option<String>,
}

/// One view per entry, newest first. An empty history renders nothing.
pub fn render_history(history: &HistoryList) -> Vec<HistoryEntryView> {
    history.iter().map(render_entry).collect()
}

pub fn render_entry(item: &HistoryItem) -> HistoryEntryView {
    HistoryEntryView {
        id: item.id.clone(),
        prompt: item.prompt.clone(),
        time: format_local_time(item.timestamp),
        response: item.response.as_ref().and_then(displayable_response),
    }
}

/// `None` for payloads that are present but falsy (`""`, `0`, `false`).
pub fn displayable_response(payload: &ResponsePayload) -> Option<String> {
    let shown = match payload {
        ResponsePayload::Text(text) => !text.is_empty(),
        ResponsePayload::Structured(value) => is_truthy(value),
    };
    shown.then(|| format_response(payload))
}

pub fn format_response(payload: &ResponsePayload) -> String {
    match payload {
        ResponsePayload::Text(text) => text.clone(),
        ResponsePayload::Structured(Value::Object(map)) => RESPONSE_TEXT_FIELDS
            .iter()
            .filter_map(|field| map.get(*field))
            .find(|value| is_truthy(value))
            .map(plain_text)
            .unwrap_or_else(|| pretty(&Value::Object(map.clone()))),
        ResponsePayload::Structured(value) => match value {
            Value::Array(_) => pretty(value),
            _ => plain_text(value),
        },
    }
}

fn plain_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map_or(true, |n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Wall-clock `HH:MM:SS` in the local offset, UTC when it cannot be determined.
pub fn format_local_time(timestamp: OffsetDateTime) -> String {
    let local_offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    let local = timestamp.to_offset(local_offset);
    format!(
        "{:02}:{:02}:{:02}",
        local.hour(),
        local.minute(),
        local.second()
    )
}

/// Plain-text block for terminals.
pub fn render_plain(history: &HistoryList) -> String {
    render_history(history)
        .iter()
        .map(|entry| {
            let mut block = format!("[{}] {}", entry.time, entry.prompt);
            if let Some(response) = &entry.response {
                for line in response.lines() {
                    block.push_str("\n    ");
                    block.push_str(line);
                }
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

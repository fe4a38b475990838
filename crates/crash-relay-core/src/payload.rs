//! # Crash Metadata Extraction
//!
//! Sentry sends two notification shapes that differ only in nesting: issue
//! alerts carry their data under `data.issue`, event alerts under
//! `data.event`. Both are flattened into a single [`CrashMetadata`] record.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Title used when neither the issue/event nor the payload carries one
pub const UNKNOWN_TITLE: &str = "Unknown error";

/// Culprit used when the issue/event does not name one
pub const UNKNOWN_CULPRIT: &str = "unknown";

/// Level used when the issue/event does not carry one
pub const DEFAULT_LEVEL: &str = "error";

/// Flat crash description forwarded to the automation endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrashMetadata {
    /// Error title, e.g. `ZeroDivisionError: division by zero`
    pub title: String,

    /// Code location blamed for the error
    pub culprit: String,

    /// Severity level reported by Sentry
    pub level: String,

    /// Link to the issue in Sentry (may be empty)
    pub url: String,
}

impl CrashMetadata {
    /// Extract crash metadata from a parsed notification body.
    ///
    /// Never fails: every missing field falls back to a fixed default. Each
    /// field is resolved through an ordered chain and the first present,
    /// non-null, non-empty value wins:
    ///
    /// | Field | Chain |
    /// |---|---|
    /// | `title` | issue `title`, payload `message`, `"Unknown error"` |
    /// | `culprit` | issue `culprit`, `"unknown"` |
    /// | `level` | issue `level`, `"error"` |
    /// | `url` | issue `web_url`, issue `permalink`, payload `url`, `""` |
    ///
    /// "issue" is `data.issue` when present, otherwise `data.event`.
    pub fn extract(payload: &Map<String, Value>) -> Self {
        let empty = Map::new();
        let issue = issue_or_event(payload).unwrap_or(&empty);

        let title = text_field(issue, "title")
            .or_else(|| text_field(payload, "message"))
            .unwrap_or_else(|| UNKNOWN_TITLE.to_string());

        let culprit =
            text_field(issue, "culprit").unwrap_or_else(|| UNKNOWN_CULPRIT.to_string());

        let level = text_field(issue, "level").unwrap_or_else(|| DEFAULT_LEVEL.to_string());

        let url = text_field(issue, "web_url")
            .or_else(|| text_field(issue, "permalink"))
            .or_else(|| text_field(payload, "url"))
            .unwrap_or_default();

        Self {
            title,
            culprit,
            level,
            url,
        }
    }
}

/// Locate the issue (preferred) or event object under `data`.
fn issue_or_event(payload: &Map<String, Value>) -> Option<&Map<String, Value>> {
    let data = payload.get("data")?.as_object()?;

    ["issue", "event"]
        .iter()
        .filter_map(|key| data.get(*key).and_then(Value::as_object))
        .find(|object| !object.is_empty())
}

/// Read a field as text if it holds a usable value.
///
/// Strings are taken verbatim when non-empty and numbers are rendered when
/// non-zero. Null, booleans, arrays and objects count as absent.
fn text_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
#[path = "payload_tests.rs"]
mod tests;

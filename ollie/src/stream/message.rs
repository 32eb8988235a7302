//! Messages carried by NDJSON response streams.

use serde::de::DeserializeOwned;
use serde_json::Value;

/// A typed message decoded from one NDJSON line.
///
/// Every long-running endpoint ends its stream with a *terminal* message:
/// generation and chat set `"done": true`, model management operations
/// report `"status": "success"`.
pub trait StreamMessage: DeserializeOwned {
    /// Whether this message ends the stream.
    fn is_terminal(&self) -> bool;
}

impl StreamMessage for Value {
    fn is_terminal(&self) -> bool {
        is_terminal_document(self)
    }
}

/// Terminal check on an untyped JSON document.
#[must_use]
pub fn is_terminal_document(doc: &Value) -> bool {
    doc.get("done").and_then(Value::as_bool) == Some(true)
        || doc.get("status").and_then(Value::as_str) == Some("success")
}

/// Extract the message of an error document (`{"error": ...}`).
///
/// Non-string error payloads are rendered as JSON text.
#[must_use]
pub fn error_message(doc: &Value) -> Option<String> {
    match doc.get("error")? {
        Value::Null => None,
        Value::String(message) => Some(message.clone()),
        other => Some(other.to_string()),
    }
}

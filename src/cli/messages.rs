//! Message types from the tool's stream-json output.
//!
//! One JSON object per line arrives on the primary output channel; the
//! top-level `type` field names the message kind. The vocabulary is owned by
//! the external tool and open-ended, so unrecognized kinds are classified,
//! not rejected. Every variant keeps the raw payload: a failed run is
//! reported together with the exact object the tool sent.

use serde_json::Value;

/// Subtype marking a successful terminal result.
pub const SUCCESS_SUBTYPE: &str = "success";

/// Messages emitted on the primary output channel, classified by `type`.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamMessage {
    /// Informational message (session start, configuration echo).
    System {
        payload: Value,
        session_id: Option<String>,
    },
    /// Assistant output: text, tool use and thinking content items.
    Assistant {
        payload: Value,
        session_id: Option<String>,
    },
    /// Echoed user input; carries no assistant output.
    User {
        payload: Value,
        session_id: Option<String>,
    },
    /// Terminal result for the invocation.
    Result(ResultMessage),
    /// Unrecognized message kind.
    Other {
        kind: String,
        payload: Value,
        session_id: Option<String>,
    },
}

/// Terminal `result` message with its success markers.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultMessage {
    /// Full raw payload as received.
    pub payload: Value,
    /// The tool's own conversation-session identifier.
    pub session_id: Option<String>,
    /// True when the tool marks the run as failed.
    pub is_error: bool,
    /// Result subtype; [`SUCCESS_SUBTYPE`] marks success.
    pub subtype: String,
}

/// Error produced when a line parses as JSON but is not a protocol object.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected a JSON object, got {kind}")]
pub struct ShapeError {
    kind: &'static str,
}

impl StreamMessage {
    /// Classify a parsed JSON value by its `type` field.
    ///
    /// A missing or non-string `type` lands in [`StreamMessage::Other`].
    ///
    /// # Errors
    ///
    /// Returns [`ShapeError`] if `value` is not a JSON object.
    pub fn from_value(value: Value) -> Result<Self, ShapeError> {
        if !value.is_object() {
            return Err(ShapeError {
                kind: json_kind(&value),
            });
        }
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let session_id = value
            .get("session_id")
            .and_then(Value::as_str)
            .map(String::from);

        match kind.as_str() {
            "system" => Ok(Self::System {
                payload: value,
                session_id,
            }),
            "assistant" => Ok(Self::Assistant {
                payload: value,
                session_id,
            }),
            "user" => Ok(Self::User {
                payload: value,
                session_id,
            }),
            "result" => {
                let is_error = value
                    .get("is_error")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                let subtype = value
                    .get("subtype")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                Ok(Self::Result(ResultMessage {
                    payload: value,
                    session_id,
                    is_error,
                    subtype,
                }))
            }
            _ => Ok(Self::Other {
                kind,
                payload: value,
                session_id,
            }),
        }
    }

    /// Returns true if this is the terminal `result` message.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Result(_))
    }

    /// The tool's conversation-session identifier, if the message carried one.
    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        match self {
            Self::System { session_id, .. }
            | Self::Assistant { session_id, .. }
            | Self::User { session_id, .. }
            | Self::Other { session_id, .. } => session_id.as_deref(),
            Self::Result(result) => result.session_id.as_deref(),
        }
    }
}

impl ResultMessage {
    /// Whether the markers denote success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        !self.is_error && self.subtype == SUCCESS_SUBTYPE
    }

    /// The `result` string field of the payload, if present.
    #[must_use]
    pub fn result_text(&self) -> Option<&str> {
        self.payload.get("result").and_then(Value::as_str)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_classify_system_message() {
        let value = json!({"type": "system", "cwd": "/tmp", "session_id": "abc"});
        let message = StreamMessage::from_value(value).unwrap();
        assert!(matches!(message, StreamMessage::System { .. }));
        assert_eq!(message.session_id(), Some("abc"));
        assert!(!message.is_terminal());
    }

    #[test]
    fn test_classify_result_message() {
        let value = json!({
            "type": "result",
            "subtype": "success",
            "is_error": false,
            "result": "done",
            "session_id": "abc"
        });
        let message = StreamMessage::from_value(value).unwrap();
        assert!(message.is_terminal());
        let StreamMessage::Result(result) = message else {
            panic!("expected result");
        };
        assert!(result.is_success());
        assert_eq!(result.result_text(), Some("done"));
        assert_eq!(result.subtype, "success");
    }

    #[test]
    fn test_result_markers_default_to_failure_shape() {
        // A result without subtype must not look successful.
        let value = json!({"type": "result", "result": "x"});
        let StreamMessage::Result(result) = StreamMessage::from_value(value).unwrap() else {
            panic!("expected result");
        };
        assert!(!result.is_error);
        assert_eq!(result.subtype, "");
        assert!(!result.is_success());
    }

    #[test]
    fn test_result_error_flag() {
        let value = json!({"type": "result", "subtype": "success", "is_error": true});
        let StreamMessage::Result(result) = StreamMessage::from_value(value).unwrap() else {
            panic!("expected result");
        };
        assert!(!result.is_success());
    }

    #[test]
    fn test_result_non_success_subtype() {
        let value = json!({"type": "result", "subtype": "error_max_turns", "is_error": false});
        let StreamMessage::Result(result) = StreamMessage::from_value(value).unwrap() else {
            panic!("expected result");
        };
        assert!(!result.is_success());
    }

    #[test]
    fn test_classify_unknown_kind() {
        let value = json!({"type": "telemetry", "data": 1});
        let message = StreamMessage::from_value(value).unwrap();
        let StreamMessage::Other { kind, .. } = message else {
            panic!("expected other");
        };
        assert_eq!(kind, "telemetry");
    }

    #[test]
    fn test_classify_missing_type_field() {
        let value = json!({"data": 1});
        let message = StreamMessage::from_value(value).unwrap();
        assert!(matches!(message, StreamMessage::Other { .. }));
    }

    #[test]
    fn test_classify_user_message() {
        let value = json!({"type": "user", "message": {"content": "hi"}});
        let message = StreamMessage::from_value(value).unwrap();
        assert!(matches!(message, StreamMessage::User { .. }));
    }

    #[test]
    fn test_non_object_is_shape_error() {
        let err = StreamMessage::from_value(json!([1, 2, 3])).unwrap_err();
        assert_eq!(err.to_string(), "expected a JSON object, got array");
        let err = StreamMessage::from_value(json!("text")).unwrap_err();
        assert_eq!(err.to_string(), "expected a JSON object, got string");
    }

    #[test]
    fn test_payload_retained_verbatim() {
        let value = json!({"type": "assistant", "message": {"content": []}});
        let StreamMessage::Assistant { payload, .. } =
            StreamMessage::from_value(value.clone()).unwrap()
        else {
            panic!("expected assistant");
        };
        assert_eq!(payload, value);
    }
}

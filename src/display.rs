//! Rendering helpers for streamed assistant output.
//!
//! Assistant messages can carry large text blocks and tool inputs; log lines
//! built from them are truncated so a single message cannot flood the log.

/// Maximum length for rendered message content in log output.
pub const MAX_CONTENT_LEN: usize = 250;

/// Truncate a string to a maximum number of characters, adding an ellipsis
/// if anything was cut. Counts characters, not bytes, so multibyte content
/// is never split mid-codepoint.
#[must_use]
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        "...".to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{kept}...")
    }
}

/// Format tool input for display as `key=value` pairs.
///
/// String values are rendered without quotes; everything else uses its JSON
/// rendering. Callers truncate the combined result.
#[must_use]
pub fn format_tool_input(input: &serde_json::Value) -> String {
    match input {
        serde_json::Value::Object(map) => {
            let pairs: Vec<String> = map
                .iter()
                .map(|(k, v)| {
                    let value_str = match v {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    format!("{k}={value_str}")
                })
                .collect();
            pairs.join(", ")
        }
        other => other.to_string(),
    }
}

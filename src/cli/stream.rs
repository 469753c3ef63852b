//! Line decoding and message classification for the primary output channel.

use std::io;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

use crate::cli::{ResultMessage, StreamMessage};
use crate::display::{format_tool_input, truncate, MAX_CONTENT_LEN};
use crate::logging::{LogFields, LogLevel, RunLogger};

/// Placeholder logged for thinking content, which is never rendered.
const THINKING_PLACEHOLDER: &str = "[thinking]";

/// Decode a byte source into trimmed, non-empty lines.
///
/// The sequence is lazy and single-pass; it ends when the source does, not on
/// any content signal. Invalid UTF-8 is replaced per record so one bad line
/// cannot poison later ones. A final record without a trailing newline is
/// still yielded.
pub fn decode_lines<R>(source: R) -> impl futures_core::Stream<Item = io::Result<String>>
where
    R: AsyncRead + Unpin,
{
    let reader = BufReader::new(source);
    futures_util::stream::unfold(reader, |mut reader| async move {
        loop {
            let mut buf = Vec::new();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => return None,
                Ok(_) => {
                    let decoded = String::from_utf8_lossy(&buf);
                    let trimmed = decoded.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    return Some((Ok(trimmed.to_string()), reader));
                }
                Err(e) => return Some((Err(e), reader)),
            }
        }
    })
}

/// Classifies decoded lines from the primary channel and reports them to the
/// run logger.
///
/// The classifier is linear: the only cross-line state is the caller stopping
/// consumption once a terminal result is returned. Malformed lines are logged
/// and absorbed; they never fail the invocation.
pub struct MessageClassifier<'a> {
    logger: &'a dyn RunLogger,
    fields: LogFields,
}

impl<'a> MessageClassifier<'a> {
    #[must_use]
    pub fn new(logger: &'a dyn RunLogger, fields: LogFields) -> Self {
        Self { logger, fields }
    }

    /// Classify one decoded line.
    ///
    /// Returns the terminal result message when this line ends the stream,
    /// `None` otherwise.
    pub fn classify(&self, line: &str) -> Option<ResultMessage> {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(_) => {
                self.log(
                    LogLevel::Warn,
                    &format!(
                        "Received non-JSON line from stdout: {}",
                        truncate(line, MAX_CONTENT_LEN)
                    ),
                    None,
                );
                return None;
            }
        };
        match StreamMessage::from_value(value) {
            Ok(message) => self.handle(message),
            Err(e) => {
                self.log(
                    LogLevel::Error,
                    &format!(
                        "Failed to process stream line: {}: {e}",
                        truncate(line, MAX_CONTENT_LEN)
                    ),
                    None,
                );
                None
            }
        }
    }

    fn handle(&self, message: StreamMessage) -> Option<ResultMessage> {
        match message {
            StreamMessage::System {
                payload,
                session_id,
            } => {
                let text = match payload.get("cwd").and_then(Value::as_str) {
                    Some(cwd) => format!("System message (cwd: {cwd})"),
                    None => "System message".to_string(),
                };
                self.log(LogLevel::Info, &text, session_id.as_deref());
                None
            }
            StreamMessage::Assistant {
                payload,
                session_id,
            } => {
                self.log_assistant_content(&payload, session_id.as_deref());
                None
            }
            // Echoed input, deliberately silent.
            StreamMessage::User { .. } => None,
            StreamMessage::Result(result) => {
                let preview = match result.result_text() {
                    Some(text) => truncate(text, MAX_CONTENT_LEN),
                    None => truncate(&result.payload.to_string(), MAX_CONTENT_LEN),
                };
                self.log(
                    LogLevel::Info,
                    &format!("Final message received: {preview}"),
                    result.session_id.as_deref(),
                );
                Some(result)
            }
            StreamMessage::Other {
                kind, session_id, ..
            } => {
                self.log(
                    LogLevel::Debug,
                    &format!("Received unhandled message type: {kind}"),
                    session_id.as_deref(),
                );
                None
            }
        }
    }

    fn log_assistant_content(&self, payload: &Value, session_id: Option<&str>) {
        let Some(items) = payload
            .get("message")
            .and_then(|m| m.get("content"))
            .and_then(Value::as_array)
        else {
            return;
        };
        for item in items {
            match item.get("type").and_then(Value::as_str) {
                Some("tool_use") => {
                    let name = item.get("name").and_then(Value::as_str).unwrap_or("unknown");
                    let rendered = item.get("input").map(format_tool_input).unwrap_or_default();
                    self.log(
                        LogLevel::Info,
                        &format!("Tool use: {name} ({})", truncate(&rendered, MAX_CONTENT_LEN)),
                        session_id,
                    );
                }
                Some("text") => {
                    let text = item.get("text").and_then(Value::as_str).unwrap_or_default();
                    if text.trim().is_empty() {
                        continue;
                    }
                    self.log(
                        LogLevel::Info,
                        &format!("Assistant: {}", truncate(text, MAX_CONTENT_LEN)),
                        session_id,
                    );
                }
                Some("thinking") => {
                    self.log(LogLevel::Info, THINKING_PLACEHOLDER, session_id);
                }
                // Unknown content-item kinds are skipped.
                _ => {}
            }
        }
    }

    fn log(&self, level: LogLevel, message: &str, claude_session_id: Option<&str>) {
        let mut fields = self.fields.clone();
        if let Some(id) = claude_session_id {
            fields = fields.with_claude_session(id);
        }
        self.logger.log(level, message, &fields);
    }
}

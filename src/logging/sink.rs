//! Structured log sink for run supervision.

use std::sync::{Mutex, PoisonError};

/// Severity of a run log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Structured fields attached to every run log record.
///
/// `run_session_id` correlates interleaved records from concurrent runs and
/// is always present. The remaining fields are filled in where known:
/// `claude_session_id` once the tool reports its own conversation id,
/// `status` with the current run state, `attempt` inside the retry loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFields {
    pub run_session_id: String,
    pub claude_session_id: Option<String>,
    pub status: Option<&'static str>,
    pub attempt: Option<u32>,
}

impl LogFields {
    /// Create fields carrying only the run session identifier.
    #[must_use]
    pub fn new(run_session_id: impl Into<String>) -> Self {
        Self {
            run_session_id: run_session_id.into(),
            ..Self::default()
        }
    }

    /// Attach the tool's own conversation-session identifier.
    #[must_use]
    pub fn with_claude_session(mut self, id: impl Into<String>) -> Self {
        self.claude_session_id = Some(id.into());
        self
    }

    /// Attach the current run status.
    #[must_use]
    pub fn with_status(mut self, status: &'static str) -> Self {
        self.status = Some(status);
        self
    }

    /// Attach the current attempt number (1-based).
    #[must_use]
    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = Some(attempt);
        self
    }
}

/// Sink for leveled, structured log events emitted while supervising a run.
///
/// Injected into every component that reports progress so tests can
/// substitute [`CapturingLogger`] and assert on the records.
pub trait RunLogger: Send + Sync {
    fn log(&self, level: LogLevel, message: &str, fields: &LogFields);
}

/// Forwards run events to the process-wide `tracing` subscriber.
///
/// Absent optional fields are omitted from the emitted record entirely.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl RunLogger for TracingLogger {
    fn log(&self, level: LogLevel, message: &str, fields: &LogFields) {
        let LogFields {
            run_session_id,
            claude_session_id,
            status,
            attempt,
        } = fields;
        match level {
            LogLevel::Debug => tracing::debug!(
                run_session_id = %run_session_id,
                claude_session_id = claude_session_id.as_deref(),
                status = *status,
                attempt = *attempt,
                "{message}"
            ),
            LogLevel::Info => tracing::info!(
                run_session_id = %run_session_id,
                claude_session_id = claude_session_id.as_deref(),
                status = *status,
                attempt = *attempt,
                "{message}"
            ),
            LogLevel::Warn => tracing::warn!(
                run_session_id = %run_session_id,
                claude_session_id = claude_session_id.as_deref(),
                status = *status,
                attempt = *attempt,
                "{message}"
            ),
            LogLevel::Error => tracing::error!(
                run_session_id = %run_session_id,
                claude_session_id = claude_session_id.as_deref(),
                status = *status,
                attempt = *attempt,
                "{message}"
            ),
        }
    }
}

/// One event captured by [`CapturingLogger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedRecord {
    pub level: LogLevel,
    pub message: String,
    pub fields: LogFields,
}

/// Records log events in memory for test assertions.
#[derive(Debug, Default)]
pub struct CapturingLogger {
    records: Mutex<Vec<CapturedRecord>>,
}

impl CapturingLogger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All records captured so far, in emission order.
    #[must_use]
    pub fn records(&self) -> Vec<CapturedRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Messages captured at the given level, in emission order.
    #[must_use]
    pub fn messages_at(&self, level: LogLevel) -> Vec<String> {
        self.records()
            .into_iter()
            .filter(|r| r.level == level)
            .map(|r| r.message)
            .collect()
    }

    /// Whether any record at `level` contains `needle` in its message.
    #[must_use]
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.records()
            .iter()
            .any(|r| r.level == level && r.message.contains(needle))
    }
}

impl RunLogger for CapturingLogger {
    fn log(&self, level: LogLevel, message: &str, fields: &LogFields) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(CapturedRecord {
                level,
                message: message.to_string(),
                fields: fields.clone(),
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_builder() {
        let fields = LogFields::new("run-1")
            .with_claude_session("conv-9")
            .with_status("attempting")
            .with_attempt(3);
        assert_eq!(fields.run_session_id, "run-1");
        assert_eq!(fields.claude_session_id.as_deref(), Some("conv-9"));
        assert_eq!(fields.status, Some("attempting"));
        assert_eq!(fields.attempt, Some(3));
    }

    #[test]
    fn test_fields_optional_defaults() {
        let fields = LogFields::new("run-2");
        assert!(fields.claude_session_id.is_none());
        assert!(fields.status.is_none());
        assert!(fields.attempt.is_none());
    }

    #[test]
    fn test_capturing_logger_records_in_order() {
        let logger = CapturingLogger::new();
        let fields = LogFields::new("run-3");
        logger.log(LogLevel::Info, "first", &fields);
        logger.log(LogLevel::Warn, "second", &fields);

        let records = logger.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].message, "first");
        assert_eq!(records[0].level, LogLevel::Info);
        assert_eq!(records[1].message, "second");
        assert_eq!(records[1].level, LogLevel::Warn);
    }

    #[test]
    fn test_capturing_logger_level_queries() {
        let logger = CapturingLogger::new();
        let fields = LogFields::new("run-4");
        logger.log(LogLevel::Error, "stderr: boom", &fields);
        logger.log(LogLevel::Info, "fine", &fields);

        assert_eq!(logger.messages_at(LogLevel::Error), vec!["stderr: boom"]);
        assert!(logger.contains(LogLevel::Error, "boom"));
        assert!(!logger.contains(LogLevel::Info, "boom"));
    }

    #[test]
    fn test_tracing_logger_accepts_all_levels() {
        let logger = TracingLogger;
        let fields = LogFields::new("run-5").with_attempt(1);
        logger.log(LogLevel::Debug, "d", &fields);
        logger.log(LogLevel::Info, "i", &fields);
        logger.log(LogLevel::Warn, "w", &fields);
        logger.log(LogLevel::Error, "e", &fields);
    }
}

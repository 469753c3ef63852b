//! Error taxonomy for supervised runs.
//!
//! [`ProcessError`] covers failures of a single invocation, the kind a
//! later attempt may not repeat. [`RunnerError`] is what callers see after
//! the retry schedule has had its say.

use serde_json::Value;

use crate::cli::SpawnError;

/// Diagnostic text the CLI prints when `--continue` finds nothing to resume.
pub const NO_HISTORY_MARKER: &str = "No prior conversation history";

/// A single invocation failed.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    /// The binary could not be started.
    #[error(transparent)]
    Launch(#[from] SpawnError),

    /// The process exited with a non-zero status.
    #[error("Claude exited with code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },

    /// The process exited cleanly without ever sending a result message.
    #[error("Claude exited without a final result message")]
    NoFinalResult,

    /// The final result message reported failure.
    #[error("Claude reported failure ({subtype}): {payload}")]
    FailedResult { subtype: String, payload: Value },
}

impl ProcessError {
    /// Whether this failure says there was no conversation to resume.
    #[must_use]
    pub fn reports_missing_history(&self) -> bool {
        match self {
            Self::NonZeroExit { stderr, .. } => stderr.contains(NO_HISTORY_MARKER),
            Self::FailedResult { payload, .. } => payload.to_string().contains(NO_HISTORY_MARKER),
            Self::Launch(_) | Self::NoFinalResult => false,
        }
    }
}

/// Errors surfaced by [`ClaudeRunner::run`](crate::supervisor::ClaudeRunner::run).
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// One attempt failed. Only seen by callers when retries are disabled
    /// at the call site; the run loop folds these into `RetriesExhausted`.
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// Every attempt failed; wraps the last failure.
    #[error("All {attempts} attempts failed: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: ProcessError,
    },

    /// Reading the child's output failed mid-stream.
    #[error("Failed to read process output: {0}")]
    Io(#[from] std::io::Error),

    /// Process stdout was not available.
    #[error("Process stdout not available")]
    NoStdout,

    /// Process stderr was not available.
    #[error("Process stderr not available")]
    NoStderr,

    /// The run was cancelled before completion.
    #[error("Run cancelled")]
    Cancelled,
}

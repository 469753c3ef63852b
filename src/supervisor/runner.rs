//! Retrying runner for Claude invocations.
//!
//! This module connects the process spawner, output collector, and retry
//! schedule: one `run` call drives a prompt through as many attempts as
//! the configuration allows and hands back the final result text.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::cli::{collect_output, ClaudeCommand, ClaudeProcess, DEFAULT_BINARY};
use crate::config::RunConfig;
use crate::logging::{LogFields, LogLevel, RunLogger, TracingLogger};
use crate::supervisor::{
    backoff_delay, AllowedToolsPolicy, DefaultToolsPolicy, ProcessError, RunState,
    RunStateTracker, RunnerError,
};

/// Default timeout for graceful process termination.
pub const DEFAULT_TERMINATE_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs Claude invocations with retries, backoff, and structured logging.
pub struct ClaudeRunner {
    binary: String,
    policy: Arc<dyn AllowedToolsPolicy>,
    logger: Arc<dyn RunLogger>,
    run_limit: Option<Arc<Semaphore>>,
}

impl Default for ClaudeRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ClaudeRunner {
    /// Create a runner with the built-in allowlists, logging through
    /// `tracing`, invoking `claude` from `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            binary: DEFAULT_BINARY.to_string(),
            policy: Arc::new(DefaultToolsPolicy),
            logger: Arc::new(TracingLogger),
            run_limit: None,
        }
    }

    /// Invoke a different binary than `claude` from `PATH`.
    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Replace the tool allowlist policy.
    #[must_use]
    pub fn with_policy(mut self, policy: Arc<dyn AllowedToolsPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the run logger.
    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn RunLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Cap the number of runs executing at once; further `run` calls wait.
    #[must_use]
    pub fn with_run_limit(mut self, limit: usize) -> Self {
        self.run_limit = Some(Arc::new(Semaphore::new(limit)));
        self
    }

    /// Binary this runner invokes.
    #[must_use]
    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Run one prompt to completion, retrying failed attempts.
    ///
    /// Returns the final result text on success.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::RetriesExhausted`] once every attempt has
    /// failed, or an I/O error immediately if the child's output cannot
    /// be read.
    pub async fn run(&self, config: RunConfig) -> Result<String, RunnerError> {
        self.run_inner(config, None).await
    }

    /// Like [`run`](Self::run), stopping early when the token fires.
    ///
    /// A live child process is terminated gracefully before the call
    /// returns [`RunnerError::Cancelled`].
    ///
    /// # Errors
    ///
    /// As [`run`](Self::run), plus [`RunnerError::Cancelled`].
    pub async fn run_with_cancellation(
        &self,
        config: RunConfig,
        cancel: CancellationToken,
    ) -> Result<String, RunnerError> {
        self.run_inner(config, Some(cancel)).await
    }

    async fn run_inner(
        &self,
        config: RunConfig,
        cancel: Option<CancellationToken>,
    ) -> Result<String, RunnerError> {
        let _permit = match &self.run_limit {
            Some(limit) => Some(
                Arc::clone(limit)
                    .acquire_owned()
                    .await
                    .map_err(|_| RunnerError::Cancelled)?,
            ),
            None => None,
        };

        let run_session_id = Uuid::new_v4().to_string();
        let fields = LogFields::new(&run_session_id);
        let mut state = RunStateTracker::new();

        let total_attempts = config.retries.saturating_add(1);
        self.logger.log(
            LogLevel::Info,
            "Starting Claude run",
            &fields.clone().with_status("started"),
        );

        loop {
            state.transition(RunState::Attempting);
            state.record_attempt();
            let attempt = state.attempts();

            let attempt_fields = fields.clone().with_attempt(attempt);
            self.logger.log(
                LogLevel::Info,
                &format!("Claude attempt {attempt}/{total_attempts}"),
                &attempt_fields,
            );

            let error = match self
                .attempt_with_fallback(&config, &attempt_fields, cancel.as_ref())
                .await
            {
                Ok(result) => {
                    state.transition(RunState::Succeeded);
                    self.logger.log(
                        LogLevel::Info,
                        "Claude run succeeded",
                        &attempt_fields.clone().with_status(state.state().label()),
                    );
                    return Ok(result);
                }
                Err(RunnerError::Process(error)) => error,
                Err(other) => return Err(other),
            };

            self.logger.log(
                LogLevel::Warn,
                &format!("Attempt {attempt}/{total_attempts} failed: {error}"),
                &attempt_fields.clone().with_status("failed"),
            );

            if attempt >= total_attempts {
                state.transition(RunState::Exhausted);
                self.logger.log(
                    LogLevel::Error,
                    &format!("All {attempt} attempts failed"),
                    &fields.clone().with_status(state.state().label()),
                );
                return Err(RunnerError::RetriesExhausted {
                    attempts: attempt,
                    source: error,
                });
            }

            state.transition(RunState::Retrying);
            let delay = backoff_delay(attempt);
            self.logger.log(
                LogLevel::Info,
                &format!("Retrying in {}s", delay.as_secs()),
                &attempt_fields.clone().with_status(state.state().label()),
            );
            if let Some(cancel) = &cancel {
                tokio::select! {
                    biased;

                    () = cancel.cancelled() => return Err(RunnerError::Cancelled),
                    () = tokio::time::sleep(delay) => {}
                }
            } else {
                tokio::time::sleep(delay).await;
            }
        }
    }

    /// One attempt, with a fresh-start fallback when resuming finds no
    /// history. The fallback runs immediately and consumes no retry slot.
    async fn attempt_with_fallback(
        &self,
        config: &RunConfig,
        fields: &LogFields,
        cancel: Option<&CancellationToken>,
    ) -> Result<String, RunnerError> {
        let first = self
            .invoke_once(config, config.continue_conversation, fields, cancel)
            .await;

        match first {
            Err(RunnerError::Process(ref error))
                if config.continue_conversation && error.reports_missing_history() =>
            {
                self.logger.log(
                    LogLevel::Warn,
                    "No conversation history to continue, starting fresh",
                    fields,
                );
                self.invoke_once(config, false, fields, cancel).await
            }
            other => other,
        }
    }

    async fn invoke_once(
        &self,
        config: &RunConfig,
        continue_conversation: bool,
        fields: &LogFields,
        cancel: Option<&CancellationToken>,
    ) -> Result<String, RunnerError> {
        if cancel.is_some_and(|c| c.is_cancelled()) {
            return Err(RunnerError::Cancelled);
        }

        let mut command = ClaudeCommand::new(&config.prompt)
            .model(config.model.cli_name())
            .allowed_tools(self.policy.allowed_tools(config.permissions))
            .continue_conversation(continue_conversation)
            .bypass_permissions(config.permissions.bypasses_permissions());
        if let Some(dir) = &config.working_dir {
            command = command.working_dir(dir);
        }

        let mut process =
            ClaudeProcess::spawn(&self.binary, &command).map_err(ProcessError::Launch)?;
        tracing::debug!(pid = ?process.id(), "Spawned Claude process");

        let stdout = process.take_stdout().ok_or(RunnerError::NoStdout)?;
        let stderr = process.take_stderr().ok_or(RunnerError::NoStderr)?;

        let collected = if let Some(cancel) = cancel {
            tokio::select! {
                biased;

                () = cancel.cancelled() => {
                    self.logger.log(LogLevel::Info, "Run cancelled, terminating Claude", fields);
                    process.graceful_terminate(DEFAULT_TERMINATE_TIMEOUT).await?;
                    return Err(RunnerError::Cancelled);
                }
                collected = collect_output(stdout, stderr, self.logger.as_ref(), fields) => {
                    collected?
                }
            }
        } else {
            collect_output(stdout, stderr, self.logger.as_ref(), fields).await?
        };

        // The child can close both pipes and keep running; waiting for it
        // is a suspension point and must honor cancellation too.
        let status = if let Some(cancel) = cancel {
            tokio::select! {
                biased;

                () = cancel.cancelled() => {
                    self.logger.log(LogLevel::Info, "Run cancelled, terminating Claude", fields);
                    process.graceful_terminate(DEFAULT_TERMINATE_TIMEOUT).await?;
                    return Err(RunnerError::Cancelled);
                }
                status = process.wait() => status?,
            }
        } else {
            process.wait().await?
        };

        if !status.success() {
            let code = status.code().unwrap_or(-1);
            return Err(ProcessError::NonZeroExit {
                code,
                stderr: collected.diagnostics,
            }
            .into());
        }

        let Some(result) = collected.result else {
            return Err(ProcessError::NoFinalResult.into());
        };

        if !result.is_success() {
            return Err(ProcessError::FailedResult {
                subtype: result.subtype,
                payload: result.payload,
            }
            .into());
        }

        Ok(result.result_text().unwrap_or_default().to_string())
    }
}

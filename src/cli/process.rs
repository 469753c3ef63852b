//! Subprocess spawning and control for supervised invocations.
//!
//! [`ClaudeCommand`] assembles the argument vector for one attempt;
//! [`ClaudeProcess`] owns the running child and its pipes.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::{Child, ChildStderr, ChildStdout, Command};

/// Binary invoked when the caller does not override it.
pub const DEFAULT_BINARY: &str = "claude";

/// Error type for process spawning operations.
#[derive(thiserror::Error, Debug)]
pub enum SpawnError {
    /// The binary was not found.
    #[error("Binary not found: {binary}")]
    NotFound { binary: String },
    /// Permission denied when spawning.
    #[error("Permission denied spawning: {binary}")]
    PermissionDenied { binary: String },
    /// Other I/O error.
    #[error("I/O error spawning {binary}: {source}")]
    Io {
        binary: String,
        source: std::io::Error,
    },
}

impl SpawnError {
    /// Create a `SpawnError` from an I/O error, classifying common cases.
    fn from_io(binary: &str, err: std::io::Error) -> Self {
        let binary = binary.to_string();
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound { binary },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { binary },
            _ => Self::Io {
                binary,
                source: err,
            },
        }
    }
}

/// Builder for one invocation's command-line arguments.
#[derive(Debug, Clone, Default)]
pub struct ClaudeCommand {
    prompt: String,
    model: String,
    allowed_tools: Vec<String>,
    continue_conversation: bool,
    bypass_permissions: bool,
    working_dir: Option<PathBuf>,
}

impl ClaudeCommand {
    /// Create a new command for the given prompt.
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    /// Set the model identifier passed to `--model`.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the allowed tools, joined with commas for `--allowedTools`.
    #[must_use]
    pub fn allowed_tools(mut self, tools: Vec<String>) -> Self {
        self.allowed_tools = tools;
        self
    }

    /// Request continuation of the previous conversation.
    #[must_use]
    pub fn continue_conversation(mut self, enabled: bool) -> Self {
        self.continue_conversation = enabled;
        self
    }

    /// Bypass the tool's own permission prompts.
    #[must_use]
    pub fn bypass_permissions(mut self, enabled: bool) -> Self {
        self.bypass_permissions = enabled;
        self
    }

    /// Set the working directory for the spawned process.
    #[must_use]
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Build the command-line arguments.
    ///
    /// The continuation flag, when requested, comes first; the
    /// permission-bypass flag, when requested, comes last.
    #[must_use]
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.continue_conversation {
            args.push("--continue".to_string());
        }
        args.extend([
            "-p".to_string(),
            self.prompt.clone(),
            "--output-format".to_string(),
            "stream-json".to_string(),
            "--model".to_string(),
            self.model.clone(),
            "--verbose".to_string(),
            "--allowedTools".to_string(),
            self.allowed_tools.join(","),
        ]);
        if self.bypass_permissions {
            args.push("--dangerously-skip-permissions".to_string());
        }
        args
    }
}

/// A running supervised process.
#[derive(Debug)]
pub struct ClaudeProcess {
    child: Child,
}

impl ClaudeProcess {
    /// Spawn the process described by `command` using `binary`.
    ///
    /// Both output channels are piped; stdin is closed. The environment is
    /// inherited from this process. The child is killed if the handle is
    /// dropped before it exits, so an abandoned invocation cannot leak.
    ///
    /// # Errors
    ///
    /// Returns `SpawnError` if the process fails to spawn.
    pub fn spawn(binary: &str, command: &ClaudeCommand) -> Result<Self, SpawnError> {
        let args = command.build_args();

        let mut cmd = Command::new(binary);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(ref dir) = command.working_dir {
            cmd.current_dir(dir);
        }

        let child = cmd.spawn().map_err(|e| SpawnError::from_io(binary, e))?;

        Ok(Self { child })
    }

    /// Take ownership of the stdout handle.
    ///
    /// This can only be called once; subsequent calls return `None`.
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.stdout.take()
    }

    /// Take ownership of the stderr handle.
    ///
    /// This can only be called once; subsequent calls return `None`.
    pub fn take_stderr(&mut self) -> Option<ChildStderr> {
        self.child.stderr.take()
    }

    /// Get the process ID, if still running.
    #[must_use]
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Wait for the process to exit.
    ///
    /// # Errors
    ///
    /// Returns an error if waiting fails.
    pub async fn wait(&mut self) -> std::io::Result<ExitStatus> {
        self.child.wait().await
    }

    /// Forcefully kill the process.
    ///
    /// # Errors
    ///
    /// Returns an error if the kill signal cannot be sent.
    pub async fn kill(&mut self) -> std::io::Result<()> {
        self.child.kill().await
    }

    /// Attempt graceful termination with a timeout.
    ///
    /// On Unix, sends SIGTERM first, then SIGKILL after the timeout.
    /// On other platforms, falls back to immediate kill.
    ///
    /// # Errors
    ///
    /// Returns an error if termination fails.
    pub async fn graceful_terminate(&mut self, timeout: Duration) -> std::io::Result<()> {
        #[cfg(unix)]
        {
            self.graceful_terminate_unix(timeout).await
        }

        #[cfg(not(unix))]
        {
            let _ = timeout;
            self.kill().await
        }
    }

    #[cfg(unix)]
    async fn graceful_terminate_unix(&mut self, timeout: Duration) -> std::io::Result<()> {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        if let Some(pid) = self.id() {
            let nix_pid = Pid::from_raw(i32::try_from(pid).unwrap_or(i32::MAX));
            let _ = kill(nix_pid, Signal::SIGTERM);

            match tokio::time::timeout(timeout, self.child.wait()).await {
                Ok(Ok(_)) => Ok(()),
                Ok(Err(e)) => Err(e),
                // Timeout elapsed, force kill.
                Err(_) => self.child.kill().await,
            }
        } else {
            // Process already exited.
            Ok(())
        }
    }
}

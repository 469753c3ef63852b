//! Configuration types for supervised runs.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::supervisor::FilePermissions;

/// Default retry budget: total attempts are `retries + 1`.
pub const DEFAULT_RETRIES: u32 = 2;

/// Model selected for a run, by CLI identifier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ClaudeModel {
    Opus,
    #[default]
    Sonnet,
    Haiku,
}

impl ClaudeModel {
    /// Identifier passed to the tool's `--model` flag.
    #[must_use]
    pub fn cli_name(self) -> &'static str {
        match self {
            Self::Opus => "opus",
            Self::Sonnet => "sonnet",
            Self::Haiku => "haiku",
        }
    }
}

/// Immutable description of one supervised run.
///
/// Built with [`RunConfig::new`] plus the builder methods, then passed by
/// value into each invocation; the runner never mutates it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunConfig {
    /// Prompt text passed to the tool.
    pub prompt: String,
    /// Permission mode for this run.
    #[serde(default)]
    pub permissions: FilePermissions,
    /// Retry budget.
    #[serde(default = "default_retries")]
    pub retries: u32,
    /// Model identifier.
    #[serde(default)]
    pub model: ClaudeModel,
    /// Working directory for the spawned tool; `None` inherits ours.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
    /// Continue the previous conversation.
    #[serde(default)]
    pub continue_conversation: bool,
}

fn default_retries() -> u32 {
    DEFAULT_RETRIES
}

impl RunConfig {
    /// Create a run configuration with defaults for the given prompt.
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            permissions: FilePermissions::default(),
            retries: DEFAULT_RETRIES,
            model: ClaudeModel::default(),
            working_dir: None,
            continue_conversation: false,
        }
    }

    /// Set the permission mode.
    #[must_use]
    pub fn permissions(mut self, permissions: FilePermissions) -> Self {
        self.permissions = permissions;
        self
    }

    /// Set the retry budget. Negative values are clamped to zero.
    #[must_use]
    pub fn retries(mut self, retries: i64) -> Self {
        self.retries = u32::try_from(retries.max(0)).unwrap_or(u32::MAX);
        self
    }

    /// Set the model.
    #[must_use]
    pub fn model(mut self, model: ClaudeModel) -> Self {
        self.model = model;
        self
    }

    /// Set the working directory for the spawned tool.
    #[must_use]
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Continue the previous conversation instead of starting fresh.
    #[must_use]
    pub fn continue_conversation(mut self, enabled: bool) -> Self {
        self.continue_conversation = enabled;
        self
    }
}

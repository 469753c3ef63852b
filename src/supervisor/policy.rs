//! Tool allowlists by permission mode.

use serde::{Deserialize, Serialize};

/// File-permission mode granted to a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilePermissions {
    /// Inspection tools only; the working tree cannot be modified.
    #[default]
    ReadOnly,
    /// Full tool set with permission prompts bypassed.
    FullAccess,
}

impl FilePermissions {
    /// Whether runs in this mode skip interactive permission prompts.
    #[must_use]
    pub fn bypasses_permissions(self) -> bool {
        matches!(self, Self::FullAccess)
    }
}

/// Tools granted to read-only runs.
const READ_ONLY_TOOLS: &[&str] = &[
    "Read",
    "LS",
    "Glob",
    "Grep",
    "WebFetch",
    "WebSearch",
    "Bash",
    "TodoRead",
    "Agent",
];

/// Tools granted to full-access runs.
const FULL_ACCESS_TOOLS: &[&str] = &[
    "Read",
    "LS",
    "Glob",
    "Grep",
    "Write",
    "Edit",
    "MultiEdit",
    "Bash",
    "NotebookRead",
    "NotebookEdit",
    "TodoRead",
    "TodoWrite",
    "WebFetch",
    "WebSearch",
    "Agent",
];

/// Maps a permission mode to the tool names handed to the CLI.
///
/// Injected into the runner so deployments can narrow or extend the
/// built-in lists without forking the invocation code.
pub trait AllowedToolsPolicy: Send + Sync {
    /// Tool names for `--allowedTools`, in the order they are passed.
    fn allowed_tools(&self, permissions: FilePermissions) -> Vec<String>;
}

/// Built-in allowlists.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultToolsPolicy;

impl AllowedToolsPolicy for DefaultToolsPolicy {
    fn allowed_tools(&self, permissions: FilePermissions) -> Vec<String> {
        let tools = match permissions {
            FilePermissions::ReadOnly => READ_ONLY_TOOLS,
            FilePermissions::FullAccess => FULL_ACCESS_TOOLS,
        };
        tools.iter().map(|t| (*t).to_string()).collect()
    }
}

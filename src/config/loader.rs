//! Settings file loader.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::types::{ClaudeModel, DEFAULT_RETRIES};
use crate::cli::DEFAULT_BINARY;

/// Settings that apply to every run started by this process.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunnerSettings {
    /// Binary to invoke.
    pub binary: String,
    /// Model used when the command line does not pick one.
    pub model: ClaudeModel,
    /// Retry budget used when the command line does not pick one.
    pub retries: u32,
    /// Mirror log records to this file as JSON lines.
    pub log_file: Option<PathBuf>,
    /// Cap on concurrently running invocations.
    pub run_limit: Option<usize>,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            binary: DEFAULT_BINARY.to_string(),
            model: ClaudeModel::default(),
            retries: DEFAULT_RETRIES,
            log_file: None,
            run_limit: None,
        }
    }
}

/// Settings loader that searches multiple locations.
#[derive(Debug)]
pub struct ConfigLoader {
    /// Search paths in order of priority.
    search_paths: Vec<PathBuf>,
}

impl ConfigLoader {
    /// Create a new loader with default search paths.
    #[must_use]
    pub fn new() -> Self {
        let mut search_paths = Vec::new();

        // 1. Current directory: .claude-runner.toml
        search_paths.push(PathBuf::from(".claude-runner.toml"));

        // 2. User config directory: ~/.config/claude-runner/config.toml
        if let Some(config_dir) = dirs::config_dir() {
            search_paths.push(config_dir.join("claude-runner").join("config.toml"));
        }

        Self { search_paths }
    }

    /// Create a loader with a specific settings file path.
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            search_paths: vec![path],
        }
    }

    /// Load settings from the first available file, or return defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a settings file exists but cannot be parsed.
    pub fn load(&self) -> Result<RunnerSettings, ConfigError> {
        for path in &self.search_paths {
            if path.exists() {
                tracing::debug!(path = %path.display(), "Loading settings file");
                return Self::load_from_path(path);
            }
        }

        tracing::debug!("No settings file found, using defaults");
        Ok(RunnerSettings::default())
    }

    /// Load settings from a specific path.
    fn load_from_path(path: &PathBuf) -> Result<RunnerSettings, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.clone(),
            source: e,
        })
    }

    /// Get the search paths for debugging.
    #[must_use]
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur while loading settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

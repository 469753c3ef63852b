//! Process-wide logging setup.

use std::path::{Path, PathBuf};

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::{Layer as _, SubscriberExt as _};
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::EnvFilter;

use super::format::ConsoleFormat;

/// Options for [`init_logging`].
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// Console verbosity: 0 warn, 1 info, 2 debug, 3+ trace.
    /// `RUST_LOG` overrides this mapping when set.
    pub verbosity: u8,
    /// Optional JSONL log file (daily-rotated); parent directories are
    /// created. The file layer records at debug level regardless of console
    /// verbosity.
    pub log_file: Option<PathBuf>,
}

/// Errors raised while preparing log output.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to create log directory {path}: {source}")]
    CreateLogDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Initialize process-wide logging. Repeated calls are no-ops.
///
/// # Errors
///
/// Returns an error if the log file's parent directory cannot be created.
pub fn init_logging(options: &LogOptions) -> Result<(), LoggingError> {
    let level = match options.verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console_layer = tracing_subscriber::fmt::layer()
        .event_format(ConsoleFormat)
        .with_writer(std::io::stderr)
        .with_filter(filter);

    if let Some(path) = &options.log_file {
        let (dir, file_name) = split_log_path(path)?;
        let writer = tracing_appender::rolling::daily(dir, file_name);
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_ansi(false)
            .with_writer(writer)
            .with_filter(LevelFilter::DEBUG);
        let _ = tracing_subscriber::registry()
            .with(console_layer)
            .with(json_layer)
            .try_init();
    } else {
        let _ = tracing_subscriber::registry().with(console_layer).try_init();
    }
    Ok(())
}

fn split_log_path(path: &Path) -> Result<(&Path, &str), LoggingError> {
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(dir) = parent {
        std::fs::create_dir_all(dir).map_err(|source| LoggingError::CreateLogDir {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    let dir = parent.unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("claude-runner.log");
    Ok((dir, file_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_log_path_bare_file_name() {
        let (dir, name) = split_log_path(Path::new("runner.log")).unwrap();
        assert_eq!(dir, Path::new("."));
        assert_eq!(name, "runner.log");
    }

    #[test]
    fn test_split_log_path_creates_parent() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("logs").join("runner.log");
        let (dir, name) = split_log_path(&nested).unwrap();
        assert_eq!(dir, tmp.path().join("logs"));
        assert_eq!(name, "runner.log");
        assert!(tmp.path().join("logs").is_dir());
    }
}

//! Claude Runner - Supervised Claude Code invocations with retries.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;

use claude_runner::config::{ClaudeModel, ConfigLoader, RunConfig};
use claude_runner::logging::{init_logging, LogOptions};
use claude_runner::supervisor::{ClaudeRunner, FilePermissions};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PermissionsArg {
    ReadOnly,
    FullAccess,
}

impl From<PermissionsArg> for FilePermissions {
    fn from(arg: PermissionsArg) -> Self {
        match arg {
            PermissionsArg::ReadOnly => FilePermissions::ReadOnly,
            PermissionsArg::FullAccess => FilePermissions::FullAccess,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModelArg {
    Opus,
    Sonnet,
    Haiku,
}

impl From<ModelArg> for ClaudeModel {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::Opus => ClaudeModel::Opus,
            ModelArg::Sonnet => ClaudeModel::Sonnet,
            ModelArg::Haiku => ClaudeModel::Haiku,
        }
    }
}

#[derive(Parser)]
#[command(
    name = "claude-runner",
    about = "Supervised Claude Code invocations with retries",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Settings file to use instead of the default search paths.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Mirror log records to this JSONL file.
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a prompt through Claude, retrying failed attempts.
    Run {
        /// The prompt to execute.
        prompt: String,
        /// File permissions granted to the run.
        #[arg(short, long, value_enum, default_value_t = PermissionsArg::ReadOnly)]
        permissions: PermissionsArg,
        /// Retry budget; total attempts are retries + 1.
        #[arg(short, long)]
        retries: Option<i64>,
        /// Model to use.
        #[arg(short, long, value_enum)]
        model: Option<ModelArg>,
        /// Working directory for the Claude process.
        #[arg(long)]
        cwd: Option<PathBuf>,
        /// Continue the most recent conversation.
        #[arg(long = "continue")]
        continue_conversation: bool,
        /// Claude binary to invoke.
        #[arg(long)]
        binary: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loader = match cli.config {
        Some(ref path) => ConfigLoader::with_path(path.clone()),
        None => ConfigLoader::new(),
    };
    let settings = match loader.load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };

    let options = LogOptions {
        verbosity: cli.verbose,
        log_file: cli.log_file.or_else(|| settings.log_file.clone()),
    };
    if let Err(e) = init_logging(&options) {
        eprintln!("Failed to initialize logging: {e}");
        std::process::exit(2);
    }

    match cli.command {
        Commands::Run {
            prompt,
            permissions,
            retries,
            model,
            cwd,
            continue_conversation,
            binary,
        } => {
            let mut config = RunConfig::new(prompt)
                .permissions(permissions.into())
                .retries(retries.unwrap_or_else(|| i64::from(settings.retries)))
                .model(model.map_or(settings.model, Into::into))
                .continue_conversation(continue_conversation);
            if let Some(dir) = cwd {
                config = config.working_dir(dir);
            }

            let mut runner =
                ClaudeRunner::new().with_binary(binary.unwrap_or_else(|| settings.binary.clone()));
            if let Some(limit) = settings.run_limit {
                runner = runner.with_run_limit(limit);
            }

            let cancel = CancellationToken::new();
            let signal_cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Interrupt received, cancelling run");
                    signal_cancel.cancel();
                }
            });

            match runner.run_with_cancellation(config, cancel).await {
                Ok(result) => println!("{result}"),
                Err(e) => {
                    tracing::error!(error = %e, "Run failed");
                    std::process::exit(1);
                }
            }
        }
    }
}

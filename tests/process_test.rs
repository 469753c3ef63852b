//! Tests for Claude process spawning and control.

use claude_runner::cli::{ClaudeCommand, ClaudeProcess, SpawnError};

#[test]
fn command_args_follow_cli_contract() {
    let command = ClaudeCommand::new("Fix the bug")
        .model("sonnet")
        .allowed_tools(vec!["Read".to_string(), "Grep".to_string()]);

    assert_eq!(
        command.build_args(),
        vec![
            "-p",
            "Fix the bug",
            "--output-format",
            "stream-json",
            "--model",
            "sonnet",
            "--verbose",
            "--allowedTools",
            "Read,Grep",
        ]
    );
}

#[test]
fn continue_flag_comes_first() {
    let args = ClaudeCommand::new("task")
        .model("sonnet")
        .continue_conversation(true)
        .build_args();

    assert_eq!(args.first().map(String::as_str), Some("--continue"));
    assert!(args.contains(&"-p".to_string()));
}

#[test]
fn bypass_flag_comes_last() {
    let args = ClaudeCommand::new("task")
        .model("sonnet")
        .bypass_permissions(true)
        .build_args();

    assert_eq!(
        args.last().map(String::as_str),
        Some("--dangerously-skip-permissions")
    );
}

#[test]
fn continue_and_bypass_bracket_the_args() {
    let args = ClaudeCommand::new("task")
        .model("opus")
        .continue_conversation(true)
        .bypass_permissions(true)
        .build_args();

    assert_eq!(args.first().map(String::as_str), Some("--continue"));
    assert_eq!(
        args.last().map(String::as_str),
        Some("--dangerously-skip-permissions")
    );
}

#[test]
fn flags_absent_by_default() {
    let args = ClaudeCommand::new("task").model("sonnet").build_args();

    assert!(!args.contains(&"--continue".to_string()));
    assert!(!args.contains(&"--dangerously-skip-permissions".to_string()));
}

#[test]
fn empty_tool_list_still_passes_flag() {
    let args = ClaudeCommand::new("task").model("sonnet").build_args();

    let position = args
        .iter()
        .position(|a| a == "--allowedTools")
        .expect("missing --allowedTools");
    assert_eq!(args[position + 1], "");
}

#[test]
fn spawn_missing_binary_is_not_found() {
    let command = ClaudeCommand::new("task").model("sonnet");
    let err = ClaudeProcess::spawn("/nonexistent/claude-binary", &command).unwrap_err();

    assert!(matches!(err, SpawnError::NotFound { .. }));
    assert!(err.to_string().contains("/nonexistent/claude-binary"));
}

#[tokio::test]
async fn spawn_echo_and_wait() {
    let command = ClaudeCommand::new("ignored").model("sonnet");
    let mut process = ClaudeProcess::spawn("echo", &command).unwrap();

    assert!(process.id().is_some());

    let status = process.wait().await.unwrap();
    assert!(status.success());
}

#[tokio::test]
async fn take_pipes_once() {
    let command = ClaudeCommand::new("hello").model("sonnet");
    let mut process = ClaudeProcess::spawn("echo", &command).unwrap();

    assert!(process.take_stdout().is_some());
    assert!(process.take_stdout().is_none());
    assert!(process.take_stderr().is_some());
    assert!(process.take_stderr().is_none());

    process.wait().await.unwrap();
}

// The remaining tests drive real child processes through stub scripts that
// ignore the Claude argument list.
#[cfg(unix)]
mod unix {
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    use super::*;

    fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        use std::io::Write as _;
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "#!/bin/sh\n{body}").unwrap();
        drop(file);
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[tokio::test]
    async fn kill_running_process() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "hang.sh", "sleep 10");

        let command = ClaudeCommand::new("task").model("sonnet");
        let mut process = ClaudeProcess::spawn(script.to_str().unwrap(), &command).unwrap();

        process.kill().await.unwrap();

        let status = process.wait().await.unwrap();
        assert!(!status.success());
    }

    #[tokio::test]
    async fn graceful_terminate_stops_hung_process() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "hang.sh", "sleep 10");

        let command = ClaudeCommand::new("task").model("sonnet");
        let mut process = ClaudeProcess::spawn(script.to_str().unwrap(), &command).unwrap();

        let result = process.graceful_terminate(Duration::from_millis(500)).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn spawn_applies_working_dir() {
        use tokio::io::AsyncReadExt;

        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "print-cwd.sh", "pwd");
        let work_dir = dir.path().canonicalize().unwrap();

        let command = ClaudeCommand::new("ignored")
            .model("sonnet")
            .working_dir(&work_dir);
        let mut process = ClaudeProcess::spawn(script.to_str().unwrap(), &command).unwrap();

        let mut stdout = process.take_stdout().unwrap();
        let mut output = String::new();
        stdout.read_to_string(&mut output).await.unwrap();
        process.wait().await.unwrap();

        assert_eq!(output.trim(), work_dir.to_str().unwrap());
    }
}

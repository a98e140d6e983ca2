//! Tests for running built git commands as subprocesses
//!
//! These use the real git executable, like the end-to-end fetch tests, or a
//! shell script standing in for it when the test needs a slow subprocess.

use core::time::Duration;
use gitrip::error::FetchError;
use gitrip::git::{DiagnosticSink, ExecContext, GitCommand, execute};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command as StdCommand;
use std::time::Instant;
use tempfile::TempDir;

/// Repository with a single commit
fn init_repo() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let git = |args: &[&str]| {
        let output = StdCommand::new("git")
            .args(["-c", "user.email=test@test.com", "-c", "user.name=Test User"])
            .args(args)
            .current_dir(temp_dir.path())
            .output()
            .unwrap();
        assert!(output.status.success(), "git {args:?} failed");
    };

    git(&["init", "--quiet"]);
    fs::create_dir_all(temp_dir.path().join("docs")).unwrap();
    fs::write(temp_dir.path().join("docs/guide.md"), "# Guide\n").unwrap();
    git(&["add", "."]);
    git(&["commit", "--quiet", "-m", "Initial commit"]);
    temp_dir
}

/// Executable shell script at `<dir>/git` running `body`
#[cfg(unix)]
fn stand_in_git(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt as _;

    let path = dir.join("git");
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[tokio::test]
async fn test_failed_pre_exec_action_spawns_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let blocker = temp_dir.path().join("blocker");
    fs::write(&blocker, b"not a directory").unwrap();

    let spec = GitCommand::shallow_clone("file:///nowhere/owner/repo.git", blocker.join("repo"))
        .to_spec();
    let err = execute(&spec, None, &ExecContext::new()).await.unwrap_err();

    match &err {
        FetchError::PreExecutionActionFailed {
            command_line, path, ..
        } => {
            assert!(command_line.starts_with("git clone --depth 1 --no-checkout"));
            assert_eq!(path, &blocker.join("repo"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.exit_code(), 5);
}

#[tokio::test]
async fn test_relative_pre_exec_path_is_resolved_against_cwd() {
    let temp_dir = TempDir::new().unwrap();
    let spec = GitCommand::shallow_clone("file:///nowhere/owner/repo.git", "nested/repo").to_spec();

    // The clone itself fails: the remote does not exist
    let err = execute(&spec, Some(temp_dir.path()), &ExecContext::new())
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::SubprocessFailed { .. }), "{err}");
    assert!(temp_dir.path().join("nested/repo").is_dir());
}

#[tokio::test]
async fn test_non_zero_exit_carries_command_line_and_diagnostics() {
    let repo = init_repo();
    let spec = GitCommand::checkout("nope").to_spec();

    let err = execute(&spec, Some(repo.path()), &ExecContext::new())
        .await
        .unwrap_err();

    match &err {
        FetchError::SubprocessFailed {
            command_line,
            status,
            stderr,
        } => {
            assert_eq!(command_line, "git checkout nope");
            assert!(status.is_some_and(|code| code != 0));
            assert!(stderr.contains("nope"), "stderr: {stderr}");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.exit_code(), 4);
    assert_eq!(err.command_line(), Some("git checkout nope"));
}

#[tokio::test]
async fn test_successful_command_returns_output() {
    let repo = init_repo();
    let spec = GitCommand::sparse_set(["docs/"]).to_spec();

    let result = execute(&spec, Some(repo.path()), &ExecContext::new())
        .await
        .unwrap();

    assert_eq!(result.command_line, "git sparse-checkout set --no-cone docs/");
    let sparse_file = fs::read_to_string(repo.path().join(".git/info/sparse-checkout")).unwrap();
    assert!(sparse_file.contains("docs/"));
}

#[tokio::test]
async fn test_cancelled_context_runs_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let dest = temp_dir.path().join("clone");
    let ctx = ExecContext::new();
    ctx.cancel_token().cancel();

    let spec = GitCommand::shallow_clone("file:///nowhere/owner/repo.git", &dest).to_spec();
    let err = execute(&spec, None, &ctx).await.unwrap_err();

    assert!(matches!(err, FetchError::Cancelled { .. }), "{err}");
    assert_eq!(err.exit_code(), 130);
    assert!(!dest.exists());
}

#[tokio::test]
async fn test_passthrough_still_captures_diagnostics() {
    let repo = init_repo();
    let spec = GitCommand::checkout("nope").to_spec();
    let ctx = ExecContext::new().with_sink(DiagnosticSink::Passthrough);

    let err = execute(&spec, Some(repo.path()), &ctx).await.unwrap_err();

    match err {
        FetchError::SubprocessFailed { stderr, .. } => {
            assert!(stderr.contains("pathspec 'nope' did not match"), "stderr: {stderr}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[cfg(unix)]
#[tokio::test]
async fn test_timeout_kills_running_subprocess() {
    let bin = TempDir::new().unwrap();
    let program = stand_in_git(bin.path(), "exec sleep 30");
    let spec = GitCommand::checkout("main").to_spec().with_program(program.to_string_lossy());
    let ctx = ExecContext::new().with_timeout(Some(Duration::from_secs(1)));

    let started = Instant::now();
    let err = execute(&spec, None, &ctx).await.unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(10), "{:?}", started.elapsed());
    match &err {
        FetchError::TimedOut {
            command_line,
            seconds,
        } => {
            assert!(command_line.ends_with("git checkout main"));
            assert_eq!(*seconds, 1);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.exit_code(), 124);
}

#[cfg(unix)]
#[tokio::test]
async fn test_cancel_kills_running_subprocess() {
    let bin = TempDir::new().unwrap();
    let program = stand_in_git(bin.path(), "exec sleep 30");
    let spec = GitCommand::checkout("main").to_spec().with_program(program.to_string_lossy());
    let ctx = ExecContext::new();

    let cancel = ctx.cancel_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        cancel.cancel();
    });

    let started = Instant::now();
    let err = execute(&spec, None, &ctx).await.unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(10), "{:?}", started.elapsed());
    assert!(matches!(err, FetchError::Cancelled { .. }), "{err}");
    assert_eq!(err.exit_code(), 130);
}

#[cfg(unix)]
#[tokio::test]
async fn test_exit_is_not_held_up_by_lingering_descendants() {
    let bin = TempDir::new().unwrap();
    // The background sleep inherits both pipes and outlives the script
    let program = stand_in_git(bin.path(), "sleep 20 &\nexit 0");
    let spec = GitCommand::checkout("main").to_spec().with_program(program.to_string_lossy());
    let ctx = ExecContext::new().with_timeout(Some(Duration::from_secs(10)));

    let started = Instant::now();
    let result = execute(&spec, None, &ctx).await;

    assert!(result.is_ok(), "{:?}", result.err());
    assert!(started.elapsed() < Duration::from_secs(5), "{:?}", started.elapsed());
}

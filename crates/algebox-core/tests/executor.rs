//! End-to-end executor tests against a fake interpreter.
//!
//! The fake is a small shell script that mimics the real binary's contract:
//! `--version` prints a version line, `--script FILE` runs a file, and the
//! default (stdin) mode emits the banner on stderr before evaluating input.

#![cfg(unix)]

use algebox_core::executor::execute;
use algebox_core::probe::probe;
use algebox_core::{AlgeboxError, DeliveryMode, ResourceLimits, SandboxConfig};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::TempDir;

const FAKE_INTERPRETER: &str = r#"#!/bin/sh
if [ "$1" = "--version" ]; then
    echo 'Macaulay2 9.9.9'
    exit 0
fi
if [ "$1" = "--script" ]; then
    exec /bin/sh "$2"
fi
echo 'Macaulay2, version 9.9.9' >&2
echo 'with packages: TestOnly' >&2
exec /bin/sh
"#;

fn install_fake_interpreter(dir: &Path) -> PathBuf {
    let path = dir.join("fake-m2");
    std::fs::write(&path, FAKE_INTERPRETER).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Limits safe for the test host: generous process ceiling so the fake
/// shell can fork, short wall clock where the test wants one.
fn test_limits(wall_secs: u64) -> ResourceLimits {
    ResourceLimits {
        max_memory_bytes: 1_024_000_000,
        max_cpu_seconds: 30,
        max_processes: 10_000,
        max_file_size_bytes: 10_000_000,
        wall_clock_timeout: Duration::from_secs(wall_secs),
    }
}

fn config_for(interpreter: &Path, wall_secs: u64) -> SandboxConfig {
    SandboxConfig::builder()
        .interpreter_path(interpreter)
        .limits(test_limits(wall_secs))
        .build()
}

#[tokio::test]
async fn clean_run_returns_stdout_and_clears_banner_stderr() {
    let dir = TempDir::new().unwrap();
    let interpreter = install_fake_interpreter(dir.path());
    let config = config_for(&interpreter, 10);

    let result = execute("echo hello", &config).await.unwrap();
    assert!(result.success);
    assert_eq!(result.stdout, "hello\n");
    assert!(result.stderr.is_empty());
    assert!(result.error_message.is_none());
}

#[tokio::test]
async fn working_directory_is_removed_after_the_call() {
    let dir = TempDir::new().unwrap();
    let interpreter = install_fake_interpreter(dir.path());
    let config = config_for(&interpreter, 10);

    let result = execute("pwd", &config).await.unwrap();
    assert!(result.success);
    let workdir = result.stdout.trim();
    assert!(!workdir.is_empty());
    assert!(
        !Path::new(workdir).exists(),
        "temp dir {workdir} survived the call"
    );
}

#[tokio::test]
async fn runtime_error_is_classified_without_banner_noise() {
    let dir = TempDir::new().unwrap();
    let interpreter = install_fake_interpreter(dir.path());
    let config = config_for(&interpreter, 10);

    let result = execute("echo boom >&2\nexit 3", &config).await.unwrap();
    assert!(!result.success);
    assert!(result.stderr.contains("boom"));

    let message = result.error_message.unwrap();
    assert!(message.contains("boom"));
    assert!(message.contains("Macaulay2, version 9.9.9"));
    assert!(!message.contains("with packages"));
}

#[tokio::test]
async fn infinite_loop_times_out_and_returns_promptly() {
    let dir = TempDir::new().unwrap();
    let interpreter = install_fake_interpreter(dir.path());
    let config = config_for(&interpreter, 1);

    let started = Instant::now();
    let result = execute("sleep 30", &config).await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(5));

    assert!(!result.success);
    assert_eq!(
        result.error_message.as_deref(),
        Some("Timeout after 1 seconds")
    );
}

/// Gone entirely, or a zombie awaiting reaping by init. A live descendant
/// shows up in `/proc` with a running/sleeping state.
fn descendant_is_dead(pid: u32) -> bool {
    match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
        Err(_) => true,
        Ok(stat) => {
            let state = stat
                .rsplit_once(')')
                .and_then(|(_, rest)| rest.trim_start().chars().next());
            matches!(state, Some('Z' | 'X') | None)
        }
    }
}

#[tokio::test]
async fn timeout_kills_background_descendants_too() {
    let dir = TempDir::new().unwrap();
    let interpreter = install_fake_interpreter(dir.path());
    let config = config_for(&interpreter, 1);

    // The shell forks a background sleeper and blocks; both live in the
    // child's process group and must die with it. The sleeper's pid lands
    // outside the workdir so its fate can be checked after the call.
    let pid_file = dir.path().join("descendant.pid");
    let code = format!("sleep 30 &\necho $! > {}\nsleep 30", pid_file.display());

    let started = Instant::now();
    let result = execute(&code, &config).await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(!result.success);

    let pid: u32 = std::fs::read_to_string(&pid_file)
        .unwrap()
        .trim()
        .parse()
        .unwrap();
    assert!(
        descendant_is_dead(pid),
        "background process {pid} survived the timeout"
    );
}

#[tokio::test]
async fn script_file_delivery_runs_the_code() {
    let dir = TempDir::new().unwrap();
    let interpreter = install_fake_interpreter(dir.path());
    let config = SandboxConfig::builder()
        .interpreter_path(&interpreter)
        .delivery(DeliveryMode::ScriptFile)
        .limits(test_limits(10))
        .build();

    let result = execute("echo scripted", &config).await.unwrap();
    assert!(result.success);
    assert_eq!(result.stdout, "scripted\n");
}

#[tokio::test]
async fn file_size_ceiling_stops_runaway_writes() {
    let dir = TempDir::new().unwrap();
    let interpreter = install_fake_interpreter(dir.path());
    let mut limits = test_limits(10);
    limits.max_file_size_bytes = 1_000;
    let config = SandboxConfig::builder()
        .interpreter_path(&interpreter)
        .limits(limits)
        .build();

    let result = execute("exec head -c 50000 /dev/zero > big", &config)
        .await
        .unwrap();
    assert!(!result.success);
    assert!(result.error_message.is_some());
}

#[tokio::test]
async fn missing_binary_is_a_configuration_error() {
    let config = SandboxConfig::builder()
        .interpreter_path("/nonexistent/algebra-interpreter")
        .limits(test_limits(10))
        .build();

    match execute("1+1", &config).await {
        Err(AlgeboxError::BinaryNotFound(path)) => {
            assert_eq!(path, Path::new("/nonexistent/algebra-interpreter"));
        }
        other => panic!("expected BinaryNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_code_is_rejected_before_spawning() {
    // Interpreter path is bogus on purpose: validation must fire first.
    let config = SandboxConfig::builder()
        .interpreter_path("/nonexistent/algebra-interpreter")
        .build();

    assert!(matches!(
        execute("   \n ", &config).await,
        Err(AlgeboxError::Validation(_))
    ));
}

#[tokio::test]
async fn oversized_code_is_rejected_before_spawning() {
    let config = SandboxConfig::builder()
        .interpreter_path("/nonexistent/algebra-interpreter")
        .max_code_bytes(64)
        .build();

    assert!(matches!(
        execute(&"x".repeat(65), &config).await,
        Err(AlgeboxError::Validation(_))
    ));
}

#[tokio::test]
async fn slow_request_does_not_block_a_fast_one() {
    let dir = TempDir::new().unwrap();
    let interpreter = install_fake_interpreter(dir.path());
    let slow_config = config_for(&interpreter, 3);
    let fast_config = config_for(&interpreter, 10);

    let slow = tokio::spawn(async move { execute("sleep 30", &slow_config).await });

    let started = Instant::now();
    let fast = execute("echo fast", &fast_config).await.unwrap();
    assert!(fast.success);
    assert_eq!(fast.stdout, "fast\n");
    assert!(
        started.elapsed() < Duration::from_secs(2),
        "fast request was held up by the slow one"
    );

    let slow = slow.await.unwrap().unwrap();
    assert!(!slow.success);
    assert!(slow.error_message.unwrap().starts_with("Timeout"));
}

#[tokio::test]
async fn probe_reports_version_of_a_reachable_interpreter() {
    let dir = TempDir::new().unwrap();
    let interpreter = install_fake_interpreter(dir.path());

    let status = probe(&interpreter).await;
    assert!(status.available);
    assert_eq!(status.version.as_deref(), Some("Macaulay2 9.9.9"));
}

#[tokio::test]
async fn probe_reports_a_missing_interpreter_as_unavailable() {
    let status = probe(Path::new("/nonexistent/algebra-interpreter")).await;
    assert!(!status.available);
    assert!(status.version.is_none());
}

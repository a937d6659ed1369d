//! Sandbox executor
//!
//! One invocation: validate, create a fresh working directory, spawn the
//! interpreter in its own process group with rlimits applied, drain output,
//! wait up to the wall-clock deadline, classify. The directory is removed on
//! every exit path.

use crate::classify;
use crate::config::{DeliveryMode, SandboxConfig};
use crate::error::AlgeboxError;
use crate::result::ExecutionResult;
use crate::Result;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;

/// File name used for script-mode delivery inside the isolated directory.
const SCRIPT_FILE_NAME: &str = "input.m2";

/// Reject input the sandbox will not run.
///
/// Callers are expected to validate before submitting; the executor
/// re-validates anyway since it may receive arbitrary input.
pub fn validate(code: &str, max_code_bytes: usize) -> Result<()> {
    if code.trim().is_empty() {
        return Err(AlgeboxError::Validation("code cannot be empty".into()));
    }
    if code.len() > max_code_bytes {
        return Err(AlgeboxError::Validation(format!(
            "code too long ({} bytes, max {max_code_bytes})",
            code.len()
        )));
    }
    Ok(())
}

/// Run `code` through the interpreter under the configured ceilings.
///
/// Timeouts and non-zero exits come back as structured results; only
/// validation failures, a missing binary, and unclassified spawn/IO
/// failures surface as errors.
///
/// # Errors
///
/// `Validation` for empty or oversized code (nothing is spawned),
/// `BinaryNotFound` if the interpreter is missing on this host,
/// `Execution`/`Io` for unclassified spawn or pipe failures.
pub async fn execute(code: &str, config: &SandboxConfig) -> Result<ExecutionResult> {
    validate(code, config.max_code_bytes)?;

    // Fresh directory, exclusively owned by this invocation. TempDir
    // removes it and everything the child wrote on every exit path.
    let workdir = tempfile::tempdir()?;
    tracing::info!(
        code_len = code.len(),
        delivery = ?config.delivery,
        workdir = %workdir.path().display(),
        "executing interpreter code"
    );

    let outcome = run_in(code, config, workdir.path()).await;

    if let Err(e) = workdir.close() {
        tracing::warn!(error = %e, "failed to remove isolated working directory");
    }
    outcome
}

async fn run_in(code: &str, config: &SandboxConfig, dir: &Path) -> Result<ExecutionResult> {
    let mut cmd = Command::new(&config.interpreter_path);
    cmd.current_dir(dir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    match config.delivery {
        DeliveryMode::Stdin => {
            cmd.arg("--stop").stdin(Stdio::piped());
        }
        DeliveryMode::ScriptFile => {
            let script = dir.join(SCRIPT_FILE_NAME);
            tokio::fs::write(&script, code).await?;
            cmd.arg("--script").arg(&script).stdin(Stdio::null());
        }
    }

    let limiter = config.limits.limiter();
    #[cfg(unix)]
    {
        // Own process group so deadline expiry can kill descendants too.
        cmd.process_group(0);
        unsafe {
            cmd.pre_exec(move || limiter.apply());
        }
    }
    #[cfg(not(unix))]
    let _ = limiter; // selection already logged the degraded-containment warning

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(AlgeboxError::BinaryNotFound(config.interpreter_path.clone()));
        }
        Err(e) => return Err(e.into()),
    };
    let child_pid = child.id();

    if config.delivery == DeliveryMode::Stdin {
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| AlgeboxError::Execution("child stdin not captured".into()))?;
        // Trailing `exit` forces a clean shutdown even when the input has
        // no final expression. Written from its own task so a child that
        // stops reading cannot stall the deadline; a child that already
        // exited closed the pipe, and its exit status tells the rest of
        // the story.
        let payload = format!("{code}\nexit\n");
        tokio::spawn(async move {
            if let Err(e) = stdin.write_all(payload.as_bytes()).await {
                tracing::debug!(error = %e, "child stopped reading stdin");
            }
            drop(stdin);
        });
    }

    // Drain both pipes concurrently so a chatty child cannot deadlock on a
    // full pipe while we wait for it.
    let mut stdout_pipe = child
        .stdout
        .take()
        .ok_or_else(|| AlgeboxError::Execution("child stdout not captured".into()))?;
    let mut stderr_pipe = child
        .stderr
        .take()
        .ok_or_else(|| AlgeboxError::Execution("child stderr not captured".into()))?;

    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        let _ = stdout_pipe.read_to_end(&mut buf).await;
        buf
    });
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        let _ = stderr_pipe.read_to_end(&mut buf).await;
        buf
    });

    let deadline = config.limits.wall_clock_timeout;
    let status = match tokio::time::timeout(deadline, child.wait()).await {
        Ok(status) => status?,
        Err(_) => {
            tracing::warn!(pid = child_pid, deadline_secs = deadline.as_secs(), "execution timeout");
            kill_process_group(child_pid);
            let _ = child.wait().await; // reap
            stdout_task.abort();
            stderr_task.abort();
            return Ok(ExecutionResult::timed_out(deadline));
        }
    };

    let stdout = stdout_task
        .await
        .map_err(|e| AlgeboxError::Execution(format!("stdout reader failed: {e}")))?;
    let stderr = stderr_task
        .await
        .map_err(|e| AlgeboxError::Execution(format!("stderr reader failed: {e}")))?;

    let exit_code = status.code().unwrap_or(-1);
    tracing::info!(
        exit_code,
        stdout_len = stdout.len(),
        stderr_len = stderr.len(),
        "execution completed"
    );

    Ok(classify::classify(
        exit_code,
        &String::from_utf8_lossy(&stdout),
        &String::from_utf8_lossy(&stderr),
    ))
}

/// SIGKILL the child's whole process group; orphaned descendants must not
/// survive the call.
#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Some(pid) = pid else { return };
    #[allow(clippy::cast_possible_wrap)]
    let pgid = Pid::from_raw(pid as i32);
    if let Err(e) = killpg(pgid, Signal::SIGKILL) {
        tracing::warn!(pid, error = %e, "failed to kill process group");
    }
}

/// Without process groups, `kill_on_drop` reaps the direct child.
#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}

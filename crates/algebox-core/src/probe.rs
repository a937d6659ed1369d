//! Interpreter availability probe
//!
//! A short version query against the binary, used by the health endpoint
//! and the CLI. Never fails: an unreachable interpreter is a status, not
//! an error.

use serde::Serialize;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Deadline for the version query.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// What the probe learned about the interpreter on this host.
#[derive(Debug, Clone, Serialize)]
pub struct InterpreterStatus {
    pub available: bool,
    pub version: Option<String>,
}

impl InterpreterStatus {
    const fn unavailable() -> Self {
        Self {
            available: false,
            version: None,
        }
    }
}

/// Probe the interpreter with `--version` under a short timeout.
pub async fn probe(interpreter_path: &Path) -> InterpreterStatus {
    let output = Command::new(interpreter_path)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .output();

    match tokio::time::timeout(PROBE_TIMEOUT, output).await {
        Ok(Ok(output)) if output.status.success() => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let version = stdout.lines().next().map(|line| line.trim().to_string());
            InterpreterStatus {
                available: true,
                version,
            }
        }
        Ok(Ok(output)) => {
            tracing::warn!(status = ?output.status, "interpreter version query failed");
            InterpreterStatus::unavailable()
        }
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "interpreter binary not reachable");
            InterpreterStatus::unavailable()
        }
        Err(_) => {
            tracing::warn!(timeout_secs = PROBE_TIMEOUT.as_secs(), "interpreter version query timed out");
            InterpreterStatus::unavailable()
        }
    }
}

//! Execution result types

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Result of one sandboxed execution.
///
/// Constructed once per request, immutable, never persisted.
///
/// Invariants: `success` is true iff the child exited with status 0 within
/// the wall-clock deadline; when `success` is false, `error_message` is
/// always populated; `stderr` is cleared on success (the interpreter's
/// banner routinely lands on the error stream and is not an error).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Captured standard output
    pub stdout: String,

    /// Error-stream text, surfaced only on failure
    pub stderr: String,

    /// Whether the child exited 0 within the deadline
    pub success: bool,

    /// Human-readable classification, present iff `success` is false
    pub error_message: Option<String>,
}

impl ExecutionResult {
    /// A clean exit. The error stream is dropped.
    #[must_use]
    pub const fn completed(stdout: String) -> Self {
        Self {
            stdout,
            stderr: String::new(),
            success: true,
            error_message: None,
        }
    }

    /// A non-zero exit with a classified diagnostic.
    #[must_use]
    pub const fn failed(stdout: String, stderr: String, error_message: String) -> Self {
        Self {
            stdout,
            stderr,
            success: false,
            error_message: Some(error_message),
        }
    }

    /// The wall-clock deadline expired and the process tree was killed.
    #[must_use]
    pub fn timed_out(deadline: Duration) -> Self {
        let secs = deadline.as_secs();
        Self {
            stdout: String::new(),
            stderr: format!(
                "Execution timeout: code took longer than {secs} seconds to execute"
            ),
            success: false,
            error_message: Some(format!("Timeout after {secs} seconds")),
        }
    }
}

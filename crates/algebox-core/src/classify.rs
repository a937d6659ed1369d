//! Output classification
//!
//! The interpreter writes its startup banner and package-load notices to the
//! error stream even on clean runs, so raw stderr cannot be shown to callers
//! as-is. A small rule table maps line prefixes to an action; classification
//! needs no subprocess and is tested in isolation.

use crate::result::ExecutionResult;

/// What to do with an error-stream line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineAction {
    /// Banner or package noise, never part of a diagnostic.
    Drop,
    /// Substantive diagnostic text.
    Keep,
    /// The version line; kept separately to prefix the diagnostic.
    KeepAsVersion,
}

struct LineRule {
    prefix: &'static str,
    action: LineAction,
}

/// Prefix table for the interpreter's known error-stream preamble.
const RULES: &[LineRule] = &[
    LineRule {
        prefix: "Macaulay2, version",
        action: LineAction::KeepAsVersion,
    },
    LineRule {
        prefix: "with packages:",
        action: LineAction::Drop,
    },
    LineRule {
        prefix: "--loading",
        action: LineAction::Drop,
    },
    LineRule {
        prefix: "--Copyright",
        action: LineAction::Drop,
    },
];

fn action_for(line: &str) -> LineAction {
    for rule in RULES {
        if line.starts_with(rule.prefix) {
            return rule.action;
        }
    }
    LineAction::Keep
}

/// Split the error stream into the detected version string and the
/// substantive diagnostic lines. Indented continuations of a dropped line
/// (the wrapped package list) are dropped with it.
fn extract_diagnostics(stderr: &str) -> (Option<String>, String) {
    let mut version = None;
    let mut kept = Vec::new();
    let mut in_dropped_block = false;

    for line in stderr.lines() {
        let continuation = line.starts_with(char::is_whitespace) && !line.trim().is_empty();
        if in_dropped_block && continuation {
            continue;
        }
        in_dropped_block = false;

        match action_for(line) {
            LineAction::Drop => in_dropped_block = true,
            LineAction::KeepAsVersion => version = Some(line.trim().to_string()),
            LineAction::Keep => {
                if !line.trim().is_empty() {
                    kept.push(line);
                }
            }
        }
    }

    (version, kept.join("\n"))
}

/// Classify a finished child process into a structured result.
///
/// Timeout and binary-missing outcomes never reach this function; they are
/// produced upstream and stay textually distinct from non-zero exits.
#[must_use]
pub fn classify(exit_code: i32, stdout: &str, stderr: &str) -> ExecutionResult {
    if exit_code == 0 {
        return ExecutionResult::completed(stdout.to_string());
    }

    let (version, diagnostics) = extract_diagnostics(stderr);
    let error_message = if diagnostics.is_empty() {
        format!("process exited with code {exit_code}")
    } else if let Some(version) = version {
        format!("{version}\n{diagnostics}")
    } else {
        diagnostics
    };

    ExecutionResult::failed(stdout.to_string(), stderr.to_string(), error_message)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BANNER: &str = concat!(
        "Macaulay2, version 1.24.11\n",
        "with packages: ConwayPolynomials, Elimination, IntegralClosure,\n",
        "               LLLBases, MinimalPrimes, OnlineLookup,\n",
        "               PrimaryDecomposition, ReesAlgebra, Saturation\n",
    );

    #[test]
    fn clean_exit_drops_banner_from_stderr() {
        let result = classify(0, "o1 = 4\n", BANNER);
        assert!(result.success);
        assert_eq!(result.stdout, "o1 = 4\n");
        assert!(result.stderr.is_empty());
        assert!(result.error_message.is_none());
    }

    #[test]
    fn failure_keeps_diagnostics_and_strips_noise() {
        let stderr = format!("{BANNER}stdio:1:1: error: expected an expression\n");
        let result = classify(1, "", &stderr);
        assert!(!result.success);
        assert_eq!(result.stderr, stderr);

        let message = result.error_message.unwrap();
        assert!(message.starts_with("Macaulay2, version 1.24.11"));
        assert!(message.contains("expected an expression"));
        assert!(!message.contains("with packages"));
        assert!(!message.contains("LLLBases"));
    }

    #[test]
    fn package_list_continuations_are_dropped_with_the_header() {
        let (version, kept) = extract_diagnostics(BANNER);
        assert_eq!(version.as_deref(), Some("Macaulay2, version 1.24.11"));
        assert!(kept.is_empty());
    }

    #[test]
    fn indented_diagnostic_lines_survive_when_not_continuations() {
        let stderr = "stdio:2:5: error: no method found\n  for applying f to x\n";
        let (version, kept) = extract_diagnostics(stderr);
        assert!(version.is_none());
        assert_eq!(
            kept,
            "stdio:2:5: error: no method found\n  for applying f to x"
        );
    }

    #[test]
    fn empty_stderr_falls_back_to_exit_code_message() {
        let result = classify(137, "", "");
        assert_eq!(
            result.error_message.as_deref(),
            Some("process exited with code 137")
        );
    }

    #[test]
    fn banner_only_stderr_falls_back_with_version_absent_from_diagnostics() {
        let result = classify(2, "", "with packages: Saturation\n");
        assert_eq!(
            result.error_message.as_deref(),
            Some("process exited with code 2")
        );
    }

    #[test]
    fn loading_notices_are_dropped() {
        let stderr = "--loading configuration for package \"FourTiTwo\"\nstdio:1:1: error: oops\n";
        let (_, kept) = extract_diagnostics(stderr);
        assert_eq!(kept, "stdio:1:1: error: oops");
    }
}

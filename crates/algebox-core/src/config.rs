//! Sandbox configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default cap on submitted code size, in bytes.
pub const DEFAULT_MAX_CODE_BYTES: usize = 100_000;

/// How the code is handed to the interpreter process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// Pipe the code to the interpreter's standard input, followed by an
    /// explicit `exit` directive. The mode that reliably emits output.
    Stdin,
    /// Write the code to a file inside the isolated directory and invoke
    /// the interpreter in non-interactive script mode against it.
    ScriptFile,
}

impl FromStr for DeliveryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stdin" => Ok(Self::Stdin),
            "script" | "script_file" | "script-file" => Ok(Self::ScriptFile),
            other => Err(format!(
                "unknown delivery mode {other:?} (expected \"stdin\" or \"script\")"
            )),
        }
    }
}

/// Per-invocation resource ceilings applied to the child process.
///
/// Immutable once an execution starts. The wall-clock timeout bounds the
/// whole subprocess lifetime and is deliberately larger than the CPU-time
/// ceiling, leaving headroom for I/O-bound wait.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Virtual memory ceiling in bytes (RLIMIT_AS)
    pub max_memory_bytes: u64,

    /// Cumulative CPU time ceiling in seconds (RLIMIT_CPU)
    pub max_cpu_seconds: u64,

    /// Ceiling on processes/threads the child may create (RLIMIT_NPROC)
    pub max_processes: u64,

    /// Ceiling on any single file the child writes (RLIMIT_FSIZE)
    pub max_file_size_bytes: u64,

    /// Deadline for the entire subprocess lifetime
    pub wall_clock_timeout: Duration,
}

impl ResourceLimits {
    /// The tight profile: the limits the service has always shipped with.
    #[must_use]
    pub const fn conservative() -> Self {
        Self {
            max_memory_bytes: 512_000_000,
            max_cpu_seconds: 30,
            max_processes: 10,
            max_file_size_bytes: 10_000_000,
            wall_clock_timeout: Duration::from_secs(35),
        }
    }

    /// The loose profile, for deployments serving heavier computations.
    #[must_use]
    pub const fn relaxed() -> Self {
        Self {
            max_memory_bytes: 1_024_000_000,
            max_cpu_seconds: 60,
            max_processes: 32,
            max_file_size_bytes: 25_000_000,
            wall_clock_timeout: Duration::from_secs(70),
        }
    }
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self::conservative()
    }
}

/// Named limit profile, selected by deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitProfile {
    Conservative,
    Relaxed,
}

impl LimitProfile {
    #[must_use]
    pub const fn limits(self) -> ResourceLimits {
        match self {
            Self::Conservative => ResourceLimits::conservative(),
            Self::Relaxed => ResourceLimits::relaxed(),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Conservative => "conservative",
            Self::Relaxed => "relaxed",
        }
    }
}

impl FromStr for LimitProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "conservative" => Ok(Self::Conservative),
            "relaxed" => Ok(Self::Relaxed),
            other => Err(format!(
                "unknown limit profile {other:?} (expected \"conservative\" or \"relaxed\")"
            )),
        }
    }
}

/// Configuration for a sandbox instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Path to the interpreter binary (resolved via PATH if bare)
    pub interpreter_path: PathBuf,

    /// Code delivery strategy
    pub delivery: DeliveryMode,

    /// Resource ceilings for the child process
    pub limits: ResourceLimits,

    /// Maximum accepted code size in bytes
    pub max_code_bytes: usize,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            interpreter_path: PathBuf::from("M2"),
            delivery: DeliveryMode::Stdin,
            limits: ResourceLimits::default(),
            max_code_bytes: DEFAULT_MAX_CODE_BYTES,
        }
    }
}

impl SandboxConfig {
    /// Create a new config builder
    #[must_use]
    pub fn builder() -> SandboxConfigBuilder {
        SandboxConfigBuilder::default()
    }
}

/// Builder for SandboxConfig
#[derive(Debug, Default)]
pub struct SandboxConfigBuilder {
    config: SandboxConfig,
}

impl SandboxConfigBuilder {
    #[must_use]
    pub fn interpreter_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.interpreter_path = path.into();
        self
    }

    #[must_use]
    pub const fn delivery(mut self, mode: DeliveryMode) -> Self {
        self.config.delivery = mode;
        self
    }

    #[must_use]
    pub fn limits(mut self, limits: ResourceLimits) -> Self {
        self.config.limits = limits;
        self
    }

    #[must_use]
    pub fn profile(self, profile: LimitProfile) -> Self {
        self.limits(profile.limits())
    }

    #[must_use]
    pub fn wall_clock_timeout(mut self, timeout: Duration) -> Self {
        self.config.limits.wall_clock_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn max_code_bytes(mut self, bytes: usize) -> Self {
        self.config.max_code_bytes = bytes;
        self
    }

    #[must_use]
    pub fn build(self) -> SandboxConfig {
        self.config
    }
}

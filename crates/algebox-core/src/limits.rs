//! OS resource containment for the child process.
//!
//! Ceilings are applied between fork and exec, in the child only. Platforms
//! without rlimit-style controls fall back to the wall-clock deadline alone;
//! that degraded mode is logged loudly, never silently.

use crate::config::ResourceLimits;
use std::io;

/// Strategy for applying resource ceilings inside the child process.
///
/// `apply` runs in the forked child before exec, so it must stay
/// async-signal-safe: no allocation, no logging.
pub trait ResourceLimiter: Send + Sync {
    fn apply(&self) -> io::Result<()>;

    /// Whether this limiter actually enforces OS-level ceilings.
    fn is_enforcing(&self) -> bool;
}

/// rlimit-based containment (RLIMIT_AS, RLIMIT_CPU, RLIMIT_NPROC,
/// RLIMIT_FSIZE).
#[cfg(unix)]
#[derive(Debug, Clone)]
pub struct RlimitLimiter {
    limits: ResourceLimits,
}

#[cfg(unix)]
impl RlimitLimiter {
    #[must_use]
    pub const fn new(limits: ResourceLimits) -> Self {
        Self { limits }
    }
}

#[cfg(unix)]
impl ResourceLimiter for RlimitLimiter {
    fn apply(&self) -> io::Result<()> {
        use nix::sys::resource::{Resource, setrlimit};

        let set = |resource, value| {
            setrlimit(resource, value, value)
                .map_err(|errno| io::Error::from_raw_os_error(errno as i32))
        };

        set(Resource::RLIMIT_AS, self.limits.max_memory_bytes)?;
        set(Resource::RLIMIT_CPU, self.limits.max_cpu_seconds)?;
        set(Resource::RLIMIT_NPROC, self.limits.max_processes)?;
        set(Resource::RLIMIT_FSIZE, self.limits.max_file_size_bytes)?;

        Ok(())
    }

    fn is_enforcing(&self) -> bool {
        true
    }
}

/// Fallback limiter for platforms without rlimit-style controls.
/// Containment degrades to the wall-clock deadline alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLimiter;

impl ResourceLimiter for NoopLimiter {
    fn apply(&self) -> io::Result<()> {
        Ok(())
    }

    fn is_enforcing(&self) -> bool {
        false
    }
}

impl ResourceLimits {
    /// Pick the containment strategy this platform supports.
    #[must_use]
    pub fn limiter(&self) -> Box<dyn ResourceLimiter> {
        #[cfg(unix)]
        {
            Box::new(RlimitLimiter::new(self.clone()))
        }
        #[cfg(not(unix))]
        {
            tracing::warn!(
                "OS resource limits are unavailable on this platform; \
                 containment degrades to the wall-clock timeout alone"
            );
            Box::new(NoopLimiter)
        }
    }
}

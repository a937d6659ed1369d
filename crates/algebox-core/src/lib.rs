//! # algebox-core
//!
//! Sandboxed subprocess execution for an external computational-algebra
//! interpreter.
//!
//! This crate provides the execution core:
//! - Per-request isolated working directories (created fresh, always removed)
//! - OS resource ceilings on the child (memory, CPU time, processes, file size)
//! - A wall-clock deadline that kills the whole process group on expiry
//! - Classification of captured output into success / failure / timeout

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod classify;
pub mod config;
pub mod error;
pub mod executor;
pub mod limits;
pub mod probe;
pub mod result;

pub use config::{DeliveryMode, LimitProfile, ResourceLimits, SandboxConfig};
pub use error::AlgeboxError;
pub use result::ExecutionResult;

/// Crate-level result type
pub type Result<T> = std::result::Result<T, AlgeboxError>;

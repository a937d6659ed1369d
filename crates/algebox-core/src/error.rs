//! Error types for algebox-core

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AlgeboxError {
    /// Input rejected before any subprocess is spawned.
    #[error("validation error: {0}")]
    Validation(String),

    /// The interpreter binary is missing on this host. A deployment
    /// problem, not a user-code problem.
    #[error("interpreter binary not found: {0}")]
    BinaryNotFound(PathBuf),

    /// Any spawn or IO failure that is not a classified outcome.
    #[error("execution error: {0}")]
    Execution(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

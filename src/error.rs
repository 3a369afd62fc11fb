// src/error.rs

//! Crate-wide error and result types.

use std::path::PathBuf;
use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the bring-up pipeline
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("download of {url} failed: {reason}")]
    Download { url: String, reason: String },

    #[error("administrative privilege required: {0}")]
    Privilege(String),

    #[error("unsupported operating system: {0}")]
    UnsupportedOs(String),

    #[error("failed to run {command}: {reason}")]
    CommandSpawn { command: String, reason: String },

    #[error("{command} exited with an error: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("package install failed: {0}")]
    Install(String),

    #[error("compiler not found: nvcc is not on PATH and {} does not exist", .0.display())]
    CompilerNotFound(PathBuf),

    #[error("hardware probe failed: {0}")]
    HardwareProbe(String),

    #[error("compute probe failed: {0}")]
    ComputeProbe(String),

    #[error("{0}")]
    Parse(String),
}

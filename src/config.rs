// src/config.rs

//! Run configuration for the bring-up pipeline
//!
//! An [`InstallConfig`] is built once from the command line, validated, and
//! never mutated afterwards. The rest of the pipeline reads from it only.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Default path for the duplicated console log
pub const DEFAULT_LOG_FILE: &str = "/var/log/nvup.log";

/// CUDA toolkit version, parsed from the `major-minor` CLI form (e.g. `12-4`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CudaVersion {
    pub major: u32,
    pub minor: u32,
}

impl FromStr for CudaVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (major, minor) = s
            .split_once('-')
            .ok_or_else(|| format!("'{}' is not of the form <major>-<minor> (e.g. 12-4)", s))?;
        let major: u32 = major
            .parse()
            .map_err(|_| format!("'{}' has a non-numeric major component", s))?;
        let minor: u32 = minor
            .parse()
            .map_err(|_| format!("'{}' has a non-numeric minor component", s))?;
        Ok(Self { major, minor })
    }
}

impl fmt::Display for CudaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.major, self.minor)
    }
}

/// Immutable configuration for a single pipeline run
#[derive(Debug, Clone)]
pub struct InstallConfig {
    /// Driver release branch (e.g. 535, 580); always present and positive
    pub driver_branch: u32,

    /// CUDA toolkit version; `None` skips the toolkit stage and compute probe
    pub cuda_version: Option<CudaVersion>,

    /// Skip the entire verification harness
    pub skip_tests: bool,

    /// Path the console log is duplicated to (append mode)
    pub log_file: PathBuf,
}

impl InstallConfig {
    /// Whether a CUDA toolkit install was requested
    pub fn wants_toolkit(&self) -> bool {
        self.cuda_version.is_some()
    }
}

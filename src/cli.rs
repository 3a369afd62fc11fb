// src/cli.rs
//! CLI definitions for the nvup bring-up tool
//!
//! This module contains the command-line interface definition using clap.
//! Parsing produces an immutable [`InstallConfig`]; the pipeline itself lives
//! in the `stages` module.

use crate::config::{CudaVersion, InstallConfig, DEFAULT_LOG_FILE};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "nvup")]
#[command(version)]
#[command(
    about = "Install the NVIDIA data-center driver (and optionally CUDA) on a compute node, then verify it",
    long_about = None
)]
pub struct Cli {
    /// Driver release branch to install (e.g. 535, 580)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub driver_branch: u32,

    /// CUDA toolkit version as <major>-<minor> (e.g. 12-4); omit to skip the toolkit
    #[arg(long)]
    pub cuda_version: Option<CudaVersion>,

    /// Skip the verification harness entirely
    #[arg(long)]
    pub skip_tests: bool,

    /// File the console log is duplicated to (append mode)
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,
}

impl Cli {
    /// Consume the parsed arguments into the run configuration
    pub fn into_config(self) -> InstallConfig {
        InstallConfig {
            driver_branch: self.driver_branch,
            cuda_version: self.cuda_version,
            skip_tests: self.skip_tests,
            log_file: self.log_file,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn test_minimal_invocation() {
        let cli = Cli::try_parse_from(["nvup", "--driver-branch", "580"]).unwrap();
        let config = cli.into_config();
        assert_eq!(config.driver_branch, 580);
        assert!(config.cuda_version.is_none());
        assert!(!config.skip_tests);
        assert_eq!(config.log_file, PathBuf::from(DEFAULT_LOG_FILE));
    }

    #[test]
    fn test_full_invocation() {
        let cli = Cli::try_parse_from([
            "nvup",
            "--driver-branch",
            "535",
            "--cuda-version",
            "12-4",
            "--skip-tests",
            "--log-file",
            "/tmp/bringup.log",
        ])
        .unwrap();
        let config = cli.into_config();
        assert_eq!(config.driver_branch, 535);
        assert_eq!(config.cuda_version.unwrap().to_string(), "12-4");
        assert!(config.skip_tests);
        assert_eq!(config.log_file, PathBuf::from("/tmp/bringup.log"));
    }

    #[test]
    fn test_driver_branch_is_required() {
        let err = Cli::try_parse_from(["nvup"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_driver_branch_must_be_positive() {
        assert!(Cli::try_parse_from(["nvup", "--driver-branch", "0"]).is_err());
        assert!(Cli::try_parse_from(["nvup", "--driver-branch", "abc"]).is_err());
    }

    #[test]
    fn test_malformed_cuda_version_rejected() {
        // A bare major version is not a valid <major>-<minor> pair
        let err = Cli::try_parse_from([
            "nvup",
            "--driver-branch",
            "535",
            "--cuda-version",
            "12",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn test_unknown_option_rejected() {
        let err =
            Cli::try_parse_from(["nvup", "--driver-branch", "535", "--frobnicate"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_help_short_circuits() {
        let err = Cli::try_parse_from(["nvup", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    }
}

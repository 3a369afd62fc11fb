// src/lib.rs

//! nvup: GPU compute node bring-up
//!
//! Installs the NVIDIA data-center driver (and optionally the CUDA toolkit)
//! on a fleet node, activates the kernel module, and proves the stack works
//! before handing the node back to the provisioning pipeline.
//!
//! # Architecture
//!
//! - Linear staged pipeline: preflight, repository, nouveau deconfliction,
//!   driver, toolkit, live module load, verification, upgrade lockdown
//! - Every filesystem mutation is a guarded check-before-act write, so
//!   re-invoking the whole workflow is the retry mechanism
//! - Verification failures warn instead of aborting: the node may still be
//!   fully functional after the reboot the caller schedules

pub mod cli;
pub mod config;
mod error;
pub mod guard;
pub mod logging;
pub mod stages;
pub mod system;
pub mod verify;

pub use config::{CudaVersion, InstallConfig, DEFAULT_LOG_FILE};
pub use error::{Error, Result};
pub use stages::{harness_scope, plan, HarnessScope, InstallState, SkipReason, Stage};
pub use verify::compute::KernelTestResult;
pub use verify::hardware::GpuDeviceReport;

// src/stages/toolkit.rs

//! Optional CUDA toolkit install
//!
//! Independent of the driver package (the toolkit meta-package does not pull
//! a driver in). Unlike the driver stage, any failure here is immediately
//! fatal: a half-provisioned toolkit cannot be remedied by a reboot.

use crate::config::CudaVersion;
use crate::error::Result;
use crate::system::pkg;
use tracing::info;

/// Package name for a toolkit version
pub fn package_name(version: &CudaVersion) -> String {
    format!("cuda-toolkit-{}-{}", version.major, version.minor)
}

/// Install the toolkit package; errors propagate unrecovered.
pub fn install(version: &CudaVersion) -> Result<()> {
    let package = package_name(version);
    pkg::apt_install(&package)?;
    info!("toolkit package {} installed", package);
    Ok(())
}

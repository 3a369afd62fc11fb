// src/stages/driver.rs

//! Branch-specific proprietary driver install
//!
//! Reports success as a flag instead of aborting: the orchestrator owns the
//! decision to stop the run when the driver did not install.

use crate::system::pkg;
use tracing::{error, info};

/// Package name for a driver release branch (data-center/server variant)
pub fn package_name(branch: u32) -> String {
    format!("nvidia-driver-{}-server", branch)
}

/// Install the driver package; returns whether it succeeded.
pub fn install(branch: u32) -> bool {
    let package = package_name(branch);
    match pkg::apt_install(&package) {
        Ok(()) => {
            info!("driver package {} installed", package);
            true
        }
        Err(e) => {
            error!("driver package {} failed to install: {}", package, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_name_tracks_branch() {
        assert_eq!(package_name(535), "nvidia-driver-535-server");
        assert_eq!(package_name(580), "nvidia-driver-580-server");
    }
}

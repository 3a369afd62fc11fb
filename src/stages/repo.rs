// src/stages/repo.rs

//! Vendor repository provisioning
//!
//! Two ordered, individually guarded steps: install the priority pin file so
//! vendor packages shadow the distribution's own, then install the keyring
//! package (signing key + apt source entry) and refresh the index. Re-running
//! performs no network action when both are already in place. Any download or
//! install error is fatal and propagates to the orchestrator.

use crate::error::Result;
use crate::guard;
use crate::system::{pkg, OsIdentity};
use std::path::Path;
use tracing::info;

/// Base URL of the NVIDIA CUDA repositories
const REPO_BASE: &str = "https://developer.download.nvidia.com/compute/cuda/repos";

/// Keyring package file name as published in every repository
const KEYRING_DEB: &str = "cuda-keyring_1.1-1_all.deb";

/// Name the keyring package registers under in dpkg
const KEYRING_PACKAGE: &str = "cuda-keyring";

/// Destination of the priority pin, relative to the system root
const PIN_DEST: &str = "etc/apt/preferences.d/cuda-repository-pin-600";

/// URL of a file inside the repository for this OS
fn repo_url(os: &OsIdentity, file: &str) -> String {
    format!("{}/{}/x86_64/{}", REPO_BASE, os.repo_key(), file)
}

/// Establish the vendor repository: pin file, then keyring package.
pub fn provision(os: &OsIdentity, root: &Path) -> Result<()> {
    let pin_path = root.join(PIN_DEST);
    let pin_url = repo_url(os, &format!("cuda-{}.pin", os.repo_key()));

    let wrote_pin = guard::ensure_file(&pin_path, || pkg::download(&pin_url, &pin_path))?;
    if wrote_pin {
        info!("installed repository pin at {}", pin_path.display());
    }

    let installed = guard::ensure_with(
        "cuda keyring package",
        || Ok(pkg::dpkg_installed(KEYRING_PACKAGE)),
        || {
            let staging = tempfile::tempdir()?;
            let deb = staging.path().join(KEYRING_DEB);
            pkg::download(&repo_url(os, KEYRING_DEB), &deb)?;
            pkg::dpkg_install(&deb)?;
            pkg::apt_update()
        },
    )?;
    if installed {
        info!("installed {} and refreshed the package index", KEYRING_PACKAGE);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_url_embeds_os_key() {
        let os = OsIdentity {
            id: "ubuntu".to_string(),
            version_id: "22.04".to_string(),
        };
        assert_eq!(
            repo_url(&os, "cuda-ubuntu2204.pin"),
            "https://developer.download.nvidia.com/compute/cuda/repos/ubuntu2204/x86_64/cuda-ubuntu2204.pin"
        );
    }

    #[test]
    fn test_existing_pin_skips_download() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        let pin = root.join(PIN_DEST);
        std::fs::create_dir_all(pin.parent().unwrap()).unwrap();
        std::fs::write(&pin, "Package: *\nPin: origin developer.download.nvidia.com\n").unwrap();

        // The pin step must not touch the network when the file exists; the
        // guard skips the download closure entirely.
        let before = std::fs::read(&pin).unwrap();
        let ran = guard::ensure_file(&pin, || {
            panic!("download must not run when the pin exists")
        })
        .unwrap();
        assert!(!ran);
        assert_eq!(std::fs::read(&pin).unwrap(), before);
    }
}

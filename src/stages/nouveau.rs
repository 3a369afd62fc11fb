// src/stages/nouveau.rs

//! Nouveau deconfliction
//!
//! The in-tree nouveau driver claims the GPU and blocks the proprietary
//! module. Unloading it live is best-effort (it may be pinned by a console);
//! the persistent blacklist makes a failed unload moot after the next boot.

use crate::error::Result;
use crate::guard;
use crate::system::{self, kmod};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

const NOUVEAU_MODULE: &str = "nouveau";

/// Blacklist file location, relative to the system root
const BLACKLIST_DEST: &str = "etc/modprobe.d/blacklist-nouveau.conf";

const BLACKLIST_CONTENT: &str = "blacklist nouveau\noptions nouveau modeset=0\n";

/// Write the persistent blacklist once; returns whether it was written.
pub fn write_blacklist(root: &Path) -> Result<bool> {
    let path = root.join(BLACKLIST_DEST);
    guard::ensure_file(&path, || {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, BLACKLIST_CONTENT)?;
        Ok(())
    })
}

/// Unload nouveau if resident and make the blacklist persistent.
pub fn deconflict(root: &Path) -> Result<()> {
    if kmod::is_loaded(NOUVEAU_MODULE)? {
        match kmod::unload(NOUVEAU_MODULE) {
            Ok(()) => info!("unloaded resident nouveau module"),
            // Tolerated: the blacklist takes over at next boot
            Err(e) => warn!("could not unload nouveau ({}), blacklist covers next boot", e),
        }
    }

    if write_blacklist(root)? {
        info!("wrote nouveau blacklist, regenerating initramfs");
        system::run_checked("update-initramfs", &["-u"])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blacklist_written_once() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();

        assert!(write_blacklist(root).unwrap());
        let path = root.join(BLACKLIST_DEST);
        let first = fs::read_to_string(&path).unwrap();
        assert!(first.contains("blacklist nouveau"));
        assert!(first.contains("modeset=0"));

        // Second run is a no-op: no duplicate lines, identical bytes
        assert!(!write_blacklist(root).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), first);
    }
}

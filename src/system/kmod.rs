// src/system/kmod.rs

//! Kernel module control: load, unload, residency query.
//!
//! Residency is read from /proc/modules rather than shelling out to lsmod;
//! the format is one module per line with the name as the first field.

use crate::error::Result;
use std::fs;
use std::path::Path;

/// Whether a module is currently resident in the kernel.
pub fn is_loaded(name: &str) -> Result<bool> {
    let content = fs::read_to_string(Path::new("/proc/modules"))?;
    Ok(parse_resident(&content, name))
}

/// Scan /proc/modules content for a module name (first whitespace field).
pub fn parse_resident(proc_modules: &str, name: &str) -> bool {
    proc_modules
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .any(|module| module == name)
}

/// Load a module with modprobe.
pub fn load(name: &str) -> Result<()> {
    super::run_checked("modprobe", &[name])
}

/// Unload a module with rmmod.
pub fn unload(name: &str) -> Result<()> {
    super::run_checked("rmmod", &[name])
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROC_MODULES: &str = "\
nouveau 2883584 1 - Live 0x0000000000000000
ttm 94208 1 nouveau, Live 0x0000000000000000
drm_kms_helper 311296 1 nouveau, Live 0x0000000000000000
";

    #[test]
    fn test_parse_resident_module() {
        assert!(parse_resident(PROC_MODULES, "nouveau"));
        assert!(parse_resident(PROC_MODULES, "ttm"));
    }

    #[test]
    fn test_parse_absent_module() {
        assert!(!parse_resident(PROC_MODULES, "nvidia"));
        // Substrings of a module name must not match
        assert!(!parse_resident(PROC_MODULES, "nou"));
        assert!(!parse_resident("", "nouveau"));
    }
}

// src/guard.rs

//! Guarded (check-before-act) writes
//!
//! Every idempotent step in the pipeline — repository pin, keyring package,
//! nouveau blacklist, upgrade-exclusion rules — goes through one of these
//! guards: if the marker is already present the action is skipped entirely,
//! so re-running the whole workflow never re-downloads or duplicates entries.

use crate::error::Result;
use std::path::Path;
use tracing::debug;

/// Run `action` only if the marker file does not exist yet.
///
/// Returns `true` when the action ran, `false` when the marker was already
/// present and the step was skipped.
pub fn ensure_file<F>(marker: &Path, action: F) -> Result<bool>
where
    F: FnOnce() -> Result<()>,
{
    if marker.exists() {
        debug!("{} already present, skipping", marker.display());
        return Ok(false);
    }
    action()?;
    Ok(true)
}

/// Run `action` only if the `present` check reports the marker as absent.
///
/// Used where presence is not a plain file-existence test (e.g. an installed
/// dpkg package, or a marker line inside an existing config file).
pub fn ensure_with<C, F>(what: &str, present: C, action: F) -> Result<bool>
where
    C: FnOnce() -> Result<bool>,
    F: FnOnce() -> Result<()>,
{
    if present()? {
        debug!("{} already present, skipping", what);
        return Ok(false);
    }
    action()?;
    Ok(true)
}

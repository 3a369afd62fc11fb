// src/system/os.rs

//! Preflight checks: privilege and OS identity
//!
//! The OS identity is resolved once from /etc/os-release and drives the
//! NVIDIA repository path (e.g. ubuntu + 22.04 -> ubuntu2204). Only the
//! distribution/version pairs the vendor publishes repositories for are
//! accepted; anything else aborts before any mutating action.

use crate::error::{Error, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Distribution/version pairs with a published NVIDIA CUDA repository
const SUPPORTED: &[(&str, &str)] = &[
    ("ubuntu", "20.04"),
    ("ubuntu", "22.04"),
    ("ubuntu", "24.04"),
    ("debian", "12"),
];

/// Distribution identity from os-release, resolved once and read-only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsIdentity {
    /// `ID=` field, e.g. "ubuntu"
    pub id: String,
    /// `VERSION_ID=` field, e.g. "22.04"
    pub version_id: String,
}

impl OsIdentity {
    /// Resolve the identity of the running system
    pub fn detect() -> Result<Self> {
        Self::from_release_file(Path::new("/etc/os-release"))
    }

    /// Resolve from a specific os-release file
    pub fn from_release_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse os-release content (KEY=VALUE lines, values optionally quoted)
    pub fn parse(content: &str) -> Result<Self> {
        let mut id = None;
        let mut version_id = None;

        for line in content.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim().trim_matches('"').to_string();
            match key.trim() {
                "ID" => id = Some(value),
                "VERSION_ID" => version_id = Some(value),
                _ => {}
            }
        }

        match (id, version_id) {
            (Some(id), Some(version_id)) => Ok(Self { id, version_id }),
            _ => Err(Error::Parse(
                "os-release is missing ID or VERSION_ID".to_string(),
            )),
        }
    }

    /// Whether this distribution/version pair is on the supported allow-list
    pub fn is_supported(&self) -> bool {
        SUPPORTED
            .iter()
            .any(|(id, version)| *id == self.id && *version == self.version_id)
    }

    /// Repository path key: distro id concatenated with the version, dots
    /// stripped (ubuntu + 22.04 -> "ubuntu2204")
    pub fn repo_key(&self) -> String {
        format!("{}{}", self.id, self.version_id.replace('.', ""))
    }
}

/// Fail unless running with administrative privilege
pub fn require_root() -> Result<()> {
    if !nix::unistd::Uid::effective().is_root() {
        return Err(Error::Privilege(
            "this tool installs drivers and must run as root".to_string(),
        ));
    }
    Ok(())
}

/// Privilege and OS checks; returns the identity on success.
///
/// Runs before any mutating action so an unsupported node is left untouched.
pub fn preflight() -> Result<OsIdentity> {
    require_root()?;

    let identity = OsIdentity::detect()?;
    debug!("detected os: {} {}", identity.id, identity.version_id);

    if !identity.is_supported() {
        return Err(Error::UnsupportedOs(format!(
            "{} {} has no supported NVIDIA repository",
            identity.id, identity.version_id
        )));
    }

    info!(
        "preflight ok: {} {} ({})",
        identity.id,
        identity.version_id,
        identity.repo_key()
    );
    Ok(identity)
}

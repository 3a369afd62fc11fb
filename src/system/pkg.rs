// src/system/pkg.rs

//! Apt/dpkg wrappers and repository file downloads
//!
//! Installs are keyed by package name and rely on apt's own idempotency; the
//! callers decide which failures are fatal. Downloads use a blocking HTTP
//! client with a modest timeout.

use crate::error::{Error, Result};
use std::fs;
use std::path::Path;
use std::process::Command;
use std::time::Duration;
use tracing::{debug, info};

/// Timeout for repository file downloads
const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Install a package by name with apt, non-interactively.
pub fn apt_install(package: &str) -> Result<()> {
    info!("installing package {}", package);
    let output = Command::new("apt-get")
        .env("DEBIAN_FRONTEND", "noninteractive")
        .args(["install", "-y", package])
        .output()
        .map_err(|e| Error::CommandSpawn {
            command: "apt-get".to_string(),
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(Error::Install(format!(
            "apt-get install {} failed: {}",
            package,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(())
}

/// Refresh the apt package index.
pub fn apt_update() -> Result<()> {
    debug!("refreshing apt package index");
    super::run_checked("apt-get", &["update"])
}

/// Install a local .deb file with dpkg.
pub fn dpkg_install(deb: &Path) -> Result<()> {
    let path = deb
        .to_str()
        .ok_or_else(|| Error::Install(format!("non-UTF-8 package path: {}", deb.display())))?;
    info!("installing local package {}", path);
    super::run_checked("dpkg", &["-i", path])
}

/// Whether a package is currently installed according to dpkg.
pub fn dpkg_installed(package: &str) -> bool {
    let output = Command::new("dpkg-query")
        .args(["-W", "-f", "${Status}", package])
        .output();

    match output {
        Ok(output) if output.status.success() => {
            String::from_utf8_lossy(&output.stdout).contains("install ok installed")
        }
        _ => false,
    }
}

/// Download a URL to a local file.
pub fn download(url: &str, dest: &Path) -> Result<()> {
    debug!("downloading {} -> {}", url, dest.display());

    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|e| Error::Download {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().map_err(|e| Error::Download {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    if !response.status().is_success() {
        return Err(Error::Download {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let body = response.bytes().map_err(|e| Error::Download {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(dest, &body)?;
    Ok(())
}

// src/system/mod.rs

//! Thin wrappers around the OS collaborators: os-release identity, the apt
//! package manager, and the kernel module interface. Command failures carry
//! the tool's stderr so diagnostics stay human-readable.

pub mod kmod;
pub mod os;
pub mod pkg;

pub use os::{preflight, OsIdentity};

use crate::error::{Error, Result};
use std::process::Command;

/// Run a command, requiring a zero exit status.
pub(crate) fn run_checked(program: &str, args: &[&str]) -> Result<()> {
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| Error::CommandSpawn {
            command: program.to_string(),
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(Error::CommandFailed {
            command: format!("{} {}", program, args.join(" ")),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}

/// Run a command and capture stdout, requiring a zero exit status.
pub(crate) fn run_capture(program: &str, args: &[&str]) -> Result<String> {
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| Error::CommandSpawn {
            command: program.to_string(),
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(Error::CommandFailed {
            command: format!("{} {}", program, args.join(" ")),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

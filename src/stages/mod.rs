// src/stages/mod.rs

//! The staged bring-up pipeline
//!
//! Stages run strictly in order; each one gates the next. Two skips are
//! configuration-driven: the toolkit stage (and the compute probe inside the
//! harness) when no CUDA version was requested, and the whole verification
//! harness when tests are skipped or the module did not come up live.
//!
//! Per-run installation state is an explicit value passed forward between
//! stages, never shared mutable state: each field is written exactly once.

pub mod driver;
pub mod kernel_module;
pub mod lockdown;
pub mod nouveau;
pub mod repo;
pub mod toolkit;

use crate::config::InstallConfig;
use crate::verify;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::{info, warn};

/// Pipeline stages in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Privilege and OS identity checks
    Preflight,
    /// Vendor repository pin and keyring
    Repository,
    /// Unload and blacklist the nouveau driver
    Nouveau,
    /// Branch-specific proprietary driver package
    Driver,
    /// Optional CUDA toolkit package
    Toolkit,
    /// Live (no-reboot) kernel module activation
    ModuleLoad,
    /// Hardware and compute probes
    Verify,
    /// Exclude the driver/toolkit families from automatic upgrades
    Lockdown,
}

impl Stage {
    /// Human-readable stage name used in log lines
    pub fn name(&self) -> &'static str {
        match self {
            Self::Preflight => "preflight",
            Self::Repository => "repository",
            Self::Nouveau => "nouveau",
            Self::Driver => "driver",
            Self::Toolkit => "toolkit",
            Self::ModuleLoad => "module-load",
            Self::Verify => "verify",
            Self::Lockdown => "lockdown",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Transient per-run installation state.
///
/// Not persisted across runs; each field is written once and read-only
/// afterwards.
#[derive(Debug, Clone, Copy)]
pub struct InstallState {
    /// Driver package install reported success
    pub driver_installed: bool,
    /// Kernel module came up live without a reboot
    pub module_loaded: bool,
}

/// How much of the verification harness a run gets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarnessScope {
    /// Hardware probe plus the compiled-workload compute probe
    Full,
    /// Hardware probe only (no toolkit requested)
    HardwareOnly,
    /// Entire harness skipped
    Skipped(SkipReason),
}

/// Why the verification harness was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// `--skip-tests` was given
    TestsDisabled,
    /// The module did not load live; probes would fail until reboot
    ModuleNotLive,
}

/// Decide the harness scope for a run.
///
/// A module that is not live skips even the hardware probe; that probe does
/// not strictly need a fresh load, but the skip is kept as-is.
pub fn harness_scope(config: &InstallConfig, state: &InstallState) -> HarnessScope {
    if config.skip_tests {
        return HarnessScope::Skipped(SkipReason::TestsDisabled);
    }
    if !state.module_loaded {
        return HarnessScope::Skipped(SkipReason::ModuleNotLive);
    }
    if config.wants_toolkit() {
        HarnessScope::Full
    } else {
        HarnessScope::HardwareOnly
    }
}

/// The ordered stage list for a configuration.
pub fn plan(config: &InstallConfig) -> Vec<Stage> {
    let mut stages = vec![
        Stage::Preflight,
        Stage::Repository,
        Stage::Nouveau,
        Stage::Driver,
    ];
    if config.wants_toolkit() {
        stages.push(Stage::Toolkit);
    }
    stages.push(Stage::ModuleLoad);
    if !config.skip_tests {
        stages.push(Stage::Verify);
    }
    stages.push(Stage::Lockdown);
    stages
}

/// Run the whole pipeline against the live system root.
///
/// Returns `Ok(())` for an overall-successful run, including runs where
/// verification probes warned or the module needs a reboot to activate.
pub fn run(config: &InstallConfig) -> Result<()> {
    let root = Path::new("/");

    info!("[{}] checking privilege and os identity", Stage::Preflight);
    let os = crate::system::preflight()?;

    info!("[{}] provisioning NVIDIA package repository", Stage::Repository);
    repo::provision(&os, root).context("repository provisioning failed")?;

    info!("[{}] deconflicting the nouveau driver", Stage::Nouveau);
    nouveau::deconflict(root).context("nouveau deconfliction failed")?;

    info!(
        "[{}] installing driver branch {}",
        Stage::Driver,
        config.driver_branch
    );
    let driver_installed = driver::install(config.driver_branch);
    if !driver_installed {
        anyhow::bail!(
            "driver package {} did not install; aborting bring-up",
            driver::package_name(config.driver_branch)
        );
    }

    if let Some(version) = &config.cuda_version {
        info!("[{}] installing CUDA toolkit {}", Stage::Toolkit, version);
        toolkit::install(version)
            .with_context(|| format!("toolkit {} install failed", version))?;
    } else {
        info!("[{}] no CUDA version requested, skipping", Stage::Toolkit);
    }

    info!("[{}] attempting live module activation", Stage::ModuleLoad);
    let module_loaded = kernel_module::load_live();

    let state = InstallState {
        driver_installed,
        module_loaded,
    };

    match harness_scope(config, &state) {
        HarnessScope::Full => {
            info!("[{}] running hardware and compute probes", Stage::Verify);
            verify::run(true);
        }
        HarnessScope::HardwareOnly => {
            info!("[{}] running hardware probe", Stage::Verify);
            verify::run(false);
        }
        HarnessScope::Skipped(SkipReason::TestsDisabled) => {
            info!("[{}] tests skipped by configuration", Stage::Verify);
        }
        HarnessScope::Skipped(SkipReason::ModuleNotLive) => {
            warn!(
                "[{}] module not live, skipping verification; GPU activates on next boot",
                Stage::Verify
            );
        }
    }

    info!("[{}] excluding driver packages from automatic upgrades", Stage::Lockdown);
    lockdown::apply(root).context("upgrade lockdown failed")?;

    if state.module_loaded {
        info!("bring-up complete, driver is live");
    } else {
        warn!("bring-up complete, reboot required to activate the driver");
    }
    Ok(())
}

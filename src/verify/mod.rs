// src/verify/mod.rs

//! Two-tier verification harness
//!
//! Tier one is a structured hardware probe over every visible device; tier
//! two compiles and executes a fixed vector-add workload on each device. The
//! probes are independent and a failure in either is logged as a warning, not
//! escalated: the node may still be fully functional after a reboot, and the
//! embedding pipeline decides what to do with a warned run.

pub mod compute;
pub mod hardware;

use tracing::{info, warn};

/// Run the harness; `include_compute` is true only when a toolkit was
/// requested for this run.
pub fn run(include_compute: bool) {
    match hardware::probe() {
        Ok(devices) => {
            info!("hardware probe found {} device(s)", devices.len());
            for device in &devices {
                info!(
                    "  gpu {}: {} driver {} mem {}/{} MiB temp {}C",
                    device.index,
                    device.name,
                    device.driver_version,
                    device.memory_free_mib,
                    device.memory_total_mib,
                    device.temperature_c
                );
            }
        }
        Err(e) => {
            warn!("{}; node may still be functional after reboot", e);
        }
    }

    if include_compute {
        match compute::probe() {
            Ok(()) => info!("compute probe passed on all devices"),
            Err(e) => warn!("{}; node may still be functional after reboot", e),
        }
    }
}

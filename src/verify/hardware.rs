// src/verify/hardware.rs

//! Structured hardware probe
//!
//! One multi-field nvidia-smi query covers every visible device in a single
//! call; the comma-delimited rows are parsed into per-device reports. Two
//! distinct failure modes: the query itself erroring (driver not answering)
//! and a well-formed reply with zero rows (no GPUs visible).

use crate::error::{Error, Result};
use crate::system;

/// Fields requested from the driver, in row order
const QUERY_FIELDS: &str = "index,name,driver_version,memory.total,memory.free,temperature.gpu";

/// Snapshot of one device, produced fresh per probe and never retained
#[derive(Debug, Clone, PartialEq)]
pub struct GpuDeviceReport {
    pub index: u32,
    pub name: String,
    pub driver_version: String,
    pub memory_total_mib: u64,
    pub memory_free_mib: u64,
    pub temperature_c: i64,
}

/// Query the driver and parse one report per visible device.
pub fn probe() -> Result<Vec<GpuDeviceReport>> {
    let query = format!("--query-gpu={}", QUERY_FIELDS);
    let output = system::run_capture(
        "nvidia-smi",
        &[query.as_str(), "--format=csv,noheader,nounits"],
    )
    .map_err(|e| Error::HardwareProbe(e.to_string()))?;

    parse_device_rows(&output)
}

/// Parse the delimited query output, trimming every field.
pub fn parse_device_rows(output: &str) -> Result<Vec<GpuDeviceReport>> {
    let mut reports = Vec::new();

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != 6 {
            return Err(Error::HardwareProbe(format!(
                "malformed device row (expected 6 fields, got {}): {}",
                fields.len(),
                line
            )));
        }

        let parse_err =
            |field: &str| Error::HardwareProbe(format!("non-numeric {} in row: {}", field, line));

        reports.push(GpuDeviceReport {
            index: fields[0].parse().map_err(|_| parse_err("index"))?,
            name: fields[1].to_string(),
            driver_version: fields[2].to_string(),
            memory_total_mib: fields[3].parse().map_err(|_| parse_err("memory.total"))?,
            memory_free_mib: fields[4].parse().map_err(|_| parse_err("memory.free"))?,
            temperature_c: fields[5].parse().map_err(|_| parse_err("temperature"))?,
        });
    }

    // Distinct from a query error: the driver answered but sees no GPUs
    if reports.is_empty() {
        return Err(Error::HardwareProbe(
            "query succeeded but no GPUs are visible".to_string(),
        ));
    }

    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_ROWS: &str = "\
0, NVIDIA A100-SXM4-80GB , 535.183.01, 81920, 81050 , 33
1,NVIDIA A100-SXM4-80GB, 535.183.01 ,81920,80992,35
";

    #[test]
    fn test_two_rows_yield_two_trimmed_reports() {
        let reports = parse_device_rows(TWO_ROWS).unwrap();
        assert_eq!(reports.len(), 2);

        assert_eq!(reports[0].index, 0);
        assert_eq!(reports[0].name, "NVIDIA A100-SXM4-80GB");
        assert_eq!(reports[0].driver_version, "535.183.01");
        assert_eq!(reports[0].memory_total_mib, 81920);
        assert_eq!(reports[0].memory_free_mib, 81050);
        assert_eq!(reports[0].temperature_c, 33);

        assert_eq!(reports[1].index, 1);
        assert_eq!(reports[1].memory_free_mib, 80992);
    }

    #[test]
    fn test_zero_rows_is_a_distinct_failure() {
        let err = parse_device_rows("").unwrap_err();
        assert!(err.to_string().contains("no GPUs are visible"));

        let err = parse_device_rows("\n  \n").unwrap_err();
        assert!(err.to_string().contains("no GPUs are visible"));
    }

    #[test]
    fn test_malformed_row_rejected() {
        assert!(parse_device_rows("0, NVIDIA A100, 535.183.01\n").is_err());
        assert!(parse_device_rows("zero,gpu,535,81920,81050,33\n").is_err());
    }
}

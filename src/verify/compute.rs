// src/verify/compute.rs

//! Compiled-workload compute probe
//!
//! Proves the full driver/toolkit/hardware pipeline by compiling a fixed
//! 1024-element vector-add kernel with nvcc and running it on every visible
//! device. Devices are evaluated strictly one at a time so a failure is
//! attributable to a specific index; one bad device does not stop evaluation
//! of the rest. Build artifacts live in a temp directory that is removed on
//! success and failure alike.

use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Fallback nvcc location when the toolkit is not on PATH
const NVCC_FALLBACK: &str = "/usr/local/cuda/bin/nvcc";

/// The canonical verification workload. The harness parses its stdout, so
/// the `device N: PASS` / `device N: FAIL ...` line format is load-bearing.
/// cudaDeviceSynchronize() is required before checking results: asynchronous
/// launch errors surface there, not at launch time.
const VECTOR_ADD_SOURCE: &str = r#"
#include <cstdio>
#include <cuda_runtime.h>

#define N 1024

__global__ void vector_add(const float *a, const float *b, float *c, int n) {
    int i = blockIdx.x * blockDim.x + threadIdx.x;
    if (i < n) {
        c[i] = a[i] + b[i];
    }
}

static int check_device(int dev) {
    cudaDeviceProp prop;
    if (cudaSetDevice(dev) != cudaSuccess ||
        cudaGetDeviceProperties(&prop, dev) != cudaSuccess) {
        printf("device %d: FAIL device selection or property query\n", dev);
        return 1;
    }

    float host_a[N], host_b[N], host_c[N];
    for (int i = 0; i < N; i++) {
        host_a[i] = 1.0f;
        host_b[i] = 2.0f;
        host_c[i] = 0.0f;
    }

    float *dev_a = NULL, *dev_b = NULL, *dev_c = NULL;
    if (cudaMalloc(&dev_a, N * sizeof(float)) != cudaSuccess ||
        cudaMalloc(&dev_b, N * sizeof(float)) != cudaSuccess ||
        cudaMalloc(&dev_c, N * sizeof(float)) != cudaSuccess) {
        printf("device %d: FAIL device allocation\n", dev);
        cudaFree(dev_a); cudaFree(dev_b); cudaFree(dev_c);
        return 1;
    }

    int failed = 0;
    cudaMemcpy(dev_a, host_a, N * sizeof(float), cudaMemcpyHostToDevice);
    cudaMemcpy(dev_b, host_b, N * sizeof(float), cudaMemcpyHostToDevice);

    vector_add<<<(N + 255) / 256, 256>>>(dev_a, dev_b, dev_c, N);

    cudaError_t sync = cudaDeviceSynchronize();
    if (sync != cudaSuccess) {
        printf("device %d: FAIL kernel execution: %s\n", dev, cudaGetErrorString(sync));
        failed = 1;
    } else {
        cudaMemcpy(host_c, dev_c, N * sizeof(float), cudaMemcpyDeviceToHost);
        for (int i = 0; i < N; i++) {
            if (host_c[i] != 3.0f) {
                printf("device %d: FAIL element %d expected 3.0 got %f\n", dev, i, host_c[i]);
                failed = 1;
                break;
            }
        }
    }

    if (!failed) {
        printf("device %d: PASS (%s)\n", dev, prop.name);
    }

    cudaFree(dev_a); cudaFree(dev_b); cudaFree(dev_c);
    return failed;
}

int main(void) {
    int count = 0;
    if (cudaGetDeviceCount(&count) != cudaSuccess || count == 0) {
        printf("no CUDA devices found\n");
        return 1;
    }

    int failures = 0;
    for (int dev = 0; dev < count; dev++) {
        failures += check_device(dev);
    }
    return failures > 0 ? 1 : 0;
}
"#;

/// One device's outcome, produced fresh per probe invocation
#[derive(Debug, Clone, PartialEq)]
pub struct KernelTestResult {
    pub index: u32,
    pub passed: bool,
    pub diagnostic: Option<String>,
}

/// Resolve the nvcc binary: PATH first, then the fixed install directory.
pub fn resolve_nvcc() -> Result<PathBuf> {
    if let Ok(path) = which::which("nvcc") {
        return Ok(path);
    }
    let fallback = PathBuf::from(NVCC_FALLBACK);
    if fallback.exists() {
        return Ok(fallback);
    }
    Err(Error::CompilerNotFound(fallback))
}

/// Compile and run the workload, then aggregate per-device results.
pub fn probe() -> Result<()> {
    let nvcc = resolve_nvcc()?;
    debug!("using compiler {}", nvcc.display());

    // Removed on drop, covering both success and failure paths
    let build_dir = tempfile::tempdir()?;
    let source = build_dir.path().join("vector_add.cu");
    let binary = build_dir.path().join("vector_add");
    fs::write(&source, VECTOR_ADD_SOURCE)?;

    compile(&nvcc, &source, &binary)?;
    let stdout = execute(&binary)?;

    let results = parse_kernel_output(&stdout)?;
    for result in &results {
        match &result.diagnostic {
            None => info!("compute probe: device {} passed", result.index),
            Some(diag) => info!("compute probe: device {}: {}", result.index, diag),
        }
    }
    aggregate(&results)
}

fn compile(nvcc: &Path, source: &Path, binary: &Path) -> Result<()> {
    let output = Command::new(nvcc)
        .arg(source)
        .arg("-o")
        .arg(binary)
        .output()
        .map_err(|e| Error::CommandSpawn {
            command: nvcc.display().to_string(),
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(Error::ComputeProbe(format!(
            "workload compilation failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(())
}

/// Run the compiled workload; a nonzero exit is expected on device failure,
/// so stdout is captured either way and the parsed results decide.
fn execute(binary: &Path) -> Result<String> {
    let output = Command::new(binary)
        .output()
        .map_err(|e| Error::CommandSpawn {
            command: binary.display().to_string(),
            reason: e.to_string(),
        })?;
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Parse the workload's per-device result lines.
pub fn parse_kernel_output(stdout: &str) -> Result<Vec<KernelTestResult>> {
    let mut results = Vec::new();

    for line in stdout.lines() {
        let line = line.trim();
        let Some(rest) = line.strip_prefix("device ") else {
            continue;
        };
        let Some((index, verdict)) = rest.split_once(':') else {
            continue;
        };
        let index: u32 = index
            .trim()
            .parse()
            .map_err(|_| Error::ComputeProbe(format!("unparseable result line: {}", line)))?;

        let verdict = verdict.trim();
        if verdict.starts_with("PASS") {
            results.push(KernelTestResult {
                index,
                passed: true,
                diagnostic: None,
            });
        } else {
            results.push(KernelTestResult {
                index,
                passed: false,
                diagnostic: Some(verdict.to_string()),
            });
        }
    }

    if results.is_empty() {
        return Err(Error::ComputeProbe(
            "workload reported no per-device results".to_string(),
        ));
    }
    Ok(results)
}

/// Overall verdict: fails if any device failed, naming which.
pub fn aggregate(results: &[KernelTestResult]) -> Result<()> {
    let failed: Vec<String> = results
        .iter()
        .filter(|r| !r.passed)
        .map(|r| r.index.to_string())
        .collect();

    if failed.is_empty() {
        Ok(())
    } else {
        Err(Error::ComputeProbe(format!(
            "kernel verification failed on device(s) {}",
            failed.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_device_results() {
        let stdout = "\
device 0: PASS (NVIDIA A100-SXM4-80GB)
device 1: FAIL element 17 expected 3.0 got 2.000000
";
        let results = parse_kernel_output(stdout).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].passed);
        assert!(results[0].diagnostic.is_none());
        assert!(!results[1].passed);
        assert!(results[1].diagnostic.as_deref().unwrap().contains("element 17"));
    }

    #[test]
    fn test_one_bad_device_fails_overall_and_names_it() {
        let results = vec![
            KernelTestResult {
                index: 0,
                passed: true,
                diagnostic: None,
            },
            KernelTestResult {
                index: 1,
                passed: false,
                diagnostic: Some("FAIL element 17 expected 3.0 got 2.000000".to_string()),
            },
        ];

        let err = aggregate(&results).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("device(s) 1"));
        assert!(!message.contains("0,"));

        // The passing device's result is unaffected by its neighbor
        assert!(results[0].passed);
    }

    #[test]
    fn test_all_devices_passing_is_ok() {
        let results = vec![
            KernelTestResult {
                index: 0,
                passed: true,
                diagnostic: None,
            },
            KernelTestResult {
                index: 1,
                passed: true,
                diagnostic: None,
            },
        ];
        assert!(aggregate(&results).is_ok());
    }

    #[test]
    fn test_empty_output_is_an_error() {
        assert!(parse_kernel_output("").is_err());
        assert!(parse_kernel_output("no CUDA devices found\n").is_err());
    }

    #[test]
    fn test_workload_source_mentions_required_calls() {
        // The fixed workload must synchronize before verifying and must
        // verify against exact 3.0
        assert!(VECTOR_ADD_SOURCE.contains("cudaDeviceSynchronize"));
        assert!(VECTOR_ADD_SOURCE.contains("!= 3.0f"));
        assert!(VECTOR_ADD_SOURCE.contains("#define N 1024"));
    }
}

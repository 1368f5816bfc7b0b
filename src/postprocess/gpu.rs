//! Accelerator detection and GPU device reservations.

use super::stage::{for_each_service, mapping_entry, PostProcessStage};
use crate::compose::ComposeFile;
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// Services that never receive a GPU reservation
pub const GPU_DENYLIST: &[&str] = &["db", "redis", "postgres", "mysql", "mariadb", "mongodb"];

const NVIDIA_CAPABILITIES: &[&str] = &["gpu", "compute", "utility"];
const AMD_CAPABILITIES: &[&str] = &["gpu", "compute"];

const OPENCL_LIBRARIES: &[&str] = &["libOpenCL.so", "libOpenCL.so.1", "OpenCL.dll"];

const LIBRARY_DIRS: &[&str] = &[
    "/usr/lib",
    "/usr/lib64",
    "/usr/lib/x86_64-linux-gnu",
    "/usr/lib/aarch64-linux-gnu",
    "/usr/local/lib",
    "/opt/rocm/lib",
    "/usr/local/cuda/lib64",
    "C:\\Windows\\System32",
];

/// Host capability checks
pub trait GpuProbe {
    /// Whether `program args...` can be started and exits successfully
    fn command_succeeds(&self, program: &str, args: &[&str]) -> bool;

    /// Whether any of the named shared libraries can be found
    fn library_available(&self, names: &[&str]) -> bool;
}

/// Probes the real host: subprocesses with discarded output and a library
/// search over `LD_LIBRARY_PATH` and common system directories.
pub struct SystemProbe {
    search_dirs: Vec<PathBuf>,
}

impl SystemProbe {
    pub fn new() -> Self {
        let mut search_dirs: Vec<PathBuf> = std::env::var_os("LD_LIBRARY_PATH")
            .map(|paths| std::env::split_paths(&paths).collect())
            .unwrap_or_default();
        search_dirs.extend(LIBRARY_DIRS.iter().map(PathBuf::from));
        Self { search_dirs }
    }
}

impl Default for SystemProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl GpuProbe for SystemProbe {
    fn command_succeeds(&self, program: &str, args: &[&str]) -> bool {
        match Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
        {
            Ok(status) => status.success(),
            Err(e) => {
                debug!(program, error = %e, "Probe command unavailable");
                false
            }
        }
    }

    fn library_available(&self, names: &[&str]) -> bool {
        self.search_dirs
            .iter()
            .any(|dir| names.iter().any(|name| Path::new(dir).join(name).is_file()))
    }
}

/// Accelerators found on the host
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GpuCapabilities {
    pub cuda: bool,
    pub rocm: bool,
    pub opencl: bool,
    pub intel: bool,
}

impl GpuCapabilities {
    pub fn detect(probe: &dyn GpuProbe) -> Self {
        let capabilities = Self {
            cuda: probe.command_succeeds("nvidia-smi", &[]),
            rocm: probe.command_succeeds("rocm-smi", &[]),
            opencl: probe.library_available(OPENCL_LIBRARIES),
            intel: probe.command_succeeds("intel_gpu_top", &["-L"]),
        };
        debug!(?capabilities, "GPU probe finished");
        capabilities
    }

    /// OpenCL alone does not count as a usable GPU.
    pub fn has_gpu(&self) -> bool {
        self.cuda || self.rocm || self.intel
    }

    pub fn labels(&self) -> Vec<&'static str> {
        [
            (self.cuda, "CUDA"),
            (self.rocm, "ROCm"),
            (self.opencl, "OpenCL"),
            (self.intel, "Intel GPU"),
        ]
        .into_iter()
        .filter_map(|(present, label)| present.then_some(label))
        .collect()
    }

    fn device(&self) -> Option<(&'static str, &'static [&'static str])> {
        if self.cuda {
            Some(("nvidia", NVIDIA_CAPABILITIES))
        } else if self.rocm {
            Some(("amd", AMD_CAPABILITIES))
        } else {
            None
        }
    }
}

/// Adds device reservations for CUDA or ROCm hosts. CUDA wins when both
/// are present.
pub struct GpuStage {
    capabilities: GpuCapabilities,
}

impl GpuStage {
    pub fn new(capabilities: GpuCapabilities) -> Self {
        Self { capabilities }
    }
}

impl PostProcessStage for GpuStage {
    fn name(&self) -> &'static str {
        "gpu"
    }

    fn apply(&self, compose: &mut ComposeFile) {
        // Intel and OpenCL hosts have no device entry to reserve
        let Some((driver, capabilities)) = self.capabilities.device() else {
            return;
        };
        let cuda = self.capabilities.cuda;

        for_each_service(compose, |name, service| {
            if GPU_DENYLIST.contains(&name) {
                return;
            }

            let Some(reservations) = mapping_entry(service, "deploy")
                .and_then(|deploy| mapping_entry(deploy, "resources"))
                .and_then(|resources| mapping_entry(resources, "reservations"))
            else {
                return;
            };
            add_device(reservations, driver, capabilities);

            if cuda {
                service.insert("runtime".into(), "nvidia".into());
            }
        });
    }
}

fn add_device(reservations: &mut Mapping, driver: &str, capabilities: &[&str]) {
    if !reservations.get("devices").is_some_and(Value::is_sequence) {
        reservations.insert("devices".into(), Value::Sequence(Vec::new()));
    }
    let Some(Value::Sequence(devices)) = reservations.get_mut("devices") else {
        return;
    };

    let already_reserved = devices
        .iter()
        .any(|device| device.get("driver").and_then(Value::as_str) == Some(driver));
    if already_reserved {
        return;
    }

    let mut device = Mapping::new();
    device.insert("driver".into(), driver.into());
    device.insert("count".into(), "all".into());
    device.insert(
        "capabilities".into(),
        Value::Sequence(capabilities.iter().map(|c| Value::from(*c)).collect()),
    );
    devices.push(Value::Mapping(device));
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeProbe {
        commands: Vec<&'static str>,
        opencl: bool,
    }

    impl GpuProbe for FakeProbe {
        fn command_succeeds(&self, program: &str, _args: &[&str]) -> bool {
            self.commands.contains(&program)
        }

        fn library_available(&self, _names: &[&str]) -> bool {
            self.opencl
        }
    }

    fn compose(source: &str) -> ComposeFile {
        ComposeFile::from_mapping(serde_yaml::from_str(source).unwrap())
    }

    const STACK: &str = "services:\n  app:\n    image: python:3.12-slim\n  db:\n    image: postgres:16-alpine\n";

    #[test]
    fn test_detect_from_probe() {
        let probe = FakeProbe {
            commands: vec!["rocm-smi", "intel_gpu_top"],
            opencl: true,
        };
        let capabilities = GpuCapabilities::detect(&probe);

        assert!(!capabilities.cuda);
        assert!(capabilities.rocm);
        assert!(capabilities.has_gpu());
        assert_eq!(capabilities.labels(), vec!["ROCm", "OpenCL", "Intel GPU"]);
    }

    #[test]
    fn test_opencl_alone_is_not_a_gpu() {
        let capabilities = GpuCapabilities {
            opencl: true,
            ..Default::default()
        };
        let mut doc = compose(STACK);
        GpuStage::new(capabilities).apply(&mut doc);

        assert!(!capabilities.has_gpu());
        assert_eq!(doc, compose(STACK));
    }

    #[test]
    fn test_cuda_reservation_and_runtime() {
        let mut doc = compose(STACK);
        GpuStage::new(GpuCapabilities {
            cuda: true,
            rocm: true,
            ..Default::default()
        })
        .apply(&mut doc);

        assert_eq!(
            doc,
            compose(
                "services:\n  app:\n    image: python:3.12-slim\n    deploy:\n      resources:\n        reservations:\n          devices:\n            - driver: nvidia\n              count: all\n              capabilities: [gpu, compute, utility]\n    runtime: nvidia\n  db:\n    image: postgres:16-alpine\n"
            )
        );
    }

    #[test]
    fn test_rocm_reservation() {
        let mut doc = compose(STACK);
        GpuStage::new(GpuCapabilities {
            rocm: true,
            ..Default::default()
        })
        .apply(&mut doc);

        let app = doc.service("app").unwrap();
        let devices = &app.get("deploy").unwrap()["resources"]["reservations"]["devices"];
        assert_eq!(devices[0]["driver"], Value::from("amd"));
        assert!(app.get("runtime").is_none());
    }

    #[test]
    fn test_intel_only_injects_nothing() {
        let capabilities = GpuCapabilities {
            intel: true,
            ..Default::default()
        };
        let mut doc = compose(STACK);
        GpuStage::new(capabilities).apply(&mut doc);

        assert!(capabilities.has_gpu());
        assert_eq!(doc, compose(STACK));
    }

    #[test]
    fn test_idempotent_and_keeps_foreign_devices() {
        let mut doc = compose(
            "services:\n  trainer:\n    image: pytorch/pytorch:2.3\n    deploy:\n      resources:\n        reservations:\n          devices:\n            - driver: custom\n",
        );
        let stage = GpuStage::new(GpuCapabilities {
            cuda: true,
            ..Default::default()
        });
        stage.apply(&mut doc);
        let once = doc.clone();
        stage.apply(&mut doc);

        assert_eq!(doc, once);
        let deploy = doc.service("trainer").unwrap().get("deploy").unwrap();
        let devices = deploy["resources"]["reservations"]["devices"].as_sequence().unwrap();
        assert_eq!(devices.len(), 2);
    }
}

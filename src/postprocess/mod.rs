//! Post-processing of the merged compose document.
//!
//! Stages run in a fixed order: build cache, platform, GPU, watch stripping,
//! resource limits. Each stage is idempotent and a no-op without `services`.

pub mod cache;
pub mod gpu;
pub mod limits;
pub mod platform;
pub mod stage;
pub mod watch;

pub use cache::BuildCacheStage;
pub use gpu::{GpuCapabilities, GpuProbe, GpuStage, SystemProbe};
pub use limits::ResourceLimitsStage;
pub use platform::{HostPlatform, ParsePlatformError, PlatformStage, TargetPlatform};
pub use stage::PostProcessStage;
pub use watch::StripWatchStage;

use crate::compose::ComposeFile;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Explicit platform; the host architecture decides when `None`
    pub platform: Option<TargetPlatform>,
    pub gpu: bool,
    pub watch: bool,
    pub resource_limits: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            platform: None,
            gpu: true,
            watch: true,
            resource_limits: false,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_platform(mut self, platform: Option<TargetPlatform>) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_gpu(mut self, gpu: bool) -> Self {
        self.gpu = gpu;
        self
    }

    pub fn with_watch(mut self, watch: bool) -> Self {
        self.watch = watch;
        self
    }

    pub fn with_resource_limits(mut self, resource_limits: bool) -> Self {
        self.resource_limits = resource_limits;
        self
    }
}

/// Facts about the host that stages depend on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFacts {
    pub platform: HostPlatform,
    pub gpu: GpuCapabilities,
}

impl HostFacts {
    /// Inspects the running machine. GPU probes are skipped when `probe_gpu`
    /// is false.
    pub fn detect(probe_gpu: bool) -> Self {
        let gpu = if probe_gpu {
            GpuCapabilities::detect(&SystemProbe::new())
        } else {
            GpuCapabilities::default()
        };
        Self {
            platform: HostPlatform::detect(),
            gpu,
        }
    }
}

pub struct Pipeline {
    stages: Vec<Box<dyn PostProcessStage>>,
    target: TargetPlatform,
}

impl Pipeline {
    pub fn new(config: &PipelineConfig, host: &HostFacts) -> Self {
        let target = config.platform.unwrap_or_else(|| host.platform.target());

        let mut stages: Vec<Box<dyn PostProcessStage>> = vec![
            Box::new(BuildCacheStage),
            Box::new(PlatformStage::new(target)),
        ];
        if config.gpu {
            stages.push(Box::new(GpuStage::new(host.gpu)));
        }
        if !config.watch {
            stages.push(Box::new(StripWatchStage));
        }
        if config.resource_limits {
            stages.push(Box::new(ResourceLimitsStage::default()));
        }

        Self { stages, target }
    }

    pub fn target(&self) -> TargetPlatform {
        self.target
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    pub fn run(&self, compose: &mut ComposeFile) {
        for stage in &self.stages {
            debug!(stage = stage.name(), "Running post-processing stage");
            stage.apply(compose);
        }
        info!(stages = self.stages.len(), platform = %self.target, "Post-processing complete");
    }
}

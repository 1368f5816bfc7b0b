//! End-to-end generation
//!
//! [`Generator`] ties the stages together for one project:
//!
//! ```text
//! project root
//!   ├── detection (signatures, env hints, manifests, proxies)
//!   ├── ComposeBuilder (templates + version pinning + merge)
//!   └── Pipeline (build cache, platform, GPU, watch, limits)
//! ```
//!
//! Nothing here writes files; see [`crate::output`] for that.
//!
//! # Example
//!
//! ```no_run
//! use stackcompose::fs::RealFileSystem;
//! use stackcompose::postprocess::{HostFacts, PipelineConfig};
//! use stackcompose::templates::TemplateLibrary;
//! use stackcompose::version::Environment;
//! use stackcompose::Generator;
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let generator = Generator::new(
//!     RealFileSystem::new(),
//!     TemplateLibrary::builtin()?,
//!     Environment::from_process(),
//!     HostFacts::detect(true),
//! );
//! let report = generator.generate(Path::new("."), &[], &PipelineConfig::default())?;
//! println!("{}", report.compose.to_yaml()?);
//! # Ok(())
//! # }
//! ```

use crate::compose::{ComposeBuilder, ComposeFile};
use crate::detection::{detect_project, Detection};
use crate::error::GenerateError;
use crate::fs::FileSystem;
use crate::postprocess::{GpuCapabilities, HostFacts, Pipeline, PipelineConfig, TargetPlatform};
use crate::stack::TechnologyId;
use crate::templates::TemplateLibrary;
use crate::version::{Environment, VersionResolver};
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Everything a caller needs to write and summarize one run
#[derive(Debug, Clone, Serialize)]
pub struct GenerateReport {
    pub compose: ComposeFile,
    pub detection: Detection,
    /// Identifiers whose templates were merged, in merge order
    pub applied: Vec<TechnologyId>,
    /// Identifiers without a template
    pub missing: Vec<TechnologyId>,
    pub platform: TargetPlatform,
    /// Host accelerators; all false when GPU handling is disabled
    pub gpu: GpuCapabilities,
    pub elapsed_ms: u64,
}

impl GenerateReport {
    /// Detected identifiers without duplicates, forced ones excluded
    pub fn detected(&self) -> Vec<TechnologyId> {
        self.detection.unique()
    }
}

pub struct Generator<F: FileSystem> {
    fs: F,
    library: TemplateLibrary,
    env: Environment,
    host: HostFacts,
}

impl<F: FileSystem> std::fmt::Debug for Generator<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generator")
            .field("templates", &self.library.len())
            .field("host", &self.host)
            .finish()
    }
}

impl<F: FileSystem> Generator<F> {
    pub fn new(fs: F, library: TemplateLibrary, env: Environment, host: HostFacts) -> Self {
        Self {
            fs,
            library,
            env,
            host,
        }
    }

    pub fn library(&self) -> &TemplateLibrary {
        &self.library
    }

    pub fn host(&self) -> &HostFacts {
        &self.host
    }

    /// Detects, merges and post-processes the descriptor for `project_root`.
    ///
    /// `forced` identifiers are appended after detected ones.
    ///
    /// # Errors
    ///
    /// - [`GenerateError::InvalidProjectRoot`] if the root is not a directory
    /// - [`GenerateError::NoSupportedTechnology`] if nothing was detected or forced
    pub fn generate(
        &self,
        project_root: &Path,
        forced: &[TechnologyId],
        pipeline: &PipelineConfig,
    ) -> Result<GenerateReport, GenerateError> {
        let start = Instant::now();

        if !self.fs.is_dir(project_root) {
            return Err(GenerateError::InvalidProjectRoot(project_root.to_path_buf()));
        }
        info!(root = %project_root.display(), "Starting generation");

        let detection = detect_project(&self.fs, project_root);
        debug!(forced = ?forced.iter().map(|t| t.key()).collect::<Vec<_>>(), "Forced technologies");

        let resolver = VersionResolver::new(&self.fs, project_root, &self.env);
        let generated =
            ComposeBuilder::new(&self.library, resolver).build(&detection.technologies, forced)?;

        let pipeline = Pipeline::new(pipeline, &self.host);
        let mut compose = generated.compose;
        pipeline.run(&mut compose);

        let gpu = if pipeline.stage_names().contains(&"gpu") {
            self.host.gpu
        } else {
            GpuCapabilities::default()
        };

        let elapsed_ms = start.elapsed().as_millis() as u64;
        info!(
            services = compose.service_names().len(),
            elapsed_ms, "Generation completed"
        );

        Ok(GenerateReport {
            compose,
            detection,
            applied: generated.applied,
            missing: generated.missing,
            platform: pipeline.target(),
            gpu,
            elapsed_ms,
        })
    }
}

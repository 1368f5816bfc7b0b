//! Configuration management for stackcompose
//!
//! Settings are loaded from environment variables with constant fallbacks.
//! Command-line flags are applied on top by the CLI layer.
//!
//! # Environment Variables
//!
//! - `STACKCOMPOSE_OUTPUT`: Descriptor path - default: "docker-compose.generated.yml"
//! - `STACKCOMPOSE_GPU`: Probe for GPUs and add reservations (true|false) - default: "true"
//! - `STACKCOMPOSE_BAKE`: Write `docker-bake.hcl` (true|false) - default: "true"
//! - `STACKCOMPOSE_TEMPLATE_DIR`: Directory of extra `*.yml` templates - default: unset
//! - `DOCKER_DEFAULT_PLATFORM`: Target platform (amd64|arm64|linux/amd64|linux/arm64) - default: host
//!
//! # Example
//!
//! ```no_run
//! use stackcompose::GeneratorConfig;
//!
//! let config = GeneratorConfig::default();
//! config.validate().expect("Invalid configuration");
//! let pipeline = config.pipeline_config();
//! ```

use crate::postprocess::{PipelineConfig, TargetPlatform};
use std::env;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_OUTPUT: &str = "docker-compose.generated.yml";
const DEFAULT_GPU: bool = true;
const DEFAULT_BAKE: bool = true;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    /// Failed to parse configuration value
    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Where the descriptor is written
    pub output: PathBuf,

    /// Probe host accelerators and add device reservations
    pub gpu: bool,

    /// Write a `docker-bake.hcl` next to the project
    pub bake: bool,

    /// Keep `develop` sections in the output
    pub watch: bool,

    /// Add default CPU and memory limits
    pub resource_limits: bool,

    /// Explicit platform; `None` follows the host architecture
    pub platform: Option<TargetPlatform>,

    /// Extra templates layered over the built-in library
    pub template_dir: Option<PathBuf>,
}

impl Default for GeneratorConfig {
    /// Reads `STACKCOMPOSE_*` variables and `DOCKER_DEFAULT_PLATFORM`.
    ///
    /// Unparseable values fall back to their defaults.
    fn default() -> Self {
        let output = env::var("STACKCOMPOSE_OUTPUT")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

        let gpu = env_bool("STACKCOMPOSE_GPU").unwrap_or(DEFAULT_GPU);
        let bake = env_bool("STACKCOMPOSE_BAKE").unwrap_or(DEFAULT_BAKE);

        let template_dir = env::var("STACKCOMPOSE_TEMPLATE_DIR")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        let platform = match env::var("DOCKER_DEFAULT_PLATFORM") {
            Ok(value) if !value.trim().is_empty() => match value.parse::<TargetPlatform>() {
                Ok(platform) => Some(platform),
                Err(e) => {
                    warn!(error = %e, "Ignoring DOCKER_DEFAULT_PLATFORM");
                    None
                }
            },
            _ => None,
        };

        Self {
            output,
            gpu,
            bake,
            watch: true,
            resource_limits: false,
            platform,
            template_dir,
        }
    }
}

fn env_bool(key: &str) -> Option<bool> {
    env::var(key)
        .ok()
        .and_then(|v| parse_bool(&v).ok())
}

/// Accepts `true|false|1|0|yes|no|on|off`, case-insensitive.
pub fn parse_bool(value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(ConfigError::ParseError {
            field: "boolean".to_string(),
            error: format!("'{}' is not a boolean", other),
        }),
    }
}

impl GeneratorConfig {
    /// Validates the configuration
    ///
    /// Checks that the output path is non-empty and that the template
    /// directory, when set, is an existing directory.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output.as_os_str().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Output path must not be empty".to_string(),
            ));
        }

        if let Some(dir) = &self.template_dir {
            if !dir.is_dir() {
                return Err(ConfigError::ValidationFailed(format!(
                    "Template directory is not a directory: {}",
                    dir.display()
                )));
            }
        }

        Ok(())
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig::new()
            .with_platform(self.platform)
            .with_gpu(self.gpu)
            .with_watch(self.watch)
            .with_resource_limits(self.resource_limits)
    }
}

impl fmt::Display for GeneratorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Stackcompose Configuration:")?;
        writeln!(f, "  Output: {}", self.output.display())?;
        writeln!(f, "  GPU: {}", self.gpu)?;
        writeln!(f, "  Bake: {}", self.bake)?;
        writeln!(f, "  Watch: {}", self.watch)?;
        writeln!(f, "  Resource Limits: {}", self.resource_limits)?;
        match self.platform {
            Some(platform) => writeln!(f, "  Platform: {}", platform)?,
            None => writeln!(f, "  Platform: auto")?,
        }
        if let Some(ref dir) = self.template_dir {
            writeln!(f, "  Template Dir: {}", dir.display())?;
        }
        Ok(())
    }
}

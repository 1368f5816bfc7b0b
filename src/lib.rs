//! stackcompose - docker-compose generation for local projects
//!
//! The library inspects a project directory, maps what it finds to
//! technology identifiers, merges one compose template per identifier and
//! post-processes the result for the host.
//!
//! # Example
//!
//! ```no_run
//! use stackcompose::fs::RealFileSystem;
//! use stackcompose::postprocess::{HostFacts, PipelineConfig};
//! use stackcompose::templates::TemplateLibrary;
//! use stackcompose::version::Environment;
//! use stackcompose::{output, Generator};
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let generator = Generator::new(
//!     RealFileSystem::new(),
//!     TemplateLibrary::builtin()?,
//!     Environment::from_process(),
//!     HostFacts::detect(false),
//! );
//! let report = generator.generate(Path::new("/path/to/project"), &[], &PipelineConfig::default())?;
//! output::write_compose(&report.compose, Path::new("docker-compose.generated.yml"))?;
//! # Ok(())
//! # }
//! ```
//!
//! # Project Structure
//!
//! - [`detection`]: signature matching and dependency inspection
//! - [`version`]: runtime version resolution
//! - [`templates`]: the template library
//! - [`compose`]: template merging
//! - [`postprocess`]: host-specific stages
//! - [`output`]: descriptor, bake file and summary

pub mod cli;
pub mod compose;
pub mod config;
pub mod detection;
pub mod error;
pub mod fs;
pub mod generator;
pub mod output;
pub mod postprocess;
pub mod stack;
pub mod templates;
pub mod util;
pub mod version;

pub use compose::ComposeFile;
pub use config::{ConfigError, GeneratorConfig};
pub use detection::{detect_project, Detection};
pub use error::GenerateError;
pub use generator::{GenerateReport, Generator};
pub use stack::TechnologyId;
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

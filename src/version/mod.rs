//! Image tag resolution.
//!
//! Resolution order for a technology:
//! 1. project metadata of its runtime (`.nvmrc`, `go.mod`, `*.csproj`, ...)
//! 2. the `<ID>_VERSION` variable in the supplied [`Environment`]
//! 3. a per-technology default
//! 4. `latest`
//!
//! [`resolve`] never fails and never returns an empty string.

mod environment;
pub mod extractors;

pub use environment::Environment;

use crate::fs::FileSystem;
use crate::stack::TechnologyId;
use std::path::Path;
use tracing::debug;

pub const FALLBACK_VERSION: &str = "latest";

pub fn default_version(technology: &TechnologyId) -> Option<&'static str> {
    let version = match technology {
        TechnologyId::Node => "20-alpine",
        TechnologyId::Python
        | TechnologyId::Django
        | TechnologyId::Flask
        | TechnologyId::FastApi => "3.12-slim",
        TechnologyId::Php => "8.3-apache",
        TechnologyId::Go => "1.22-alpine",
        TechnologyId::Ruby => "3.3-alpine",
        TechnologyId::DotNet => "8.0",
        TechnologyId::Spring => "21-jre-jammy",
        TechnologyId::Postgres => "16-alpine",
        TechnologyId::MySql => "8.4",
        TechnologyId::MariaDb => "11",
        TechnologyId::Cassandra => "5",
        TechnologyId::Nginx => "1.27-alpine",
        TechnologyId::Apache => "2.4-alpine",
        TechnologyId::Jupyter => "latest",
        TechnologyId::Laravel => "8.3-fpm",
        TechnologyId::Vue | TechnologyId::React | TechnologyId::Angular => "20-alpine",
        _ => return None,
    };
    Some(version)
}

/// Environment variable that overrides the version of `technology`
pub fn override_variable(technology: &TechnologyId) -> String {
    let key: String = technology
        .key()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    format!("{}_VERSION", key)
}

/// Resolves versions for one project against one environment.
pub struct VersionResolver<'a, F: FileSystem> {
    fs: &'a F,
    project_root: &'a Path,
    env: &'a Environment,
}

impl<'a, F: FileSystem> VersionResolver<'a, F> {
    pub fn new(fs: &'a F, project_root: &'a Path, env: &'a Environment) -> Self {
        Self {
            fs,
            project_root,
            env,
        }
    }

    pub fn resolve(&self, technology: &TechnologyId) -> String {
        let runtime = technology.version_source();
        match extractors::extract(self.fs, self.project_root, &runtime) {
            Ok(Some(version)) => {
                debug!(technology = %technology, version = %version, "Version from project metadata");
                return version;
            }
            Ok(None) => {}
            Err(e) => {
                debug!(technology = %technology, error = %e, "Version metadata unusable, falling back");
            }
        }

        let variable = override_variable(technology);
        if let Some(version) = self.env.get_non_empty(&variable) {
            debug!(technology = %technology, variable = %variable, "Version from environment");
            return version.to_string();
        }

        default_version(technology)
            .unwrap_or(FALLBACK_VERSION)
            .to_string()
    }
}

pub fn resolve<F: FileSystem>(
    fs: &F,
    project_root: &Path,
    technology: &TechnologyId,
    env: &Environment,
) -> String {
    VersionResolver::new(fs, project_root, env).resolve(technology)
}

//! Marker-file signature matching

use super::Detection;
use crate::fs::FileSystem;
use crate::stack::TechnologyId;
use std::path::Path;
use tracing::debug;

const NOTEBOOK_EXTENSION: &str = ".ipynb";

/// A marker file (or extension-style marker) that implies a technology
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureRule {
    pub marker: &'static str,
    pub technology: TechnologyId,
}

/// How a marker is looked up under the project root
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerPattern<'a> {
    /// Relative path checked at the root only
    Path(&'a str),
    /// Filename suffix searched recursively
    Extension(&'a str),
}

impl SignatureRule {
    const fn new(marker: &'static str, technology: TechnologyId) -> Self {
        Self { marker, technology }
    }

    pub fn pattern(&self) -> MarkerPattern<'static> {
        if self.marker.starts_with('.') {
            MarkerPattern::Extension(self.marker)
        } else {
            MarkerPattern::Path(self.marker)
        }
    }
}

/// Rules in evaluation order. The order decides which services come first in
/// the generated file, and therefore which fields win on merge collisions.
pub const SIGNATURE_RULES: &[SignatureRule] = &[
    SignatureRule::new("package.json", TechnologyId::Node),
    SignatureRule::new("pom.xml", TechnologyId::Spring),
    SignatureRule::new("build.gradle", TechnologyId::Spring),
    SignatureRule::new("composer.json", TechnologyId::Php),
    SignatureRule::new("go.mod", TechnologyId::Go),
    SignatureRule::new("CMakeLists.txt", TechnologyId::Cpp),
    SignatureRule::new("Gemfile", TechnologyId::Ruby),
    SignatureRule::new(".csproj", TechnologyId::DotNet),
    SignatureRule::new("requirements.txt", TechnologyId::Python),
    SignatureRule::new("setup.py", TechnologyId::Python),
    SignatureRule::new("pyproject.toml", TechnologyId::Python),
    SignatureRule::new("manage.py", TechnologyId::Django),
    SignatureRule::new("wsgi.py", TechnologyId::Django),
    SignatureRule::new("asgi.py", TechnologyId::Django),
    SignatureRule::new("app.py", TechnologyId::Flask),
    SignatureRule::new("Cargo.toml", TechnologyId::Rust),
    SignatureRule::new("build.sbt", TechnologyId::Scala),
    SignatureRule::new("mix.exs", TechnologyId::Elixir),
    SignatureRule::new("artisan", TechnologyId::Laravel),
    SignatureRule::new("main.rs", TechnologyId::Rust),
    SignatureRule::new("angular.json", TechnologyId::Angular),
    SignatureRule::new("vue.config.js", TechnologyId::Vue),
    SignatureRule::new("gatsby-config.js", TechnologyId::React),
    SignatureRule::new("next.config.js", TechnologyId::React),
    SignatureRule::new("tsconfig.json", TechnologyId::Node),
];

pub fn detect<F: FileSystem>(fs: &F, project_root: &Path) -> Detection {
    let mut detection = Detection::new();

    for rule in SIGNATURE_RULES {
        let matched = match rule.pattern() {
            MarkerPattern::Path(relative) => fs.exists(&project_root.join(relative)),
            MarkerPattern::Extension(suffix) => {
                match fs.find_files(project_root, &|name| name.ends_with(suffix)) {
                    Ok(found) => !found.is_empty(),
                    Err(e) => {
                        detection.skip(project_root, format!("{} search failed: {}", suffix, e));
                        false
                    }
                }
            }
        };

        if matched {
            debug!(marker = rule.marker, technology = %rule.technology, "Signature matched");
            detection.push(rule.technology.clone());
        }
    }

    match fs.read_dir(project_root) {
        Ok(entries) => {
            if entries
                .iter()
                .any(|e| e.is_file() && e.file_name().ends_with(NOTEBOOK_EXTENSION))
            {
                debug!("Notebook found at project root");
                detection.push(TechnologyId::Jupyter);
            }
        }
        Err(e) => detection.skip(project_root, e),
    }

    detection
}

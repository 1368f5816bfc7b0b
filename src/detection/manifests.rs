//! Dependency manifests read once per detection run.

use super::Detection;
use crate::fs::FileSystem;
use crate::stack::TechnologyId;
use serde_json::Value;
use std::path::Path;
use tracing::trace;

/// Root-level Python files scanned for import statements
const MAX_PYTHON_SOURCES: usize = 10;

/// Dependencies that also count when imported from root Python files
const IMPORT_PROBED: &[&str] = &["fastapi", "flask", "django"];

/// Dependency groups and the service each one implies, in probe order
pub const DEPENDENCY_PROBES: &[(&[&str], TechnologyId)] = &[
    (&["psycopg2", "pg"], TechnologyId::Postgres),
    (&["mysql", "mysql2"], TechnologyId::MySql),
    (&["mongodb", "mongoose"], TechnologyId::MongoDb),
    (&["redis"], TechnologyId::Redis),
    (&["elasticsearch"], TechnologyId::Elasticsearch),
];

#[derive(Debug, Clone, Default)]
pub struct ProjectManifests {
    requirements: Vec<String>,
    pyproject: Option<String>,
    npm_dependencies: Vec<String>,
    composer_dependencies: Vec<String>,
    python_sources: Vec<String>,
}

impl ProjectManifests {
    pub fn load<F: FileSystem>(fs: &F, project_root: &Path, detection: &mut Detection) -> Self {
        let mut manifests = Self::default();

        if let Some(content) = read_optional(fs, &project_root.join("requirements.txt"), detection) {
            manifests.requirements = content.lines().map(str::to_lowercase).collect();
        }

        manifests.pyproject = read_optional(fs, &project_root.join("pyproject.toml"), detection)
            .map(|content| content.to_lowercase());

        manifests.npm_dependencies = read_json_keys(
            fs,
            &project_root.join("package.json"),
            &["dependencies", "devDependencies"],
            detection,
        );
        manifests.composer_dependencies = read_json_keys(
            fs,
            &project_root.join("composer.json"),
            &["require", "require-dev"],
            detection,
        );

        match fs.read_dir(project_root) {
            Ok(entries) => {
                for entry in entries
                    .iter()
                    .filter(|e| e.is_file() && e.file_name().ends_with(".py"))
                    .take(MAX_PYTHON_SOURCES)
                {
                    if let Some(content) = read_optional(fs, entry.path(), detection) {
                        manifests.python_sources.push(content);
                    }
                }
            }
            Err(e) => detection.skip(project_root, e),
        }

        manifests
    }

    /// Whether `name` is declared by any manifest.
    ///
    /// `requirements.txt` and `pyproject.toml` match by case-insensitive
    /// substring, `package.json` by exact key, `composer.json` by key
    /// substring. Framework names are also matched against
    /// `import <name>` / `from <name>` in root Python files.
    pub fn has_dependency(&self, name: &str) -> bool {
        let needle = name.to_lowercase();

        if self.requirements.iter().any(|line| line.contains(&needle)) {
            return true;
        }
        if self
            .pyproject
            .as_deref()
            .is_some_and(|content| content.contains(&needle))
        {
            return true;
        }
        if self.npm_dependencies.iter().any(|dep| dep == name) {
            return true;
        }
        if self.composer_dependencies.iter().any(|dep| dep.contains(name)) {
            return true;
        }

        if IMPORT_PROBED.contains(&name) {
            let import = format!("import {}", name);
            let from = format!("from {}", name);
            return self
                .python_sources
                .iter()
                .any(|source| source.contains(&import) || source.contains(&from));
        }

        false
    }

    /// Services implied by declared dependencies, one per matching probe group.
    pub fn probe_services(&self) -> Vec<TechnologyId> {
        DEPENDENCY_PROBES
            .iter()
            .filter(|(names, _)| names.iter().any(|name| self.has_dependency(name)))
            .map(|(_, technology)| technology.clone())
            .collect()
    }
}

fn read_optional<F: FileSystem>(fs: &F, path: &Path, detection: &mut Detection) -> Option<String> {
    if !fs.is_file(path) {
        return None;
    }
    match fs.read_to_string(path) {
        Ok(content) => {
            trace!(path = %path.display(), "Read manifest");
            Some(content)
        }
        Err(e) => {
            detection.skip(path, e);
            None
        }
    }
}

fn read_json_keys<F: FileSystem>(
    fs: &F,
    path: &Path,
    sections: &[&str],
    detection: &mut Detection,
) -> Vec<String> {
    let Some(content) = read_optional(fs, path, detection) else {
        return Vec::new();
    };

    let value: Value = match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            detection.skip(path, format!("invalid JSON: {}", e));
            return Vec::new();
        }
    };

    sections
        .iter()
        .filter_map(|section| value.get(section).and_then(Value::as_object))
        .flat_map(|deps| deps.keys().cloned())
        .collect()
}

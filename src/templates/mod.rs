//! Service template library.
//!
//! Each template is a partial compose document with optional `services`,
//! `volumes` and `networks` sections. Compose `x-*` extension keys are
//! dropped. Templates are parsed and validated once, when the library is
//! built; afterwards the library is read-only.

use crate::fs::FileSystem;
use crate::stack::TechnologyId;
use serde_yaml::{Mapping, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Top-level sections a template may contribute
pub const SECTIONS: &[&str] = &["services", "volumes", "networks"];

const BUILTIN: &[(&str, &str)] = &[
    ("node", include_str!("builtin/node.yml")),
    ("spring", include_str!("builtin/spring.yml")),
    ("php", include_str!("builtin/php.yml")),
    ("go", include_str!("builtin/go.yml")),
    ("cpp", include_str!("builtin/cpp.yml")),
    ("ruby", include_str!("builtin/ruby.yml")),
    ("dotnet", include_str!("builtin/dotnet.yml")),
    ("postgres", include_str!("builtin/postgres.yml")),
    ("python", include_str!("builtin/python.yml")),
    ("mysql", include_str!("builtin/mysql.yml")),
    ("mariadb", include_str!("builtin/mariadb.yml")),
    ("cassandra", include_str!("builtin/cassandra.yml")),
    ("nginx", include_str!("builtin/nginx.yml")),
    ("apache", include_str!("builtin/apache.yml")),
    ("django", include_str!("builtin/django.yml")),
    ("flask", include_str!("builtin/flask.yml")),
    ("jupyter", include_str!("builtin/jupyter.yml")),
    ("rust", include_str!("builtin/rust.yml")),
    ("scala", include_str!("builtin/scala.yml")),
    ("elixir", include_str!("builtin/elixir.yml")),
    ("laravel", include_str!("builtin/laravel.yml")),
    ("fastapi", include_str!("builtin/fastapi.yml")),
    ("vue", include_str!("builtin/vue.yml")),
    ("react", include_str!("builtin/react.yml")),
    ("angular", include_str!("builtin/angular.yml")),
    ("mongodb", include_str!("builtin/mongodb.yml")),
    ("redis", include_str!("builtin/redis.yml")),
    ("elasticsearch", include_str!("builtin/elasticsearch.yml")),
];

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template '{id}' is not valid YAML: {source}")]
    Parse {
        id: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Template '{id}' is invalid: {reason}")]
    Invalid { id: String, reason: String },

    #[error("Failed to read template directory {}: {message}", path.display())]
    Read { path: PathBuf, message: String },
}

/// A validated partial compose document
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    id: TechnologyId,
    document: Mapping,
}

impl Template {
    pub fn parse(id: TechnologyId, source: &str) -> Result<Self, TemplateError> {
        let value: Value = serde_yaml::from_str(source).map_err(|e| TemplateError::Parse {
            id: id.key().to_string(),
            source: e,
        })?;

        let invalid = |reason: String| TemplateError::Invalid {
            id: id.key().to_string(),
            reason,
        };

        let Value::Mapping(document) = value else {
            return Err(invalid("top level must be a mapping".to_string()));
        };
        let document: Mapping = document
            .into_iter()
            .filter(|(key, _)| match key.as_str() {
                Some(name) if name.starts_with("x-") => {
                    warn!(template = %id, key = name, "Dropping extension key");
                    false
                }
                _ => true,
            })
            .collect();

        for (key, section) in &document {
            let name = key
                .as_str()
                .ok_or_else(|| invalid("section names must be strings".to_string()))?;
            if !SECTIONS.contains(&name) {
                return Err(invalid(format!("unknown section '{}'", name)));
            }
            if !matches!(section, Value::Mapping(_) | Value::Null) {
                return Err(invalid(format!("section '{}' must be a mapping", name)));
            }
        }

        let services = document
            .get("services")
            .and_then(Value::as_mapping)
            .into_iter()
            .flatten();
        for (name, service) in services {
            if name.as_str().map_or(true, str::is_empty) {
                return Err(invalid("service names must be non-empty strings".to_string()));
            }
            if !service.is_mapping() {
                return Err(invalid(format!(
                    "service '{}' must be a mapping",
                    name.as_str().unwrap_or_default()
                )));
            }
        }

        Ok(Self { id, document })
    }

    pub fn id(&self) -> &TechnologyId {
        &self.id
    }

    pub fn document(&self) -> &Mapping {
        &self.document
    }

    pub fn service_names(&self) -> Vec<&str> {
        self.document
            .get("services")
            .and_then(Value::as_mapping)
            .map(|services| services.keys().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TemplateLibrary {
    templates: HashMap<TechnologyId, Template>,
}

impl TemplateLibrary {
    /// The compiled-in templates.
    pub fn builtin() -> Result<Self, TemplateError> {
        let mut library = Self::default();
        for (key, source) in BUILTIN {
            library.insert(Template::parse(TechnologyId::parse(key), source)?);
        }
        debug!(templates = library.len(), "Built-in template library loaded");
        Ok(library)
    }

    /// Adds or replaces templates from `<id>.yml` / `<id>.yaml` files in `dir`.
    /// Other files are ignored. Returns the number of templates loaded.
    pub fn load_dir<F: FileSystem>(&mut self, fs: &F, dir: &Path) -> Result<usize, TemplateError> {
        let entries = fs.read_dir(dir).map_err(|e| TemplateError::Read {
            path: dir.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut loaded = 0;
        for entry in entries.iter().filter(|e| e.is_file()) {
            let Some(stem) = template_stem(entry.file_name()) else {
                continue;
            };
            let source = fs.read_to_string(entry.path()).map_err(|e| TemplateError::Read {
                path: entry.path().to_path_buf(),
                message: e.to_string(),
            })?;

            let template = Template::parse(TechnologyId::parse(stem), &source)?;
            if self.templates.contains_key(template.id()) {
                info!(template = %template.id(), path = %entry.path().display(), "Overriding template");
            } else {
                info!(template = %template.id(), path = %entry.path().display(), "Adding template");
            }
            self.insert(template);
            loaded += 1;
        }

        Ok(loaded)
    }

    pub fn insert(&mut self, template: Template) {
        self.templates.insert(template.id().clone(), template);
    }

    pub fn get(&self, id: &TechnologyId) -> Option<&Template> {
        self.templates.get(id)
    }

    pub fn contains(&self, id: &TechnologyId) -> bool {
        self.templates.contains_key(id)
    }

    /// Identifiers sorted by key
    pub fn ids(&self) -> Vec<TechnologyId> {
        let mut ids: Vec<TechnologyId> = self.templates.keys().cloned().collect();
        ids.sort_by(|a, b| a.key().cmp(b.key()));
        ids
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

fn template_stem(file_name: &str) -> Option<&str> {
    file_name
        .strip_suffix(".yml")
        .or_else(|| file_name.strip_suffix(".yaml"))
        .filter(|stem| !stem.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;
    use yare::parameterized;

    #[test]
    fn test_builtin_covers_every_variant() {
        let library = TemplateLibrary::builtin().unwrap();

        assert_eq!(library.len(), TechnologyId::all_variants().len());
        for id in TechnologyId::all_variants() {
            assert!(library.contains(id), "missing template for {}", id);
        }
    }

    #[test]
    fn test_ids_sorted_by_key() {
        let ids = TemplateLibrary::builtin().unwrap().ids();
        let keys: Vec<&str> = ids.iter().map(|id| id.key()).collect();

        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert_eq!(keys.first(), Some(&"angular"));
    }

    #[test]
    fn test_builtin_service_names() {
        let library = TemplateLibrary::builtin().unwrap();

        assert_eq!(
            library.get(&TechnologyId::Laravel).unwrap().service_names(),
            vec!["app", "webserver"]
        );
        assert_eq!(
            library.get(&TechnologyId::FastApi).unwrap().service_names(),
            vec!["api"]
        );
    }

    #[parameterized(
        not_a_mapping = { "- a\n- b\n" },
        unknown_section = { "services:\n  app:\n    image: x\nconfigs:\n  c: {}\n" },
        service_not_mapping = { "services:\n  app: nginx\n" },
        volumes_list = { "services:\n  app:\n    image: x\nvolumes:\n  - data\n" },
    )]
    fn test_invalid_templates(source: &str) {
        let result = Template::parse(TechnologyId::Custom("bad".into()), source);
        assert!(matches!(result, Err(TemplateError::Invalid { .. })));
    }

    #[test]
    fn test_templates_without_services_accepted() {
        let volumes_only = Template::parse(TechnologyId::Custom("shared".into()), "volumes:\n  data:\n").unwrap();
        assert!(volumes_only.service_names().is_empty());

        let empty = Template::parse(TechnologyId::Custom("empty".into()), "services: {}\n").unwrap();
        assert!(empty.service_names().is_empty());
    }

    #[test]
    fn test_extension_keys_dropped() {
        let template = Template::parse(
            TechnologyId::Custom("deno".into()),
            "x-common:\n  restart: always\nservices:\n  app:\n    image: denoland/deno:2.0\n",
        )
        .unwrap();

        let keys: Vec<&str> = template.document().keys().filter_map(Value::as_str).collect();
        assert_eq!(keys, vec!["services"]);
        assert_eq!(template.service_names(), vec!["app"]);
    }

    #[test]
    fn test_malformed_yaml() {
        let result = Template::parse(TechnologyId::Node, "services: [unclosed");
        assert!(matches!(result, Err(TemplateError::Parse { .. })));
    }

    #[test]
    fn test_load_dir_overrides_and_extends() {
        let fs = MockFileSystem::new();
        fs.add_file("templates/redis.yml", "services:\n  cache:\n    image: valkey/valkey:8\n");
        fs.add_file("templates/deno.yaml", "services:\n  app:\n    image: denoland/deno:2.0\n");
        fs.add_file("templates/README.md", "not a template");

        let mut library = TemplateLibrary::builtin().unwrap();
        let loaded = library.load_dir(&fs, Path::new("/mock/templates")).unwrap();

        assert_eq!(loaded, 2);
        assert_eq!(
            library.get(&TechnologyId::Redis).unwrap().service_names(),
            vec!["cache"]
        );
        assert!(library.contains(&TechnologyId::Custom("deno".into())));
    }

    #[test]
    fn test_load_dir_rejects_invalid_template() {
        let fs = MockFileSystem::new();
        fs.add_file("templates/broken.yml", "services: 3\n");

        let mut library = TemplateLibrary::default();
        assert!(library.load_dir(&fs, Path::new("/mock/templates")).is_err());
    }

    #[test]
    fn test_load_dir_missing_directory() {
        let fs = MockFileSystem::new();
        let mut library = TemplateLibrary::default();

        assert!(matches!(
            library.load_dir(&fs, Path::new("/mock/nowhere")),
            Err(TemplateError::Read { .. })
        ));
    }
}

use super::image::ImageRef;
use super::merge::merge_documents;
use super::ComposeFile;
use crate::detection::dedup_preserving_order;
use crate::error::GenerateError;
use crate::fs::FileSystem;
use crate::stack::TechnologyId;
use crate::templates::TemplateLibrary;
use crate::version::VersionResolver;
use serde_yaml::{Mapping, Value};
use tracing::{debug, info, warn};

/// Merge engine output
#[derive(Debug, Clone, PartialEq)]
pub struct Generated {
    pub compose: ComposeFile,
    /// Identifiers whose templates were merged, in merge order
    pub applied: Vec<TechnologyId>,
    /// Identifiers without a template
    pub missing: Vec<TechnologyId>,
}

/// Turns identifiers into a merged compose document.
pub struct ComposeBuilder<'a, F: FileSystem> {
    library: &'a TemplateLibrary,
    resolver: VersionResolver<'a, F>,
}

impl<'a, F: FileSystem> ComposeBuilder<'a, F> {
    pub fn new(library: &'a TemplateLibrary, resolver: VersionResolver<'a, F>) -> Self {
        Self { library, resolver }
    }

    /// Forced identifiers are appended after detected ones; the combined list
    /// is de-duplicated keeping first occurrences.
    pub fn build(
        &self,
        detected: &[TechnologyId],
        forced: &[TechnologyId],
    ) -> Result<Generated, GenerateError> {
        let technologies =
            dedup_preserving_order(detected.iter().chain(forced.iter()).cloned());
        if technologies.is_empty() {
            return Err(GenerateError::NoSupportedTechnology);
        }

        let mut documents = Vec::with_capacity(technologies.len());
        let mut applied = Vec::new();
        let mut missing = Vec::new();

        for technology in technologies {
            let Some(template) = self.library.get(&technology) else {
                warn!(technology = %technology, "No template for technology, skipping");
                missing.push(technology);
                continue;
            };

            let mut document = template.document().clone();
            self.pin_runtime_images(&technology, &mut document);
            documents.push(document);
            applied.push(technology);
        }

        let compose = ComposeFile::from_mapping(merge_documents(documents.iter()));
        info!(
            templates = applied.len(),
            services = compose.service_names().len(),
            "Compose document assembled"
        );

        Ok(Generated {
            compose,
            applied,
            missing,
        })
    }

    fn pin_runtime_images(&self, technology: &TechnologyId, document: &mut Mapping) {
        let Some(services) = document.get_mut("services").and_then(Value::as_mapping_mut) else {
            return;
        };

        let mut tag: Option<String> = None;
        for (name, service) in services.iter_mut() {
            let Some(image) = service
                .get("image")
                .and_then(Value::as_str)
                .and_then(ImageRef::parse)
                .filter(ImageRef::is_runtime_image)
            else {
                continue;
            };
            let tag = tag.get_or_insert_with(|| self.resolver.resolve(technology));
            let pinned = image.with_tag(tag);
            debug!(
                service = name.as_str().unwrap_or_default(),
                image = %pinned,
                "Pinned runtime image"
            );
            service["image"] = Value::String(pinned);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;
    use crate::version::Environment;
    use std::path::Path;

    fn build(
        fs: &MockFileSystem,
        env: &Environment,
        detected: &[TechnologyId],
        forced: &[TechnologyId],
    ) -> Result<Generated, GenerateError> {
        let library = TemplateLibrary::builtin().unwrap();
        let resolver = VersionResolver::new(fs, Path::new("/mock"), env);
        ComposeBuilder::new(&library, resolver).build(detected, forced)
    }

    fn image_of(generated: &Generated, service: &str) -> String {
        generated
            .compose
            .service(service)
            .and_then(|s| s.get("image"))
            .and_then(Value::as_str)
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_empty_input_is_error() {
        let fs = MockFileSystem::new();
        let result = build(&fs, &Environment::new(), &[], &[]);

        assert!(matches!(result, Err(GenerateError::NoSupportedTechnology)));
    }

    #[test]
    fn test_forced_redis_on_empty_project() {
        let fs = MockFileSystem::new();
        let generated = build(&fs, &Environment::new(), &[], &[TechnologyId::Redis]).unwrap();

        assert_eq!(generated.compose.service_names(), vec!["redis"]);
        assert_eq!(generated.compose.section_names(), vec!["services", "volumes"]);
        assert!(generated.compose.section("volumes").unwrap().contains_key("redisdata"));
    }

    #[test]
    fn test_duplicates_produce_each_service_once() {
        let fs = MockFileSystem::new();
        let generated = build(
            &fs,
            &Environment::new(),
            &[TechnologyId::Postgres, TechnologyId::Redis, TechnologyId::Postgres],
            &[TechnologyId::Redis],
        )
        .unwrap();

        assert_eq!(generated.applied, vec![TechnologyId::Postgres, TechnologyId::Redis]);
        assert_eq!(generated.compose.service_names(), vec!["db", "redis"]);
    }

    #[test]
    fn test_runtime_image_pinned_from_metadata() {
        let fs = MockFileSystem::new();
        fs.add_file("package.json", r#"{"engines":{"node":">=18.2.0"}}"#);

        let generated = build(&fs, &Environment::new(), &[TechnologyId::Node], &[]).unwrap();

        assert_eq!(image_of(&generated, "app"), "node:18-alpine");
    }

    #[test]
    fn test_non_runtime_images_untouched() {
        let fs = MockFileSystem::new();
        let env = Environment::from_pairs([("POSTGRES_VERSION", "15")]);

        let generated = build(&fs, &env, &[TechnologyId::Postgres], &[]).unwrap();

        assert_eq!(image_of(&generated, "db"), "postgres:16-alpine");
    }

    #[test]
    fn test_laravel_retags_only_php_service() {
        let fs = MockFileSystem::new();
        let generated = build(&fs, &Environment::new(), &[TechnologyId::Laravel], &[]).unwrap();

        assert_eq!(image_of(&generated, "app"), "php:8.3-fpm");
        assert_eq!(image_of(&generated, "webserver"), "nginx:1.27-alpine");
        assert!(generated.compose.has_section("networks"));
    }

    #[test]
    fn test_missing_templates_are_reported() {
        let fs = MockFileSystem::new();
        let deno = TechnologyId::Custom("deno".into());
        let generated = build(&fs, &Environment::new(), &[TechnologyId::Go], &[deno.clone()]).unwrap();

        assert_eq!(generated.applied, vec![TechnologyId::Go]);
        assert_eq!(generated.missing, vec![deno]);
    }

    #[test]
    fn test_later_template_wins_on_scalars() {
        let fs = MockFileSystem::new();
        let generated = build(
            &fs,
            &Environment::new(),
            &[TechnologyId::Node, TechnologyId::Python],
            &[],
        )
        .unwrap();

        let app = generated.compose.service("app").unwrap();
        assert_eq!(app.get("command").and_then(Value::as_str), Some("python main.py"));
        assert_eq!(image_of(&generated, "app"), "python:3.12-slim");
    }
}

//! The generated compose document and the engine that assembles it.

pub mod builder;
pub mod image;
pub mod merge;

pub use builder::{ComposeBuilder, Generated};

use serde::Serialize;
use serde_yaml::{Mapping, Value};

/// Merged compose document. Key order is insertion order and is kept on
/// serialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ComposeFile {
    document: Mapping,
}

impl ComposeFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_mapping(document: Mapping) -> Self {
        Self { document }
    }

    pub fn as_mapping(&self) -> &Mapping {
        &self.document
    }

    pub fn into_mapping(self) -> Mapping {
        self.document
    }

    pub fn section(&self, name: &str) -> Option<&Mapping> {
        self.document.get(name).and_then(Value::as_mapping)
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.document.contains_key(name)
    }

    pub fn section_names(&self) -> Vec<&str> {
        self.document.keys().filter_map(Value::as_str).collect()
    }

    pub fn services(&self) -> Option<&Mapping> {
        self.section("services")
    }

    pub fn services_mut(&mut self) -> Option<&mut Mapping> {
        self.document
            .get_mut("services")
            .and_then(Value::as_mapping_mut)
    }

    pub fn service(&self, name: &str) -> Option<&Mapping> {
        self.services()
            .and_then(|services| services.get(name))
            .and_then(Value::as_mapping)
    }

    pub fn service_names(&self) -> Vec<&str> {
        self.services()
            .map(|services| services.keys().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self.document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_keeps_insertion_order() {
        let document: Mapping =
            serde_yaml::from_str("services:\n  web:\n    image: php:8.3-apache\n  api:\n    image: python:3.12-slim\n")
                .unwrap();
        let compose = ComposeFile::from_mapping(document);

        let yaml = compose.to_yaml().unwrap();
        assert!(yaml.find("web:").unwrap() < yaml.find("api:").unwrap());
        assert_eq!(compose.service_names(), vec!["web", "api"]);
    }

    #[test]
    fn test_missing_services() {
        let mut compose = ComposeFile::new();

        assert!(compose.services().is_none());
        assert!(compose.services_mut().is_none());
        assert!(compose.service_names().is_empty());
    }
}

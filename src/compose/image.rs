//! Image reference handling for tag rewriting.

/// Base-name fragments of language runtime images whose tag follows the
/// project's own version
pub const RUNTIME_IMAGE_FAMILIES: &[&str] = &["node", "python", "php", "ruby", "golang", "dotnet"];

/// `repository:tag` split of an image reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageRef<'a> {
    pub repository: &'a str,
    pub tag: &'a str,
}

impl<'a> ImageRef<'a> {
    /// Splits references with exactly one `:`. A `/` after the colon means
    /// the colon belongs to a registry port (`localhost:5000/app`), so such
    /// references are rejected too.
    pub fn parse(image: &'a str) -> Option<Self> {
        let (repository, tag) = image.split_once(':')?;
        if tag.contains(':') || tag.contains('/') || repository.is_empty() || tag.is_empty() {
            return None;
        }
        Some(Self { repository, tag })
    }

    pub fn is_runtime_image(&self) -> bool {
        RUNTIME_IMAGE_FAMILIES
            .iter()
            .any(|family| self.repository.contains(family))
    }

    pub fn with_tag(&self, tag: &str) -> String {
        format!("{}:{}", self.repository, tag)
    }
}

/// New image reference with `version` as tag, when `image` is a plain
/// runtime image reference
pub fn retag_runtime_image(image: &str, version: &str) -> Option<String> {
    ImageRef::parse(image)
        .filter(ImageRef::is_runtime_image)
        .map(|image| image.with_tag(version))
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    #[parameterized(
        node = { "node:20-alpine", Some("node:22-alpine") },
        golang = { "golang:1.22-alpine", Some("golang:22-alpine") },
        mcr_dotnet = { "mcr.microsoft.com/dotnet/aspnet:8.0", Some("mcr.microsoft.com/dotnet/aspnet:22-alpine") },
        database = { "postgres:16-alpine", None },
        untagged = { "python", None },
        registry_port = { "localhost:5000/node", None },
        registry_port_tagged = { "localhost:5000/node:20", None },
        digest = { "node@sha256:abc", None },
    )]
    fn test_retag(image: &str, expected: Option<&str>) {
        assert_eq!(retag_runtime_image(image, "22-alpine").as_deref(), expected);
    }

    #[test]
    fn test_parse_parts() {
        let image = ImageRef::parse("php:8.3-apache").unwrap();
        assert_eq!(image.repository, "php");
        assert_eq!(image.tag, "8.3-apache");
    }
}

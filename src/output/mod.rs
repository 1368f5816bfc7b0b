//! Files and text produced from a [`GenerateReport`](crate::GenerateReport)

pub mod bake;
pub mod summary;

pub use bake::{render_bake, write_bake_file, BAKE_FILE_NAME};
pub use summary::{Summary, SummaryFormat};

use crate::compose::ComposeFile;
use crate::error::GenerateError;
use std::path::Path;
use tracing::info;

/// Serializes `compose` as YAML and writes it to `path`, replacing any
/// existing file.
pub fn write_compose(compose: &ComposeFile, path: &Path) -> Result<(), GenerateError> {
    let yaml = compose.to_yaml()?;
    std::fs::write(path, yaml).map_err(|e| GenerateError::Write {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    info!(path = %path.display(), "Compose file written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_keeps_key_order() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("docker-compose.generated.yml");
        let compose = ComposeFile::from_mapping(
            serde_yaml::from_str("services:\n  web:\n    image: nginx:1.27-alpine\n    ports:\n      - 80:80\n")
                .unwrap(),
        );

        write_compose(&compose, &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("services:\n  web:\n    image: nginx:1.27-alpine\n"));
    }

    #[test]
    fn test_write_failure_names_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("missing").join("compose.yml");

        let err = write_compose(&ComposeFile::new(), &path).unwrap_err();

        match err {
            GenerateError::Write { path: failed, .. } => assert_eq!(failed, path),
            other => panic!("unexpected error: {other}"),
        }
    }
}

use crate::templates::TemplateError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort generation
#[derive(Debug, Error)]
pub enum GenerateError {
    /// Nothing was detected and nothing was forced
    #[error("Did not find a supported type of project")]
    NoSupportedTechnology,

    #[error("Project path {} does not exist or is not a directory", .0.display())]
    InvalidProjectRoot(PathBuf),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("Failed to serialize compose file: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error("Failed to write {}: {message}", path.display())]
    Write { path: PathBuf, message: String },
}

//! Technology detection.
//!
//! Detection is best-effort and total: nothing in this module returns an
//! error. Inputs that could not be read or parsed are recorded in
//! [`Detection::skipped`] and otherwise treated as "not found".
//!
//! The entry point is [`detect_project`], which runs the signature matcher
//! followed by the dependency inspector and concatenates their results in
//! discovery order.

pub mod env_hints;
pub mod inspector;
pub mod manifests;
pub mod proxies;
pub mod signatures;

use crate::fs::FileSystem;
use crate::stack::TechnologyId;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub use env_hints::{EnvSnapshot, ENV_FILES};
pub use inspector::detect_frameworks_and_databases;
pub use manifests::ProjectManifests;
pub use signatures::{SignatureRule, SIGNATURE_RULES};

/// An input that detection could not use
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skipped {
    pub path: PathBuf,
    pub reason: String,
}

/// Ordered detection output. Duplicates are allowed; see [`Detection::unique`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Detection {
    pub technologies: Vec<TechnologyId>,
    pub skipped: Vec<Skipped>,
}

impl Detection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, technology: TechnologyId) {
        self.technologies.push(technology);
    }

    pub fn skip(&mut self, path: impl Into<PathBuf>, reason: impl ToString) {
        let skipped = Skipped {
            path: path.into(),
            reason: reason.to_string(),
        };
        debug!(path = %skipped.path.display(), reason = %skipped.reason, "Skipped detection input");
        self.skipped.push(skipped);
    }

    pub fn extend(&mut self, other: Detection) {
        self.technologies.extend(other.technologies);
        self.skipped.extend(other.skipped);
    }

    pub fn contains(&self, technology: &TechnologyId) -> bool {
        self.technologies.contains(technology)
    }

    pub fn is_empty(&self) -> bool {
        self.technologies.is_empty()
    }

    /// Technologies with duplicates removed, keeping first occurrences
    pub fn unique(&self) -> Vec<TechnologyId> {
        dedup_preserving_order(self.technologies.iter().cloned())
    }
}

pub fn dedup_preserving_order(items: impl IntoIterator<Item = TechnologyId>) -> Vec<TechnologyId> {
    let mut unique: Vec<TechnologyId> = Vec::new();
    for item in items {
        if !unique.contains(&item) {
            unique.push(item);
        }
    }
    unique
}

/// Runs every detector against `project_root`.
pub fn detect_project<F: FileSystem>(fs: &F, project_root: &Path) -> Detection {
    let mut detection = signatures::detect(fs, project_root);
    let inspected = detect_frameworks_and_databases(fs, project_root, &detection.technologies);
    detection.extend(inspected);

    info!(
        technologies = ?detection.unique().iter().map(|t| t.key()).collect::<Vec<_>>(),
        skipped = detection.skipped.len(),
        "Detection completed"
    );

    detection
}

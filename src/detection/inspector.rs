//! Dependency inspection: services and frameworks that marker files alone
//! do not reveal.

use super::{manifests::ProjectManifests, proxies, Detection, EnvSnapshot};
use crate::fs::FileSystem;
use crate::stack::TechnologyId;
use std::path::Path;
use tracing::debug;

/// Env hints, then manifest probes, then proxy configs. `signatures` is the
/// signature matcher's output and only feeds the FastAPI rule.
pub fn detect_frameworks_and_databases<F: FileSystem>(
    fs: &F,
    project_root: &Path,
    signatures: &[TechnologyId],
) -> Detection {
    let mut detection = Detection::new();

    let snapshot = EnvSnapshot::load(fs, project_root, &mut detection);
    for technology in snapshot.infer_technologies() {
        debug!(technology = %technology, "Inferred from env hints");
        detection.push(technology);
    }

    let manifests = ProjectManifests::load(fs, project_root, &mut detection);
    for technology in manifests.probe_services() {
        debug!(technology = %technology, "Inferred from manifests");
        detection.push(technology);
    }

    detection.extend(proxies::detect(fs, project_root));

    if wants_fastapi_probe(signatures) && manifests.has_dependency("fastapi") {
        debug!("FastAPI found in a Python project without another web framework");
        detection.push(TechnologyId::FastApi);
    }

    detection
}

fn wants_fastapi_probe(signatures: &[TechnologyId]) -> bool {
    signatures.contains(&TechnologyId::Python)
        && !signatures.contains(&TechnologyId::Django)
        && !signatures.contains(&TechnologyId::Flask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;

    #[test]
    fn test_fastapi_requires_python_signature() {
        let fs = MockFileSystem::new();
        fs.add_file("main.py", "from fastapi import FastAPI\n");

        let without = detect_frameworks_and_databases(&fs, Path::new("/mock"), &[]);
        let with = detect_frameworks_and_databases(&fs, Path::new("/mock"), &[TechnologyId::Python]);

        assert!(without.technologies.is_empty());
        assert_eq!(with.technologies, vec![TechnologyId::FastApi]);
    }

    #[test]
    fn test_fastapi_suppressed_by_flask() {
        let fs = MockFileSystem::new();
        fs.add_file("requirements.txt", "fastapi\nflask\n");

        let detection = detect_frameworks_and_databases(
            &fs,
            Path::new("/mock"),
            &[TechnologyId::Python, TechnologyId::Flask],
        );

        assert!(!detection.contains(&TechnologyId::FastApi));
    }

    #[test]
    fn test_source_order() {
        let fs = MockFileSystem::new();
        fs.add_file(".env", "DATABASE_URL=mysql://db\n");
        fs.add_file("package.json", r#"{"dependencies":{"pg":"8"}}"#);
        fs.add_file("nginx.conf", "");

        let detection = detect_frameworks_and_databases(&fs, Path::new("/mock"), &[TechnologyId::Node]);

        assert_eq!(
            detection.technologies,
            vec![
                TechnologyId::MySql,
                TechnologyId::Postgres,
                TechnologyId::Nginx
            ]
        );
    }
}

//! Dotenv-style hint files at the project root.

use super::Detection;
use crate::fs::FileSystem;
use crate::stack::TechnologyId;
use std::path::Path;
use tracing::trace;

/// Files scanned for hints, in read order
pub const ENV_FILES: &[&str] = &[
    ".env",
    ".env.local",
    ".env.development",
    ".env.example",
    "docker-compose.env",
];

/// Substring keywords and the technology they imply, in inference order
const ENV_KEYWORDS: &[(&str, TechnologyId)] = &[
    ("postgres", TechnologyId::Postgres),
    ("mysql", TechnologyId::MySql),
    ("mongo", TechnologyId::MongoDb),
    ("redis", TechnologyId::Redis),
    ("elastic", TechnologyId::Elasticsearch),
    ("cassandra", TechnologyId::Cassandra),
    ("maria", TechnologyId::MariaDb),
];

/// Merged key/value view over all hint files. A key seen in a later file
/// replaces the earlier value but keeps its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    entries: Vec<(String, String)>,
}

impl EnvSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads every hint file that exists under `project_root`.
    pub fn load<F: FileSystem>(fs: &F, project_root: &Path, detection: &mut Detection) -> Self {
        let mut snapshot = Self::new();

        for name in ENV_FILES {
            let path = project_root.join(name);
            if !fs.is_file(&path) {
                continue;
            }
            match fs.read_to_string(&path) {
                Ok(content) => {
                    trace!(path = %path.display(), "Reading env hints");
                    snapshot.parse(&content);
                }
                Err(e) => detection.skip(path, e),
            }
        }

        snapshot
    }

    /// Applies `KEY=VALUE` lines from `content`. Blank lines, comments and
    /// lines without `=` are ignored.
    pub fn parse(&mut self, content: &str) {
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                self.insert(key.trim(), value.trim());
            }
        }
    }

    pub fn insert(&mut self, key: &str, value: &str) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.entries.push((key.to_string(), value.to_string())),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One technology per entry: the first keyword found in the lower-cased
    /// key or value. Entries are visited in snapshot order, so duplicates
    /// are possible.
    pub fn infer_technologies(&self) -> Vec<TechnologyId> {
        self.entries
            .iter()
            .filter_map(|(key, value)| {
                let key = key.to_lowercase();
                let value = value.to_lowercase();
                ENV_KEYWORDS
                    .iter()
                    .find(|(keyword, _)| key.contains(keyword) || value.contains(keyword))
                    .map(|(_, technology)| technology.clone())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;

    #[test]
    fn test_parse_skips_comments_and_malformed() {
        let mut snapshot = EnvSnapshot::new();
        snapshot.parse("# comment\n\nNOT_A_PAIR\n DB_HOST = localhost \nURL=a=b\n");

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get("DB_HOST"), Some("localhost"));
        assert_eq!(snapshot.get("URL"), Some("a=b"));
        assert_eq!(snapshot.get("NOT_A_PAIR"), None);
    }

    #[test]
    fn test_later_file_wins() {
        let fs = MockFileSystem::new();
        fs.add_file(".env", "DB=postgres\n");
        fs.add_file(".env.local", "DB=mysql\n");

        let mut detection = Detection::new();
        let snapshot = EnvSnapshot::load(&fs, Path::new("/mock"), &mut detection);

        assert_eq!(snapshot.get("DB"), Some("mysql"));
        assert_eq!(snapshot.infer_technologies(), vec![TechnologyId::MySql]);
    }

    #[test]
    fn test_inference_follows_entry_order() {
        let mut snapshot = EnvSnapshot::new();
        snapshot.parse("REDIS_URL=redis://r\nDATABASE_URL=postgres://db/app\nSEARCH=Elastic\nREDIS_PORT=6379\n");

        assert_eq!(
            snapshot.infer_technologies(),
            vec![
                TechnologyId::Redis,
                TechnologyId::Postgres,
                TechnologyId::Elasticsearch,
                TechnologyId::Redis,
            ]
        );
    }

    #[test]
    fn test_first_keyword_wins_per_entry() {
        let mut snapshot = EnvSnapshot::new();
        snapshot.parse("CACHE=redis+postgres\n");

        assert_eq!(snapshot.infer_technologies(), vec![TechnologyId::Postgres]);
    }

    #[test]
    fn test_keyword_in_key_counts() {
        let mut snapshot = EnvSnapshot::new();
        snapshot.parse("MARIADB_ROOT_PASSWORD=secret\n");

        assert_eq!(snapshot.infer_technologies(), vec![TechnologyId::MariaDb]);
    }

    #[test]
    fn test_unreadable_file_is_skipped() {
        let fs = MockFileSystem::new();
        fs.add_unreadable_file(".env");
        fs.add_file(".env.example", "MONGO_URI=mongodb://m\n");

        let mut detection = Detection::new();
        let snapshot = EnvSnapshot::load(&fs, Path::new("/mock"), &mut detection);

        assert_eq!(detection.skipped.len(), 1);
        assert_eq!(snapshot.infer_technologies(), vec![TechnologyId::MongoDb]);
    }
}

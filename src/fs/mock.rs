use super::{DirEntry, FileSystem, FileType};
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

#[derive(Debug, Clone)]
pub struct MockEntry {
    pub content: Option<String>,
    pub file_type: FileType,
}

/// In-memory file system rooted at `/mock` (or a custom root).
pub struct MockFileSystem {
    files: RwLock<HashMap<PathBuf, MockEntry>>,
    root: PathBuf,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::with_root(PathBuf::from("/mock"))
    }

    pub fn with_root(root: PathBuf) -> Self {
        let fs = Self {
            files: RwLock::new(HashMap::new()),
            root: root.clone(),
        };
        fs.add_dir(root);
        fs
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: &str) {
        self.insert(
            path.as_ref(),
            MockEntry {
                content: Some(content.to_string()),
                file_type: FileType::File,
            },
        );
    }

    /// Adds a file that exists but cannot be read.
    pub fn add_unreadable_file(&self, path: impl AsRef<Path>) {
        self.insert(
            path.as_ref(),
            MockEntry {
                content: None,
                file_type: FileType::File,
            },
        );
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        self.insert(
            path.as_ref(),
            MockEntry {
                content: None,
                file_type: FileType::Directory,
            },
        );
    }

    fn insert(&self, path: &Path, entry: MockEntry) {
        let path = self.normalize_path(path);
        let mut files = self.files.write().unwrap();

        if let Some(parent) = path.parent() {
            Self::ensure_parents(&mut files, parent);
        }
        files.insert(path, entry);
    }

    fn normalize_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    fn ensure_parents(files: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        let mut current = PathBuf::new();
        for component in path.components() {
            current.push(component);
            files.entry(current.clone()).or_insert(MockEntry {
                content: None,
                file_type: FileType::Directory,
            });
        }
    }

    fn file_type_of(&self, path: &Path) -> Option<FileType> {
        let path = self.normalize_path(path);
        self.files.read().unwrap().get(&path).map(|e| e.file_type)
    }
}

impl Default for MockFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for MockFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.file_type_of(path).is_some()
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.file_type_of(path) == Some(FileType::Directory)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.file_type_of(path) == Some(FileType::File)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        let path = self.normalize_path(path);
        let files = self.files.read().unwrap();
        let entry = files
            .get(&path)
            .ok_or_else(|| anyhow!("File not found: {:?}", path))?;

        match (entry.file_type, &entry.content) {
            (FileType::File, Some(content)) => Ok(content.clone()),
            (FileType::File, None) => Err(anyhow!("Permission denied: {:?}", path)),
            _ => Err(anyhow!("Not a file: {:?}", path)),
        }
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>> {
        let path = self.normalize_path(path);
        let files = self.files.read().unwrap();

        match files.get(&path) {
            Some(entry) if entry.file_type == FileType::Directory => {}
            _ => return Err(anyhow!("Directory not found: {:?}", path)),
        }

        let mut entries: Vec<DirEntry> = files
            .iter()
            .filter(|(file_path, _)| file_path.parent() == Some(path.as_path()))
            .map(|(file_path, entry)| DirEntry {
                path: file_path.clone(),
                name: file_path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("")
                    .to_string(),
                file_type: entry.file_type,
            })
            .collect();

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        let normalized = self.normalize_path(path);
        if self.files.read().unwrap().contains_key(&normalized) {
            Ok(normalized)
        } else {
            Err(anyhow!("Path not found: {:?}", path))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_file() {
        let fs = MockFileSystem::new();
        fs.add_file("test.txt", "hello");

        assert!(fs.exists(Path::new("/mock/test.txt")));
        assert!(fs.is_file(Path::new("/mock/test.txt")));
        assert!(fs.is_dir(Path::new("/mock")));
    }

    #[test]
    fn test_read_to_string() {
        let fs = MockFileSystem::new();
        fs.add_file("test.txt", "hello world");

        let content = fs.read_to_string(Path::new("/mock/test.txt")).unwrap();
        assert_eq!(content, "hello world");
    }

    #[test]
    fn test_unreadable_file() {
        let fs = MockFileSystem::new();
        fs.add_unreadable_file("secret.env");

        assert!(fs.is_file(Path::new("/mock/secret.env")));
        assert!(fs.read_to_string(Path::new("/mock/secret.env")).is_err());
    }

    #[test]
    fn test_read_dir_sorted() {
        let fs = MockFileSystem::new();
        fs.add_file("zeta.txt", "content");
        fs.add_dir("subdir");
        fs.add_file("subdir/nested.txt", "nested");
        fs.add_file("alpha.txt", "content");

        let entries = fs.read_dir(Path::new("/mock")).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.file_name()).collect();

        assert_eq!(names, vec!["alpha.txt", "subdir", "zeta.txt"]);
    }

    #[test]
    fn test_find_files_default_walk() {
        let fs = MockFileSystem::new();
        fs.add_file("src/App/App.csproj", "<Project />");
        fs.add_file("tests/App.Tests/App.Tests.csproj", "<Project />");
        fs.add_file("README.md", "# app");

        let found = fs
            .find_files(Path::new("/mock"), &|name| name.ends_with(".csproj"))
            .unwrap();

        assert_eq!(
            found,
            vec![
                PathBuf::from("/mock/src/App/App.csproj"),
                PathBuf::from("/mock/tests/App.Tests/App.Tests.csproj"),
            ]
        );
    }

    #[test]
    fn test_with_root() {
        let fs = MockFileSystem::with_root(PathBuf::from("/repo"));
        fs.add_file("src/main.rs", "fn main() {}");

        assert!(fs.exists(Path::new("/repo/src/main.rs")));
        assert_eq!(fs.root(), Path::new("/repo"));
    }

    #[test]
    fn test_parent_directories_created() {
        let fs = MockFileSystem::new();
        fs.add_file("a/b/c/file.txt", "content");

        assert!(fs.is_dir(Path::new("/mock/a")));
        assert!(fs.is_dir(Path::new("/mock/a/b/c")));
        assert!(fs.is_file(Path::new("/mock/a/b/c/file.txt")));
    }
}

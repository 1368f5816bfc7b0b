//! FileSystem trait definition

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Type of file system entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    File,
    Directory,
    Symlink,
}

/// A directory entry returned by read_dir
#[derive(Debug, Clone)]
pub struct DirEntry {
    pub path: PathBuf,
    pub name: String,
    pub file_type: FileType,
}

impl DirEntry {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.name
    }

    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    pub fn is_file(&self) -> bool {
        self.file_type == FileType::File
    }

    pub fn is_dir(&self) -> bool {
        self.file_type == FileType::Directory
    }
}

/// Abstraction over file system operations for testability
pub trait FileSystem: Send + Sync {
    /// Check if a path exists
    fn exists(&self, path: &Path) -> bool;

    /// Check if path is a directory
    fn is_dir(&self, path: &Path) -> bool;

    /// Check if path is a file
    fn is_file(&self, path: &Path) -> bool;

    /// Read file contents as string
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// List directory contents, sorted by name
    fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>>;

    /// Canonicalize a path
    fn canonicalize(&self, path: &Path) -> Result<PathBuf>;

    /// Recursively collect files below `root` whose name satisfies `matches`.
    ///
    /// Unreadable subdirectories are skipped; only an unreadable `root` is an error.
    fn find_files(&self, root: &Path, matches: &dyn Fn(&str) -> bool) -> Result<Vec<PathBuf>> {
        let mut found = Vec::new();
        let mut pending = vec![root.to_path_buf()];
        let mut first = true;

        while let Some(dir) = pending.pop() {
            let entries = match self.read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) if first => return Err(e),
                Err(_) => continue,
            };
            first = false;

            for entry in entries.into_iter().rev() {
                if entry.is_dir() {
                    pending.push(entry.path);
                } else if entry.is_file() && matches(&entry.name) {
                    found.push(entry.path);
                }
            }
        }

        found.sort();
        Ok(found)
    }
}

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::{AppError, Result};

/// Kind of filesystem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// Entry metadata, captured once at listing time.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct EntryMeta {
    pub size: u64,
    pub modified: Option<SystemTime>,
}

/// A single filesystem item as returned by the adapter. Immutable once read.
#[derive(Debug, Clone)]
pub struct Entry {
    pub path: PathBuf,
    pub name: String,
    pub kind: EntryKind,
    pub meta: EntryMeta,
}

impl Entry {
    /// Build an entry from a path without following symlinks.
    ///
    /// Symlinks are reported as files, whatever they point at.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = fs::symlink_metadata(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());

        let kind = if metadata.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };

        Ok(Self {
            path: path.to_path_buf(),
            name,
            kind,
            meta: EntryMeta {
                size: metadata.len(),
                modified: metadata.modified().ok(),
            },
        })
    }

    /// File extension, lowercased, without the leading dot.
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
    }
}

/// Directory listing source for the tree.
///
/// Implementations run inside background fetch tasks, so blocking I/O is
/// fine here; it must never be called on the interactive loop.
pub trait Adapter: Send + Sync + 'static {
    /// Top-level entries shown under the synthetic super-root.
    fn list_roots(&self) -> Result<Vec<Entry>>;

    /// Immediate children of a directory.
    fn list_children(&self, path: &Path) -> Result<Vec<Entry>>;
}

/// Adapter over the operating system filesystem.
pub struct OsAdapter {
    roots: Vec<PathBuf>,
    sorted: bool,
}

impl OsAdapter {
    /// Adapter whose only root is an explicit directory.
    pub fn rooted_at(root: PathBuf, sorted: bool) -> Self {
        Self {
            roots: vec![root],
            sorted,
        }
    }

    /// Adapter exposing the platform filesystem roots.
    pub fn system(sorted: bool) -> Self {
        Self {
            roots: system_roots(),
            sorted,
        }
    }

    /// Sort by name (case-insensitive), directories first, when enabled.
    fn finish(&self, mut entries: Vec<Entry>) -> Vec<Entry> {
        if self.sorted {
            entries.sort_by(|a, b| {
                matches!(b.kind, EntryKind::Directory)
                    .cmp(&matches!(a.kind, EntryKind::Directory))
                    .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
            });
        }
        entries
    }
}

impl Adapter for OsAdapter {
    fn list_roots(&self) -> Result<Vec<Entry>> {
        let mut entries = Vec::new();
        for root in &self.roots {
            match Entry::from_path(root) {
                Ok(entry) => entries.push(entry),
                Err(source) => {
                    return Err(AppError::Listing {
                        path: root.clone(),
                        source,
                    })
                }
            }
        }
        Ok(self.finish(entries))
    }

    fn list_children(&self, path: &Path) -> Result<Vec<Entry>> {
        let read_dir = fs::read_dir(path).map_err(|source| AppError::Listing {
            path: path.to_path_buf(),
            source,
        })?;

        let mut entries = Vec::new();
        for dir_entry in read_dir {
            let dir_entry = match dir_entry {
                Ok(e) => e,
                Err(_) => continue,
            };
            // Entries that vanish or cannot be stat'ed mid-listing are skipped.
            match Entry::from_path(&dir_entry.path()) {
                Ok(entry) => entries.push(entry),
                Err(_) => continue,
            }
        }
        Ok(self.finish(entries))
    }
}

/// Platform filesystem roots: drive letters on Windows, `/` elsewhere.
fn system_roots() -> Vec<PathBuf> {
    #[cfg(windows)]
    {
        ('A'..='Z')
            .map(|drive| PathBuf::from(format!("{drive}:\\")))
            .filter(|p| p.exists())
            .collect()
    }
    #[cfg(not(windows))]
    {
        vec![PathBuf::from("/")]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    fn setup_test_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("alpha")).unwrap();
        fs::create_dir(dir.path().join("beta")).unwrap();
        File::create(dir.path().join("zed.txt")).unwrap();
        File::create(dir.path().join("a.rs")).unwrap();
        dir
    }

    #[test]
    fn entry_from_path_file() {
        let dir = setup_test_dir();
        let entry = Entry::from_path(&dir.path().join("zed.txt")).unwrap();
        assert_eq!(entry.kind, EntryKind::File);
        assert_eq!(entry.name, "zed.txt");
    }

    #[test]
    fn entry_from_path_directory() {
        let dir = setup_test_dir();
        let entry = Entry::from_path(&dir.path().join("alpha")).unwrap();
        assert_eq!(entry.kind, EntryKind::Directory);
    }

    #[test]
    fn entry_extension_is_lowercased() {
        let dir = TempDir::new().unwrap();
        File::create(dir.path().join("photo.PNG")).unwrap();
        let entry = Entry::from_path(&dir.path().join("photo.PNG")).unwrap();
        assert_eq!(entry.extension().as_deref(), Some("png"));
    }

    #[test]
    fn list_children_sorted_dirs_first() {
        let dir = setup_test_dir();
        let adapter = OsAdapter::rooted_at(dir.path().to_path_buf(), true);
        let names: Vec<String> = adapter
            .list_children(dir.path())
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["alpha", "beta", "a.rs", "zed.txt"]);
    }

    #[test]
    fn list_children_unsorted_returns_all() {
        let dir = setup_test_dir();
        let adapter = OsAdapter::rooted_at(dir.path().to_path_buf(), false);
        assert_eq!(adapter.list_children(dir.path()).unwrap().len(), 4);
    }

    #[test]
    fn list_children_missing_dir_fails_with_path() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("gone");
        let adapter = OsAdapter::rooted_at(dir.path().to_path_buf(), true);
        let err = adapter.list_children(&missing).unwrap_err();
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn rooted_adapter_lists_single_root() {
        let dir = setup_test_dir();
        let adapter = OsAdapter::rooted_at(dir.path().to_path_buf(), true);
        let roots = adapter.list_roots().unwrap();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].path, dir.path());
        assert_eq!(roots[0].kind, EntryKind::Directory);
    }

    #[test]
    fn system_adapter_has_at_least_one_root() {
        let adapter = OsAdapter::system(true);
        assert!(!adapter.list_roots().unwrap().is_empty());
    }
}

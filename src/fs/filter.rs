use std::collections::HashSet;

use regex::Regex;

use crate::config::FilterConfig;
use crate::error::{AppError, Result};
use crate::fs::adapter::{Entry, EntryKind};

/// Which entry kinds pass the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KindMask {
    FilesOnly,
    FoldersOnly,
    #[default]
    FilesAndFolders,
}

impl KindMask {
    /// Parse the kind mask from a config string.
    pub fn from_str(s: &str) -> Self {
        match s {
            "files" => KindMask::FilesOnly,
            "dirs" | "folders" => KindMask::FoldersOnly,
            _ => KindMask::FilesAndFolders,
        }
    }

    fn accepts(self, kind: EntryKind) -> bool {
        match self {
            KindMask::FilesOnly => kind == EntryKind::File,
            KindMask::FoldersOnly => kind == EntryKind::Directory,
            KindMask::FilesAndFolders => true,
        }
    }
}

/// Predicate deciding which filesystem entries enter the tree.
///
/// Pure and stateless: safe to share across concurrent fetch tasks. The
/// kind mask, name pattern, and extension list are ANDed; an empty filter
/// accepts everything passing the kind mask.
#[derive(Debug, Default)]
pub struct EntryFilter {
    mask: KindMask,
    name_pattern: Option<Regex>,
    extensions: Option<HashSet<String>>,
}

impl EntryFilter {
    pub fn new(mask: KindMask) -> Self {
        Self {
            mask,
            name_pattern: None,
            extensions: None,
        }
    }

    /// Restrict entries to display names fully matching `pattern`.
    ///
    /// Fails with `InvalidPattern` when the expression does not compile.
    pub fn with_pattern(mut self, pattern: &str) -> Result<Self> {
        let anchored = format!("^(?:{pattern})$");
        let regex = Regex::new(&anchored).map_err(|source| AppError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        self.name_pattern = Some(regex);
        Ok(self)
    }

    /// Restrict files to the given extensions. Leading dots are stripped and
    /// comparison is case-insensitive. Directories are exempt.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set = extensions
            .into_iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
            .collect();
        self.extensions = Some(set);
        self
    }

    /// Whether `entry` should appear in the tree.
    pub fn accept(&self, entry: &Entry) -> bool {
        if !self.mask.accepts(entry.kind) {
            return false;
        }
        if let Some(pattern) = &self.name_pattern {
            if !pattern.is_match(&entry.name) {
                return false;
            }
        }
        if let Some(extensions) = &self.extensions {
            if entry.kind == EntryKind::File {
                match entry.extension() {
                    Some(ext) if extensions.contains(&ext) => {}
                    _ => return false,
                }
            }
        }
        true
    }

    /// Short summary of the active restrictions for the status bar.
    pub fn summary(&self) -> String {
        let mut out = String::from(match self.mask {
            KindMask::FilesOnly => "files",
            KindMask::FoldersOnly => "dirs",
            KindMask::FilesAndFolders => "all",
        });
        if self.name_pattern.is_some() {
            out.push_str(" +name");
        }
        if let Some(extensions) = &self.extensions {
            let mut list: Vec<&str> = extensions.iter().map(String::as_str).collect();
            list.sort_unstable();
            out.push_str(" +ext[");
            out.push_str(&list.join(","));
            out.push(']');
        }
        out
    }
}

/// Resolve the runtime filter from the config section.
pub fn resolve_filter(config: &FilterConfig) -> Result<EntryFilter> {
    let mask = KindMask::from_str(config.kind.as_deref().unwrap_or("both"));
    let mut filter = EntryFilter::new(mask);
    if let Some(pattern) = &config.pattern {
        filter = filter.with_pattern(pattern)?;
    }
    if let Some(extensions) = &config.extensions {
        if !extensions.is_empty() {
            filter = filter.with_extensions(extensions);
        }
    }
    Ok(filter)
}

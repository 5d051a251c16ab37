//! Listing of the scan root.
//!
//! Only the immediate children of the root are considered. Entries that are
//! never meant to be sorted (Office lock files, Windows system folders, user
//! exclusions) are filtered out here so the classifier only sees candidates.

use glob::Pattern;
use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

/// One immediate child of the scan root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEntry {
    /// Leaf name of the entry, lossily decoded for matching and display.
    pub name: String,
    /// Full path of the entry.
    pub source_path: PathBuf,
    /// Whether the entry is a directory (symlinks are not followed).
    pub is_dir: bool,
}

impl ScanEntry {
    pub fn new(source_path: impl Into<PathBuf>, is_dir: bool) -> Self {
        let source_path = source_path.into();
        let name = source_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            name,
            source_path,
            is_dir,
        }
    }

    /// Leaf name exactly as stored on disk.
    pub fn leaf(&self) -> &OsStr {
        self.source_path
            .file_name()
            .unwrap_or_else(|| OsStr::new(&self.name))
    }

    /// Lower-cased extension including the leading dot, e.g. `.exe`.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
    }
}

/// Errors that make a whole scan impossible.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// The root does not exist or is not a directory.
    #[error("Invalid scan root {}: {reason}", path.display())]
    InvalidRoot { path: PathBuf, reason: String },
    /// The root exists but could not be listed.
    #[error("Failed to read directory {}: {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Checks that `root` is an existing directory.
///
/// # Errors
///
/// Returns `ScanError::InvalidRoot` otherwise.
pub fn validate_root(root: &Path) -> Result<(), ScanError> {
    match fs::metadata(root) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(ScanError::InvalidRoot {
            path: root.to_path_buf(),
            reason: "not a directory".to_string(),
        }),
        Err(e) => Err(ScanError::InvalidRoot {
            path: root.to_path_buf(),
            reason: e.to_string(),
        }),
    }
}

/// Name based filters deciding which root entries are sort candidates.
///
/// Checks are performed in this order, with early termination:
/// 1. Hidden entry filter
/// 2. Exact name match
/// 3. Name prefix match
/// 4. Glob pattern match
/// 5. Known category directory
#[derive(Debug, Clone)]
pub struct ScanFilters {
    include_hidden: bool,
    skip_names: HashSet<String>,
    skip_prefixes: Vec<String>,
    exclude_patterns: Vec<Pattern>,
    category_dirs: HashSet<String>,
}

impl ScanFilters {
    pub fn new(
        include_hidden: bool,
        skip_names: impl IntoIterator<Item = String>,
        skip_prefixes: impl IntoIterator<Item = String>,
        exclude_patterns: Vec<Pattern>,
    ) -> Self {
        Self {
            include_hidden,
            skip_names: skip_names.into_iter().collect(),
            skip_prefixes: skip_prefixes.into_iter().collect(),
            exclude_patterns,
            category_dirs: HashSet::new(),
        }
    }

    /// Filters that accept every entry.
    pub fn permissive() -> Self {
        Self::new(true, Vec::new(), Vec::new(), Vec::new())
    }

    /// Marks directory names that are sort output and must not be re-sorted.
    pub fn with_category_dirs<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.category_dirs.extend(names.into_iter().map(Into::into));
        self
    }

    /// Returns true if the entry should be classified.
    pub fn should_include(&self, name: &str, is_dir: bool) -> bool {
        if !self.include_hidden && name.starts_with('.') {
            return false;
        }
        if self.skip_names.contains(name) {
            return false;
        }
        if self.skip_prefixes.iter().any(|p| name.starts_with(p.as_str())) {
            return false;
        }
        if self.exclude_patterns.iter().any(|p| p.matches(name)) {
            return false;
        }
        !(is_dir && self.category_dirs.contains(name))
    }
}

impl Default for ScanFilters {
    /// Skips Office lock files and Windows system folders.
    fn default() -> Self {
        Self::new(
            true,
            DEFAULT_SKIP_NAMES.iter().map(|s| s.to_string()),
            DEFAULT_SKIP_PREFIXES.iter().map(|s| s.to_string()),
            Vec::new(),
        )
    }
}

pub const DEFAULT_SKIP_NAMES: &[&str] = &["System Volume Information", "$RECYCLE.BIN"];
pub const DEFAULT_SKIP_PREFIXES: &[&str] = &["~$"];

/// Lists the immediate children of `root` that pass `filters`, sorted by name.
///
/// # Errors
///
/// Returns `ScanError::InvalidRoot` if the root is missing or not a directory,
/// and `ScanError::ReadFailed` if it cannot be listed. Individual entries
/// that cannot be inspected are skipped.
pub fn scan_root(root: &Path, filters: &ScanFilters) -> Result<Vec<ScanEntry>, ScanError> {
    validate_root(root)?;

    let entries = fs::read_dir(root).map_err(|source| ScanError::ReadFailed {
        path: root.to_path_buf(),
        source,
    })?;

    let mut scanned = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(root = %root.display(), error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        let is_dir = match entry.file_type() {
            Ok(file_type) => file_type.is_dir(),
            Err(e) => {
                tracing::warn!(path = %entry.path().display(), error = %e, "Skipping entry without file type");
                continue;
            }
        };

        let name = entry.file_name().to_string_lossy().into_owned();
        if !filters.should_include(&name, is_dir) {
            tracing::debug!(name = %name, "Filtered out of scan");
            continue;
        }

        scanned.push(ScanEntry {
            name,
            source_path: entry.path(),
            is_dir,
        });
    }

    scanned.sort_by(|a, b| a.name.cmp(&b.name));
    tracing::debug!(root = %root.display(), entries = scanned.len(), "Scanned root");
    Ok(scanned)
}

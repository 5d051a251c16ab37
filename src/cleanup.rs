//! Removal of empty top-level directories after a move pass.
//!
//! Only directories that are immediate children of the scan root are looked
//! at, and only those with no entries at all are removed. Nothing deeper is
//! ever inspected and the root itself is never removed.

use crate::operation_log::OperationLog;
use crate::scan::{ScanError, validate_root};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// What a cleanup pass did.
#[derive(Debug, Default)]
pub struct CleanupReport {
    /// Directories that were removed.
    pub removed: Vec<PathBuf>,
    /// Directories that could not be inspected or removed, with the reason.
    pub failed: Vec<(PathBuf, String)>,
}

impl CleanupReport {
    pub fn removed_count(&self) -> usize {
        self.removed.len()
    }

    /// Appends one cleanup record per removal or failure.
    pub fn record_into(&self, log: &mut OperationLog) {
        for dir in &self.removed {
            log.record_cleanup(dir, None);
        }
        for (dir, reason) in &self.failed {
            log.record_cleanup(dir, Some(reason.clone()));
        }
    }
}

/// Removes empty immediate subdirectories of a root.
pub struct EmptyDirCleaner {
    root: PathBuf,
    keep: HashSet<String>,
}

impl EmptyDirCleaner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            keep: HashSet::new(),
        }
    }

    /// Directory names that are kept even when empty.
    pub fn keep<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keep.extend(names.into_iter().map(Into::into));
        self
    }

    /// Runs the cleanup pass.
    ///
    /// # Errors
    ///
    /// Returns `ScanError` if the root is invalid or cannot be listed.
    /// Failures on individual directories are collected in the report.
    pub fn run(&self) -> Result<CleanupReport, ScanError> {
        validate_root(&self.root)?;
        let entries = fs::read_dir(&self.root).map_err(|source| ScanError::ReadFailed {
            path: self.root.clone(),
            source,
        })?;

        let mut report = CleanupReport::default();
        for entry in entries.flatten() {
            // file_type does not follow symlinks, so linked directories are left alone
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if !file_type.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if self.keep.contains(&name) {
                continue;
            }

            let path = entry.path();
            match is_empty_dir(&path) {
                Ok(true) => match fs::remove_dir(&path) {
                    Ok(()) => {
                        tracing::info!(path = %path.display(), "Removed empty directory");
                        report.removed.push(path);
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Could not remove empty directory");
                        report.failed.push((path, e.to_string()));
                    }
                },
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Could not inspect directory");
                    report.failed.push((path, e.to_string()));
                }
            }
        }

        report.removed.sort();
        Ok(report)
    }
}

fn is_empty_dir(path: &Path) -> std::io::Result<bool> {
    Ok(fs::read_dir(path)?.next().is_none())
}

/// Removes every empty immediate subdirectory of `root` and returns how many
/// were removed.
///
/// # Errors
///
/// Returns `ScanError` if the root is invalid or cannot be listed.
pub fn cleanup_empty_dirs(root: &Path) -> Result<usize, ScanError> {
    EmptyDirCleaner::new(root)
        .run()
        .map(|report| report.removed_count())
}

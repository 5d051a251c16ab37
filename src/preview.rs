//! Read-only projection of classification results.
//!
//! A [`Preview`] lists every classified entry with the path it would be moved
//! to and aggregates counts per category. Building one never creates
//! directories or moves anything; the only filesystem access is a metadata
//! lookup to flag destinations that are already taken.

use crate::classifier::ClassificationResult;
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// One row of the preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewEntry {
    pub result: ClassificationResult,
    /// `root / category / name`.
    pub destination: PathBuf,
    /// An entry with the same leaf name already exists at the destination.
    pub conflict: bool,
}

/// Pre-execution view of a classification run.
#[derive(Debug, Clone)]
pub struct Preview {
    root: PathBuf,
    entries: Vec<PreviewEntry>,
    counts_by_category: BTreeMap<String, usize>,
}

impl Preview {
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entries(&self) -> &[PreviewEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&PreviewEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries per category, sorted by category name.
    pub fn counts_by_category(&self) -> &BTreeMap<String, usize> {
        &self.counts_by_category
    }

    /// Preview positions grouped by category.
    pub fn group_by_category(&self) -> BTreeMap<&str, Vec<usize>> {
        let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (index, entry) in self.entries.iter().enumerate() {
            groups
                .entry(entry.result.category.as_str())
                .or_default()
                .push(index);
        }
        groups
    }

    /// Preview positions of the entries assigned to `category`.
    pub fn indices_in_category(&self, category: &str) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.result.category == category)
            .map(|(index, _)| index)
            .collect()
    }

    /// Number of entries whose destination is already taken.
    pub fn conflict_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.conflict).count()
    }
}

/// Builds previews for one scan root.
pub struct PreviewBuilder {
    root: PathBuf,
}

impl PreviewBuilder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Destination of an entry named `name` in `category`.
    pub fn destination(&self, category: &str, name: &OsStr) -> PathBuf {
        self.root.join(category).join(name)
    }

    /// Projects classification results into a preview, keeping their order.
    pub fn build(&self, results: Vec<ClassificationResult>) -> Preview {
        let mut counts_by_category = BTreeMap::new();
        let entries = results
            .into_iter()
            .map(|result| {
                *counts_by_category
                    .entry(result.category.clone())
                    .or_insert(0) += 1;
                let destination = self.destination(&result.category, result.entry.leaf());
                // symlink_metadata so a dangling link still counts as taken
                let conflict = destination.symlink_metadata().is_ok();
                PreviewEntry {
                    result,
                    destination,
                    conflict,
                }
            })
            .collect();

        Preview {
            root: self.root.clone(),
            entries,
            counts_by_category,
        }
    }
}

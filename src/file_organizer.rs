/// Relocation of previewed entries into their category directories.
///
/// Moves are executed strictly one at a time in preview order. Category
/// directories are created lazily under the scan root, an entry whose
/// destination name is already taken is skipped, and a failure on one entry
/// is recorded and never stops the rest of the batch.
use crate::classifier::ClassificationResult;
use crate::operation_log::OperationLog;
use crate::preview::{Preview, PreviewEntry};
use crate::rules::validate_target;
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Which preview entries to move.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    /// Every preview entry.
    #[default]
    All,
    /// Only these preview positions; order of execution is still preview order.
    Indices(BTreeSet<usize>),
}

impl Selection {
    /// Selects the given preview positions.
    pub fn indices(indices: impl IntoIterator<Item = usize>) -> Self {
        Selection::Indices(indices.into_iter().collect())
    }

    /// Selects every entry assigned to one of `categories`.
    pub fn categories<'a>(preview: &Preview, categories: impl IntoIterator<Item = &'a str>) -> Self {
        let mut selected = BTreeSet::new();
        for category in categories {
            selected.extend(preview.indices_in_category(category));
        }
        Selection::Indices(selected)
    }

    /// Selects nothing.
    pub fn none() -> Self {
        Selection::Indices(BTreeSet::new())
    }

    pub fn contains(&self, index: usize) -> bool {
        match self {
            Selection::All => true,
            Selection::Indices(set) => set.contains(&index),
        }
    }

    /// Number of entries this selection covers in `preview`.
    pub fn count_in(&self, preview: &Preview) -> usize {
        match self {
            Selection::All => preview.len(),
            Selection::Indices(set) => set.iter().filter(|&&i| i < preview.len()).count(),
        }
    }
}

/// Status of one attempted move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveStatus {
    Moved,
    /// The destination already had an entry with the same name.
    SkippedExists,
    Error,
}

impl fmt::Display for MoveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveStatus::Moved => write!(f, "moved"),
            MoveStatus::SkippedExists => write!(f, "skipped (exists)"),
            MoveStatus::Error => write!(f, "error"),
        }
    }
}

/// Result of moving a single entry.
#[derive(Debug, Clone)]
pub struct MoveOutcome {
    pub result: ClassificationResult,
    pub destination: PathBuf,
    pub status: MoveStatus,
    /// Human-readable reason for skips and errors.
    pub detail: Option<String>,
}

/// Errors that can occur while moving one entry.
#[derive(Debug, thiserror::Error)]
pub enum OrganizeError {
    /// The category does not name a single directory under the root.
    #[error("Invalid category '{name}': {reason}")]
    InvalidCategory { name: String, reason: &'static str },
    /// Failed to create a category directory.
    #[error("Failed to create directory {}: {source}", path.display())]
    DirectoryCreationFailed { path: PathBuf, source: io::Error },
    /// Something other than a directory occupies the category path.
    #[error("Category path {} exists and is not a directory", path.display())]
    CategoryNotDirectory { path: PathBuf },
    /// Failed to move the entry to its category directory.
    #[error("Failed to move {} to {}: {source}", from.display(), to.display())]
    MoveFailed {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
}

/// Result type for a single move.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Moves entries into category subdirectories of a scan root.
pub struct FileOrganizer;

impl FileOrganizer {
    /// Starts a move batch over the selected preview entries.
    ///
    /// Nothing happens until the batch is iterated; each call to `next`
    /// processes exactly one entry, so a caller can stop between entries.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use softsort::classifier::classify;
    /// use softsort::file_organizer::{FileOrganizer, Selection};
    /// use softsort::rules::compile_rules;
    /// use std::path::Path;
    ///
    /// let (rules, _) = compile_rules("# target_dir: dev_tools\ngit\n");
    /// let preview = classify(Path::new("/path/to/software"), &rules).unwrap();
    /// for outcome in FileOrganizer::batch(&preview, &Selection::All) {
    ///     println!("{} -> {}", outcome.result.entry.name, outcome.status);
    /// }
    /// ```
    pub fn batch<'a>(preview: &'a Preview, selection: &'a Selection) -> MoveBatch<'a> {
        MoveBatch {
            preview,
            selection,
            next_index: 0,
        }
    }

    /// Ensures `root/category` exists as a directory and returns its path.
    ///
    /// An existing directory is not an error. A category that would land
    /// anywhere but directly under `root` is rejected before touching disk.
    pub fn ensure_category_dir(root: &Path, category: &str) -> OrganizeResult<PathBuf> {
        validate_target(category).map_err(|reason| OrganizeError::InvalidCategory {
            name: category.to_string(),
            reason,
        })?;
        let category_path = root.join(category);
        match fs::create_dir(&category_path) {
            Ok(()) => {
                tracing::info!(path = %category_path.display(), "Created category directory");
                Ok(category_path)
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                if category_path.is_dir() {
                    Ok(category_path)
                } else {
                    Err(OrganizeError::CategoryNotDirectory {
                        path: category_path,
                    })
                }
            }
            Err(e) => Err(OrganizeError::DirectoryCreationFailed {
                path: category_path,
                source: e,
            }),
        }
    }

    /// Moves one previewed entry and reports what happened.
    pub fn move_entry(root: &Path, entry: &PreviewEntry) -> MoveOutcome {
        let outcome = |status, detail| MoveOutcome {
            result: entry.result.clone(),
            destination: entry.destination.clone(),
            status,
            detail,
        };

        if let Err(e) = Self::ensure_category_dir(root, &entry.result.category) {
            return outcome(MoveStatus::Error, Some(e.to_string()));
        }

        // symlink_metadata so a dangling link at the destination is never replaced
        if entry.destination.symlink_metadata().is_ok() {
            return outcome(
                MoveStatus::SkippedExists,
                Some(format!("{} already exists", entry.destination.display())),
            );
        }

        let source = &entry.result.entry.source_path;
        match fs::rename(source, &entry.destination) {
            Ok(()) => outcome(MoveStatus::Moved, None),
            Err(e) => {
                let error = OrganizeError::MoveFailed {
                    from: source.clone(),
                    to: entry.destination.clone(),
                    source: e,
                };
                outcome(MoveStatus::Error, Some(error.to_string()))
            }
        }
    }
}

/// Sequential iterator of move outcomes, see [`FileOrganizer::batch`].
pub struct MoveBatch<'a> {
    preview: &'a Preview,
    selection: &'a Selection,
    next_index: usize,
}

impl MoveBatch<'_> {
    /// Number of entries this batch will process in total.
    pub fn total(&self) -> usize {
        self.selection.count_in(self.preview)
    }
}

impl Iterator for MoveBatch<'_> {
    type Item = MoveOutcome;

    fn next(&mut self) -> Option<MoveOutcome> {
        if let Selection::Indices(set) = self.selection {
            // Jump to the next selected position instead of walking every entry
            let next = set.range(self.next_index..).next().copied()?;
            if next >= self.preview.len() {
                return None;
            }
            self.next_index = next;
        }

        let index = self.next_index;
        let entry = self.preview.get(index)?;
        self.next_index = index + 1;
        Some(FileOrganizer::move_entry(self.preview.root(), entry))
    }
}

/// Moves the selected entries and appends every outcome to `log`.
///
/// Returns one outcome per selected entry, in preview order. Selection
/// indices past the end of the preview are ignored.
pub fn execute_moves(
    preview: &Preview,
    selection: &Selection,
    log: &mut OperationLog,
) -> Vec<MoveOutcome> {
    if let Selection::Indices(set) = selection {
        let out_of_range = set.iter().filter(|&&i| i >= preview.len()).count();
        if out_of_range > 0 {
            tracing::warn!(
                count = out_of_range,
                entries = preview.len(),
                "Ignoring selection indices outside the preview"
            );
        }
    }

    FileOrganizer::batch(preview, selection)
        .inspect(|outcome| log.record_move(outcome))
        .collect()
}

/// Append-only record of classification, move and cleanup events.
///
/// The log is what a presentation layer reads to report the fate of every
/// entry. Records are only ever appended; nothing is edited or reordered.
/// Each append is also emitted as a `tracing` event, and the records can be
/// written out as JSON Lines for a persistent history.
use crate::file_organizer::{MoveOutcome, MoveStatus};
use crate::preview::Preview;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Kind of event a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogAction {
    Classify,
    Move,
    Cleanup,
}

/// Result of the recorded event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogStatus {
    /// Classified, waiting to be moved.
    Planned,
    Moved,
    SkippedExists,
    Error,
    /// Empty directory removed by cleanup.
    Removed,
}

impl From<MoveStatus> for LogStatus {
    fn from(status: MoveStatus) -> Self {
        match status {
            MoveStatus::Moved => LogStatus::Moved,
            MoveStatus::SkippedExists => LogStatus::SkippedExists,
            MoveStatus::Error => LogStatus::Error,
        }
    }
}

/// A single log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub action: LogAction,
    pub source: PathBuf,
    /// Category of the entry; absent for cleanup records.
    pub category: Option<String>,
    /// True when the category is the fallback rather than a rule match.
    #[serde(default)]
    pub fallback: bool,
    pub status: LogStatus,
    pub detail: Option<String>,
}

/// Errors writing the log to disk.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("Failed to write history file {}: {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to serialize log record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Append-only sequence of [`LogRecord`]s.
#[derive(Debug, Default, Clone)]
pub struct OperationLog {
    records: Vec<LogRecord>,
}

impl OperationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record.
    pub fn append(&mut self, record: LogRecord) {
        match record.status {
            LogStatus::Error => tracing::error!(
                action = ?record.action,
                source = %record.source.display(),
                detail = record.detail.as_deref().unwrap_or(""),
                "Operation failed"
            ),
            LogStatus::SkippedExists => tracing::warn!(
                source = %record.source.display(),
                category = record.category.as_deref().unwrap_or(""),
                "Destination already exists, skipped"
            ),
            LogStatus::Planned => tracing::debug!(
                source = %record.source.display(),
                category = record.category.as_deref().unwrap_or(""),
                fallback = record.fallback,
                "Planned"
            ),
            LogStatus::Moved | LogStatus::Removed => tracing::info!(
                action = ?record.action,
                source = %record.source.display(),
                category = record.category.as_deref().unwrap_or(""),
                "Done"
            ),
        }
        self.records.push(record);
    }

    /// Records one `Classify` event per preview entry.
    pub fn record_preview(&mut self, preview: &Preview) {
        for entry in preview.entries() {
            let result = &entry.result;
            self.append(LogRecord {
                timestamp: Utc::now(),
                action: LogAction::Classify,
                source: result.entry.source_path.clone(),
                category: Some(result.category.clone()),
                fallback: result.is_fallback(),
                status: LogStatus::Planned,
                detail: Some(result.reason()),
            });
        }
    }

    /// Records the outcome of one move.
    pub fn record_move(&mut self, outcome: &MoveOutcome) {
        self.append(LogRecord {
            timestamp: Utc::now(),
            action: LogAction::Move,
            source: outcome.result.entry.source_path.clone(),
            category: Some(outcome.result.category.clone()),
            fallback: outcome.result.is_fallback(),
            status: outcome.status.into(),
            detail: outcome.detail.clone(),
        });
    }

    /// Records a cleanup removal or failure for `dir`.
    pub fn record_cleanup(&mut self, dir: &Path, error: Option<String>) {
        self.append(LogRecord {
            timestamp: Utc::now(),
            action: LogAction::Cleanup,
            source: dir.to_path_buf(),
            category: None,
            fallback: false,
            status: if error.is_some() {
                LogStatus::Error
            } else {
                LogStatus::Removed
            },
            detail: error,
        });
    }

    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Appends all records to `path` as JSON Lines, creating the file if needed.
    ///
    /// # Errors
    ///
    /// Returns `LogError` if the file cannot be opened or written.
    pub fn append_to_file(&self, path: &Path) -> Result<(), LogError> {
        let write_failed = |source| LogError::WriteFailed {
            path: path.to_path_buf(),
            source,
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(write_failed)?;
        let mut writer = BufWriter::new(file);
        for record in &self.records {
            let line = serde_json::to_string(record)?;
            writeln!(writer, "{}", line).map_err(write_failed)?;
        }
        writer.flush().map_err(write_failed)?;
        Ok(())
    }
}

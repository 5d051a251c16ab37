//! softsort - sort installers, archives and portable apps into category folders
//!
//! This library compiles ordered pattern rules, classifies the immediate
//! entries of a root directory with first-match-wins semantics, previews the
//! result, moves a selection of entries into category subdirectories and
//! optionally removes top-level directories left empty.

pub mod classifier;
pub mod cleanup;
pub mod cli;
pub mod config;
pub mod file_organizer;
pub mod logging;
pub mod operation_log;
pub mod output;
pub mod preview;
pub mod rules;
pub mod scan;

pub use classifier::{ClassificationResult, Classifier, FallbackReason, RuleMatch, classify, classify_with};
pub use cleanup::{CleanupReport, EmptyDirCleaner, cleanup_empty_dirs};
pub use config::{ConfigError, SortConfig};
pub use file_organizer::{FileOrganizer, MoveBatch, MoveOutcome, MoveStatus, Selection, execute_moves};
pub use operation_log::{LogAction, LogRecord, LogStatus, OperationLog};
pub use preview::{Preview, PreviewBuilder, PreviewEntry};
pub use rules::{CategoryRule, RuleParseWarning, RuleSet, compile_rules};
pub use scan::{ScanEntry, ScanError, ScanFilters, scan_root};

pub use cli::{Cli, Session, SortCommand, run_cli, run_cli_with_config};

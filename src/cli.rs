//! Command-line interface module for softsort.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing
//! - Resolving the session (root, rules, selection) from arguments and config
//! - Preview and move orchestration
//! - Cleanup and history reporting

use crate::classifier::classify_with;
use crate::cleanup::EmptyDirCleaner;
use crate::config::SortConfig;
use crate::file_organizer::{FileOrganizer, MoveOutcome, MoveStatus, Selection};
use crate::operation_log::OperationLog;
use crate::output::OutputFormatter;
use crate::preview::Preview;
use crate::rules::RuleSet;
use clap::Parser;
use std::path::{Path, PathBuf};

/// Sort installers, archives and portable apps into category folders.
#[derive(Debug, Parser)]
#[command(name = "softsort", version, about)]
pub struct Cli {
    /// Directory whose immediate entries are sorted
    #[arg(value_hint = clap::ValueHint::DirPath)]
    pub root: Option<PathBuf>,

    /// Rule file with `# target_dir:` blocks
    #[arg(short, long)]
    pub rules: Option<PathBuf>,

    /// Configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Move entries instead of only showing the preview
    #[arg(long)]
    pub run: bool,

    /// Only move these preview positions (comma separated)
    #[arg(long, value_delimiter = ',', num_args = 1.., requires = "run")]
    pub only: Vec<usize>,

    /// Only move entries of this category (repeatable)
    #[arg(long = "category", value_name = "NAME", requires = "run")]
    pub categories: Vec<String>,

    /// Remove empty top-level directories after moving
    #[arg(long, requires = "run")]
    pub cleanup: bool,

    /// Append the operation log to this JSON Lines file
    #[arg(long, value_name = "FILE")]
    pub history: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Represents a CLI command to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortCommand {
    /// Show what would happen without touching the filesystem.
    Preview,
    /// Move the selected entries.
    Run {
        selection: SelectionSpec,
        /// Remove empty top-level directories afterwards.
        cleanup: bool,
    },
}

/// A selection as given by the user, resolved against the preview later.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSpec {
    pub indices: Vec<usize>,
    pub categories: Vec<String>,
}

impl SelectionSpec {
    /// Resolves to a concrete selection; no indices and no categories selects everything.
    pub fn resolve(&self, preview: &Preview) -> Selection {
        if self.indices.is_empty() && self.categories.is_empty() {
            return Selection::All;
        }
        let mut selection = Selection::categories(preview, self.categories.iter().map(String::as_str));
        if let Selection::Indices(set) = &mut selection {
            set.extend(self.indices.iter().copied());
        }
        selection
    }
}

/// Everything one invocation needs, assembled from arguments and config.
#[derive(Debug, Clone)]
pub struct Session {
    pub root: PathBuf,
    pub rule_file: PathBuf,
    pub command: SortCommand,
    pub history: Option<PathBuf>,
}

impl Session {
    /// Combines parsed arguments with the loaded configuration.
    ///
    /// Command-line values win over configuration values.
    ///
    /// # Errors
    ///
    /// Returns an error message if no root was given anywhere.
    pub fn from_args(cli: &Cli, config: &SortConfig) -> Result<Self, String> {
        let root = cli
            .root
            .clone()
            .or_else(|| config.default_root.clone())
            .ok_or_else(|| "No directory given and no default_root configured".to_string())?;
        let rule_file = cli.rules.clone().unwrap_or_else(|| config.rule_file.clone());

        let command = if cli.run {
            SortCommand::Run {
                selection: SelectionSpec {
                    indices: cli.only.clone(),
                    categories: cli.categories.clone(),
                },
                cleanup: cli.cleanup || config.cleanup.enabled,
            }
        } else {
            SortCommand::Preview
        };

        Ok(Self {
            root,
            rule_file,
            command,
            history: cli.history.clone(),
        })
    }
}

/// What a run produced, for callers that want more than the printed report.
#[derive(Debug)]
pub struct RunReport {
    pub preview: Preview,
    pub outcomes: Vec<MoveOutcome>,
    pub removed_dirs: Vec<PathBuf>,
    pub log: OperationLog,
}

impl RunReport {
    pub fn count(&self, status: MoveStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }
}

/// Parses arguments, loads configuration and runs the session.
///
/// This is the entry point used by the binary.
pub fn run_cli(cli: Cli) -> Result<RunReport, String> {
    let config = SortConfig::load(cli.config.as_deref())
        .map_err(|e| format!("Error loading configuration: {}", e))?;
    let session = Session::from_args(&cli, &config)?;
    run_cli_with_config(&session, &config)
}

/// Runs a session with an already loaded configuration.
///
/// # Examples
///
/// ```no_run
/// use softsort::cli::{run_cli_with_config, Session, SortCommand};
/// use softsort::config::SortConfig;
/// use std::path::PathBuf;
///
/// let session = Session {
///     root: PathBuf::from("/path/to/software"),
///     rule_file: PathBuf::from("category_rules.txt"),
///     command: SortCommand::Preview,
///     history: None,
/// };
/// match run_cli_with_config(&session, &SortConfig::default()) {
///     Ok(report) => println!("{} entries classified", report.preview.len()),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli_with_config(session: &Session, config: &SortConfig) -> Result<RunReport, String> {
    config.validate().map_err(|e| e.to_string())?;
    let (rules, warnings) = RuleSet::load(&session.rule_file).map_err(|e| e.to_string())?;
    let rules = rules.with_fallback(config.fallback_category.clone());
    OutputFormatter::rule_warnings(&warnings);
    if rules.is_empty() {
        OutputFormatter::warning("No rule blocks loaded; every entry falls back");
    }

    let filters = config
        .scan_filters()
        .map_err(|e| format!("Error compiling scan filters: {}", e))?;
    let preview = classify_with(&session.root, &rules, filters).map_err(|e| e.to_string())?;

    let mut log = OperationLog::new();
    log.record_preview(&preview);

    let report = match &session.command {
        SortCommand::Preview => {
            show_preview(&preview);
            RunReport {
                preview,
                outcomes: Vec::new(),
                removed_dirs: Vec::new(),
                log,
            }
        }
        SortCommand::Run { selection, cleanup } => {
            let selection = selection.resolve(&preview);
            let outcomes = move_with_progress(&preview, &selection, &mut log);

            let removed_dirs = if *cleanup {
                cleanup_root(&session.root, config, &mut log)?
            } else {
                Vec::new()
            };

            RunReport {
                preview,
                outcomes,
                removed_dirs,
                log,
            }
        }
    };

    if let Some(history) = &session.history {
        match report.log.append_to_file(history) {
            Ok(()) => OutputFormatter::info(&format!("History appended to {}", history.display())),
            Err(e) => OutputFormatter::warning(&format!("Could not save history: {}", e)),
        }
    }

    Ok(report)
}

fn show_preview(preview: &Preview) {
    if preview.is_empty() {
        OutputFormatter::info("No entries found to sort.");
        return;
    }
    OutputFormatter::preview_table(preview);
    OutputFormatter::summary_table(preview.counts_by_category(), preview.len());
    if preview.conflict_count() > 0 {
        OutputFormatter::warning(&format!(
            "{} entries already exist at their destination and will be skipped",
            preview.conflict_count()
        ));
    }
    OutputFormatter::dry_run_notice("No files were moved. Re-run with --run to apply.");
}

fn move_with_progress(
    preview: &Preview,
    selection: &Selection,
    log: &mut OperationLog,
) -> Vec<MoveOutcome> {
    let batch = FileOrganizer::batch(preview, selection);
    let total = batch.total();
    if total == 0 {
        OutputFormatter::info("Nothing selected to move.");
        return Vec::new();
    }

    OutputFormatter::header(&format!("Moving {} entries in {}", total, preview.root().display()));
    let pb = OutputFormatter::create_progress_bar(total as u64);
    let mut outcomes = Vec::with_capacity(total);
    for outcome in batch {
        pb.set_message(outcome.result.entry.name.clone());
        log.record_move(&outcome);
        pb.suspend(|| OutputFormatter::outcome(&outcome));
        pb.inc(1);
        outcomes.push(outcome);
    }
    pb.finish_and_clear();

    OutputFormatter::move_totals(&outcomes);
    outcomes
}

fn cleanup_root(
    root: &Path,
    config: &SortConfig,
    log: &mut OperationLog,
) -> Result<Vec<PathBuf>, String> {
    let report = EmptyDirCleaner::new(root)
        .keep(config.cleanup.keep.iter().cloned())
        .run()
        .map_err(|e| e.to_string())?;
    report.record_into(log);

    for (dir, reason) in &report.failed {
        OutputFormatter::warning(&format!("Could not remove {}: {}", dir.display(), reason));
    }
    OutputFormatter::success(&format!(
        "Cleanup removed {} empty director{}",
        report.removed_count(),
        if report.removed_count() == 1 { "y" } else { "ies" }
    ));
    Ok(report.removed)
}

//! Output formatting and styling module.
//!
//! Provides a centralized interface for all terminal output: colored status
//! lines, the preview table, the per-category summary and the move progress
//! bar. The core modules never print; everything user-facing goes through here.

use crate::file_organizer::{MoveOutcome, MoveStatus};
use crate::preview::Preview;
use crate::rules::RuleParseWarning;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Prints every rule compilation warning.
    pub fn rule_warnings(warnings: &[RuleParseWarning]) {
        for warning in warnings {
            Self::warning(&format!("rules {}", warning));
        }
    }

    /// Creates the progress bar used while moving entries.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use softsort::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(100);
    /// pb.inc(1);
    /// pb.finish_with_message("Completed!");
    /// ```
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// Prints the preview as a numbered table: index, name, category, reason.
    ///
    /// The index column is what `--only` refers to.
    pub fn preview_table(preview: &Preview) {
        Self::header(&format!("PREVIEW: {}", preview.root().display()));

        let name_width = preview
            .entries()
            .iter()
            .map(|e| e.result.entry.name.chars().count())
            .max()
            .unwrap_or(0)
            .clamp(4, 48);
        let category_width = preview
            .counts_by_category()
            .keys()
            .map(|c| c.len())
            .max()
            .unwrap_or(0)
            .max(8);

        let heading = format!(
            "{:>4}  {:<name_width$}  {:<category_width$}  {}",
            "#", "Name", "Category", "Reason",
        );
        println!("{}", heading.bold());
        for (index, entry) in preview.entries().iter().enumerate() {
            let result = &entry.result;
            let padded = format!("{:<category_width$}", result.category);
            let category = if result.is_fallback() {
                padded.dimmed()
            } else {
                padded.green()
            };
            let mut line = format!(
                "{:>4}  {:<name_width$}  {}  {}",
                index,
                result.entry.name,
                category,
                result.reason(),
            );
            if entry.conflict {
                line.push_str(&format!("  {}", "(exists at destination)".yellow()));
            }
            println!("{}", line);
        }
    }

    /// Prints a summary table with entry counts by category.
    pub fn summary_table(category_counts: &BTreeMap<String, usize>, total: usize) {
        Self::header("SUMMARY");

        let max_category_len = category_counts
            .keys()
            .map(|name| name.len())
            .max()
            .unwrap_or(0)
            .max(8); // At least "Category" width

        let heading = format!("{:<width$} | Entries", "Category", width = max_category_len);
        println!("{}", heading.bold());
        println!("{}", "-".repeat(max_category_len + 12));

        for (category, count) in category_counts {
            println!(
                "{:<width$} | {} {}",
                category,
                count.to_string().green(),
                entry_word(*count),
                width = max_category_len
            );
        }

        println!("{}", "-".repeat(max_category_len + 12));
        println!(
            "{} | {} {}",
            format!("{:<width$}", "Total", width = max_category_len).bold(),
            total.to_string().green().bold(),
            entry_word(total),
        );
    }

    /// Prints one line for a move outcome.
    pub fn outcome(outcome: &MoveOutcome) {
        let name = &outcome.result.entry.name;
        match outcome.status {
            MoveStatus::Moved => {
                Self::success(&format!("{} → {}/", name, outcome.result.category))
            }
            MoveStatus::SkippedExists => Self::warning(&format!(
                "{} skipped: already exists in {}/",
                name, outcome.result.category
            )),
            MoveStatus::Error => Self::error(&format!(
                "{}: {}",
                name,
                outcome.detail.as_deref().unwrap_or("unknown error")
            )),
        }
    }

    /// Prints totals per move status.
    pub fn move_totals(outcomes: &[MoveOutcome]) {
        let count = |status| outcomes.iter().filter(|o| o.status == status).count();
        Self::header("RESULT");
        println!("  Moved:   {}", count(MoveStatus::Moved).to_string().green());
        println!(
            "  Skipped: {}",
            count(MoveStatus::SkippedExists).to_string().yellow()
        );
        println!("  Failed:  {}", count(MoveStatus::Error).to_string().red());
    }
}

fn entry_word(count: usize) -> &'static str {
    if count == 1 { "entry" } else { "entries" }
}

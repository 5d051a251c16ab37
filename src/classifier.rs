/// Entry classification by ordered pattern rules.
///
/// Rule blocks are tried in source order and patterns in declared order; the
/// first pattern that occurs in an entry's name decides its category. Entries
/// that match nothing go to the rule set's fallback category.
///
/// # Examples
///
/// ```
/// use softsort::classifier::Classifier;
/// use softsort::rules::compile_rules;
/// use softsort::scan::ScanEntry;
///
/// let (rules, _) = compile_rules("# target_dir: system_tools\ndriver|bios\n");
/// let classifier = Classifier::new(&rules);
/// let result = classifier.classify_entry(&ScanEntry::new("/sw/driver_v2.exe", false));
/// assert_eq!(result.category, "system_tools");
/// ```
use crate::preview::{Preview, PreviewBuilder};
use crate::rules::RuleSet;
use crate::scan::{ScanEntry, ScanError, ScanFilters, scan_root};
use std::fmt;
use std::path::Path;

const INSTALLER_EXTENSIONS: &[&str] = &[".exe", ".msi"];
const ARCHIVE_EXTENSIONS: &[&str] = &[".zip", ".7z", ".rar"];

/// The rule and pattern that decided a classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    /// Source order of the matching block.
    pub rule_order: usize,
    /// Index of the matching pattern inside its block.
    pub pattern_index: usize,
    /// Source text of the matching pattern.
    pub pattern: String,
    /// Line of the matching pattern in the rule source.
    pub line: usize,
}

/// Why an entry landed in the fallback category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// `.exe` or `.msi` file.
    Installer(String),
    /// `.zip`, `.7z` or `.rar` file.
    Archive(String),
    Directory,
    Other,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::Installer(ext) | FallbackReason::Archive(ext) => write!(f, "{}", ext),
            FallbackReason::Directory => write!(f, "dir"),
            FallbackReason::Other => write!(f, "other"),
        }
    }
}

/// Category assigned to a single scan entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationResult {
    pub entry: ScanEntry,
    /// A rule `target_dir` or the fallback category.
    pub category: String,
    /// Set when a rule matched.
    pub matched: Option<RuleMatch>,
    /// Set when no rule matched.
    pub fallback: Option<FallbackReason>,
}

impl ClassificationResult {
    pub fn is_fallback(&self) -> bool {
        self.matched.is_none()
    }

    /// Short human-readable explanation, e.g. `match:dev_tools:git|python`.
    pub fn reason(&self) -> String {
        match (&self.matched, &self.fallback) {
            (Some(m), _) => format!("match:{}:{}", self.category, m.pattern),
            (None, Some(reason)) => format!("fallback:{}", reason),
            (None, None) => "fallback:other".to_string(),
        }
    }
}

/// Assigns categories to scan entries. Holds no state besides the rules.
pub struct Classifier<'a> {
    rules: &'a RuleSet,
}

impl<'a> Classifier<'a> {
    pub fn new(rules: &'a RuleSet) -> Self {
        Self { rules }
    }

    /// Classifies one entry by its base name.
    ///
    /// The function uses the following strategy:
    /// 1. Try every block in source order, every pattern in declared order
    /// 2. Stop at the first pattern found in the name
    /// 3. Otherwise assign the fallback category
    pub fn classify_entry(&self, entry: &ScanEntry) -> ClassificationResult {
        for rule in self.rules.rules() {
            for (pattern_index, pattern) in rule.patterns.iter().enumerate() {
                if pattern.is_match(&entry.name) {
                    return ClassificationResult {
                        entry: entry.clone(),
                        category: rule.target_dir.clone(),
                        matched: Some(RuleMatch {
                            rule_order: rule.order,
                            pattern_index,
                            pattern: pattern.source.clone(),
                            line: pattern.line,
                        }),
                        fallback: None,
                    };
                }
            }
        }

        ClassificationResult {
            entry: entry.clone(),
            category: self.rules.fallback().to_string(),
            matched: None,
            fallback: Some(fallback_reason(entry)),
        }
    }

    /// Classifies entries, keeping their order.
    pub fn classify_entries(&self, entries: &[ScanEntry]) -> Vec<ClassificationResult> {
        entries
            .iter()
            .map(|entry| {
                let result = self.classify_entry(entry);
                tracing::debug!(name = %entry.name, reason = %result.reason(), "Classified entry");
                result
            })
            .collect()
    }
}

fn fallback_reason(entry: &ScanEntry) -> FallbackReason {
    if let Some(ext) = entry.extension() {
        if INSTALLER_EXTENSIONS.contains(&ext.as_str()) {
            return FallbackReason::Installer(ext);
        }
        if ARCHIVE_EXTENSIONS.contains(&ext.as_str()) {
            return FallbackReason::Archive(ext);
        }
    }
    if entry.is_dir {
        FallbackReason::Directory
    } else {
        FallbackReason::Other
    }
}

/// Scans `root` with the default filters and builds a preview.
///
/// # Errors
///
/// Returns `ScanError` if the root is invalid or cannot be listed.
pub fn classify(root: &Path, rules: &RuleSet) -> Result<Preview, ScanError> {
    classify_with(root, rules, ScanFilters::default())
}

/// Scans `root` with explicit filters and builds a preview.
///
/// Directories named after one of the rule set's categories are excluded so
/// that previously sorted output is not sorted again.
///
/// # Errors
///
/// Returns `ScanError` if the root is invalid or cannot be listed.
pub fn classify_with(
    root: &Path,
    rules: &RuleSet,
    filters: ScanFilters,
) -> Result<Preview, ScanError> {
    let categories = rules
        .rules()
        .iter()
        .map(|rule| rule.target_dir.clone())
        .chain(std::iter::once(rules.fallback().to_string()));
    let filters = filters.with_category_dirs(categories);

    let entries = scan_root(root, &filters)?;
    let results = Classifier::new(rules).classify_entries(&entries);
    Ok(PreviewBuilder::new(root).build(results))
}

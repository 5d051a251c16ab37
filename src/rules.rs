//! Rule source parsing and compilation.
//!
//! A rule source is plain text made of blocks. Each block opens with a header
//! line naming the category directory, followed by pattern lines:
//!
//! ```text
//! # target_dir: system_tools
//! driver|bios
//! hp|lenovo|dell
//!
//! # target_dir: office_tools
//! office|wps
//! ```
//!
//! Each pattern line is one case-insensitive regular expression whose `|`
//! separated alternatives are searched anywhere in an entry's name. Blocks and
//! patterns keep their source order, which is the matching precedence.
//!
//! # Examples
//!
//! ```
//! use softsort::rules::compile_rules;
//!
//! let (rules, warnings) = compile_rules("# target_dir: office_tools\noffice|wps\n");
//! assert!(warnings.is_empty());
//! assert_eq!(rules.len(), 1);
//! assert_eq!(rules.rules()[0].target_dir, "office_tools");
//! ```

use regex::{Regex, RegexBuilder};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Header marker opening a rule block, compared case-insensitively.
pub const HEADER_MARKER: &str = "# target_dir:";

/// Category used for entries that no rule matches.
pub const DEFAULT_FALLBACK_CATEGORY: &str = "install_misc";

/// A single compiled pattern line.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    /// The pattern text as written in the rule source.
    pub source: String,
    /// 1-based line number in the rule source.
    pub line: usize,
    regex: Regex,
}

impl CompiledPattern {
    /// Returns true if the pattern occurs anywhere in `name`.
    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    /// The `|` separated alternatives of this line, for display.
    pub fn alternatives(&self) -> impl Iterator<Item = &str> {
        self.source.split('|').map(str::trim).filter(|a| !a.is_empty())
    }
}

/// One category block of the rule source.
#[derive(Debug, Clone)]
pub struct CategoryRule {
    /// Name of the category directory created under the scan root.
    pub target_dir: String,
    /// Patterns in declared order.
    pub patterns: Vec<CompiledPattern>,
    /// Position of the block in the rule source (0 = highest precedence).
    pub order: usize,
}

/// An ordered, immutable list of compiled category rules.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<CategoryRule>,
    fallback: String,
}

impl RuleSet {
    /// Creates a rule set from already compiled rules, sorted by `order`.
    pub fn new(mut rules: Vec<CategoryRule>) -> Self {
        rules.sort_by_key(|rule| rule.order);
        Self {
            rules,
            fallback: DEFAULT_FALLBACK_CATEGORY.to_string(),
        }
    }

    /// A rule set without any rule; everything falls back.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Replaces the fallback category name.
    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = fallback.into();
        self
    }

    /// Reads and compiles a rule file.
    ///
    /// # Errors
    ///
    /// Returns `RuleSourceError` if the file cannot be read. Malformed lines
    /// inside the file are not errors; they come back as warnings.
    pub fn load(path: &Path) -> Result<(Self, Vec<RuleParseWarning>), RuleSourceError> {
        let text = fs::read_to_string(path).map_err(|source| RuleSourceError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(compile_rules(&text))
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns true if `name` is a category this rule set can produce.
    pub fn is_category(&self, name: &str) -> bool {
        name == self.fallback || self.rules.iter().any(|rule| rule.target_dir == name)
    }
}

/// Error reading a rule source from disk.
#[derive(Debug, thiserror::Error)]
pub enum RuleSourceError {
    #[error("Failed to read rule file {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// A recoverable problem found while compiling a rule source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleParseWarning {
    /// 1-based line number.
    pub line: usize,
    pub kind: WarningKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarningKind {
    /// The pattern line is not a valid regular expression.
    InvalidPattern { pattern: String, reason: String },
    /// A pattern line appears before any usable header.
    OrphanPattern { pattern: String },
    /// The header names something that cannot be a single directory name.
    InvalidTarget { target: String, reason: String },
    /// A block ended up without any valid pattern.
    EmptyBlock { target: String },
}

impl fmt::Display for RuleParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            WarningKind::InvalidPattern { pattern, reason } => {
                write!(f, "line {}: invalid pattern '{}': {}", self.line, pattern, reason)
            }
            WarningKind::OrphanPattern { pattern } => {
                write!(
                    f,
                    "line {}: pattern '{}' is not inside a target_dir block",
                    self.line, pattern
                )
            }
            WarningKind::InvalidTarget { target, reason } => {
                write!(f, "line {}: invalid target_dir '{}': {}", self.line, target, reason)
            }
            WarningKind::EmptyBlock { target } => {
                write!(f, "line {}: block '{}' has no valid pattern", self.line, target)
            }
        }
    }
}

/// Block being accumulated during parsing.
struct OpenBlock {
    rule: CategoryRule,
    header_line: usize,
}

/// Compiles a rule source into an ordered rule set.
///
/// Never fails: malformed lines are dropped and reported as warnings, and a
/// source without any valid block produces an empty rule set.
pub fn compile_rules(source: &str) -> (RuleSet, Vec<RuleParseWarning>) {
    let mut rules = Vec::new();
    let mut warnings = Vec::new();
    let mut current: Option<OpenBlock> = None;
    let mut order = 0;

    for (index, raw) in source.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();

        if line.is_empty() {
            continue;
        }

        if let Some(target) = header_target(line) {
            close_block(current.take(), &mut rules, &mut warnings);

            match validate_target(target) {
                Ok(()) => {
                    current = Some(OpenBlock {
                        rule: CategoryRule {
                            target_dir: target.to_string(),
                            patterns: Vec::new(),
                            order,
                        },
                        header_line: line_no,
                    });
                    order += 1;
                }
                Err(reason) => warnings.push(RuleParseWarning {
                    line: line_no,
                    kind: WarningKind::InvalidTarget {
                        target: target.to_string(),
                        reason: reason.to_string(),
                    },
                }),
            }
            continue;
        }

        // Plain comment
        if line.starts_with('#') {
            continue;
        }

        let Some(block) = current.as_mut() else {
            warnings.push(RuleParseWarning {
                line: line_no,
                kind: WarningKind::OrphanPattern {
                    pattern: line.to_string(),
                },
            });
            continue;
        };

        match compile_pattern(line) {
            Ok(regex) => block.rule.patterns.push(CompiledPattern {
                source: line.to_string(),
                line: line_no,
                regex,
            }),
            Err(e) => {
                tracing::warn!(line = line_no, pattern = line, error = %e, "Dropping invalid pattern");
                warnings.push(RuleParseWarning {
                    line: line_no,
                    kind: WarningKind::InvalidPattern {
                        pattern: line.to_string(),
                        reason: e.to_string(),
                    },
                });
            }
        }
    }
    close_block(current, &mut rules, &mut warnings);

    tracing::debug!(
        blocks = rules.len(),
        warnings = warnings.len(),
        "Compiled rule source"
    );
    (RuleSet::new(rules), warnings)
}

fn close_block(
    block: Option<OpenBlock>,
    rules: &mut Vec<CategoryRule>,
    warnings: &mut Vec<RuleParseWarning>,
) {
    if let Some(block) = block {
        if block.rule.patterns.is_empty() {
            warnings.push(RuleParseWarning {
                line: block.header_line,
                kind: WarningKind::EmptyBlock {
                    target: block.rule.target_dir.clone(),
                },
            });
        }
        rules.push(block.rule);
    }
}

/// Returns the target name if `line` is a block header.
fn header_target(line: &str) -> Option<&str> {
    let marker_len = HEADER_MARKER.len();
    let prefix = line.get(..marker_len)?;
    if prefix.eq_ignore_ascii_case(HEADER_MARKER) {
        Some(line[marker_len..].trim())
    } else {
        None
    }
}

/// Checks that `target` names a single directory directly under the root.
///
/// # Errors
///
/// Returns a short reason when the name is empty, is `.` or `..`, or
/// contains a path separator.
pub fn validate_target(target: &str) -> Result<(), &'static str> {
    if target.is_empty() {
        return Err("directory name is empty");
    }
    if target == "." || target == ".." {
        return Err("directory name must not be a relative path component");
    }
    if target.contains(['/', '\\']) {
        return Err("directory name must not contain a path separator");
    }
    Ok(())
}

fn compile_pattern(line: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(line).case_insensitive(true).build()
}

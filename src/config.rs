//! Configuration loading.
//!
//! Settings are read from a TOML file and cover where the rules live, the
//! fallback category, which root entries are never sorted, and the cleanup
//! pass. Every field has a default, so an empty file is a valid configuration.
//!
//! # Configuration File Format
//!
//! ```toml
//! rule_file = "category_rules.txt"
//! fallback_category = "install_misc"
//! default_root = "D:/Software"
//!
//! [scan]
//! include_hidden = true
//! skip_prefixes = ["~$"]
//! skip_names = ["System Volume Information", "$RECYCLE.BIN"]
//! exclude_patterns = ["*.part", "*.crdownload"]
//!
//! [cleanup]
//! enabled = false
//! keep = ["dev_tools"]
//! ```

use crate::rules::{DEFAULT_FALLBACK_CATEGORY, validate_target};
use crate::scan::{DEFAULT_SKIP_NAMES, DEFAULT_SKIP_PREFIXES, ScanFilters};
use glob::Pattern;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_FILE: &str = ".softsortrc.toml";

/// Default rule file name, resolved against the working directory.
pub const DEFAULT_RULE_FILE: &str = "category_rules.txt";

/// Errors that can occur during configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),
    /// Invalid glob pattern in `scan.exclude_patterns`.
    #[error("Invalid glob pattern '{pattern}': {reason}")]
    InvalidGlobPattern { pattern: String, reason: String },
    /// `fallback_category` does not name a directory directly under the root.
    #[error("Invalid fallback category '{name}': {reason}")]
    InvalidFallbackCategory { name: String, reason: String },
    /// IO error while reading configuration.
    #[error("IO error reading configuration: {0}")]
    IoError(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SortConfig {
    /// Rule source used when none is given on the command line.
    pub rule_file: PathBuf,
    /// Category for entries that match no rule.
    pub fallback_category: String,
    /// Scan root used when none is given on the command line.
    pub default_root: Option<PathBuf>,
    pub scan: ScanSettings,
    pub cleanup: CleanupSettings,
}

/// Which root entries are considered for sorting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScanSettings {
    /// Whether entries starting with "." are sorted. Defaults to true.
    pub include_hidden: bool,
    /// Entries whose name starts with one of these are skipped.
    pub skip_prefixes: Vec<String>,
    /// Exact entry names that are skipped.
    pub skip_names: Vec<String>,
    /// Glob patterns on entry names that are skipped.
    pub exclude_patterns: Vec<String>,
}

/// Post-move cleanup of empty top-level directories.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CleanupSettings {
    /// Run cleanup after every move pass.
    pub enabled: bool,
    /// Directory names kept even when empty.
    pub keep: Vec<String>,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            rule_file: PathBuf::from(DEFAULT_RULE_FILE),
            fallback_category: DEFAULT_FALLBACK_CATEGORY.to_string(),
            default_root: None,
            scan: ScanSettings::default(),
            cleanup: CleanupSettings::default(),
        }
    }
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            include_hidden: true,
            skip_prefixes: DEFAULT_SKIP_PREFIXES.iter().map(|s| s.to_string()).collect(),
            skip_names: DEFAULT_SKIP_NAMES.iter().map(|s| s.to_string()).collect(),
            exclude_patterns: Vec::new(),
        }
    }
}

impl SortConfig {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.softsortrc.toml` in the current directory
    /// 3. Look for `~/.config/softsort/config.toml` in home directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but
    /// cannot be read, or if any file found is not valid TOML.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("softsort")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        tracing::debug!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if file does not exist.
    /// Returns `ConfigError::ConfigInvalid` if TOML parsing fails.
    /// Returns `ConfigError::IoError` if file cannot be read.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        let config = Self::from_toml(&content)?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigInvalid` if the text is not valid, or
    /// `ConfigError::InvalidFallbackCategory` for an unusable fallback name.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values that deserialize fine but cannot be used.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidFallbackCategory` when the fallback
    /// category would not be a single directory under the scan root.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_target(&self.fallback_category).map_err(|reason| {
            ConfigError::InvalidFallbackCategory {
                name: self.fallback_category.clone(),
                reason: reason.to_string(),
            }
        })
    }

    /// Compiles the scan settings into filters.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidGlobPattern` for a malformed exclusion.
    pub fn scan_filters(&self) -> Result<ScanFilters, ConfigError> {
        let exclude_patterns = self
            .scan
            .exclude_patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|e| ConfigError::InvalidGlobPattern {
                    pattern: pattern.clone(),
                    reason: e.msg.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ScanFilters::new(
            self.scan.include_hidden,
            self.scan.skip_names.iter().cloned(),
            self.scan.skip_prefixes.iter().cloned(),
            exclude_patterns,
        ))
    }
}

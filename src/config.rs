//! Configuration management for ppfmt.
//!
//! This module provides the [`Config`] struct which controls a formatting run.
//! Configuration can be loaded from:
//! - TOML files (`ppfmt.toml`)
//! - CLI arguments (which override file settings)
//!
//! Config files are auto-discovered by searching parent directories from the file
//! being formatted up to the filesystem root, plus the user's home directory.
//!
//! ```toml
//! preprocessor_configurations = [["DEBUG"], ["RELEASE", "TRACE"]]
//! reserved_directory = "Migrations"
//! exclude = ["*.g.cs"]
//! policy = "verify"
//!
//! [style]
//! use_tabs = false
//! indent_size = 2
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{FormatError, Result};
use crate::filter::DEFAULT_RESERVED_DIRECTORY;
use crate::options::{ConfigurationPolicy, FormatOptions, StyleOptions};

/// Config file names to search for (in order of priority, later overrides earlier)
const CONFIG_FILE_NAMES: &[&str] = &["ppfmt.toml"];

/// Get the user's home directory
fn dirs_home() -> Option<PathBuf> {
    // Try HOME environment variable first (works on Unix and some Windows setups)
    if let Ok(home) = std::env::var("HOME") {
        return Some(PathBuf::from(home));
    }
    // Fallback for Windows
    if let Ok(userprofile) = std::env::var("USERPROFILE") {
        return Some(PathBuf::from(userprofile));
    }
    None
}

fn default_reserved_directory() -> String {
    DEFAULT_RESERVED_DIRECTORY.to_string()
}

/// Main configuration struct for ppfmt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Symbol sets the terminal rule re-parses under (default: none)
    #[serde(default)]
    pub preprocessor_configurations: Vec<Vec<String>>,

    /// Parent directory name whose files are never formatted (default: Migrations)
    #[serde(default = "default_reserved_directory")]
    pub reserved_directory: String,

    /// Glob patterns of files to skip
    #[serde(default)]
    pub exclude: Vec<String>,

    /// What to do with the alternate configuration views (default: verify)
    #[serde(default)]
    pub policy: ConfigurationPolicy,

    #[serde(default)]
    pub style: StyleOptions,
}

/// Partial style table for TOML parsing
#[derive(Debug, Clone, Default, Deserialize)]
struct PartialStyle {
    pub use_tabs: Option<bool>,
    pub indent_size: Option<usize>,
    pub space_after_comma: Option<bool>,
    pub space_within_parentheses: Option<bool>,
    pub space_within_brackets: Option<bool>,
    pub space_after_control_keyword: Option<bool>,
    pub space_after_for_semicolon: Option<bool>,
    pub trim_trailing_whitespace: Option<bool>,
    pub max_blank_lines: Option<usize>,
}

/// Partial configuration for TOML parsing
///
/// All fields are `Option<T>` so we can distinguish between
/// "explicitly set" and "not specified" when merging configs.
#[derive(Debug, Clone, Default, Deserialize)]
struct PartialConfig {
    pub preprocessor_configurations: Option<Vec<Vec<String>>>,
    pub reserved_directory: Option<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    pub policy: Option<ConfigurationPolicy>,
    #[serde(default)]
    pub style: PartialStyle,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            preprocessor_configurations: Vec::new(),
            reserved_directory: default_reserved_directory(),
            exclude: Vec::new(),
            policy: ConfigurationPolicy::default(),
            style: StyleOptions::default(),
        }
    }
}

impl Config {
    /// Maximum reasonable indent size
    const MAX_INDENT_SIZE: usize = 16;
    /// Maximum reasonable run of blank lines
    const MAX_BLANK_LINES: usize = 100;

    /// Validate configuration values are within reasonable bounds
    ///
    /// Returns an error message if validation fails, None if valid.
    #[must_use]
    pub fn validate(&self) -> Option<String> {
        let indent_size = self.style.indent_size;
        if indent_size == 0 {
            return Some("indent_size must be at least 1".to_string());
        }
        if indent_size > Self::MAX_INDENT_SIZE {
            return Some(format!(
                "indent_size {indent_size} exceeds maximum of {}",
                Self::MAX_INDENT_SIZE
            ));
        }
        if self.style.max_blank_lines > Self::MAX_BLANK_LINES {
            return Some(format!(
                "max_blank_lines {} exceeds maximum of {}",
                self.style.max_blank_lines,
                Self::MAX_BLANK_LINES
            ));
        }
        if self.reserved_directory.trim().is_empty() {
            return Some("reserved_directory must not be empty".to_string());
        }
        for (index, symbols) in self.preprocessor_configurations.iter().enumerate() {
            if let Some(bad) = symbols
                .iter()
                .find(|s| s.is_empty() || s.chars().any(char::is_whitespace))
            {
                return Some(format!(
                    "preprocessor configuration {} has invalid symbol '{bad}'",
                    index + 1
                ));
            }
        }
        None
    }

    /// Options handed to every document of a run
    #[must_use]
    pub fn format_options(&self) -> FormatOptions {
        FormatOptions {
            preprocessor_configurations: self.preprocessor_configurations.clone(),
            style: self.style.clone(),
            policy: self.policy,
        }
    }

    /// Load configuration from a TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| FormatError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let partial: PartialConfig = toml::from_str(&contents)
            .map_err(|e| FormatError::Config(format!("{}: {e}", path.display())))?;
        let mut config = Self::default();
        config.apply_partial(&partial);
        Ok(config)
    }

    /// Apply a partial config, only overriding fields that are explicitly set
    fn apply_partial(&mut self, partial: &PartialConfig) {
        if let Some(v) = &partial.preprocessor_configurations {
            self.preprocessor_configurations.clone_from(v);
        }
        if let Some(v) = &partial.reserved_directory {
            self.reserved_directory.clone_from(v);
        }
        if let Some(v) = partial.policy {
            self.policy = v;
        }
        // Exclude patterns accumulate across files
        for pattern in &partial.exclude {
            if !self.exclude.contains(pattern) {
                self.exclude.push(pattern.clone());
            }
        }

        let style = &partial.style;
        if let Some(v) = style.use_tabs {
            self.style.use_tabs = v;
        }
        if let Some(v) = style.indent_size {
            self.style.indent_size = v;
        }
        if let Some(v) = style.space_after_comma {
            self.style.space_after_comma = v;
        }
        if let Some(v) = style.space_within_parentheses {
            self.style.space_within_parentheses = v;
        }
        if let Some(v) = style.space_within_brackets {
            self.style.space_within_brackets = v;
        }
        if let Some(v) = style.space_after_control_keyword {
            self.style.space_after_control_keyword = v;
        }
        if let Some(v) = style.space_after_for_semicolon {
            self.style.space_after_for_semicolon = v;
        }
        if let Some(v) = style.trim_trailing_whitespace {
            self.style.trim_trailing_whitespace = v;
        }
        if let Some(v) = style.max_blank_lines {
            self.style.max_blank_lines = v;
        }
    }

    /// Discover config files from parent directories of a given path
    ///
    /// Searches from the file's directory up to the root, then adds home directory config.
    /// Returns list of config file paths in order of priority (least specific first).
    #[must_use]
    pub fn discover_config_files(start_path: &Path) -> Vec<PathBuf> {
        let mut config_files = Vec::new();

        // Add home directory config first (lowest priority)
        if let Some(home) = dirs_home() {
            for config_name in CONFIG_FILE_NAMES {
                let home_config = home.join(config_name);
                if home_config.is_file() {
                    config_files.push(home_config);
                }
            }
        }

        // Start from the file's parent directory (or the path itself if it's a directory)
        let start_dir = if start_path.is_file() {
            start_path.parent().map(Path::to_path_buf)
        } else if start_path.is_dir() {
            Some(start_path.to_path_buf())
        } else {
            // Path doesn't exist, use current directory
            std::env::current_dir().ok()
        };

        // Collect config files from parent directories (from root to current)
        if let Some(dir) = start_dir {
            let mut ancestors: Vec<PathBuf> = dir.ancestors().map(Path::to_path_buf).collect();
            // Reverse so we go from root to current (less specific to more specific)
            ancestors.reverse();

            for ancestor in ancestors {
                for config_name in CONFIG_FILE_NAMES {
                    let config_path = ancestor.join(config_name);
                    if config_path.is_file() && !config_files.contains(&config_path) {
                        config_files.push(config_path);
                    }
                }
            }
        }

        config_files
    }

    /// Load and merge configuration from discovered config files
    ///
    /// Later files override earlier ones (only explicitly set values).
    /// Unreadable or malformed files are skipped with a warning.
    #[must_use]
    pub fn from_discovered_files(start_path: &Path) -> Self {
        let mut config = Self::default();
        for path in &Self::discover_config_files(start_path) {
            match std::fs::read_to_string(path) {
                Ok(contents) => match toml::from_str::<PartialConfig>(&contents) {
                    Ok(partial) => config.apply_partial(&partial),
                    Err(e) => warn!("failed to parse {}: {e}", path.display()),
                },
                Err(e) => warn!("failed to read {}: {e}", path.display()),
            }
        }
        config
    }
}

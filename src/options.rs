//! Per-run formatting options
//!
//! [`FormatOptions`] is built once per run (from [`crate::Config`]) and passed
//! explicitly to every document through its [`crate::ProjectContext`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Style normalization settings shared by every language service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleOptions {
    /// Indent with tabs (one per level) instead of spaces
    pub use_tabs: bool,
    /// Spaces per level when `use_tabs` is false
    pub indent_size: usize,
    /// `f(a, b)` rather than `f(a,b)`
    pub space_after_comma: bool,
    /// `f( a )` rather than `f(a)`; empty `()` is never padded
    pub space_within_parentheses: bool,
    /// `a[ 0 ]` rather than `a[0]`
    pub space_within_brackets: bool,
    /// `if (x)` rather than `if(x)`
    pub space_after_control_keyword: bool,
    /// `for (i = 0; i < n; i++)`
    pub space_after_for_semicolon: bool,
    pub trim_trailing_whitespace: bool,
    /// Longest allowed run of consecutive blank lines
    pub max_blank_lines: usize,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            use_tabs: true,
            indent_size: 4,
            space_after_comma: true,
            space_within_parentheses: true,
            space_within_brackets: true,
            space_after_control_keyword: true,
            space_after_for_semicolon: true,
            trim_trailing_whitespace: true,
            max_blank_lines: 1,
        }
    }
}

impl StyleOptions {
    /// Leading whitespace for `depth` indentation levels
    #[must_use]
    pub fn indent(&self, depth: usize) -> String {
        if self.use_tabs {
            "\t".repeat(depth)
        } else {
            " ".repeat(depth * self.indent_size)
        }
    }
}

/// What the terminal rule does with the per-configuration passes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigurationPolicy {
    /// Alternate views only produce diagnostics; the default view is returned
    #[default]
    Verify,
    /// Each alternate view's formatting is carried into the returned tree
    Apply,
}

impl fmt::Display for ConfigurationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationPolicy::Verify => write!(f, "verify"),
            ConfigurationPolicy::Apply => write!(f, "apply"),
        }
    }
}

impl FromStr for ConfigurationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "verify" => Ok(ConfigurationPolicy::Verify),
            "apply" => Ok(ConfigurationPolicy::Apply),
            other => Err(format!("unknown policy '{other}' (expected verify or apply)")),
        }
    }
}

/// Options consumed by the rules of one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatOptions {
    /// Each entry is one set of conditional-compilation symbols to verify
    pub preprocessor_configurations: Vec<Vec<String>>,
    pub style: StyleOptions,
    pub policy: ConfigurationPolicy,
}

impl FormatOptions {
    #[must_use]
    pub fn with_configurations(mut self, configurations: Vec<Vec<String>>) -> Self {
        self.preprocessor_configurations = configurations;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indent_tabs_and_spaces() {
        let mut style = StyleOptions::default();
        assert_eq!(style.indent(2), "\t\t");
        style.use_tabs = false;
        style.indent_size = 2;
        assert_eq!(style.indent(3), "      ");
        assert_eq!(style.indent(0), "");
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("Apply".parse(), Ok(ConfigurationPolicy::Apply));
        assert_eq!("verify".parse(), Ok(ConfigurationPolicy::Verify));
        assert!("merge".parse::<ConfigurationPolicy>().is_err());
    }
}

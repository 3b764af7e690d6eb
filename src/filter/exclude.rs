use std::path::{Component, Path};

use glob::Pattern;

use crate::document::Document;
use crate::error::{FormatError, Result};

use super::Filter;

/// Skips documents matching any of a set of glob patterns
#[derive(Debug, Clone, Default)]
pub struct ExcludePatternFilter {
    patterns: Vec<Pattern>,
}

impl ExcludePatternFilter {
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                Pattern::new(pattern).map_err(|e| {
                    FormatError::Config(format!("invalid exclude pattern '{pattern}': {e}"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Match against the full path, the file name, then each component
    #[must_use]
    pub fn is_excluded(&self, path: &Path) -> bool {
        if self.patterns.is_empty() {
            return false;
        }

        let path_str = path.to_string_lossy();
        self.patterns.iter().any(|pattern| {
            if pattern.matches(&path_str) {
                return true;
            }
            if path
                .file_name()
                .is_some_and(|name| pattern.matches(&name.to_string_lossy()))
            {
                return true;
            }
            path.components().any(|component| match component {
                Component::Normal(part) => pattern.matches(&part.to_string_lossy()),
                _ => false,
            })
        })
    }
}

impl Filter for ExcludePatternFilter {
    fn name(&self) -> &'static str {
        "exclude-pattern"
    }

    fn should_process(&self, document: &Document) -> bool {
        !self.is_excluded(document.path())
    }
}

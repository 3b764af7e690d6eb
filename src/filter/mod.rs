//! Document filters
//!
//! A [`Filter`] decides from document metadata alone whether a document
//! enters the rule pipeline. [`FilterRegistry`] combines every applicable
//! filter with a logical AND: one rejection excludes the document.

mod exclude;
mod migrations;

pub use exclude::ExcludePatternFilter;
pub use migrations::{IgnoreMigrationsFilter, DEFAULT_RESERVED_DIRECTORY};

use crate::document::Document;
use crate::language::LanguageId;

pub trait Filter: Send + Sync {
    fn name(&self) -> &'static str;

    /// Languages this filter applies to; filters that do not apply never
    /// reject a document
    fn supports_language(&self, _language: LanguageId) -> bool {
        true
    }

    /// `false` excludes the document from processing
    fn should_process(&self, document: &Document) -> bool;
}

#[derive(Default)]
pub struct FilterRegistry {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F: Filter + 'static>(&mut self, filter: F) {
        self.filters.push(Box::new(filter));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// AND over every filter supporting the document's language.
    ///
    /// Returns the name of the first rejecting filter, if any.
    #[must_use]
    pub fn rejected_by(&self, document: &Document) -> Option<&'static str> {
        self.filters
            .iter()
            .filter(|filter| filter.supports_language(document.language()))
            .find(|filter| !filter.should_process(document))
            .map(|filter| filter.name())
    }

    #[must_use]
    pub fn should_process(&self, document: &Document) -> bool {
        self.rejected_by(document).is_none()
    }
}

impl std::fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.filters.iter().map(|filter| filter.name()).collect();
        f.debug_struct("FilterRegistry")
            .field("filters", &names)
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::document::ProjectContext;
    use crate::language::CFamilyLanguage;
    use crate::options::FormatOptions;
    use crate::process::CancellationToken;

    pub(crate) fn document(path: &str) -> Document {
        Document::parse(
            &CFamilyLanguage,
            path,
            "int x;\n",
            Arc::new(ProjectContext::new("test", FormatOptions::default())),
            &CancellationToken::new(),
        )
        .unwrap()
    }

    struct Fixed {
        accept: bool,
        language: Option<LanguageId>,
    }

    impl Filter for Fixed {
        fn name(&self) -> &'static str {
            if self.accept {
                "accept"
            } else {
                "reject"
            }
        }

        fn supports_language(&self, language: LanguageId) -> bool {
            self.language.map_or(true, |only| only == language)
        }

        fn should_process(&self, _document: &Document) -> bool {
            self.accept
        }
    }

    #[test]
    fn test_empty_registry_accepts() {
        assert!(FilterRegistry::new().should_process(&document("a.cs")));
    }

    #[test]
    fn test_single_rejection_excludes() {
        let mut registry = FilterRegistry::new();
        registry.register(Fixed {
            accept: true,
            language: None,
        });
        registry.register(Fixed {
            accept: false,
            language: None,
        });
        let doc = document("a.cs");
        assert!(!registry.should_process(&doc));
        assert_eq!(registry.rejected_by(&doc), Some("reject"));
    }

    #[test]
    fn test_filter_for_other_language_is_skipped() {
        let mut registry = FilterRegistry::new();
        registry.register(Fixed {
            accept: false,
            language: Some(LanguageId::BASIC),
        });
        assert!(registry.should_process(&document("a.cs")));
    }
}

//! Rule pipeline
//!
//! Runs one document through the filter registry, then folds the applicable
//! rules over its syntax tree in order:
//! `tree[i + 1] = rule[i].transform(document.with_tree(tree[i]))`.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::config::Config;
use crate::diagnostic::Diagnostic;
use crate::document::Document;
use crate::error::{FormatError, Result};
use crate::filter::{ExcludePatternFilter, Filter, FilterRegistry, IgnoreMigrationsFilter};
use crate::language::LanguageRegistry;
use crate::rules::{
    BlankLinesRule, FormatDocumentRule, Rule, RuleContext, RuleRegistry, TrailingWhitespaceRule,
};

use super::CancellationToken;

/// A document after every applicable rule ran
#[derive(Debug, Clone)]
pub struct FormattedDocument {
    pub document: Document,
    /// Rule names in the order they were applied
    pub applied_rules: Vec<&'static str>,
    pub diagnostics: Vec<Diagnostic>,
}

impl FormattedDocument {
    /// Whether the formatted text differs from the loaded text
    #[must_use]
    pub fn is_changed(&self) -> bool {
        self.document.is_modified()
    }

    #[must_use]
    pub fn text(&self) -> String {
        self.document.tree().to_text()
    }
}

#[derive(Debug, Clone)]
pub enum PipelineOutcome {
    /// A filter rejected the document; it is returned unchanged
    Excluded(Document),
    Formatted(FormattedDocument),
    /// Cancellation was requested; no partial document is produced
    Cancelled,
}

#[derive(Default)]
pub struct PipelineBuilder {
    filters: FilterRegistry,
    rules: RuleRegistry,
}

impl PipelineBuilder {
    #[must_use]
    pub fn filter<F: Filter + 'static>(mut self, filter: F) -> Self {
        self.filters.register(filter);
        self
    }

    #[must_use]
    pub fn rule<R: Rule + 'static>(mut self, rule: R) -> Self {
        self.rules.register(rule);
        self
    }

    #[must_use]
    pub fn build(self) -> Pipeline {
        Pipeline {
            filters: self.filters,
            rules: self.rules,
        }
    }
}

/// Filters and rules shared read-only by every document of a run
pub struct Pipeline {
    filters: FilterRegistry,
    rules: RuleRegistry,
}

impl Pipeline {
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    #[must_use]
    pub fn new(filters: FilterRegistry, rules: RuleRegistry) -> Self {
        Self { filters, rules }
    }

    /// Built-in filters and rules configured from `config`
    pub fn standard(languages: Arc<LanguageRegistry>, config: &Config) -> Result<Self> {
        let mut builder = Self::builder()
            .filter(IgnoreMigrationsFilter::new(config.reserved_directory.as_str()));
        if !config.exclude.is_empty() {
            builder = builder.filter(ExcludePatternFilter::new(&config.exclude)?);
        }
        Ok(builder
            .rule(TrailingWhitespaceRule)
            .rule(BlankLinesRule)
            .rule(FormatDocumentRule::new(languages))
            .build())
    }

    #[must_use]
    pub fn filters(&self) -> &FilterRegistry {
        &self.filters
    }

    #[must_use]
    pub fn rules(&self) -> &RuleRegistry {
        &self.rules
    }

    /// Run `document` through the filters and rules.
    ///
    /// A failing rule aborts the document with [`FormatError::Rule`].
    /// Cancellation is checked before the first rule and after every rule.
    pub fn run(&self, document: Document, cancel: &CancellationToken) -> Result<PipelineOutcome> {
        if let Some(filter) = self.filters.rejected_by(&document) {
            debug!("{}: excluded by {filter}", document.path().display());
            return Ok(PipelineOutcome::Excluded(document));
        }

        let mut current = document;
        let mut applied_rules = Vec::new();
        let mut context = RuleContext::new(cancel);

        for rule in self.rules.for_language(current.language()) {
            if cancel.is_cancelled() {
                return Ok(PipelineOutcome::Cancelled);
            }
            debug!(
                "{}: applying {} (order {})",
                current.path().display(),
                rule.name(),
                rule.order()
            );
            match rule.transform(&current, &mut context) {
                Ok(tree) => current = current.with_tree(tree),
                Err(e) if e.is_cancelled() => return Ok(PipelineOutcome::Cancelled),
                Err(e) => {
                    return Err(FormatError::Rule {
                        rule: rule.name(),
                        source: Box::new(e),
                    })
                }
            }
            applied_rules.push(rule.name());
        }

        if cancel.is_cancelled() {
            return Ok(PipelineOutcome::Cancelled);
        }

        Ok(PipelineOutcome::Formatted(FormattedDocument {
            document: current,
            applied_rules,
            diagnostics: context.diagnostics,
        }))
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("filters", &self.filters)
            .field("rules", &self.rules)
            .finish()
    }
}

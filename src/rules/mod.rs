//! Formatting rules
//!
//! A [`Rule`] maps a document to a new syntax tree. The pipeline applies the
//! rules registered in a [`RuleRegistry`] in ascending [`RuleOrder`], ties
//! broken by registration order. Built-in rules:
//! - [`TrailingWhitespaceRule`] (100)
//! - [`BlankLinesRule`] (200)
//! - [`FormatDocumentRule`] (always last)

mod blank_lines;
mod format_document;
mod trailing_whitespace;

pub use blank_lines::BlankLinesRule;
pub use format_document::FormatDocumentRule;
pub use trailing_whitespace::TrailingWhitespaceRule;

use std::fmt;

use crate::diagnostic::Diagnostic;
use crate::document::Document;
use crate::error::Result;
use crate::language::LanguageId;
use crate::parser::SyntaxTree;
use crate::process::CancellationToken;

/// Position of a rule in the pipeline; lower runs first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuleOrder(pub u32);

impl RuleOrder {
    pub const TRAILING_WHITESPACE: RuleOrder = RuleOrder(100);
    pub const BLANK_LINES: RuleOrder = RuleOrder(200);
    /// Reserved for the terminal formatting rule
    pub const FORMAT_DOCUMENT: RuleOrder = RuleOrder(u32::MAX);
}

impl fmt::Display for RuleOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-document state handed to each rule
#[derive(Debug)]
pub struct RuleContext<'a> {
    pub cancel: &'a CancellationToken,
    pub diagnostics: Vec<Diagnostic>,
}

impl<'a> RuleContext<'a> {
    #[must_use]
    pub fn new(cancel: &'a CancellationToken) -> Self {
        Self {
            cancel,
            diagnostics: Vec::new(),
        }
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

pub trait Rule: Send + Sync {
    fn name(&self) -> &'static str;

    fn order(&self) -> RuleOrder;

    fn supports_language(&self, language: LanguageId) -> bool;

    /// Produce the document's next tree; `document` itself is not modified
    fn transform(&self, document: &Document, context: &mut RuleContext<'_>) -> Result<SyntaxTree>;
}

struct Registered {
    /// Captured at registration so it cannot drift afterwards
    order: RuleOrder,
    rule: Box<dyn Rule>,
}

#[derive(Default)]
pub struct RuleRegistry {
    rules: Vec<Registered>,
}

impl RuleRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<R: Rule + 'static>(&mut self, rule: R) {
        let order = rule.order();
        self.rules.push(Registered {
            order,
            rule: Box::new(rule),
        });
        // Stable sort keeps registration order among equal keys
        self.rules.sort_by_key(|registered| registered.order);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules applying to `language`, in execution order
    pub fn for_language(&self, language: LanguageId) -> impl Iterator<Item = &dyn Rule> + '_ {
        self.rules
            .iter()
            .filter(move |registered| registered.rule.supports_language(language))
            .map(|registered| registered.rule.as_ref())
    }

    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|registered| registered.rule.name()).collect()
    }
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(
                self.rules
                    .iter()
                    .map(|registered| (registered.rule.name(), registered.order.0)),
            )
            .finish()
    }
}

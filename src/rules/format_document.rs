//! Terminal formatting rule
//!
//! Normalizes the document under its default parse options, then re-parses
//! the same text under every declared preprocessor configuration (each
//! extended with [`SENTINEL_SYMBOL`]) so that code hidden behind `#if`
//! guards is checked too. With [`ConfigurationPolicy::Verify`] the alternate
//! views only produce diagnostics; with [`ConfigurationPolicy::Apply`] each
//! view's formatting is carried into the returned tree.

use std::sync::Arc;

use tracing::debug;

use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::document::Document;
use crate::error::{FormatError, Result};
use crate::language::{LanguageId, LanguageRegistry, LanguageService};
use crate::options::{ConfigurationPolicy, StyleOptions};
use crate::parser::{ParseOptions, SyntaxTree};
use crate::SENTINEL_SYMBOL;

use super::{Rule, RuleContext, RuleOrder};

#[derive(Debug, Clone)]
pub struct FormatDocumentRule {
    languages: Arc<LanguageRegistry>,
}

impl FormatDocumentRule {
    #[must_use]
    pub fn new(languages: Arc<LanguageRegistry>) -> Self {
        Self { languages }
    }
}

/// `symbols` plus the sentinel, without duplicates
fn augment(symbols: &[String]) -> Vec<String> {
    let mut augmented: Vec<String> = Vec::with_capacity(symbols.len() + 1);
    for symbol in symbols.iter().map(String::as_str).chain([SENTINEL_SYMBOL]) {
        if !augmented.iter().any(|existing| existing == symbol) {
            augmented.push(symbol.to_string());
        }
    }
    augmented
}

/// One alternate view: parse options plus the symbols that produced them
struct Configuration<'a> {
    options: ParseOptions,
    symbols: Vec<String>,
    service: &'a dyn LanguageService,
    style: &'a StyleOptions,
}

impl Configuration<'_> {
    fn diagnostic(
        &self,
        document: &Document,
        kind: DiagnosticKind,
        line: usize,
        message: String,
    ) -> Diagnostic {
        Diagnostic {
            kind,
            path: document.path().to_path_buf(),
            line: line + 1,
            symbols: self.symbols.clone(),
            message,
        }
    }

    /// Parse and normalize `text` under this configuration, reporting
    /// non-idempotent normalization
    fn format(
        &self,
        document: &Document,
        text: &str,
        context: &mut RuleContext<'_>,
    ) -> Result<SyntaxTree> {
        let alternate = self.service.parse(text, &self.options, context.cancel)?;
        let formatted = self
            .service
            .normalize(&alternate, &self.options, self.style, context.cancel)?;
        let again = self
            .service
            .normalize(&formatted, &self.options, self.style, context.cancel)?;

        if let Some(line) = first_difference(&formatted, &again) {
            context.report(self.diagnostic(
                document,
                DiagnosticKind::NonIdempotent,
                line,
                "a second normalization pass changed this line".to_string(),
            ));
        }
        Ok(formatted)
    }

    /// Report lines active in `alternate` that differ from `reference`
    fn compare(
        &self,
        document: &Document,
        alternate: &SyntaxTree,
        reference: &SyntaxTree,
        context: &mut RuleContext<'_>,
    ) {
        for (index, (line, expected)) in alternate
            .lines()
            .iter()
            .zip(reference.lines())
            .enumerate()
        {
            if !line.is_active() || Arc::ptr_eq(line, expected) {
                continue;
            }
            let actual = expected.to_string();
            let wanted = line.to_string();
            if actual != wanted {
                context.report(self.diagnostic(
                    document,
                    DiagnosticKind::UnformattedRegion,
                    index,
                    format!("expected `{}`, found `{}`", wanted.trim(), actual.trim()),
                ));
            }
        }
    }
}

/// Index of the first line where two trees render differently
fn first_difference(a: &SyntaxTree, b: &SyntaxTree) -> Option<usize> {
    if a.ptr_eq(b) {
        return None;
    }
    let differing = a
        .lines()
        .iter()
        .zip(b.lines())
        .position(|(x, y)| x.leading() != y.leading() || x.body() != y.body());
    differing.or_else(|| {
        (a.line_count() != b.line_count()).then(|| a.line_count().min(b.line_count()))
    })
}

impl Rule for FormatDocumentRule {
    fn name(&self) -> &'static str {
        "format-document"
    }

    fn order(&self) -> RuleOrder {
        RuleOrder::FORMAT_DOCUMENT
    }

    fn supports_language(&self, language: LanguageId) -> bool {
        self.languages.contains(language)
    }

    fn transform(&self, document: &Document, context: &mut RuleContext<'_>) -> Result<SyntaxTree> {
        let service = self
            .languages
            .get(document.language())
            .ok_or_else(|| FormatError::UnknownLanguage(document.language().to_string()))?;
        let options = document.project().options();
        let style = &options.style;
        let default_options = document.parse_options();

        let formatted = service.normalize(document.tree(), default_options, style, context.cancel)?;

        let configurations = &options.preprocessor_configurations;
        if configurations.is_empty() {
            return Ok(formatted);
        }

        let input = document.tree().to_text();
        let mut current = formatted.clone();
        let mut applied = false;

        for symbols in configurations {
            if context.cancel.is_cancelled() {
                return Err(FormatError::Cancelled);
            }

            let symbols = augment(symbols);
            let Some(augmented) = default_options.with_preprocessor_symbols(&symbols)? else {
                debug!(
                    "{}: {} options carry no preprocessor symbols, skipping configurations",
                    document.path().display(),
                    default_options.kind_name()
                );
                break;
            };
            debug!(
                "{}: formatting under [{}]",
                document.path().display(),
                symbols.join(", ")
            );

            let configuration = Configuration {
                options: augmented,
                symbols,
                service: service.as_ref(),
                style,
            };

            match options.policy {
                ConfigurationPolicy::Verify => {
                    let alternate = configuration.format(document, &input, context)?;
                    configuration.compare(document, &alternate, &formatted, context);
                }
                ConfigurationPolicy::Apply => {
                    let text = current.to_text();
                    let alternate = configuration.format(document, &text, context)?;
                    configuration.compare(document, &alternate, &current, context);
                    if alternate.to_text() != text {
                        applied = true;
                    }
                    current = alternate;
                }
            }
        }

        if !applied {
            return Ok(formatted);
        }

        // Restore the default view's line kinds and canonical layout
        let text = current.to_text();
        let reparsed = service.parse(&text, default_options, context.cancel)?;
        service.normalize(&reparsed, default_options, style, context.cancel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ProjectContext;
    use crate::language::CFamilyLanguage;
    use crate::options::FormatOptions;
    use crate::process::CancellationToken;

    const SOURCE: &str = "void F() {\nrun();\n#if FAST\n      skip(  1 );\n#endif\n}\n";

    fn document(options: FormatOptions) -> Document {
        Document::parse(
            &CFamilyLanguage,
            "src/f.c",
            SOURCE,
            Arc::new(ProjectContext::new("t", options)),
            &CancellationToken::new(),
        )
        .unwrap()
    }

    fn rule() -> FormatDocumentRule {
        FormatDocumentRule::new(Arc::new(LanguageRegistry::with_defaults()))
    }

    fn configurations(sets: &[&[&str]]) -> Vec<Vec<String>> {
        sets.iter()
            .map(|set| set.iter().map(|s| (*s).to_string()).collect())
            .collect()
    }

    #[test]
    fn test_augment_adds_sentinel_once() {
        assert_eq!(
            augment(&["A".to_string(), "A".to_string()]),
            vec!["A".to_string(), SENTINEL_SYMBOL.to_string()]
        );
        assert_eq!(
            augment(&[SENTINEL_SYMBOL.to_string()]),
            vec![SENTINEL_SYMBOL.to_string()]
        );
    }

    #[test]
    fn test_default_pass_only() {
        let doc = document(FormatOptions::default());
        let cancel = CancellationToken::new();
        let mut context = RuleContext::new(&cancel);
        let tree = rule().transform(&doc, &mut context).unwrap();
        assert_eq!(
            tree.to_text(),
            "void F() {\n\trun();\n#if FAST\n      skip(  1 );\n#endif\n}\n"
        );
        assert!(context.diagnostics.is_empty());
    }

    #[test]
    fn test_verify_reports_hidden_region() {
        let options = FormatOptions::default().with_configurations(configurations(&[&["FAST"]]));
        let doc = document(options);
        let cancel = CancellationToken::new();
        let mut context = RuleContext::new(&cancel);
        let tree = rule().transform(&doc, &mut context).unwrap();

        // Returned tree is the default view
        assert_eq!(tree.lines()[3].body(), "      skip(  1 );");
        assert_eq!(context.diagnostics.len(), 1);
        let diagnostic = &context.diagnostics[0];
        assert_eq!(diagnostic.kind, DiagnosticKind::UnformattedRegion);
        assert_eq!(diagnostic.line, 4);
        assert_eq!(
            diagnostic.symbols,
            vec!["FAST".to_string(), SENTINEL_SYMBOL.to_string()]
        );
    }

    #[test]
    fn test_sentinel_region_is_checked() {
        let source = "#if PPFMT_FORMATTER\n  x( 1 ,2);\n#endif\n";
        let options = FormatOptions::default().with_configurations(configurations(&[&[]]));
        let doc = Document::parse(
            &CFamilyLanguage,
            "g.c",
            source,
            Arc::new(ProjectContext::new("t", options)),
            &CancellationToken::new(),
        )
        .unwrap();
        let cancel = CancellationToken::new();
        let mut context = RuleContext::new(&cancel);
        rule().transform(&doc, &mut context).unwrap();
        assert_eq!(context.diagnostics.len(), 1);
        assert_eq!(context.diagnostics[0].line, 2);
    }

    #[test]
    fn test_apply_carries_alternate_formatting() {
        let mut options = FormatOptions::default().with_configurations(configurations(&[&["FAST"]]));
        options.policy = ConfigurationPolicy::Apply;
        let doc = document(options);
        let cancel = CancellationToken::new();
        let mut context = RuleContext::new(&cancel);
        let tree = rule().transform(&doc, &mut context).unwrap();
        assert_eq!(
            tree.to_text(),
            "void F() {\n\trun();\n#if FAST\n\tskip( 1 );\n#endif\n}\n"
        );
        assert_eq!(tree.lines()[3].kind(), &crate::parser::LineKind::Disabled);
    }

    #[test]
    fn test_plain_options_skip_configurations() {
        let options = FormatOptions::default().with_configurations(configurations(&[&["A"]]));
        let source = "  x;\n";
        let doc = Document::new(
            LanguageId::C_FAMILY,
            "p.c",
            ParseOptions::Plain,
            Arc::new(ProjectContext::new("t", options)),
            source,
            CFamilyLanguage
                .parse(source, &ParseOptions::Plain, &CancellationToken::new())
                .unwrap(),
        );
        let cancel = CancellationToken::new();
        let mut context = RuleContext::new(&cancel);
        let tree = rule().transform(&doc, &mut context).unwrap();
        assert_eq!(tree.to_text(), "x;\n");
        assert!(context.diagnostics.is_empty());
    }

    #[test]
    fn test_unknown_options_kind_fails() {
        let options = FormatOptions::default().with_configurations(configurations(&[&["A"]]));
        let source = "x;\n";
        let doc = Document::new(
            LanguageId::C_FAMILY,
            "o.c",
            ParseOptions::Other {
                kind: "script".to_string(),
            },
            Arc::new(ProjectContext::new("t", options)),
            source,
            CFamilyLanguage
                .parse(source, &ParseOptions::Plain, &CancellationToken::new())
                .unwrap(),
        );
        let cancel = CancellationToken::new();
        let err = rule()
            .transform(&doc, &mut RuleContext::new(&cancel))
            .unwrap_err();
        assert!(matches!(err, FormatError::UnsupportedConfiguration { kind } if kind == "script"));
    }

    #[test]
    fn test_cancelled_before_configuration() {
        let options = FormatOptions::default().with_configurations(configurations(&[&["A"]]));
        let doc = document(options);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = rule()
            .transform(&doc, &mut RuleContext::new(&cancel))
            .unwrap_err();
        assert!(err.is_cancelled());
    }
}

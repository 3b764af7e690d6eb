use std::sync::Arc;

use crate::document::Document;
use crate::error::Result;
use crate::language::LanguageId;
use crate::parser::{LineKind, SyntaxTree};

use super::{Rule, RuleContext, RuleOrder};

/// Strips trailing spaces and tabs outside inactive branches and string literals
#[derive(Debug, Clone, Copy, Default)]
pub struct TrailingWhitespaceRule;

impl Rule for TrailingWhitespaceRule {
    fn name(&self) -> &'static str {
        "trailing-whitespace"
    }

    fn order(&self) -> RuleOrder {
        RuleOrder::TRAILING_WHITESPACE
    }

    fn supports_language(&self, _language: LanguageId) -> bool {
        true
    }

    fn transform(&self, document: &Document, _context: &mut RuleContext<'_>) -> Result<SyntaxTree> {
        let tree = document.tree();
        if !document.project().options().style.trim_trailing_whitespace {
            return Ok(tree.clone());
        }

        let lines = tree.lines();
        let trimmed = lines
            .iter()
            .enumerate()
            .map(|(index, line)| {
                // A line followed by a literal continuation ends inside that literal
                let opens_literal = lines
                    .get(index + 1)
                    .is_some_and(|next| matches!(next.kind(), LineKind::Literal));
                let replacement = match line.kind() {
                    LineKind::Disabled | LineKind::Literal => None,
                    _ if opens_literal => None,
                    LineKind::Blank => (!line.leading().is_empty()).then(|| line.with_leading("")),
                    LineKind::Code | LineKind::Directive(_) => {
                        let body = line.body().trim_end_matches([' ', '\t']);
                        (body.len() != line.body().len()).then(|| line.with_body(body))
                    }
                };
                replacement.map_or_else(|| Arc::clone(line), Arc::new)
            })
            .collect();
        Ok(tree.with_lines(trimmed))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::document::ProjectContext;
    use crate::language::CFamilyLanguage;
    use crate::options::FormatOptions;
    use crate::process::CancellationToken;

    fn run(source: &str, options: FormatOptions) -> String {
        let cancel = CancellationToken::new();
        let doc = Document::parse(
            &CFamilyLanguage,
            "a.c",
            source,
            Arc::new(ProjectContext::new("t", options)),
            &cancel,
        )
        .unwrap();
        TrailingWhitespaceRule
            .transform(&doc, &mut RuleContext::new(&cancel))
            .unwrap()
            .to_text()
    }

    #[test]
    fn test_strips_code_and_blank_lines() {
        assert_eq!(
            run("int x;  \n  \t\n#define A \t\n", FormatOptions::default()),
            "int x;\n\n#define A\n"
        );
    }

    #[test]
    fn test_disabled_lines_untouched() {
        let source = "#if OFF\nold();   \n#endif\n";
        assert_eq!(run(source, FormatOptions::default()), source);
    }

    #[test]
    fn test_multi_line_string_untouched() {
        let source = "s = @\"one  \n  two\t\n\";  \n";
        assert_eq!(run(source, FormatOptions::default()), source);
    }

    #[test]
    fn test_disabled_by_style() {
        let mut options = FormatOptions::default();
        options.style.trim_trailing_whitespace = false;
        assert_eq!(run("x;  \n", options), "x;  \n");
    }
}

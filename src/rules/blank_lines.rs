use std::sync::Arc;

use crate::document::Document;
use crate::error::Result;
use crate::language::LanguageId;
use crate::parser::{LineKind, SyntaxTree};

use super::{Rule, RuleContext, RuleOrder};

/// Collapses runs of blank lines longer than `style.max_blank_lines`
#[derive(Debug, Clone, Copy, Default)]
pub struct BlankLinesRule;

impl Rule for BlankLinesRule {
    fn name(&self) -> &'static str {
        "blank-lines"
    }

    fn order(&self) -> RuleOrder {
        RuleOrder::BLANK_LINES
    }

    fn supports_language(&self, _language: LanguageId) -> bool {
        true
    }

    fn transform(&self, document: &Document, _context: &mut RuleContext<'_>) -> Result<SyntaxTree> {
        let tree = document.tree();
        let max = document.project().options().style.max_blank_lines;

        let mut run = 0;
        let mut lines = Vec::with_capacity(tree.line_count());
        for line in tree.lines() {
            if matches!(line.kind(), LineKind::Blank) {
                run += 1;
                if run > max {
                    continue;
                }
            } else {
                run = 0;
            }
            lines.push(Arc::clone(line));
        }

        if lines.len() == tree.line_count() {
            return Ok(tree.clone());
        }
        Ok(tree.with_lines(lines))
    }
}

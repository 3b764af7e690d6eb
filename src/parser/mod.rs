//! Source parsing into line-based syntax trees.
//!
//! This module contains the grammar-independent parsing machinery:
//! - [`tree`]: the persistent [`SyntaxTree`] and its lines
//! - [`options`]: [`ParseOptions`] and preprocessor symbol augmentation
//! - [`conditional`]: condition evaluation and the active-branch stack
//! - [`scanner`]: per-line tokenizer used by the style normalizers
//!
//! Language services plug in through the [`Dialect`] trait, which tells
//! [`parse_conditional`] how to recognize directives and symbol definitions.

pub mod conditional;
pub mod options;
pub(crate) mod patterns;
pub mod scanner;
pub mod tree;

pub use conditional::{evaluate, ConditionSyntax, ConditionalStack, SymbolTable};
pub use options::{BasicParseOptions, CFamilyParseOptions, ParseOptions};
pub use scanner::{scan_line, Flavor, OpenLiteral, ScanState, Token, TokenKind};
pub use tree::{Directive, DirectiveKind, LineEnding, LineKind, SourceLines, SyntaxLine, SyntaxTree};

use crate::error::{FormatError, Result};
use crate::process::CancellationToken;

/// How often (in lines) long loops poll the cancellation token
pub(crate) const CANCEL_CHECK_INTERVAL: usize = 256;

/// Grammar-specific preprocessor surface
pub trait Dialect {
    /// Recognize a directive; `line` has no leading whitespace
    fn classify_directive(&self, line: &str) -> Option<Directive>;

    fn condition_syntax(&self) -> ConditionSyntax;

    /// Parse a `Define` argument into `(name, value)`
    fn definition(&self, argument: &str, symbols: &SymbolTable) -> Option<(String, bool)>;

    /// Build the initial symbol table from parse options
    fn symbols(&self, options: &ParseOptions) -> Result<SymbolTable>;

    /// Scanner flavor used to follow string literals that span lines
    fn literal_flavor(&self) -> Option<Flavor> {
        None
    }
}

/// Parse `source` into a tree, marking lines in inactive branches `Disabled`
pub fn parse_conditional(
    source: &str,
    dialect: &impl Dialect,
    options: &ParseOptions,
    cancel: &CancellationToken,
) -> Result<SyntaxTree> {
    let mut symbols = dialect.symbols(options)?;
    let syntax = dialect.condition_syntax();
    let split = SourceLines::split(source);
    let mut stack = ConditionalStack::new();
    let mut lines = Vec::with_capacity(split.lines.len());
    let flavor = dialect.literal_flavor();
    let mut scan = ScanState::default();

    for (index, raw) in split.lines.iter().enumerate() {
        if index % CANCEL_CHECK_INTERVAL == 0 && cancel.is_cancelled() {
            return Err(FormatError::Cancelled);
        }

        if scan.in_literal() && stack.is_active() {
            if let Some(flavor) = flavor {
                scan_line(raw, flavor, &mut scan);
            }
            lines.push(SyntaxLine::new(LineKind::Literal, "", *raw));
            continue;
        }

        let trimmed = raw.trim_start_matches([' ', '\t']);
        if let Some(directive) = dialect.classify_directive(trimmed) {
            let active = stack.is_active();
            match directive.kind {
                DirectiveKind::If => {
                    stack.enter_if(|| evaluate(&directive.argument, syntax, &symbols));
                }
                DirectiveKind::Elif => {
                    stack.enter_elif(|| evaluate(&directive.argument, syntax, &symbols));
                }
                DirectiveKind::Else => stack.enter_else(),
                DirectiveKind::EndIf => stack.exit(),
                DirectiveKind::Define if active => {
                    if let Some((name, value)) = dialect.definition(&directive.argument, &symbols)
                    {
                        symbols.define(&name, value);
                    }
                }
                DirectiveKind::Undef if active => {
                    if let Some(name) = directive.argument.split_whitespace().next() {
                        symbols.undefine(name);
                    }
                }
                _ => {}
            }
            lines.push(SyntaxLine::from_raw(LineKind::Directive(directive), raw));
        } else if !stack.is_active() {
            lines.push(SyntaxLine::new(LineKind::Disabled, "", *raw));
        } else if trimmed.trim().is_empty() {
            lines.push(SyntaxLine::new(LineKind::Blank, *raw, ""));
        } else {
            if let Some(flavor) = flavor {
                scan_line(raw, flavor, &mut scan);
            }
            lines.push(SyntaxLine::from_raw(LineKind::Code, raw));
        }
    }

    Ok(SyntaxTree::from_lines(lines, split.final_newline, split.line_ending).with_bom(split.bom))
}

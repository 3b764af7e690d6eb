//! C-family language service (C, C++, C#, Java)
//!
//! Parsing recognizes `#if`/`#ifdef`/`#ifndef`/`#elif`/`#else`/`#endif`,
//! `#define`/`#undef` and `#region` directives with case-sensitive symbols.
//!
//! Normalization:
//! - directives are pinned to column 0 with their inner whitespace collapsed
//! - code is re-indented by brace depth, one extra level inside open parens
//! - token spacing follows [`StyleOptions`]
//! - literals, comments, disabled lines and lines that start inside a block
//!   comment or a multi-line string are left as written

use std::sync::Arc;

use crate::error::{FormatError, Result};
use crate::options::StyleOptions;
use crate::parser::patterns::{C_DEFINE_NAME_RE, C_DIRECTIVE_RE};
use crate::parser::{
    parse_conditional, scan_line, CFamilyParseOptions, ConditionSyntax, Dialect, Directive,
    DirectiveKind, Flavor, LineKind, ParseOptions, ScanState, SymbolTable, SyntaxLine,
    SyntaxTree, Token, TokenKind, CANCEL_CHECK_INTERVAL,
};
use crate::process::CancellationToken;

use super::{LanguageId, LanguageService};

/// Keywords separated from their `(` by `space_after_control_keyword`
const CONTROL_KEYWORDS: &[&str] = &[
    "if", "for", "foreach", "while", "switch", "catch", "using", "lock", "fixed",
];

/// Words that keep their original spacing before `(`
const SPACED_KEYWORDS: &[&str] = &[
    "return", "new", "throw", "await", "yield", "in", "is", "as", "case", "else", "do", "when",
    "where", "and", "or", "not",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct CFamilyLanguage;

/// Drop a trailing `//` or `/*` comment from a directive argument
fn strip_comment(argument: &str) -> &str {
    let end = [argument.find("//"), argument.find("/*")]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(argument.len());
    argument[..end].trim_end()
}

impl Dialect for CFamilyLanguage {
    fn classify_directive(&self, line: &str) -> Option<Directive> {
        if !line.starts_with('#') {
            return None;
        }
        let caps = C_DIRECTIVE_RE.captures(line)?;
        let keyword = caps.get(1).map_or("", |m| m.as_str());
        let argument = caps.get(2).map_or("", |m| m.as_str());
        let condition = strip_comment(argument);

        let directive = match keyword {
            "if" => Directive::new(DirectiveKind::If, condition),
            "ifdef" => Directive::new(DirectiveKind::If, format!("defined({condition})")),
            "ifndef" => Directive::new(DirectiveKind::If, format!("!defined({condition})")),
            "elif" => Directive::new(DirectiveKind::Elif, condition),
            "else" => Directive::new(DirectiveKind::Else, ""),
            "endif" => Directive::new(DirectiveKind::EndIf, ""),
            "define" => Directive::new(DirectiveKind::Define, argument),
            "undef" => Directive::new(DirectiveKind::Undef, condition),
            "region" => Directive::new(DirectiveKind::Region, argument),
            "endregion" => Directive::new(DirectiveKind::EndRegion, argument),
            _ => Directive::new(DirectiveKind::Other, argument),
        };
        Some(directive)
    }

    fn condition_syntax(&self) -> ConditionSyntax {
        ConditionSyntax::CFamily
    }

    fn definition(&self, argument: &str, _symbols: &SymbolTable) -> Option<(String, bool)> {
        let caps = C_DEFINE_NAME_RE.captures(argument)?;
        Some((caps[1].to_string(), true))
    }

    fn symbols(&self, options: &ParseOptions) -> Result<SymbolTable> {
        let mut table = SymbolTable::new(false);
        match options {
            ParseOptions::CFamily(options) => {
                for symbol in options.symbols() {
                    table.define(symbol, true);
                }
            }
            ParseOptions::Plain => {}
            ParseOptions::Basic(_) | ParseOptions::Other { .. } => {
                return Err(FormatError::UnsupportedConfiguration {
                    kind: options.kind_name().to_string(),
                });
            }
        }
        Ok(table)
    }

    fn literal_flavor(&self) -> Option<Flavor> {
        Some(Flavor::CFamily)
    }
}

impl LanguageService for CFamilyLanguage {
    fn id(&self) -> LanguageId {
        LanguageId::C_FAMILY
    }

    fn extensions(&self) -> &[&'static str] {
        &["c", "h", "cpp", "hpp", "cc", "cs", "java"]
    }

    fn default_parse_options(&self) -> ParseOptions {
        ParseOptions::CFamily(CFamilyParseOptions::default())
    }

    fn parse(
        &self,
        source: &str,
        options: &ParseOptions,
        cancel: &CancellationToken,
    ) -> Result<SyntaxTree> {
        parse_conditional(source, self, options, cancel)
    }

    fn normalize(
        &self,
        tree: &SyntaxTree,
        _options: &ParseOptions,
        style: &StyleOptions,
        cancel: &CancellationToken,
    ) -> Result<SyntaxTree> {
        let mut layout = Layout::default();
        let mut lines = Vec::with_capacity(tree.line_count());

        for (index, line) in tree.lines().iter().enumerate() {
            if index % CANCEL_CHECK_INTERVAL == 0 && cancel.is_cancelled() {
                return Err(FormatError::Cancelled);
            }
            let replacement = match line.kind() {
                LineKind::Disabled => None,
                LineKind::Literal => layout.follow(line),
                LineKind::Blank => (!line.leading().is_empty() || !line.body().is_empty())
                    .then(|| SyntaxLine::new(LineKind::Blank, "", "")),
                LineKind::Directive(_) => normalize_directive(line),
                LineKind::Code => layout.normalize_code(line, style),
            };
            lines.push(replacement.map_or_else(|| Arc::clone(line), Arc::new));
        }

        Ok(tree.with_lines(lines))
    }
}

fn normalize_directive(line: &SyntaxLine) -> Option<SyntaxLine> {
    let body = line.body();
    let caps = C_DIRECTIVE_RE.captures(body)?;
    let keyword = caps.get(1).map_or("", |m| m.as_str());
    let argument = caps.get(2).map_or("", |m| m.as_str());

    let mut text = String::with_capacity(body.len());
    text.push('#');
    text.push_str(keyword);
    if !argument.is_empty() {
        if !keyword.is_empty() {
            text.push(' ');
        }
        text.push_str(argument);
    }

    (text != body || !line.leading().is_empty())
        .then(|| SyntaxLine::new(line.kind().clone(), "", text))
}

/// Brace and paren nesting carried from line to line
#[derive(Debug, Default)]
struct Layout {
    depth: usize,
    parens: usize,
    scan: ScanState,
}

impl Layout {
    /// Keep a line as written while following its literal, comment and brace state
    fn follow(&mut self, line: &SyntaxLine) -> Option<SyntaxLine> {
        let text = line.to_string();
        let tokens = scan_line(&text, Flavor::CFamily, &mut self.scan);
        self.track(&tokens);
        None
    }

    fn normalize_code(&mut self, line: &SyntaxLine, style: &StyleOptions) -> Option<SyntaxLine> {
        if self.scan.in_block_comment || self.scan.in_literal() {
            return self.follow(line);
        }
        let tokens = scan_line(line.body(), Flavor::CFamily, &mut self.scan);

        let closers = tokens.iter().take_while(|t| t.is_punct('}')).count();
        let continuation = self.parens > 0 && !tokens.first().is_some_and(|t| t.is_punct(')'));
        let level = self.depth.saturating_sub(closers) + usize::from(continuation);

        let mut body = render(&tokens, style, self.parens);
        if style.trim_trailing_whitespace && !self.scan.in_literal() {
            body.truncate(body.trim_end().len());
        }
        self.track(&tokens);

        let leading = style.indent(level);
        (leading != line.leading() || body != line.body())
            .then(|| SyntaxLine::new(LineKind::Code, leading, body))
    }

    fn track(&mut self, tokens: &[Token<'_>]) {
        for token in tokens {
            match token.kind {
                TokenKind::Punct('{') => self.depth += 1,
                TokenKind::Punct('}') => self.depth = self.depth.saturating_sub(1),
                TokenKind::Punct('(') => self.parens += 1,
                TokenKind::Punct(')') => self.parens = self.parens.saturating_sub(1),
                _ => {}
            }
        }
    }
}

fn render(tokens: &[Token<'_>], style: &StyleOptions, mut parens: usize) -> String {
    let mut out = String::new();
    let mut prev: Option<&Token<'_>> = None;
    for token in tokens {
        if let Some(prev) = prev {
            out.push_str(gap(prev, token, style, parens));
        }
        out.push_str(token.text);
        match token.kind {
            TokenKind::Punct('(') => parens += 1,
            TokenKind::Punct(')') => parens = parens.saturating_sub(1),
            _ => {}
        }
        prev = Some(token);
    }
    out
}

/// Whitespace between two adjacent tokens; `parens` is the depth between them
fn gap(prev: &Token<'_>, cur: &Token<'_>, style: &StyleOptions, parens: usize) -> &'static str {
    let space = |on: bool| if on { " " } else { "" };
    if prev.is_comment() || cur.is_comment() {
        return " ";
    }

    match (prev.kind, cur.kind) {
        (TokenKind::Punct('('), TokenKind::Punct(')'))
        | (TokenKind::Punct('['), TokenKind::Punct(']'))
        | (_, TokenKind::Punct(',' | ';')) => "",
        (TokenKind::Punct(')'), TokenKind::Punct('{')) => " ",
        (TokenKind::Punct('('), _) | (_, TokenKind::Punct(')')) => {
            space(style.space_within_parentheses)
        }
        (TokenKind::Punct('['), _) | (_, TokenKind::Punct(']')) => {
            space(style.space_within_brackets)
        }
        (TokenKind::Punct(','), _) => space(style.space_after_comma),
        (TokenKind::Punct(';'), _) if parens > 0 => space(style.space_after_for_semicolon),
        (TokenKind::Word, TokenKind::Punct('(')) if CONTROL_KEYWORDS.contains(&prev.text) => {
            space(style.space_after_control_keyword)
        }
        (TokenKind::Word, TokenKind::Punct('(')) if !SPACED_KEYWORDS.contains(&prev.text) => "",
        _ => space(cur.space_before),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str, symbols: &[&str]) -> SyntaxTree {
        let options = ParseOptions::CFamily(CFamilyParseOptions::new(symbols.iter().copied()));
        CFamilyLanguage
            .parse(source, &options, &CancellationToken::new())
            .unwrap()
    }

    fn format_with(source: &str, style: &StyleOptions) -> String {
        let tree = parse(source, &[]);
        CFamilyLanguage
            .normalize(
                &tree,
                &CFamilyLanguage.default_parse_options(),
                style,
                &CancellationToken::new(),
            )
            .unwrap()
            .to_text()
    }

    fn format(source: &str) -> String {
        format_with(source, &StyleOptions::default())
    }

    fn kinds(tree: &SyntaxTree) -> Vec<&'static str> {
        tree.lines()
            .iter()
            .map(|line| match line.kind() {
                LineKind::Blank => "blank",
                LineKind::Code => "code",
                LineKind::Directive(_) => "directive",
                LineKind::Disabled => "disabled",
                LineKind::Literal => "literal",
            })
            .collect()
    }

    #[test]
    fn test_parse_marks_inactive_branch() {
        let source = "#if DEBUG\nlog();\n#else\nrun();\n#endif\n";

        let tree = parse(source, &[]);
        assert_eq!(
            kinds(&tree),
            vec!["directive", "disabled", "directive", "code", "directive"]
        );

        let tree = parse(source, &["DEBUG"]);
        assert_eq!(
            kinds(&tree),
            vec!["directive", "code", "directive", "disabled", "directive"]
        );
        assert_eq!(tree.to_text(), source);
    }

    #[test]
    fn test_ifdef_ifndef_and_define() {
        let source = "#define FEATURE\n#ifdef FEATURE\na();\n#endif\n#ifndef FEATURE\nb();\n#endif\n";
        let tree = parse(source, &[]);
        assert_eq!(tree.lines()[2].kind(), &LineKind::Code);
        assert_eq!(tree.lines()[5].kind(), &LineKind::Disabled);
    }

    #[test]
    fn test_define_in_inactive_branch_is_ignored() {
        let source = "#if NEVER\n#define X\n#endif\n#if X\nx();\n#endif\n";
        let tree = parse(source, &[]);
        assert_eq!(tree.lines()[4].kind(), &LineKind::Disabled);
    }

    #[test]
    fn test_directive_with_trailing_comment() {
        let tree = parse("#if DEBUG // debug only\nx();\n#endif\n", &["DEBUG"]);
        assert_eq!(tree.lines()[1].kind(), &LineKind::Code);
    }

    #[test]
    fn test_symbols_rejects_foreign_options() {
        let options = ParseOptions::Other {
            kind: "script".to_string(),
        };
        let err = CFamilyLanguage
            .parse("x();\n", &options, &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, FormatError::UnsupportedConfiguration { .. }));

        let tree = CFamilyLanguage
            .parse("x();\n", &ParseOptions::Plain, &CancellationToken::new())
            .unwrap();
        assert_eq!(tree.line_count(), 1);
    }

    #[test]
    fn test_normalize_indentation_and_spacing() {
        let source = "class A {\nvoid F() {\nif(x){\ny( 1,2 );\n}\n}\n}\n";
        assert_eq!(
            format(source),
            "class A {\n\tvoid F() {\n\t\tif ( x ) {\n\t\t\ty( 1, 2 );\n\t\t}\n\t}\n}\n"
        );
    }

    #[test]
    fn test_normalize_with_spaces_and_compact_style() {
        let style = StyleOptions {
            use_tabs: false,
            indent_size: 2,
            space_within_parentheses: false,
            space_after_control_keyword: false,
            ..StyleOptions::default()
        };
        let source = "void F() {\nwhile ( ok ) {\nrun (a ,b);\n}\n}\n";
        assert_eq!(
            format_with(source, &style),
            "void F() {\n  while(ok) {\n    run(a, b);\n  }\n}\n"
        );
    }

    #[test]
    fn test_for_loop_semicolons() {
        assert_eq!(
            format("for(int i = 0;i < n;i++) {}\n"),
            "for ( int i = 0; i < n; i++ ) {}\n"
        );
    }

    #[test]
    fn test_verbatim_string_lines_kept_as_written() {
        let source = "class C {\nstring s = @\"line one\n    keep,  these   spaces\n}\";\nvoid M() {}\n}\n";
        assert_eq!(
            kinds(&parse(source, &[])),
            vec!["code", "code", "literal", "literal", "code", "code"]
        );
        assert_eq!(
            format(source),
            "class C {\n\tstring s = @\"line one\n    keep,  these   spaces\n}\";\n\tvoid M() {}\n}\n"
        );
    }

    #[test]
    fn test_raw_string_hides_directives_and_blank_lines() {
        let source = "void F() {\nauto q = R\"(  \n#if NEVER\n\n   {{  )\";\ng(1,2);\n}\n";
        let tree = parse(source, &[]);
        assert_eq!(
            kinds(&tree),
            vec!["code", "code", "literal", "literal", "literal", "code", "code"]
        );
        assert_eq!(
            format(source),
            "void F() {\n\tauto q = R\"(  \n#if NEVER\n\n   {{  )\";\n\tg( 1, 2 );\n}\n"
        );
    }

    #[test]
    fn test_byte_order_mark_before_first_directive() {
        let source = "\u{feff}#if DEBUG\nint  x;\n#endif\n";
        let tree = parse(source, &[]);
        assert_eq!(kinds(&tree), vec!["directive", "disabled", "directive"]);
        assert!(!tree.lines()[1].is_active());
        assert!(parse(source, &["DEBUG"]).lines()[1].is_active());
        assert_eq!(tree.to_text(), source);
        assert_eq!(format("\u{feff}int  x;\n"), "\u{feff}int x;\n");
    }

    #[test]
    fn test_literals_and_comments_preserved() {
        let source = "s = \"a,b  ( c )\";   // keep  this\n";
        assert_eq!(format(source), "s = \"a,b  ( c )\"; // keep  this\n");
    }

    #[test]
    fn test_block_comment_continuation_untouched() {
        let source = "/* header\n      keep   me\n*/\nint  x;\n";
        assert_eq!(format(source), "/* header\n      keep   me\n*/\nint x;\n");
    }

    #[test]
    fn test_directives_pinned_and_disabled_untouched() {
        let source = "void F() {\n    #  if DEBUG\n        log(  1 );\n    #endif\n}\n";
        assert_eq!(
            format(source),
            "void F() {\n#if DEBUG\n        log(  1 );\n#endif\n}\n"
        );
    }

    #[test]
    fn test_continuation_indent() {
        assert_eq!(format("call(a,\nb);\n"), "call( a,\n\tb );\n");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let source = "namespace N {\nclass C {\nint[] a = new int[ 3 ];\nvoid M(int x,int y) {\nfor(;;) { if(x>y) return ; }\n#if TRACE\nTrace( \"x\" );\n#endif\n}\n}\n}\n";
        let once = format(source);
        assert_eq!(format(&once), once);
    }

    #[test]
    fn test_normalize_preserves_line_count_and_shares_lines() {
        let tree = parse("int x;\n\n  int  y;\n", &[]);
        let normalized = CFamilyLanguage
            .normalize(
                &tree,
                &CFamilyLanguage.default_parse_options(),
                &StyleOptions::default(),
                &CancellationToken::new(),
            )
            .unwrap();
        assert_eq!(normalized.line_count(), tree.line_count());
        assert!(Arc::ptr_eq(&tree.lines()[0], &normalized.lines()[0]));
        assert_eq!(normalized.to_text(), "int x;\n\nint y;\n");
    }

    #[test]
    fn test_normalize_observes_cancellation() {
        let tree = parse("int x;\n", &[]);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = CFamilyLanguage
            .normalize(
                &tree,
                &CFamilyLanguage.default_parse_options(),
                &StyleOptions::default(),
                &cancel,
            )
            .unwrap_err();
        assert!(err.is_cancelled());
    }
}

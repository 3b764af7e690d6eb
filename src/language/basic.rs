//! Basic language service (Visual Basic style sources)
//!
//! Directives are `#If … Then`, `#ElseIf … Then`, `#Else`, `#End If`,
//! `#Const NAME = value` and `#Region`/`#End Region`, all case-insensitive.
//! Normalization indents blocks (`Select Case` takes two levels), collapses
//! whitespace and applies comma spacing. Strings and `'` comments are kept.

use std::sync::Arc;

use crate::error::{FormatError, Result};
use crate::options::StyleOptions;
use crate::parser::patterns::{
    BASIC_CONST_RE, BASIC_ELSE_RE, BASIC_END_RE, BASIC_IF_RE, BASIC_OTHER_RE, BASIC_REGION_RE,
};
use crate::parser::{
    evaluate, parse_conditional, scan_line, BasicParseOptions, ConditionSyntax, Dialect,
    Directive, DirectiveKind, Flavor, LineKind, ParseOptions, ScanState, SymbolTable, SyntaxLine,
    SyntaxTree, Token, TokenKind, CANCEL_CHECK_INTERVAL,
};
use crate::process::CancellationToken;

use super::{LanguageId, LanguageService};

/// Declaration modifiers skipped before the statement keyword
const MODIFIERS: &[&str] = &[
    "public",
    "private",
    "protected",
    "friend",
    "shared",
    "static",
    "overrides",
    "overridable",
    "notoverridable",
    "mustoverride",
    "mustinherit",
    "notinheritable",
    "partial",
    "shadows",
    "overloads",
    "readonly",
    "writeonly",
    "default",
    "async",
    "iterator",
    "widening",
    "narrowing",
    "custom",
];

/// Keywords that may follow `End` to close a block
const END_KINDS: &[&str] = &[
    "if",
    "sub",
    "function",
    "operator",
    "property",
    "get",
    "set",
    "class",
    "module",
    "structure",
    "interface",
    "enum",
    "namespace",
    "select",
    "try",
    "while",
    "with",
    "using",
    "synclock",
    "event",
    "addhandler",
    "removehandler",
    "raiseevent",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct BasicLanguage;

impl Dialect for BasicLanguage {
    fn classify_directive(&self, line: &str) -> Option<Directive> {
        if !line.starts_with('#') {
            return None;
        }
        if let Some(caps) = BASIC_IF_RE.captures(line) {
            let kind = if caps[1].eq_ignore_ascii_case("if") {
                DirectiveKind::If
            } else {
                DirectiveKind::Elif
            };
            return Some(Directive::new(kind, &caps[2]));
        }
        if BASIC_ELSE_RE.is_match(line) {
            return Some(Directive::new(DirectiveKind::Else, ""));
        }
        if let Some(caps) = BASIC_END_RE.captures(line) {
            let kind = if caps[1].eq_ignore_ascii_case("if") {
                DirectiveKind::EndIf
            } else {
                DirectiveKind::EndRegion
            };
            return Some(Directive::new(kind, ""));
        }
        if let Some(caps) = BASIC_CONST_RE.captures(line) {
            return Some(Directive::new(
                DirectiveKind::Define,
                format!("{} = {}", &caps[1], &caps[2]),
            ));
        }
        if let Some(caps) = BASIC_REGION_RE.captures(line) {
            return Some(Directive::new(DirectiveKind::Region, &caps[1]));
        }
        BASIC_OTHER_RE
            .is_match(line)
            .then(|| Directive::new(DirectiveKind::Other, line[1..].trim()))
    }

    fn condition_syntax(&self) -> ConditionSyntax {
        ConditionSyntax::Basic
    }

    /// `NAME = value`; numbers are true when non-zero
    fn definition(&self, argument: &str, symbols: &SymbolTable) -> Option<(String, bool)> {
        let (name, value) = argument.split_once('=')?;
        let value = value.trim();
        let value = match value.parse::<i64>() {
            Ok(number) => number != 0,
            Err(_) => evaluate(value, ConditionSyntax::Basic, symbols),
        };
        Some((name.trim().to_string(), value))
    }

    fn symbols(&self, options: &ParseOptions) -> Result<SymbolTable> {
        let mut table = SymbolTable::new(true);
        match options {
            ParseOptions::Basic(options) => {
                for (name, value) in options.symbols() {
                    table.define(name, value);
                }
            }
            ParseOptions::Plain => {}
            ParseOptions::CFamily(_) | ParseOptions::Other { .. } => {
                return Err(FormatError::UnsupportedConfiguration {
                    kind: options.kind_name().to_string(),
                });
            }
        }
        Ok(table)
    }
}

impl LanguageService for BasicLanguage {
    fn id(&self) -> LanguageId {
        LanguageId::BASIC
    }

    fn extensions(&self) -> &[&'static str] {
        &["vb", "bas"]
    }

    fn default_parse_options(&self) -> ParseOptions {
        ParseOptions::Basic(BasicParseOptions::default())
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
        let next_keywords = lookahead_keywords(tree);
        let mut blocks = BlockStack::default();
        let mut continued = false;
        let mut lines = Vec::with_capacity(tree.line_count());

        for (index, line) in tree.lines().iter().enumerate() {
            if index % CANCEL_CHECK_INTERVAL == 0 && cancel.is_cancelled() {
                return Err(FormatError::Cancelled);
            }
            let replacement = match line.kind() {
                LineKind::Disabled | LineKind::Literal => None,
                LineKind::Blank => (!line.leading().is_empty() || !line.body().is_empty())
                    .then(|| SyntaxLine::new(LineKind::Blank, "", "")),
                LineKind::Directive(_) => {
                    let tokens = scan_line(line.body(), Flavor::Basic, &mut ScanState::default());
                    rebuild(line, String::new(), &tokens, style)
                }
                LineKind::Code => {
                    let tokens = scan_line(line.body(), Flavor::Basic, &mut ScanState::default());
                    let statement = Statement::classify(&tokens);
                    let level = if continued {
                        blocks.depth() + 1
                    } else {
                        blocks.apply(&statement, next_keywords[index].as_deref())
                    };
                    continued = statement.continues;
                    rebuild(line, style.indent(level), &tokens, style)
                }
            };
            lines.push(replacement.map_or_else(|| Arc::clone(line), Arc::new));
        }

        Ok(tree.with_lines(lines))
    }
}

fn rebuild(
    line: &SyntaxLine,
    leading: String,
    tokens: &[Token<'_>],
    style: &StyleOptions,
) -> Option<SyntaxLine> {
    let mut body = render(tokens, style);
    if style.trim_trailing_whitespace {
        body.truncate(body.trim_end().len());
    }
    (leading != line.leading() || body != line.body())
        .then(|| SyntaxLine::new(line.kind().clone(), leading, body))
}

fn render(tokens: &[Token<'_>], style: &StyleOptions) -> String {
    let mut out = String::new();
    let mut prev: Option<&Token<'_>> = None;
    for token in tokens {
        if let Some(prev) = prev {
            let gap = if prev.is_comment() || token.is_comment() {
                true
            } else if token.is_punct(',') {
                false
            } else if prev.is_punct(',') {
                style.space_after_comma
            } else {
                token.space_before
            };
            if gap {
                out.push(' ');
            }
        }
        out.push_str(token.text);
        prev = Some(token);
    }
    out
}

/// First statement keyword (after modifiers) of the next code line, per line
fn lookahead_keywords(tree: &SyntaxTree) -> Vec<Option<String>> {
    let mut result = vec![None; tree.line_count()];
    let mut next: Option<String> = None;
    for (index, line) in tree.lines().iter().enumerate().rev() {
        result[index] = next.clone();
        if matches!(line.kind(), LineKind::Code) {
            next = line
                .body()
                .split(|c: char| !(c.is_alphanumeric() || c == '_'))
                .filter(|word| !word.is_empty())
                .map(str::to_ascii_lowercase)
                .find(|word| !MODIFIERS.contains(&word.as_str()));
        }
    }
    result
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Select,
    Interface,
    Property,
    Event,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Shape {
    /// Ordinary statement at the current depth
    Plain,
    /// Opens a block unless the enclosing block rules it out
    Open(String),
    /// `End X`, `Next`, `Loop`, `Wend`
    Close,
    /// `Else`, `ElseIf`, `Case`, `Catch`, `Finally`
    Middle,
}

#[derive(Debug)]
struct Statement {
    shape: Shape,
    /// Declared with `MustOverride`
    abstract_member: bool,
    /// `Custom Event`
    custom: bool,
    /// Ends with the ` _` line-continuation marker
    continues: bool,
}

impl Statement {
    fn classify(tokens: &[Token<'_>]) -> Self {
        let code: Vec<&Token<'_>> = tokens.iter().take_while(|t| !t.is_comment()).collect();
        let words: Vec<String> = code
            .iter()
            .filter(|t| t.kind == TokenKind::Word)
            .map(|t| t.text.to_ascii_lowercase())
            .collect();
        let modifiers = words
            .iter()
            .take_while(|w| MODIFIERS.contains(&w.as_str()))
            .count();
        let abstract_member = words[..modifiers].iter().any(|w| w == "mustoverride");
        let custom = words[..modifiers].iter().any(|w| w == "custom");
        let last_word = code
            .last()
            .filter(|t| t.kind == TokenKind::Word)
            .map(|t| t.text.to_ascii_lowercase());
        let continues = last_word.as_deref() == Some("_");

        // Statements must start with a word; labels and attributes stay plain
        let starts_with_word = code.first().is_some_and(|t| t.kind == TokenKind::Word);
        let keyword = if starts_with_word {
            words.get(modifiers).map(String::as_str)
        } else {
            None
        };
        let second = words.get(modifiers + 1).map(String::as_str);

        let shape = match keyword {
            Some("end") if second.is_some_and(|w| END_KINDS.contains(&w)) => Shape::Close,
            Some("next" | "loop" | "wend") => Shape::Close,
            Some("else" | "elseif" | "case" | "catch" | "finally") => Shape::Middle,
            Some("if") if last_word.as_deref() == Some("then") => Shape::Open("if".into()),
            Some(
                word @ ("for" | "do" | "while" | "with" | "try" | "using" | "synclock"
                | "namespace" | "class" | "module" | "structure" | "interface" | "enum"
                | "select" | "sub" | "function" | "operator" | "property" | "get" | "set"
                | "event" | "addhandler" | "removehandler" | "raiseevent"),
            ) => Shape::Open(word.to_string()),
            _ => Shape::Plain,
        };

        Self {
            shape,
            abstract_member,
            custom,
            continues,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Block {
    kind: BlockKind,
    width: usize,
}

#[derive(Debug, Default)]
struct BlockStack {
    blocks: Vec<Block>,
}

impl BlockStack {
    fn depth(&self) -> usize {
        self.blocks.iter().map(|block| block.width).sum()
    }

    fn top(&self) -> Option<BlockKind> {
        self.blocks.last().map(|block| block.kind)
    }

    /// Update the stack for `statement`, returning its indentation level
    fn apply(&mut self, statement: &Statement, next_keyword: Option<&str>) -> usize {
        match &statement.shape {
            Shape::Plain => self.depth(),
            Shape::Close => {
                self.blocks.pop();
                self.depth()
            }
            Shape::Middle => self.depth().saturating_sub(1),
            Shape::Open(keyword) => {
                let level = self.depth();
                if let Some(kind) = self.opened_block(keyword, statement, next_keyword) {
                    let width = if kind == BlockKind::Select { 2 } else { 1 };
                    self.blocks.push(Block { kind, width });
                }
                level
            }
        }
    }

    fn opened_block(
        &self,
        keyword: &str,
        statement: &Statement,
        next_keyword: Option<&str>,
    ) -> Option<BlockKind> {
        let in_interface = self.top() == Some(BlockKind::Interface);
        match keyword {
            "select" => Some(BlockKind::Select),
            "interface" => Some(BlockKind::Interface),
            "sub" | "function" | "operator" => {
                (!in_interface && !statement.abstract_member).then_some(BlockKind::Other)
            }
            "property" => (!in_interface
                && !statement.abstract_member
                && matches!(next_keyword, Some("get" | "set")))
            .then_some(BlockKind::Property),
            "get" | "set" => (self.top() == Some(BlockKind::Property)).then_some(BlockKind::Other),
            "event" => (statement.custom && !in_interface).then_some(BlockKind::Event),
            "addhandler" | "removehandler" | "raiseevent" => {
                (self.top() == Some(BlockKind::Event)).then_some(BlockKind::Other)
            }
            _ => Some(BlockKind::Other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str, symbols: &[(&str, bool)]) -> SyntaxTree {
        let options = ParseOptions::Basic(BasicParseOptions::new(symbols.iter().copied()));
        BasicLanguage
            .parse(source, &options, &CancellationToken::new())
            .unwrap()
    }

    fn format(source: &str) -> String {
        let tree = parse(source, &[]);
        BasicLanguage
            .normalize(
                &tree,
                &BasicLanguage.default_parse_options(),
                &StyleOptions::default(),
                &CancellationToken::new(),
            )
            .unwrap()
            .to_text()
    }

    #[test]
    fn test_directives_case_insensitive() {
        let source = "#if debug then\nA()\n#ElseIf TRACE Then\nB()\n#else\nC()\n#End If\n";
        let tree = parse(source, &[("DEBUG", true)]);
        assert_eq!(tree.lines()[1].kind(), &LineKind::Code);
        assert_eq!(tree.lines()[3].kind(), &LineKind::Disabled);
        assert_eq!(tree.lines()[5].kind(), &LineKind::Disabled);

        let tree = parse(source, &[("trace", true)]);
        assert_eq!(tree.lines()[1].kind(), &LineKind::Disabled);
        assert_eq!(tree.lines()[3].kind(), &LineKind::Code);
    }

    #[test]
    fn test_const_definitions() {
        let source = "#Const LOGGING = True\n#Const LEVEL = 0\n#If LOGGING And Not LEVEL Then\nLog()\n#End If\n";
        let tree = parse(source, &[]);
        assert_eq!(tree.lines()[3].kind(), &LineKind::Code);
    }

    #[test]
    fn test_false_constant_from_options() {
        let tree = parse("#If X Then\nA()\n#End If\n", &[("X", false)]);
        assert_eq!(tree.lines()[1].kind(), &LineKind::Disabled);
    }

    #[test]
    fn test_block_indentation() {
        let source = "Module M\nSub Main()\nDim a = F(1,2)\nIf a > 1 Then\nPrint(a)\nElse\nPrint(0)\nEnd If\nSelect Case a\nCase 1\nx = 1\nCase Else\nx = 2\nEnd Select\nEnd Sub\nEnd Module\n";
        let expected = "Module M\n\tSub Main()\n\t\tDim a = F(1, 2)\n\t\tIf a > 1 Then\n\t\t\tPrint(a)\n\t\tElse\n\t\t\tPrint(0)\n\t\tEnd If\n\t\tSelect Case a\n\t\t\tCase 1\n\t\t\t\tx = 1\n\t\t\tCase Else\n\t\t\t\tx = 2\n\t\tEnd Select\n\tEnd Sub\nEnd Module\n";
        assert_eq!(format(source), expected);
    }

    #[test]
    fn test_single_line_if_does_not_open() {
        assert_eq!(
            format("Sub S()\nIf a Then b = 1\nc = 2\nEnd Sub\n"),
            "Sub S()\n\tIf a Then b = 1\n\tc = 2\nEnd Sub\n"
        );
    }

    #[test]
    fn test_properties_and_auto_properties() {
        let source = "Class C\nPublic Property Name As String\nPublic Property Age As Integer\nGet\nReturn 1\nEnd Get\nSet(value As Integer)\nEnd Set\nEnd Property\nEnd Class\n";
        let expected = "Class C\n\tPublic Property Name As String\n\tPublic Property Age As Integer\n\t\tGet\n\t\t\tReturn 1\n\t\tEnd Get\n\t\tSet(value As Integer)\n\t\tEnd Set\n\tEnd Property\nEnd Class\n";
        assert_eq!(format(source), expected);
    }

    #[test]
    fn test_interface_and_abstract_members() {
        let source = "Interface I\nSub Run()\nFunction Calc() As Integer\nEnd Interface\nMustInherit Class Base\nPublic MustOverride Sub Run()\nPublic Sub Halt()\nEnd Sub\nEnd Class\n";
        let expected = "Interface I\n\tSub Run()\n\tFunction Calc() As Integer\nEnd Interface\nMustInherit Class Base\n\tPublic MustOverride Sub Run()\n\tPublic Sub Halt()\n\tEnd Sub\nEnd Class\n";
        assert_eq!(format(source), expected);
    }

    #[test]
    fn test_strings_comments_and_continuation() {
        let source = "Sub S()\nx  =  Foo(\"a,  b\" ,2, _\n3)   ' note  here\nEnd Sub\n";
        assert_eq!(
            format(source),
            "Sub S()\n\tx = Foo(\"a,  b\", 2, _\n\t\t3) ' note  here\nEnd Sub\n"
        );
    }

    #[test]
    fn test_directives_pinned_and_disabled_untouched() {
        let source = "Sub S()\n    #If   DEBUG Then\n        Log(  1 )\n    #End If\nEnd Sub\n";
        assert_eq!(
            format(source),
            "Sub S()\n#If DEBUG Then\n        Log(  1 )\n#End If\nEnd Sub\n"
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let source = "Namespace N\nPublic Class C\nPrivate Sub M(a As Integer,b As Integer)\nFor i = 1 To 3\nTry\nDo While a < 1\na += 1\nLoop\nCatch ex As Exception\nFinally\nEnd Try\nNext\nEnd Sub\nEnd Class\nEnd Namespace\n";
        let once = format(source);
        assert_eq!(format(&once), once);
        assert!(once.contains("\n\t\t\t\t\tDo While a < 1\n"));
    }
}

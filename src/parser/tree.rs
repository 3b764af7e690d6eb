//! Persistent line-based syntax tree
//!
//! A [`SyntaxTree`] is an immutable, `Arc`-shared sequence of [`SyntaxLine`]s.
//! Transformations never mutate a tree: they build a new one, reusing the
//! `Arc` of every line they leave alone, so the previous tree stays valid.

use std::fmt;
use std::sync::Arc;

/// Preprocessor directive recognized by a language dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    If,
    Elif,
    Else,
    EndIf,
    Define,
    Undef,
    Region,
    EndRegion,
    /// Any other directive (`#pragma`, `#include`, `#error`, ...)
    Other,
}

impl DirectiveKind {
    /// Whether this directive affects which branches are active
    #[must_use]
    pub fn is_conditional(self) -> bool {
        matches!(
            self,
            DirectiveKind::If | DirectiveKind::Elif | DirectiveKind::Else | DirectiveKind::EndIf
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub kind: DirectiveKind,
    /// Text after the directive keyword (condition, symbol name, region label)
    pub argument: String,
}

impl Directive {
    #[must_use]
    pub fn new(kind: DirectiveKind, argument: impl Into<String>) -> Self {
        Self {
            kind,
            argument: argument.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// Empty or whitespace-only line in an active region
    Blank,
    /// Source code (or a comment) in an active region
    Code,
    Directive(Directive),
    /// Text inside an inactive conditional branch; never reformatted
    Disabled,
    /// Line that begins inside a multi-line string literal; never reformatted
    Literal,
}

/// One physical source line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxLine {
    kind: LineKind,
    /// Leading whitespace
    leading: String,
    /// Everything after the leading whitespace, without the line terminator
    body: String,
}

impl SyntaxLine {
    #[must_use]
    pub fn new(kind: LineKind, leading: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            kind,
            leading: leading.into(),
            body: body.into(),
        }
    }

    /// Split a raw line into leading whitespace and body
    #[must_use]
    pub fn from_raw(kind: LineKind, raw: &str) -> Self {
        let body = raw.trim_start_matches([' ', '\t']);
        let leading = &raw[..raw.len() - body.len()];
        Self::new(kind, leading, body)
    }

    #[must_use]
    pub fn kind(&self) -> &LineKind {
        &self.kind
    }

    #[must_use]
    pub fn leading(&self) -> &str {
        &self.leading
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Lines outside an inactive conditional branch
    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self.kind, LineKind::Disabled)
    }

    #[must_use]
    pub fn directive(&self) -> Option<&Directive> {
        match &self.kind {
            LineKind::Directive(directive) => Some(directive),
            _ => None,
        }
    }

    #[must_use]
    pub fn with_leading(&self, leading: impl Into<String>) -> Self {
        Self::new(self.kind.clone(), leading, self.body.clone())
    }

    #[must_use]
    pub fn with_body(&self, body: impl Into<String>) -> Self {
        Self::new(self.kind.clone(), self.leading.clone(), body)
    }

    fn write_to(&self, out: &mut String) {
        out.push_str(&self.leading);
        out.push_str(&self.body);
    }
}

impl fmt::Display for SyntaxLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.leading, self.body)
    }
}

/// Line terminator style of a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }

    /// Detect from the first line break in `source` (LF when there is none)
    #[must_use]
    pub fn detect(source: &str) -> Self {
        match source.find('\n') {
            Some(pos) if pos > 0 && source.as_bytes()[pos - 1] == b'\r' => LineEnding::CrLf,
            _ => LineEnding::Lf,
        }
    }
}

/// UTF-8 byte order mark
const BOM: char = '\u{feff}';

/// Source text split into physical lines
#[derive(Debug)]
pub struct SourceLines<'a> {
    pub lines: Vec<&'a str>,
    pub final_newline: bool,
    pub line_ending: LineEnding,
    /// The source started with a byte order mark, which is not part of `lines`
    pub bom: bool,
}

impl<'a> SourceLines<'a> {
    #[must_use]
    pub fn split(source: &'a str) -> Self {
        let bom = source.starts_with(BOM);
        let source = source.strip_prefix(BOM).unwrap_or(source);
        let line_ending = LineEnding::detect(source);
        if source.is_empty() {
            return Self {
                lines: Vec::new(),
                final_newline: false,
                line_ending,
                bom,
            };
        }

        let final_newline = source.ends_with('\n');
        let content = source.strip_suffix('\n').unwrap_or(source);
        let lines = content
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .collect();

        Self {
            lines,
            final_newline,
            line_ending,
            bom,
        }
    }
}

/// Immutable syntax tree snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxTree {
    lines: Arc<[Arc<SyntaxLine>]>,
    final_newline: bool,
    line_ending: LineEnding,
    bom: bool,
}

impl SyntaxTree {
    #[must_use]
    pub fn new(lines: Vec<Arc<SyntaxLine>>, final_newline: bool, line_ending: LineEnding) -> Self {
        Self {
            lines: lines.into(),
            final_newline,
            line_ending,
            bom: false,
        }
    }

    /// Mark whether [`to_text`](Self::to_text) starts with a byte order mark
    #[must_use]
    pub fn with_bom(mut self, bom: bool) -> Self {
        self.bom = bom;
        self
    }

    #[must_use]
    pub fn from_lines(lines: Vec<SyntaxLine>, final_newline: bool, line_ending: LineEnding) -> Self {
        Self::new(
            lines.into_iter().map(Arc::new).collect(),
            final_newline,
            line_ending,
        )
    }

    #[must_use]
    pub fn lines(&self) -> &[Arc<SyntaxLine>] {
        &self.lines
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn final_newline(&self) -> bool {
        self.final_newline
    }

    #[must_use]
    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    #[must_use]
    pub fn has_bom(&self) -> bool {
        self.bom
    }

    /// Build a sibling tree with the same terminator and BOM settings
    #[must_use]
    pub fn with_lines(&self, lines: Vec<Arc<SyntaxLine>>) -> Self {
        Self::new(lines, self.final_newline, self.line_ending).with_bom(self.bom)
    }

    /// Rebuild the tree, replacing lines for which `f` returns `Some`.
    ///
    /// Lines mapped to `None` are shared with `self`.
    #[must_use]
    pub fn map_lines<F>(&self, mut f: F) -> Self
    where
        F: FnMut(&SyntaxLine) -> Option<SyntaxLine>,
    {
        let lines = self
            .lines
            .iter()
            .map(|line| f(line).map_or_else(|| Arc::clone(line), Arc::new))
            .collect();
        self.with_lines(lines)
    }

    /// Whether two trees share the same line storage
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.lines, &other.lines)
    }

    /// Render the tree back to source text
    #[must_use]
    pub fn to_text(&self) -> String {
        let newline = self.line_ending.as_str();
        let capacity: usize = self
            .lines
            .iter()
            .map(|line| line.leading.len() + line.body.len() + newline.len())
            .sum();
        let mut out = String::with_capacity(capacity + BOM.len_utf8());
        if self.bom {
            out.push(BOM);
        }
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                out.push_str(newline);
            }
            line.write_to(&mut out);
        }
        if self.final_newline && !self.lines.is_empty() {
            out.push_str(newline);
        }
        out
    }
}

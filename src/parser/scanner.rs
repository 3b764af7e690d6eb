//! Line scanner producing spacing-aware tokens
//!
//! Splits one line of code into words, punctuation, literals and comments,
//! remembering whether whitespace preceded each token. String and comment
//! contents are kept verbatim. Block comments, verbatim strings and raw
//! strings carry over to the next line through [`ScanState`].

/// Lexical flavor of the language being scanned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    /// `//` and `/* */` comments, `"..."`/`'x'`/`@"..."` literals
    CFamily,
    /// `'` and `REM` comments, `"..."` literals with `""` escapes
    Basic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier, keyword or number
    Word,
    /// Single punctuation or operator character
    Punct(char),
    /// String or character literal
    Literal,
    /// Comment running to the end of the line
    LineComment,
    /// `/* ... */` comment, possibly unterminated on this line
    BlockComment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    /// Whitespace separated this token from the previous one
    pub space_before: bool,
}

impl Token<'_> {
    #[must_use]
    pub fn is_punct(&self, c: char) -> bool {
        self.kind == TokenKind::Punct(c)
    }

    #[must_use]
    pub fn is_comment(&self) -> bool {
        matches!(self.kind, TokenKind::LineComment | TokenKind::BlockComment)
    }
}

/// A string literal left open at the end of a line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenLiteral {
    /// `@"..."`, closed by a lone `"`
    Verbatim,
    /// C++ `R"delim(...)delim"`
    Raw { delimiter: String },
    /// C# `"""..."""` or a Java text block, closed by `quotes` quotes
    Quoted { quotes: usize },
}

impl OpenLiteral {
    /// Byte length of `text` up to and including the closing delimiter
    fn close(&self, text: &str) -> Option<usize> {
        match self {
            Self::Verbatim => verbatim_end(text),
            Self::Raw { delimiter } => {
                let end = format!("){delimiter}\"");
                text.find(&end).map(|i| i + end.len())
            }
            Self::Quoted { quotes } => {
                let end = "\"".repeat(*quotes);
                text.find(&end).map(|i| i + end.len())
            }
        }
    }
}

/// State carried between lines
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanState {
    pub in_block_comment: bool,
    pub literal: Option<OpenLiteral>,
}

impl ScanState {
    /// The previous line ended inside a string literal
    #[must_use]
    pub fn in_literal(&self) -> bool {
        self.literal.is_some()
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Scan `line` into tokens, updating `state`
pub fn scan_line<'a>(line: &'a str, flavor: Flavor, state: &mut ScanState) -> Vec<Token<'a>> {
    let mut tokens = Vec::new();
    let mut pos = 0;
    let mut space_before = false;

    if let Some(literal) = &state.literal {
        let end = literal.close(line);
        if end.is_some() {
            state.literal = None;
        }
        let end = end.unwrap_or(line.len());
        tokens.push(Token {
            kind: TokenKind::Literal,
            text: &line[..end],
            space_before: false,
        });
        pos = end;
    } else if state.in_block_comment {
        let end = line.find("*/").map_or(line.len(), |i| i + 2);
        state.in_block_comment = end == line.len() && !line.ends_with("*/");
        tokens.push(Token {
            kind: TokenKind::BlockComment,
            text: &line[..end],
            space_before: false,
        });
        pos = end;
    }

    while pos < line.len() {
        let rest = &line[pos..];
        let Some(c) = rest.chars().next() else {
            break;
        };

        if c.is_whitespace() {
            space_before = true;
            pos += c.len_utf8();
            continue;
        }

        let (kind, len) = match flavor {
            Flavor::CFamily => scan_c_family(rest, c, state),
            Flavor::Basic => scan_basic(rest, c, tokens.last()),
        };
        tokens.push(Token {
            kind,
            text: &rest[..len],
            space_before,
        });
        space_before = false;
        pos += len;
    }

    tokens
}

fn word_len(rest: &str) -> usize {
    rest.char_indices()
        .find(|&(_, c)| !is_word_char(c))
        .map_or(rest.len(), |(i, _)| i)
}

/// Length of a quoted literal starting at `rest[0]`; backslash escapes when `escapes`
fn quoted_len(rest: &str, quote: char, escapes: bool, doubled: bool) -> usize {
    let mut chars = rest.char_indices().skip(1).peekable();
    while let Some((i, c)) = chars.next() {
        if escapes && c == '\\' {
            chars.next();
            continue;
        }
        if c == quote {
            if doubled && chars.peek().is_some_and(|&(_, next)| next == quote) {
                chars.next();
                continue;
            }
            return i + c.len_utf8();
        }
    }
    // Unterminated literal runs to the end of the line
    rest.len()
}

/// End of a verbatim string body (after the opening quote); `""` is an escape
fn verbatim_end(text: &str) -> Option<usize> {
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c == '"' {
            if chars.peek().is_some_and(|&(_, next)| next == '"') {
                chars.next();
                continue;
            }
            return Some(i + 1);
        }
    }
    None
}

/// Emit a literal that either closes within `rest` at `end` or stays open
fn literal_or_open(
    rest: &str,
    body: usize,
    end: Option<usize>,
    open: OpenLiteral,
    state: &mut ScanState,
) -> (TokenKind, usize) {
    match end {
        Some(len) => (TokenKind::Literal, body + len),
        None => {
            state.literal = Some(open);
            (TokenKind::Literal, rest.len())
        }
    }
}

/// Prefixes that turn `"` into a C++ raw string
const RAW_PREFIXES: &[&str] = &["R", "u8R", "uR", "UR", "LR"];

/// Delimiter of a C++ raw string opening at `rest`, with the offset of its body
fn raw_string_start(rest: &str) -> Option<(&str, usize)> {
    let prefix = RAW_PREFIXES
        .iter()
        .find(|p| rest.strip_prefix(**p).is_some_and(|r| r.starts_with('"')))?;
    let open = prefix.len() + 1;
    let paren = rest[open..].find('(')?;
    let delimiter = &rest[open..open + paren];
    let valid = delimiter.len() <= 16
        && !delimiter.contains(|c: char| c.is_whitespace() || matches!(c, ')' | '\\' | '"'));
    valid.then_some((delimiter, open + paren + 1))
}

fn scan_c_family(rest: &str, c: char, state: &mut ScanState) -> (TokenKind, usize) {
    if rest.starts_with("//") {
        return (TokenKind::LineComment, rest.len());
    }
    if rest.starts_with("/*") {
        return match rest[2..].find("*/") {
            Some(i) => (TokenKind::BlockComment, i + 4),
            None => {
                state.in_block_comment = true;
                (TokenKind::BlockComment, rest.len())
            }
        };
    }
    if rest.starts_with("@\"") || rest.starts_with("$@\"") || rest.starts_with("@$\"") {
        let body = rest.find('"').map_or(rest.len(), |i| i + 1);
        let end = verbatim_end(&rest[body..]);
        return literal_or_open(rest, body, end, OpenLiteral::Verbatim, state);
    }
    if let Some((delimiter, body)) = raw_string_start(rest) {
        let open = OpenLiteral::Raw {
            delimiter: delimiter.to_string(),
        };
        let end = open.close(&rest[body..]);
        return literal_or_open(rest, body, end, open, state);
    }
    let dollars = rest.len() - rest.trim_start_matches('$').len();
    let quotes = rest[dollars..].len() - rest[dollars..].trim_start_matches('"').len();
    if quotes >= 3 {
        let open = OpenLiteral::Quoted { quotes };
        let body = dollars + quotes;
        let end = open.close(&rest[body..]);
        return literal_or_open(rest, body, end, open, state);
    }
    if rest.starts_with("$\"") {
        return (TokenKind::Literal, 1 + quoted_len(&rest[1..], '"', true, false));
    }
    if c == '"' || c == '\'' {
        return (TokenKind::Literal, quoted_len(rest, c, true, false));
    }
    if is_word_char(c) {
        return (TokenKind::Word, word_len(rest));
    }
    (TokenKind::Punct(c), c.len_utf8())
}

fn scan_basic(rest: &str, c: char, previous: Option<&Token<'_>>) -> (TokenKind, usize) {
    if c == '\'' {
        return (TokenKind::LineComment, rest.len());
    }
    if c == '"' {
        return (TokenKind::Literal, quoted_len(rest, '"', false, true));
    }
    if is_word_char(c) {
        let len = word_len(rest);
        // `REM` starts a comment when it is a statement keyword
        let statement_start = previous.map_or(true, |token| token.is_punct(':'));
        if statement_start && rest[..len].eq_ignore_ascii_case("rem") {
            return (TokenKind::LineComment, rest.len());
        }
        return (TokenKind::Word, len);
    }
    (TokenKind::Punct(c), c.len_utf8())
}

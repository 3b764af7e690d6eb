//! Conditional-compilation state: symbol tables, condition evaluation and
//! the `#if`/`#elif`/`#else`/`#endif` branch stack.

use std::collections::HashMap;

/// Surface syntax of conditions for a dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionSyntax {
    /// `!`, `&&`, `||`, `==`, `!=`, `defined(X)`; case-sensitive
    CFamily,
    /// `Not`, `And`, `AndAlso`, `Or`, `OrElse`, `=`, `<>`; case-insensitive
    Basic,
}

/// Currently defined symbols and their boolean values
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    values: HashMap<String, bool>,
    case_insensitive: bool,
}

impl SymbolTable {
    #[must_use]
    pub fn new(case_insensitive: bool) -> Self {
        Self {
            values: HashMap::new(),
            case_insensitive,
        }
    }

    fn key(&self, name: &str) -> String {
        if self.case_insensitive {
            name.to_ascii_lowercase()
        } else {
            name.to_string()
        }
    }

    pub fn define(&mut self, name: &str, value: bool) {
        let key = self.key(name);
        self.values.insert(key, value);
    }

    pub fn undefine(&mut self, name: &str) {
        let key = self.key(name);
        self.values.remove(&key);
    }

    /// Undefined symbols evaluate to false
    #[must_use]
    pub fn lookup(&self, name: &str) -> bool {
        self.values.get(&self.key(name)).copied().unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum CondToken {
    Ident(String),
    Bool(bool),
    Not,
    And,
    Or,
    Eq,
    Ne,
    LParen,
    RParen,
}

fn tokenize(expr: &str, syntax: ConditionSyntax) -> Option<Vec<CondToken>> {
    let mut tokens = Vec::new();
    let mut chars = expr.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c.is_alphanumeric() || c == '_' {
            let mut end = start;
            while let Some(&(i, c)) = chars.peek() {
                if c.is_alphanumeric() || c == '_' {
                    end = i + c.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(word_token(&expr[start..end], syntax));
            continue;
        }

        chars.next();
        let next = chars.peek().map(|&(_, c)| c);
        let token = match (syntax, c, next) {
            (ConditionSyntax::CFamily, '!', Some('=')) => {
                chars.next();
                CondToken::Ne
            }
            (ConditionSyntax::CFamily, '!', _) => CondToken::Not,
            (ConditionSyntax::CFamily, '&', Some('&')) => {
                chars.next();
                CondToken::And
            }
            (ConditionSyntax::CFamily, '|', Some('|')) => {
                chars.next();
                CondToken::Or
            }
            (ConditionSyntax::CFamily, '=', Some('=')) => {
                chars.next();
                CondToken::Eq
            }
            (ConditionSyntax::Basic, '=', _) => CondToken::Eq,
            (ConditionSyntax::Basic, '<', Some('>')) => {
                chars.next();
                CondToken::Ne
            }
            (_, '(', _) => CondToken::LParen,
            (_, ')', _) => CondToken::RParen,
            _ => return None,
        };
        tokens.push(token);
    }

    Some(tokens)
}

fn word_token(word: &str, syntax: ConditionSyntax) -> CondToken {
    match syntax {
        ConditionSyntax::CFamily => match word {
            "true" => CondToken::Bool(true),
            "false" => CondToken::Bool(false),
            _ => CondToken::Ident(word.to_string()),
        },
        ConditionSyntax::Basic => match word.to_ascii_lowercase().as_str() {
            "true" => CondToken::Bool(true),
            "false" => CondToken::Bool(false),
            "not" => CondToken::Not,
            "and" | "andalso" => CondToken::And,
            "or" | "orelse" => CondToken::Or,
            _ => CondToken::Ident(word.to_string()),
        },
    }
}

/// Recursive-descent evaluator over condition tokens
struct Evaluator<'a> {
    tokens: &'a [CondToken],
    pos: usize,
    symbols: &'a SymbolTable,
}

impl Evaluator<'_> {
    fn peek(&self) -> Option<&CondToken> {
        self.tokens.get(self.pos)
    }

    fn eat(&mut self, token: &CondToken) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn or_expr(&mut self) -> Option<bool> {
        let mut value = self.and_expr()?;
        while self.eat(&CondToken::Or) {
            let rhs = self.and_expr()?;
            value = value || rhs;
        }
        Some(value)
    }

    fn and_expr(&mut self) -> Option<bool> {
        let mut value = self.eq_expr()?;
        while self.eat(&CondToken::And) {
            let rhs = self.eq_expr()?;
            value = value && rhs;
        }
        Some(value)
    }

    fn eq_expr(&mut self) -> Option<bool> {
        let lhs = self.unary()?;
        if self.eat(&CondToken::Eq) {
            return Some(lhs == self.unary()?);
        }
        if self.eat(&CondToken::Ne) {
            return Some(lhs != self.unary()?);
        }
        Some(lhs)
    }

    fn unary(&mut self) -> Option<bool> {
        if self.eat(&CondToken::Not) {
            return Some(!self.unary()?);
        }
        self.primary()
    }

    fn primary(&mut self) -> Option<bool> {
        let token = self.peek()?.clone();
        self.pos += 1;
        match token {
            CondToken::Bool(value) => Some(value),
            CondToken::Ident(name) if name == "defined" => {
                // `defined(X)` or `defined X`
                let parenthesized = self.eat(&CondToken::LParen);
                let CondToken::Ident(symbol) = self.peek()?.clone() else {
                    return None;
                };
                self.pos += 1;
                if parenthesized && !self.eat(&CondToken::RParen) {
                    return None;
                }
                Some(self.symbols.lookup(&symbol))
            }
            CondToken::Ident(name) => Some(self.symbols.lookup(&name)),
            CondToken::LParen => {
                let value = self.or_expr()?;
                self.eat(&CondToken::RParen).then_some(value)
            }
            _ => None,
        }
    }
}

/// Evaluate a directive condition; malformed conditions are false
#[must_use]
pub fn evaluate(expr: &str, syntax: ConditionSyntax, symbols: &SymbolTable) -> bool {
    let Some(tokens) = tokenize(expr, syntax) else {
        return false;
    };
    let mut evaluator = Evaluator {
        tokens: &tokens,
        pos: 0,
        symbols,
    };
    match evaluator.or_expr() {
        Some(value) if evaluator.pos == tokens.len() => value,
        _ => false,
    }
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    parent_active: bool,
    /// A branch of this group has already been taken
    taken: bool,
    active: bool,
}

/// Tracks which conditional branch is active
#[derive(Debug, Default)]
pub struct ConditionalStack {
    frames: Vec<Frame>,
}

impl ConditionalStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.frames.last().map_or(true, |frame| frame.active)
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Open a group; `condition` is only evaluated when the parent is active
    pub fn enter_if(&mut self, condition: impl FnOnce() -> bool) {
        let parent_active = self.is_active();
        let active = parent_active && condition();
        self.frames.push(Frame {
            parent_active,
            taken: active,
            active,
        });
    }

    pub fn enter_elif(&mut self, condition: impl FnOnce() -> bool) {
        let Some(frame) = self.frames.last_mut() else {
            return;
        };
        if frame.taken || !frame.parent_active {
            frame.active = false;
        } else {
            frame.active = condition();
            frame.taken = frame.active;
        }
    }

    pub fn enter_else(&mut self) {
        if let Some(frame) = self.frames.last_mut() {
            frame.active = frame.parent_active && !frame.taken;
            frame.taken = true;
        }
    }

    /// Close a group; an unbalanced `#endif` is ignored
    pub fn exit(&mut self) {
        self.frames.pop();
    }
}

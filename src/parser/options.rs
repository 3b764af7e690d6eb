//! Parse options and preprocessor symbol augmentation
//!
//! [`ParseOptions`] is a closed set of option kinds. Callers match on it
//! exhaustively; a kind that cannot carry conditional-compilation symbols is
//! `Plain`, and a kind the engine does not know how to extend is `Other`.

use std::collections::BTreeSet;
use std::fmt;

use crate::error::{FormatError, Result};

/// Options for the C-family grammar (case-sensitive symbols)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CFamilyParseOptions {
    symbols: BTreeSet<String>,
}

impl CFamilyParseOptions {
    #[must_use]
    pub fn new<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            symbols: symbols.into_iter().map(Into::into).collect(),
        }
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.symbols.iter().map(String::as_str)
    }

    /// Replace the symbol set
    #[must_use]
    pub fn with_preprocessor_symbols(&self, symbols: &[String]) -> Self {
        Self::new(symbols.iter().cloned())
    }
}

/// Options for the Basic grammar (case-insensitive `name = value` constants)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BasicParseOptions {
    symbols: Vec<(String, bool)>,
}

impl BasicParseOptions {
    #[must_use]
    pub fn new<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = (S, bool)>,
        S: Into<String>,
    {
        Self {
            symbols: symbols
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        }
    }

    pub fn symbols(&self) -> impl Iterator<Item = (&str, bool)> {
        self.symbols.iter().map(|(name, value)| (name.as_str(), *value))
    }

    /// Replace the constants; every name becomes `True`
    #[must_use]
    pub fn with_preprocessor_symbols(&self, symbols: &[String]) -> Self {
        Self::new(symbols.iter().map(|name| (name.clone(), true)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOptions {
    CFamily(CFamilyParseOptions),
    Basic(BasicParseOptions),
    /// Grammar without conditional compilation
    Plain,
    /// A kind this engine does not know how to apply symbols to
    Other { kind: String },
}

impl ParseOptions {
    #[must_use]
    pub fn kind_name(&self) -> &str {
        match self {
            ParseOptions::CFamily(_) => "c-family",
            ParseOptions::Basic(_) => "basic",
            ParseOptions::Plain => "plain",
            ParseOptions::Other { kind } => kind,
        }
    }

    /// Capability check: can this kind carry conditional-compilation symbols?
    #[must_use]
    pub fn supports_preprocessor_symbols(&self) -> bool {
        matches!(self, ParseOptions::CFamily(_) | ParseOptions::Basic(_))
    }

    /// Derive options whose active symbol set is exactly `symbols`.
    ///
    /// Returns `Ok(None)` for `Plain` (capability unsupported) and
    /// `Err(UnsupportedConfiguration)` for an unrecognized kind.
    pub fn with_preprocessor_symbols(&self, symbols: &[String]) -> Result<Option<Self>> {
        match self {
            ParseOptions::CFamily(options) => Ok(Some(ParseOptions::CFamily(
                options.with_preprocessor_symbols(symbols),
            ))),
            ParseOptions::Basic(options) => Ok(Some(ParseOptions::Basic(
                options.with_preprocessor_symbols(symbols),
            ))),
            ParseOptions::Plain => Ok(None),
            ParseOptions::Other { kind } => Err(FormatError::UnsupportedConfiguration {
                kind: kind.clone(),
            }),
        }
    }

    /// Names of the symbols defined as true
    #[must_use]
    pub fn defined_symbols(&self) -> Vec<String> {
        match self {
            ParseOptions::CFamily(options) => options.symbols().map(str::to_string).collect(),
            ParseOptions::Basic(options) => options
                .symbols()
                .filter(|(_, value)| *value)
                .map(|(name, _)| name.to_string())
                .collect(),
            ParseOptions::Plain | ParseOptions::Other { .. } => Vec::new(),
        }
    }
}

impl fmt::Display for ParseOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbols = self.defined_symbols();
        if symbols.is_empty() {
            write!(f, "{}", self.kind_name())
        } else {
            write!(f, "{} [{}]", self.kind_name(), symbols.join(", "))
        }
    }
}

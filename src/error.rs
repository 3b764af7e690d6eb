//! Error types and result aliases for ppfmt.
//!
//! - [`FormatError`]: every failure the engine can report for a document
//! - [`Result<T>`]: alias used throughout the library
//!
//! The binary wraps these in `anyhow::Result` at its top level.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FormatError>;

#[derive(Debug, Error)]
pub enum FormatError {
    /// Cooperative cancellation observed by a language service.
    ///
    /// The pipeline turns this into `PipelineOutcome::Cancelled`.
    #[error("operation cancelled")]
    Cancelled,

    /// Parse options of a kind the engine cannot extend with symbols.
    #[error("unsupported parse configuration: {kind}")]
    UnsupportedConfiguration { kind: String },

    #[error("no language service registered for '{0}'")]
    UnknownLanguage(String),

    #[error("parse error: {message}")]
    Parse { message: String },

    #[error("rule '{rule}' failed: {source}")]
    Rule {
        rule: &'static str,
        #[source]
        source: Box<FormatError>,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("{} is {size} bytes, above the limit of {limit} bytes", path.display())]
    TooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FormatError {
    /// Whether this error (or the rule failure wrapping it) is a cancellation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        match self {
            FormatError::Cancelled => true,
            FormatError::Rule { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }

    pub(crate) fn parse(message: impl Into<String>) -> Self {
        FormatError::Parse {
            message: message.into(),
        }
    }
}

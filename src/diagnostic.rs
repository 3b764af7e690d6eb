//! Findings reported by rules without failing the document

use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// Code visible only under a preprocessor configuration that the default
    /// formatting pass leaves unformatted
    UnformattedRegion,
    /// Normalizing an alternate view twice gave different results
    NonIdempotent,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::UnformattedRegion => write!(f, "unformatted-region"),
            DiagnosticKind::NonIdempotent => write!(f, "non-idempotent"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub path: PathBuf,
    /// 1-based line number
    pub line: usize,
    /// Preprocessor symbols active when the finding was made
    pub symbols: Vec<String>,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {} [{}]: {}",
            self.path.display(),
            self.line,
            self.kind,
            self.symbols.join(", "),
            self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let diagnostic = Diagnostic {
            kind: DiagnosticKind::UnformattedRegion,
            path: PathBuf::from("src/a.cs"),
            line: 12,
            symbols: vec!["DEBUG".to_string(), "PPFMT_FORMATTER".to_string()],
            message: "expected `x = 1;`".to_string(),
        };
        assert_eq!(
            diagnostic.to_string(),
            "src/a.cs:12: unformatted-region [DEBUG, PPFMT_FORMATTER]: expected `x = 1;`"
        );
    }
}

//! ppfmt - Rule-pipeline source formatter
//!
//! Runs each document through filters and an ordered list of rules. The last
//! rule formats the document once per preprocessor configuration so code in
//! inactive `#if` branches gets checked too.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::struct_excessive_bools)]

pub mod cli;
pub mod config;
pub mod diagnostic;
pub mod document;
pub mod error;
pub mod filter;
pub mod language;
pub mod options;
pub mod parser;
pub mod process;
pub mod rules;

/// Symbol added to every preprocessor configuration so sources can fence off
/// regions that only the formatter should see.
pub const SENTINEL_SYMBOL: &str = "PPFMT_FORMATTER";

// Re-export commonly used types
pub use cli::{build_cli, parse_args, parse_args_from, CliArgs};
pub use config::Config;
pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use document::{Document, ProjectContext};
pub use error::{FormatError, Result};
pub use language::{LanguageId, LanguageRegistry, LanguageService};
pub use options::{ConfigurationPolicy, FormatOptions, StyleOptions};
pub use process::{CancellationToken, FormattedDocument, Pipeline, PipelineOutcome, Workspace};

//! Document processing.
//!
//! - [`pipeline`]: filters then ordered rules over one document
//! - [`workspace`]: loading documents from disk and writing results back
//! - [`cancel`]: the cooperative [`CancellationToken`]
//!
//! The main entry point is [`Pipeline::run`], which takes a parsed
//! [`crate::Document`] and returns a [`PipelineOutcome`].

pub mod cancel;
pub mod pipeline;
pub mod workspace;

pub use cancel::CancellationToken;
pub use pipeline::{FormattedDocument, Pipeline, PipelineBuilder, PipelineOutcome};
pub use workspace::{Workspace, DEFAULT_MAX_FILE_SIZE};

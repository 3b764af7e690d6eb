//! Loading documents from disk and writing formatted text back

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::document::{Document, ProjectContext};
use crate::error::{FormatError, Result};
use crate::language::LanguageRegistry;

use super::CancellationToken;

/// Default maximum file size in bytes (100 MB)
/// Files larger than this are rejected to prevent memory exhaustion
pub const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Workspace {
    languages: Arc<LanguageRegistry>,
    max_file_size: u64,
}

impl Workspace {
    #[must_use]
    pub fn new(languages: Arc<LanguageRegistry>) -> Self {
        Self {
            languages,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }

    #[must_use]
    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    #[must_use]
    pub fn languages(&self) -> &Arc<LanguageRegistry> {
        &self.languages
    }

    /// Whether a registered language handles this file's extension
    #[must_use]
    pub fn is_source_file(&self, path: &Path) -> bool {
        self.languages.for_path(path).is_some()
    }

    /// Read and parse the file at `path`
    pub fn load(
        &self,
        path: &Path,
        project: Arc<ProjectContext>,
        cancel: &CancellationToken,
    ) -> Result<Document> {
        let io_error = |source| FormatError::Io {
            path: path.to_path_buf(),
            source,
        };

        // Check file size before reading
        let size = std::fs::metadata(path).map_err(io_error)?.len();
        if size > self.max_file_size {
            return Err(FormatError::TooLarge {
                path: path.to_path_buf(),
                size,
                limit: self.max_file_size,
            });
        }

        let bytes = std::fs::read(path).map_err(io_error)?;
        let source = String::from_utf8(bytes).map_err(|_| {
            FormatError::parse(format!("{} is not valid UTF-8", path.display()))
        })?;
        self.load_str(path, source, project, cancel)
    }

    /// Parse in-memory `source` as if it were read from `path`
    pub fn load_str(
        &self,
        path: impl Into<PathBuf>,
        source: impl Into<Arc<str>>,
        project: Arc<ProjectContext>,
        cancel: &CancellationToken,
    ) -> Result<Document> {
        let path = path.into();
        let service = self
            .languages
            .for_path(&path)
            .ok_or_else(|| FormatError::UnknownLanguage(path.display().to_string()))?;
        Document::parse(service.as_ref(), path, source, project, cancel)
    }

    /// Write `document` back to its path if its text changed.
    ///
    /// Returns whether the file was written.
    pub fn write(&self, document: &Document) -> Result<bool> {
        if !document.is_modified() {
            return Ok(false);
        }
        std::fs::write(document.path(), document.tree().to_text()).map_err(|source| {
            FormatError::Io {
                path: document.path().to_path_buf(),
                source,
            }
        })?;
        Ok(true)
    }
}

//! Immutable document model
//!
//! A [`Document`] is one source file: its language, location, parse options,
//! owning project and current syntax tree. Rules never mutate a document;
//! [`Document::with_tree`] produces a new value sharing everything else.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::language::{LanguageId, LanguageService};
use crate::options::FormatOptions;
use crate::parser::{ParseOptions, SyntaxTree};
use crate::process::CancellationToken;
use crate::Result;

/// Project a document belongs to, with the options of the current run
#[derive(Debug, Clone, Default)]
pub struct ProjectContext {
    name: String,
    root: Option<PathBuf>,
    options: FormatOptions,
}

impl ProjectContext {
    #[must_use]
    pub fn new(name: impl Into<String>, options: FormatOptions) -> Self {
        Self {
            name: name.into(),
            root: None,
            options,
        }
    }

    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    #[must_use]
    pub fn options(&self) -> &FormatOptions {
        &self.options
    }

    /// Symbol sets the terminal rule verifies
    #[must_use]
    pub fn preprocessor_configurations(&self) -> &[Vec<String>] {
        &self.options.preprocessor_configurations
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    language: LanguageId,
    path: PathBuf,
    parse_options: ParseOptions,
    project: Arc<ProjectContext>,
    /// Text the document was loaded from
    source: Arc<str>,
    tree: SyntaxTree,
}

impl Document {
    #[must_use]
    pub fn new(
        language: LanguageId,
        path: impl Into<PathBuf>,
        parse_options: ParseOptions,
        project: Arc<ProjectContext>,
        source: impl Into<Arc<str>>,
        tree: SyntaxTree,
    ) -> Self {
        Self {
            language,
            path: path.into(),
            parse_options,
            project,
            source: source.into(),
            tree,
        }
    }

    /// Parse `source` with the service's default options
    pub fn parse(
        service: &dyn LanguageService,
        path: impl Into<PathBuf>,
        source: impl Into<Arc<str>>,
        project: Arc<ProjectContext>,
        cancel: &CancellationToken,
    ) -> Result<Self> {
        let source = source.into();
        let parse_options = service.default_parse_options();
        let tree = service.parse(&source, &parse_options, cancel)?;
        Ok(Self::new(
            service.id(),
            path,
            parse_options,
            project,
            source,
            tree,
        ))
    }

    #[must_use]
    pub fn language(&self) -> LanguageId {
        self.language
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn parse_options(&self) -> &ParseOptions {
        &self.parse_options
    }

    #[must_use]
    pub fn project(&self) -> &Arc<ProjectContext> {
        &self.project
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    /// A new document carrying `tree`; `self` is unchanged
    #[must_use]
    pub fn with_tree(&self, tree: SyntaxTree) -> Self {
        Self {
            tree,
            ..self.clone()
        }
    }

    /// Whether the current tree renders differently from the loaded text
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.tree.to_text() != *self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::CFamilyLanguage;

    fn project() -> Arc<ProjectContext> {
        Arc::new(ProjectContext::new("demo", FormatOptions::default()))
    }

    #[test]
    fn test_parse_sets_metadata() {
        let doc = Document::parse(
            &CFamilyLanguage,
            "src/main.c",
            "int main() {}\n",
            project(),
            &CancellationToken::new(),
        )
        .unwrap();

        assert_eq!(doc.language(), LanguageId::C_FAMILY);
        assert_eq!(doc.path(), Path::new("src/main.c"));
        assert_eq!(doc.project().name(), "demo");
        assert_eq!(doc.tree().to_text(), "int main() {}\n");
        assert!(!doc.is_modified());
    }

    #[test]
    fn test_with_tree_leaves_original_untouched() {
        let doc = Document::parse(
            &CFamilyLanguage,
            "a.c",
            "x;\n",
            project(),
            &CancellationToken::new(),
        )
        .unwrap();
        let other = Document::parse(
            &CFamilyLanguage,
            "b.c",
            "y;\n",
            project(),
            &CancellationToken::new(),
        )
        .unwrap();

        let replaced = doc.with_tree(other.tree().clone());
        assert_eq!(replaced.tree().to_text(), "y;\n");
        assert_eq!(replaced.path(), Path::new("a.c"));
        assert!(replaced.is_modified());
        assert_eq!(doc.tree().to_text(), "x;\n");
    }
}

//! Pluggable language services.
//!
//! A [`LanguageService`] bundles a grammar's parser and its style normalizer.
//! The engine only talks to languages through this trait; the built-in
//! services are:
//! - [`CFamilyLanguage`]: brace languages with `#if`/`#endif` directives
//! - [`BasicLanguage`]: `If ... Then`/`End If` languages with `#If` directives
//!
//! [`LanguageRegistry`] maps language ids and file extensions to services.

pub mod basic;
pub mod c_family;

use std::fmt;
use std::path::Path;
use std::sync::Arc;

pub use basic::BasicLanguage;
pub use c_family::CFamilyLanguage;

use crate::options::StyleOptions;
use crate::parser::{ParseOptions, SyntaxTree};
use crate::process::CancellationToken;
use crate::Result;

/// Identifier of a source language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LanguageId(&'static str);

impl LanguageId {
    pub const C_FAMILY: LanguageId = LanguageId("c-family");
    pub const BASIC: LanguageId = LanguageId("basic");

    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        LanguageId(name)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for LanguageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Parser plus style normalizer for one language
///
/// Implementations must be deterministic, and `normalize` must be idempotent
/// on its own output.
pub trait LanguageService: Send + Sync {
    fn id(&self) -> LanguageId;

    /// File extensions (without the dot) handled by this language
    fn extensions(&self) -> &[&'static str] {
        &[]
    }

    fn default_parse_options(&self) -> ParseOptions;

    fn parse(
        &self,
        source: &str,
        options: &ParseOptions,
        cancel: &CancellationToken,
    ) -> Result<SyntaxTree>;

    fn normalize(
        &self,
        tree: &SyntaxTree,
        options: &ParseOptions,
        style: &StyleOptions,
        cancel: &CancellationToken,
    ) -> Result<SyntaxTree>;
}

/// Registered language services
#[derive(Default)]
pub struct LanguageRegistry {
    services: Vec<Arc<dyn LanguageService>>,
}

impl LanguageRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service, replacing any service with the same id
    pub fn register<S: LanguageService + 'static>(&mut self, service: S) {
        self.register_arc(Arc::new(service));
    }

    pub fn register_arc(&mut self, service: Arc<dyn LanguageService>) {
        let id = service.id();
        self.services.retain(|existing| existing.id() != id);
        self.services.push(service);
    }

    #[must_use]
    pub fn get(&self, id: LanguageId) -> Option<&Arc<dyn LanguageService>> {
        self.services.iter().find(|service| service.id() == id)
    }

    #[must_use]
    pub fn contains(&self, id: LanguageId) -> bool {
        self.get(id).is_some()
    }

    /// Service handling the extension of `path` (case-insensitive)
    #[must_use]
    pub fn for_path(&self, path: &Path) -> Option<&Arc<dyn LanguageService>> {
        let ext = path.extension()?.to_str()?;
        self.services.iter().find(|service| {
            service
                .extensions()
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
    }

    #[must_use]
    pub fn ids(&self) -> Vec<LanguageId> {
        self.services.iter().map(|service| service.id()).collect()
    }

    /// Registry with the built-in languages
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(CFamilyLanguage);
        registry.register(BasicLanguage);
        registry
    }
}

impl fmt::Debug for LanguageRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LanguageRegistry")
            .field("languages", &self.ids())
            .finish()
    }
}

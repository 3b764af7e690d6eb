use crate::document::Document;

use super::Filter;

/// Directory name holding generated migration code
pub const DEFAULT_RESERVED_DIRECTORY: &str = "Migrations";

/// Skips documents whose immediate parent directory has a reserved name
#[derive(Debug, Clone)]
pub struct IgnoreMigrationsFilter {
    reserved: String,
}

impl IgnoreMigrationsFilter {
    #[must_use]
    pub fn new(reserved: impl Into<String>) -> Self {
        Self {
            reserved: reserved.into(),
        }
    }

    #[must_use]
    pub fn reserved(&self) -> &str {
        &self.reserved
    }
}

impl Default for IgnoreMigrationsFilter {
    fn default() -> Self {
        Self::new(DEFAULT_RESERVED_DIRECTORY)
    }
}

impl Filter for IgnoreMigrationsFilter {
    fn name(&self) -> &'static str {
        "ignore-migrations"
    }

    fn should_process(&self, document: &Document) -> bool {
        // Bare file names and root paths have no named parent
        let parent_name = document
            .path()
            .parent()
            .and_then(|parent| parent.file_name());
        parent_name.map_or(true, |name| name != self.reserved.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::tests::document;

    #[test]
    fn test_rejects_reserved_parent() {
        let filter = IgnoreMigrationsFilter::default();
        assert!(!filter.should_process(&document("foo/Migrations/Gen.cs")));
        assert!(!filter.should_process(&document("/repo/src/Migrations/001_Init.cs")));
    }

    #[test]
    fn test_only_immediate_parent_counts() {
        let filter = IgnoreMigrationsFilter::default();
        assert!(filter.should_process(&document("foo/Migrations/sub/Gen.cs")));
        assert!(filter.should_process(&document("foo/Bar.cs")));
        // Exact, case-sensitive match
        assert!(filter.should_process(&document("foo/migrations/Gen.cs")));
        assert!(filter.should_process(&document("foo/MigrationsOld/Gen.cs")));
    }

    #[test]
    fn test_paths_without_parent() {
        let filter = IgnoreMigrationsFilter::default();
        assert!(filter.should_process(&document("Gen.cs")));
        assert!(filter.should_process(&document("/")));
        assert!(filter.should_process(&document("")));
    }

    #[test]
    fn test_custom_reserved_name() {
        let filter = IgnoreMigrationsFilter::new("Generated");
        assert!(!filter.should_process(&document("src/Generated/Model.cs")));
        assert!(filter.should_process(&document("src/Migrations/Gen.cs")));
    }
}

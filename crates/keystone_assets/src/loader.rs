//! Asset loader.
//!
//! The loader reads project-relative artifacts through an [`AssetSource`]
//! and enumerates them through a [`DirectoryListing`]. Both are traits so
//! a build can run against the real filesystem ([`crate::FsAssets`]) or an
//! in-memory tree ([`crate::MemoryAssets`]).

use crate::error::AssetResult;
use crate::fs::FsAssets;
use crate::pattern::GlobPattern;
use crate::root::ProjectRoot;
use std::path::Path;
use std::sync::Arc;

/// Reads artifacts relative to the assets directory
pub trait AssetSource: Send + Sync {
    /// Read the full text of `relative`
    ///
    /// # Errors
    ///
    /// Returns [`crate::AssetError::MissingAsset`] if the artifact does not
    /// exist or is unreadable
    fn read(&self, relative: &Path) -> AssetResult<String>;
}

/// Enumerates artifacts matching a pattern
pub trait DirectoryListing: Send + Sync {
    /// Relative `/`-separated paths of every file matching `pattern`,
    /// in no particular order
    ///
    /// # Errors
    ///
    /// Returns error if the underlying store cannot be walked
    fn list(&self, pattern: &GlobPattern) -> AssetResult<Vec<String>>;
}

/// Loads artifacts for one build
#[derive(Clone)]
pub struct AssetLoader {
    source: Arc<dyn AssetSource>,
    listing: Arc<dyn DirectoryListing>,
}

impl AssetLoader {
    /// Create a loader from separate read and listing capabilities
    #[must_use]
    pub fn new(source: Arc<dyn AssetSource>, listing: Arc<dyn DirectoryListing>) -> Self {
        Self { source, listing }
    }

    /// Create a loader from one store providing both capabilities
    #[must_use]
    pub fn from_store<S>(store: S) -> Self
    where
        S: AssetSource + DirectoryListing + 'static,
    {
        let store = Arc::new(store);
        Self {
            source: store.clone(),
            listing: store,
        }
    }

    /// Loader reading `<root>/<assets_dir>` on the real filesystem
    #[must_use]
    pub fn filesystem(root: &ProjectRoot, assets_dir: &str) -> Self {
        Self::from_store(FsAssets::new(root.assets_dir(assets_dir)))
    }

    /// Load an artifact
    ///
    /// With `strip_newlines` every line break is removed, which is how
    /// schema documents are shipped as a single-line payload. Template
    /// bodies are loaded verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AssetError::MissingAsset`] if the artifact does not
    /// exist or is unreadable
    pub fn load(&self, relative: impl AsRef<Path>, strip_newlines: bool) -> AssetResult<String> {
        let relative = relative.as_ref();
        let text = self.source.read(relative)?;
        tracing::debug!(
            path = %relative.display(),
            bytes = text.len(),
            strip_newlines,
            "loaded asset"
        );

        if strip_newlines {
            Ok(text.chars().filter(|c| !matches!(c, '\n' | '\r')).collect())
        } else {
            Ok(text)
        }
    }

    /// Every path matching `pattern`, sorted lexicographically
    ///
    /// # Errors
    ///
    /// Returns error if the pattern is invalid or the listing fails
    pub fn glob(&self, pattern: &str) -> AssetResult<Vec<String>> {
        let pattern = GlobPattern::new(pattern)?;
        let mut paths = self.listing.list(&pattern)?;
        paths.sort();
        paths.dedup();
        Ok(paths)
    }
}

impl std::fmt::Debug for AssetLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetLoader").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AssetError;
    use crate::memory::MemoryAssets;
    use proptest::prelude::*;

    fn loader() -> AssetLoader {
        AssetLoader::from_store(
            MemoryAssets::new()
                .with_file("schema/schema.graphql", "type Query {\n  getUser: User\n}\n")
                .with_file("template_resolvers/query/b_request.vtl", "{}")
                .with_file("template_resolvers/query/a_request.vtl", "{\n}\n"),
        )
    }

    #[test]
    fn test_load_verbatim() {
        let text = loader().load("template_resolvers/query/a_request.vtl", false).unwrap();
        assert_eq!(text, "{\n}\n");
    }

    #[test]
    fn test_load_strip_newlines() {
        let text = loader().load("schema/schema.graphql", true).unwrap();
        assert_eq!(text, "type Query {  getUser: User}");
    }

    #[test]
    fn test_load_missing() {
        let err = loader().load("schema/missing.graphql", true).unwrap_err();
        assert!(matches!(err, AssetError::MissingAsset { .. }));
    }

    #[test]
    fn test_load_is_idempotent() {
        let l = loader();
        let a = l.load("schema/schema.graphql", false).unwrap();
        let b = l.load("schema/schema.graphql", false).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_glob_sorted() {
        let paths = loader().glob("template_resolvers/query/*_request.vtl").unwrap();
        assert_eq!(
            paths,
            vec![
                "template_resolvers/query/a_request.vtl".to_string(),
                "template_resolvers/query/b_request.vtl".to_string(),
            ]
        );
    }

    #[test]
    fn test_glob_invalid_pattern() {
        let err = loader().glob("").unwrap_err();
        assert!(matches!(err, AssetError::InvalidPattern { .. }));
    }

    proptest! {
        #[test]
        fn prop_stripped_load_has_no_newline(body in "[a-z \n\r{}]{0,64}") {
            let l = AssetLoader::from_store(MemoryAssets::new().with_file("x.graphql", &body));
            let stripped = l.load("x.graphql", true).unwrap();
            prop_assert!(!stripped.contains('\n'));
            prop_assert!(!stripped.contains('\r'));
            let verbatim = l.load("x.graphql", false).unwrap();
            prop_assert_eq!(verbatim, body);
        }
    }
}

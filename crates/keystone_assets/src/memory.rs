//! In-memory assets.

use crate::error::{AssetError, AssetResult};
use crate::loader::{AssetSource, DirectoryListing};
use crate::pattern::GlobPattern;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Assets held in memory, keyed by `/`-separated relative path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryAssets {
    files: BTreeMap<String, String>,
}

impl MemoryAssets {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file
    #[must_use]
    pub fn with_file(mut self, path: &str, contents: &str) -> Self {
        self.insert(path, contents);
        self
    }

    /// Add or replace a file
    pub fn insert(&mut self, path: &str, contents: &str) {
        self.files.insert(path.to_string(), contents.to_string());
    }

    /// Number of files
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn key(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

impl AssetSource for MemoryAssets {
    fn read(&self, relative: &Path) -> AssetResult<String> {
        self.files
            .get(&key(relative))
            .cloned()
            .ok_or_else(|| AssetError::MissingAsset {
                path: PathBuf::from(relative),
                reason: "not present in memory store".to_string(),
            })
    }
}

impl DirectoryListing for MemoryAssets {
    fn list(&self, pattern: &GlobPattern) -> AssetResult<Vec<String>> {
        Ok(self
            .files
            .keys()
            .filter(|path| pattern.matches(path))
            .cloned()
            .collect())
    }
}

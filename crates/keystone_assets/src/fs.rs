//! Filesystem-backed assets.

use crate::error::{AssetError, AssetResult};
use crate::loader::{AssetSource, DirectoryListing};
use crate::pattern::GlobPattern;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Assets read from a directory on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsAssets {
    base: PathBuf,
}

impl FsAssets {
    /// Serve files below `base`
    #[must_use]
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Base directory
    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }
}

impl AssetSource for FsAssets {
    fn read(&self, relative: &Path) -> AssetResult<String> {
        let path = self.base.join(relative);
        std::fs::read_to_string(&path).map_err(|e| AssetError::MissingAsset {
            path,
            reason: e.to_string(),
        })
    }
}

impl DirectoryListing for FsAssets {
    fn list(&self, pattern: &GlobPattern) -> AssetResult<Vec<String>> {
        let start = self.base.join(pattern.base_dir());
        if !start.is_dir() {
            return Ok(Vec::new());
        }

        let mut out = Vec::new();
        for entry in WalkDir::new(&start).follow_links(true) {
            let entry = entry.map_err(|e| AssetError::Listing {
                path: e.path().map_or_else(|| start.clone(), Path::to_path_buf),
                reason: e.to_string(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.base) else {
                continue;
            };
            let relative = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if pattern.matches(&relative) {
                out.push(relative);
            }
        }
        Ok(out)
    }
}

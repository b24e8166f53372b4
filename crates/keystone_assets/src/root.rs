//! Project root discovery.
//!
//! The root is the nearest ancestor directory holding the marker file.
//! It is looked up once by the caller and handed to the loader
//! explicitly, so tests can point the build at any synthetic tree.

use crate::error::{AssetError, AssetResult};
use std::path::{Path, PathBuf};

/// Marker file identifying the project root
pub const MARKER_FILE: &str = "keystone.json";

/// Subdirectory of the root holding every source asset
pub const DEFAULT_ASSETS_DIR: &str = "src";

/// Directory anchoring all relative asset paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRoot {
    path: PathBuf,
}

impl ProjectRoot {
    /// Use `path` as the root without any lookup
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Walk up from `start` until a directory containing `marker` is found
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::ProjectRootNotFound`] when the filesystem
    /// root is reached without finding the marker
    pub fn discover(start: &Path, marker: &str) -> AssetResult<Self> {
        let found = start
            .ancestors()
            .find(|ancestor| ancestor.join(marker).is_file())
            .map(Path::to_path_buf);

        match found {
            Some(path) => {
                tracing::debug!(root = %path.display(), "found project root");
                Ok(Self { path })
            }
            None => Err(AssetError::ProjectRootNotFound {
                start: start.to_path_buf(),
                marker: marker.to_string(),
            }),
        }
    }

    /// Walk up from the current directory looking for [`MARKER_FILE`]
    ///
    /// # Errors
    ///
    /// Returns error if the current directory cannot be read or no root is found
    pub fn discover_from_cwd() -> AssetResult<Self> {
        let cwd = std::env::current_dir().map_err(|e| AssetError::Listing {
            path: PathBuf::from("."),
            reason: e.to_string(),
        })?;
        Self::discover(&cwd, MARKER_FILE)
    }

    /// Root directory
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the marker file
    #[must_use]
    pub fn marker_path(&self) -> PathBuf {
        self.path.join(MARKER_FILE)
    }

    /// Assets directory under the root
    #[must_use]
    pub fn assets_dir(&self, dir: &str) -> PathBuf {
        self.path.join(dir)
    }
}

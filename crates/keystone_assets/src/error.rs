//! Asset errors.

use std::path::PathBuf;

/// Asset result type
pub type AssetResult<T> = Result<T, AssetError>;

/// Errors raised while locating or reading assets
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssetError {
    /// Requested artifact does not exist or is unreadable
    #[error("missing asset {}: {reason}", .path.display())]
    MissingAsset { path: PathBuf, reason: String },

    /// No ancestor directory holds the marker file
    #[error("no {marker} found in {} or any parent directory", .start.display())]
    ProjectRootNotFound { start: PathBuf, marker: String },

    /// Search pattern cannot be used
    #[error("invalid search pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Directory could not be walked
    #[error("failed to list {}: {reason}", .path.display())]
    Listing { path: PathBuf, reason: String },
}

impl AssetError {
    /// Path the error refers to, if any
    #[must_use]
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::MissingAsset { path, .. } | Self::Listing { path, .. } => Some(path),
            Self::ProjectRootNotFound { start, .. } => Some(start),
            Self::InvalidPattern { .. } => None,
        }
    }
}

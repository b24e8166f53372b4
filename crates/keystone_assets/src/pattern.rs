//! Glob patterns over asset-relative paths.
//!
//! Matching is delegated to `glob-match`: `*` and `?` stay within one
//! segment, `**` spans segments, and `[...]`/`{a,b}` are supported.
//! Paths always use `/` as separator.

use crate::error::{AssetError, AssetResult};
use glob_match::glob_match;

/// A checked search pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobPattern {
    source: String,
}

impl GlobPattern {
    /// Check a pattern
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::InvalidPattern`] for empty or absolute
    /// patterns and for patterns escaping the assets directory
    pub fn new(pattern: &str) -> AssetResult<Self> {
        let invalid = |reason: &str| AssetError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        if pattern.is_empty() {
            return Err(invalid("pattern is empty"));
        }
        if pattern.starts_with('/') {
            return Err(invalid("pattern must be relative to the assets directory"));
        }
        for segment in pattern.split('/') {
            match segment {
                "" => return Err(invalid("empty path segment")),
                ".." => return Err(invalid("'..' is not allowed")),
                _ => {}
            }
        }

        Ok(Self {
            source: pattern.to_string(),
        })
    }

    /// The pattern as written
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Leading segments that contain no wildcard
    ///
    /// Listing only needs to walk below this directory.
    #[must_use]
    pub fn base_dir(&self) -> &str {
        let mut end = 0;
        for (idx, _) in self.source.match_indices('/') {
            if self.source[..idx].contains(['*', '?', '[', '{']) {
                break;
            }
            end = idx;
        }
        &self.source[..end]
    }

    /// Whether a `/`-separated relative path matches
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        glob_match(&self.source, path)
    }
}

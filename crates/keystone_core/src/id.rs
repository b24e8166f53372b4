//! Logical identifiers for declared resources.
//!
//! A [`LogicalId`] is a `/`-separated path. Each construct owns a
//! namespace and its children are addressed by appending one segment,
//! so two children of the same parent can never share an id unless they
//! share a name.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};

const SEPARATOR: char = '/';

/// Logical identifier - identifies a node in the resource graph
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LogicalId(String);

impl LogicalId {
    /// Parse a full id path such as `stack/api/graphql-api`
    ///
    /// # Errors
    ///
    /// Returns error if any segment is empty or contains characters
    /// outside `[A-Za-z0-9._-]`
    pub fn new(path: impl Into<String>) -> CoreResult<Self> {
        let path = path.into();
        for segment in path.split(SEPARATOR) {
            check_segment(&path, segment)?;
        }
        Ok(Self(path))
    }

    /// Create the id of a direct child of this node
    ///
    /// # Errors
    ///
    /// Returns error if `name` is not a valid single segment
    pub fn child(&self, name: &str) -> CoreResult<Self> {
        check_segment(name, name)?;
        Ok(Self(format!("{}{}{}", self.0, SEPARATOR, name)))
    }

    /// Last path segment
    #[must_use]
    pub fn name(&self) -> &str {
        self.0.rsplit(SEPARATOR).next().unwrap_or(&self.0)
    }

    /// Get as str
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn check_segment(id: &str, segment: &str) -> CoreResult<()> {
    if segment.is_empty() {
        return Err(CoreError::InvalidId {
            id: id.to_string(),
            reason: "empty path segment".to_string(),
        });
    }
    if let Some(c) = segment
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(CoreError::InvalidId {
            id: id.to_string(),
            reason: format!("unexpected character '{}'", c),
        });
    }
    Ok(())
}

impl TryFrom<String> for LogicalId {
    type Error = CoreError;

    fn try_from(value: String) -> CoreResult<Self> {
        Self::new(value)
    }
}

impl From<LogicalId> for String {
    fn from(id: LogicalId) -> Self {
        id.0
    }
}

impl std::fmt::Display for LogicalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_logical_id_new() {
        let id = LogicalId::new("stack/api/graphql-api").unwrap();
        assert_eq!(id.as_str(), "stack/api/graphql-api");
        assert_eq!(id.name(), "graphql-api");
    }

    #[test]
    fn test_logical_id_rejects_empty_segment() {
        assert!(LogicalId::new("stack//api").is_err());
        assert!(LogicalId::new("").is_err());
        assert!(LogicalId::new("stack/").is_err());
    }

    #[test]
    fn test_logical_id_rejects_bad_chars() {
        let err = LogicalId::new("stack/api id").unwrap_err();
        assert!(matches!(err, CoreError::InvalidId { .. }));
    }

    #[test]
    fn test_logical_id_child() {
        let root = LogicalId::new("stack").unwrap();
        let child = root.child("authorizer").unwrap();
        assert_eq!(child.as_str(), "stack/authorizer");
        assert_eq!(child.name(), "authorizer");
        assert!(root.child("a/b").is_err());
    }

    #[test]
    fn test_logical_id_serde() {
        let id = LogicalId::new("stack/table").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"stack/table\"");
        let back: LogicalId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<LogicalId>("\"a//b\"").is_err());
    }

    proptest! {
        #[test]
        fn prop_child_name_roundtrip(name in "[A-Za-z0-9_.-]{1,24}") {
            let root = LogicalId::new("stack").unwrap();
            let child = root.child(&name).unwrap();
            prop_assert_eq!(child.name(), name.as_str());
            prop_assert_eq!(child.as_str(), format!("stack/{}", name));
        }
    }
}

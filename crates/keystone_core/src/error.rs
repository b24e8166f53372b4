//! Core error types for KEYSTONE.

use std::fmt;

/// Core result type
pub type CoreResult<T> = Result<T, CoreError>;

/// Core error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Invalid logical id
    InvalidId {
        /// The rejected id
        id: String,
        /// Why it was rejected
        reason: String,
    },

    /// A node with this id is already declared
    DuplicateNode {
        /// Conflicting id
        id: String,
    },

    /// A reference or edge names a node that has not been declared
    UnknownNode {
        /// Node holding the reference
        from: String,
        /// Missing target
        id: String,
    },

    /// A node was made to depend on itself
    SelfDependency {
        /// Offending node
        id: String,
    },

    /// Adding an edge would close a cycle
    Cycle {
        /// Node gaining the dependency
        from: String,
        /// Dependency target
        on: String,
    },

    /// Validation error
    Validation { field: String, reason: String },
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidId { id, reason } => write!(f, "Invalid id '{}': {}", id, reason),
            Self::DuplicateNode { id } => write!(f, "Node already declared: {}", id),
            Self::UnknownNode { from, id } => {
                write!(f, "Node {} references undeclared node {}", from, id)
            }
            Self::SelfDependency { id } => write!(f, "Node {} cannot depend on itself", id),
            Self::Cycle { from, on } => {
                write!(f, "Dependency {} -> {} would create a cycle", from, on)
            }
            Self::Validation { field, reason } => {
                write!(f, "Validation failed for {}: {}", field, reason)
            }
        }
    }
}

impl std::error::Error for CoreError {}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Validation {
            field: "json".to_string(),
            reason: err.to_string(),
        }
    }
}

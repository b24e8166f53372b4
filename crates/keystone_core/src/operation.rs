//! API operation taxonomy.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Root operation type a resolver is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OperationType {
    /// Read operation
    Query,
    /// Write operation
    Mutation,
}

impl OperationType {
    /// All operation types, in declaration order
    pub const ALL: [OperationType; 2] = [OperationType::Query, OperationType::Mutation];

    /// Type name as it appears in the schema
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "Query",
            Self::Mutation => "Mutation",
        }
    }

    /// Lowercased name, used as a directory name
    #[must_use]
    pub const fn dir_name(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operation type outside `{Query, Mutation}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOperationTypeError {
    /// Rejected input
    pub given: String,
}

impl fmt::Display for ParseOperationTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Resolver type {} is not valid", self.given)
    }
}

impl std::error::Error for ParseOperationTypeError {}

impl FromStr for OperationType {
    type Err = ParseOperationTypeError;

    /// Case-insensitive
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "query" => Ok(Self::Query),
            "mutation" => Ok(Self::Mutation),
            _ => Err(ParseOperationTypeError {
                given: s.to_string(),
            }),
        }
    }
}

//! Stack assembly errors.
//!
//! None of these are retried. Any of them aborts the build before a
//! manifest exists.

use keystone_assets::AssetError;
use keystone_core::{CoreError, OperationType, ParseOperationTypeError};
use keystone_graph::ValidationError;
use std::path::PathBuf;

/// Stack result type
pub type StackResult<T> = Result<T, StackError>;

/// Which half of a template pair is missing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairSide {
    /// `<field>_request.vtl`
    Request,
    /// `<field>_response.vtl`
    Response,
}

impl std::fmt::Display for PairSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Request => f.write_str("request"),
            Self::Response => f.write_str("response"),
        }
    }
}

/// Errors raised while assembling a stack
#[derive(Debug, thiserror::Error)]
pub enum StackError {
    /// Operation type outside `{Query, Mutation}`
    #[error("{0}")]
    InvalidOperationType(#[from] ParseOperationTypeError),

    /// A request document without its response document, or the reverse
    #[error("incomplete resolver pair for {operation}.{field}: {missing} document {} not found", .path.display())]
    IncompleteResolverPair {
        operation: OperationType,
        field: String,
        missing: PairSide,
        path: PathBuf,
    },

    /// Asset lookup failed
    #[error(transparent)]
    Asset(#[from] AssetError),

    /// Graph rejected a node or edge
    #[error(transparent)]
    Graph(#[from] CoreError),

    /// Project configuration is unusable
    #[error("invalid configuration {}: {reason}", .path.display())]
    Config { path: PathBuf, reason: String },

    /// Finished graph failed validation
    #[error("graph validation failed: {}", join(.0))]
    Invalid(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

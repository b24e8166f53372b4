//! KEYSTONE Resource Graph
//!
//! Typed resource declarations, the append-only dependency graph they
//! live in, and the manifest handed to the deployment tool.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod graph;
pub mod manifest;
pub mod resource;
pub mod validate;

pub use graph::{Edge, EdgeKind, Node, ResourceGraph};
pub use manifest::{Manifest, ManifestResource};
pub use resource::{
    DataSourceConfig, KeyAttribute, LambdaAuthorizerConfig, LogConfig, PolicyStatement,
    ResourceKind,
};
pub use validate::{ValidationError, Validator};

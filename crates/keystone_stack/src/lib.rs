//! KEYSTONE Stack
//!
//! Constructs that declare a GraphQL backend into a resource graph: a
//! compute node with its network binding, an API with its schema, data
//! sources and resolvers, and the stack that wires them together.
//!
//! Resolvers backed by mapping templates are discovered from the assets
//! directory by naming convention. Every resolver is ordered explicitly
//! after its API and schema.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod compute;
pub mod config;
pub mod error;
pub mod network;
pub mod resolver;
pub mod stack;

pub use api::{ApiNode, DataSourceHandle};
pub use compute::{ComputeNode, ComputeProps};
pub use config::{ComputeResolverConfig, FunctionConfig, StackConfig, TableConfig};
pub use error::{PairSide, StackError, StackResult};
pub use network::{
    DefaultNetwork, IsolationContext, NetworkBinding, NetworkDeclaration, NetworkProvider,
};
pub use resolver::{ResolverDeclaration, ResolverKind};
pub use stack::Stack;

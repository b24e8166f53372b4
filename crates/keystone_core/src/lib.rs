//! KEYSTONE Core Types
//!
//! This crate contains pure types and logic with no I/O.
//! Everything here is shared by the graph, the asset loader, and the
//! stack constructs.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod id;
pub mod operation;
pub mod value;

// Re-exports
pub use error::{CoreError, CoreResult};
pub use id::LogicalId;
pub use operation::{OperationType, ParseOperationTypeError};
pub use value::{AttrRef, Attribute, Value};

//! KEYSTONE Assets
//!
//! Everything the build reads from disk goes through here: the project
//! root, schema documents, and the request/response mapping templates
//! that sit next to each resolver.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod fs;
pub mod loader;
pub mod memory;
pub mod pattern;
pub mod root;
pub mod templates;

pub use error::{AssetError, AssetResult};
pub use fs::FsAssets;
pub use loader::{AssetLoader, AssetSource, DirectoryListing};
pub use memory::MemoryAssets;
pub use pattern::GlobPattern;
pub use root::{ProjectRoot, DEFAULT_ASSETS_DIR, MARKER_FILE};
pub use templates::{MappingTemplates, ResolverCategory, TemplateResolver};

//! Resolver mapping-template lookup.
//!
//! Layout under the assets directory:
//!
//! ```text
//! template_resolvers/<operation>/<field>_request.vtl
//! template_resolvers/<operation>/<field>_response.vtl
//! compute_resolvers/<operation>/<resolver>/mapping_templates/<field>_request.vtl
//! compute_resolvers/<operation>/<resolver>/mapping_templates/<field>_response.vtl
//! ```

use crate::error::AssetResult;
use crate::loader::AssetLoader;
use keystone_core::OperationType;
use std::path::PathBuf;

/// Suffix of request mapping documents
pub const REQUEST_SUFFIX: &str = "_request.vtl";

/// Suffix of response mapping documents
pub const RESPONSE_SUFFIX: &str = "_response.vtl";

/// Where a resolver's templates live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverCategory<'a> {
    /// Discovered in bulk from `template_resolvers/`
    Template,
    /// Declared one at a time under `compute_resolvers/<resolver_name>/`
    Compute {
        /// Directory name of the compute resolver
        resolver_name: &'a str,
    },
}

/// Request and response documents of one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingTemplates {
    /// Request mapping document
    pub request: String,
    /// Response mapping document
    pub response: String,
}

/// Computes template paths and loads them
#[derive(Debug, Clone)]
pub struct TemplateResolver {
    loader: AssetLoader,
}

impl TemplateResolver {
    /// Create a resolver reading through `loader`
    #[must_use]
    pub fn new(loader: AssetLoader) -> Self {
        Self { loader }
    }

    /// Underlying loader
    #[must_use]
    pub fn loader(&self) -> &AssetLoader {
        &self.loader
    }

    /// Path of `file_name` for a resolver of the given category
    #[must_use]
    pub fn path(
        category: ResolverCategory<'_>,
        operation: OperationType,
        file_name: &str,
    ) -> PathBuf {
        match category {
            ResolverCategory::Compute { resolver_name } => PathBuf::from("compute_resolvers")
                .join(operation.dir_name())
                .join(resolver_name)
                .join("mapping_templates")
                .join(file_name),
            ResolverCategory::Template => PathBuf::from("template_resolvers")
                .join(operation.dir_name())
                .join(file_name),
        }
    }

    /// Load one template verbatim
    ///
    /// # Errors
    ///
    /// Returns [`crate::AssetError::MissingAsset`] if the computed path
    /// does not exist
    pub fn resolve(
        &self,
        category: ResolverCategory<'_>,
        operation: OperationType,
        file_name: &str,
    ) -> AssetResult<String> {
        self.loader
            .load(Self::path(category, operation, file_name), false)
    }

    /// Load the request and response documents of `field`
    ///
    /// # Errors
    ///
    /// Returns [`crate::AssetError::MissingAsset`] if either document is missing
    pub fn resolve_pair(
        &self,
        category: ResolverCategory<'_>,
        operation: OperationType,
        field: &str,
    ) -> AssetResult<MappingTemplates> {
        let request = self.resolve(category, operation, &request_file(field))?;
        let response = self.resolve(category, operation, &response_file(field))?;
        Ok(MappingTemplates { request, response })
    }
}

/// Request document name of `field`
#[must_use]
pub fn request_file(field: &str) -> String {
    format!("{}{}", field, REQUEST_SUFFIX)
}

/// Response document name of `field`
#[must_use]
pub fn response_file(field: &str) -> String {
    format!("{}{}", field, RESPONSE_SUFFIX)
}

/// Default discovery pattern for template-backed resolvers
#[must_use]
pub fn default_search_pattern(operation: OperationType) -> String {
    format!("template_resolvers/{}/*{}", operation.dir_name(), REQUEST_SUFFIX)
}

/// Field name encoded in a document path, if it carries `suffix`
#[must_use]
pub fn field_name<'a>(path: &'a str, suffix: &str) -> Option<&'a str> {
    let file = path.rsplit('/').next().unwrap_or(path);
    file.strip_suffix(suffix).filter(|field| !field.is_empty())
}

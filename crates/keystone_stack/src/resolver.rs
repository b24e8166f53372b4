//! Resolver bindings.
//!
//! A binding moves through `Declared -> Validated -> Loaded` before the
//! API attaches it to the graph. Each stage is its own type, so a
//! binding cannot reach the graph without a valid operation type and
//! both mapping documents in hand.

use crate::error::{PairSide, StackError, StackResult};
use keystone_assets::templates::{
    self, REQUEST_SUFFIX, RESPONSE_SUFFIX, default_search_pattern, request_file, response_file,
};
use keystone_assets::{AssetLoader, MappingTemplates, ResolverCategory, TemplateResolver};
use keystone_core::{OperationType, Value};
use std::collections::BTreeSet;

/// Resolver kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResolverKind {
    /// Single data source
    #[default]
    Unit,
    /// Chain of functions
    Pipeline,
}

impl ResolverKind {
    /// Kind as the API expects it
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unit => "UNIT",
            Self::Pipeline => "PIPELINE",
        }
    }
}

/// A binding as requested by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverDeclaration {
    /// Operation type, not yet checked
    pub operation: String,
    /// Field name
    pub field: String,
    /// Data source serving the field
    pub data_source: Value,
    /// Resolver kind
    pub kind: ResolverKind,
}

impl ResolverDeclaration {
    /// Declare a binding
    #[must_use]
    pub fn new(operation: &str, field: &str, data_source: Value, kind: ResolverKind) -> Self {
        Self {
            operation: operation.to_string(),
            field: field.to_string(),
            data_source,
            kind,
        }
    }

    /// Check the operation type
    ///
    /// # Errors
    ///
    /// Returns [`StackError::InvalidOperationType`] unless the operation is
    /// `Query` or `Mutation` (any case)
    pub fn validate(self) -> StackResult<ValidatedResolver> {
        let operation: OperationType = self.operation.parse()?;
        tracing::trace!(%operation, field = %self.field, "resolver validated");
        Ok(ValidatedResolver {
            operation,
            field: self.field,
            data_source: self.data_source,
            kind: self.kind,
        })
    }
}

/// A binding with a known operation type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedResolver {
    /// Operation type
    pub operation: OperationType,
    /// Field name
    pub field: String,
    /// Data source serving the field
    pub data_source: Value,
    /// Resolver kind
    pub kind: ResolverKind,
}

impl ValidatedResolver {
    /// Load both mapping documents
    ///
    /// # Errors
    ///
    /// Returns [`StackError::Asset`] if either document cannot be read
    pub fn load(
        self,
        templates: &TemplateResolver,
        category: ResolverCategory<'_>,
    ) -> StackResult<LoadedResolver> {
        let MappingTemplates { request, response } =
            templates.resolve_pair(category, self.operation, &self.field)?;
        tracing::trace!(
            operation = %self.operation,
            field = %self.field,
            "resolver templates loaded"
        );
        Ok(LoadedResolver {
            operation: self.operation,
            field: self.field,
            data_source: self.data_source,
            kind: self.kind,
            request,
            response,
        })
    }
}

/// A binding ready to be attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedResolver {
    /// Operation type
    pub operation: OperationType,
    /// Field name
    pub field: String,
    /// Data source serving the field
    pub data_source: Value,
    /// Resolver kind
    pub kind: ResolverKind,
    /// Request mapping document
    pub request: String,
    /// Response mapping document
    pub response: String,
}

/// Field names of the template-backed resolvers matching `pattern`
///
/// Names are sorted and unique. Every returned field has both documents
/// in `template_resolvers/<operation>/`. When the pattern selects
/// request documents, every response document selected by the twin
/// pattern must have a request document too.
///
/// # Errors
///
/// Returns [`StackError::IncompleteResolverPair`] for the first field
/// missing half of its pair, or [`StackError::Asset`] if listing fails
pub fn discover_template_fields(
    loader: &AssetLoader,
    operation: OperationType,
    pattern: Option<&str>,
) -> StackResult<Vec<String>> {
    let pattern = pattern.map_or_else(|| default_search_pattern(operation), str::to_string);

    let mut fields = BTreeSet::new();
    for path in loader.glob(&pattern)? {
        match templates::field_name(&path, REQUEST_SUFFIX) {
            Some(field) => {
                tracing::debug!(%operation, field, "discovered template resolver");
                fields.insert(field.to_string());
            }
            None => tracing::warn!(%path, "ignoring match without {} suffix", REQUEST_SUFFIX),
        }
    }

    let dir = TemplateResolver::path(ResolverCategory::Template, operation, "");
    let present: BTreeSet<String> = loader
        .glob(&format!("template_resolvers/{}/*", operation.dir_name()))?
        .into_iter()
        .collect();
    let require = |file: String, missing: PairSide, field: &str| -> StackResult<()> {
        let path = dir.join(&file);
        let key = format!("template_resolvers/{}/{}", operation.dir_name(), file);
        if present.contains(&key) {
            Ok(())
        } else {
            Err(StackError::IncompleteResolverPair {
                operation,
                field: field.to_string(),
                missing,
                path,
            })
        }
    };

    for field in &fields {
        require(request_file(field), PairSide::Request, field)?;
        require(response_file(field), PairSide::Response, field)?;
    }

    if let Some(prefix) = pattern.strip_suffix(REQUEST_SUFFIX) {
        let twin = format!("{}{}", prefix, RESPONSE_SUFFIX);
        for path in loader.glob(&twin)? {
            if let Some(field) = templates::field_name(&path, RESPONSE_SUFFIX) {
                if !fields.contains(field) {
                    return Err(StackError::IncompleteResolverPair {
                        operation,
                        field: field.to_string(),
                        missing: PairSide::Request,
                        path: dir.join(request_file(field)),
                    });
                }
            }
        }
    }

    Ok(fields.into_iter().collect())
}

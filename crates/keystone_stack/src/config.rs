//! Project configuration.
//!
//! The project marker file doubles as the configuration document. Every
//! field is optional; an empty `{}` yields a stack with a query/mutation
//! template pass and no compute resolvers.

use crate::error::{StackError, StackResult};
use keystone_assets::{DEFAULT_ASSETS_DIR, ProjectRoot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Stack configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StackConfig {
    /// Stack name, used as the root of every logical id
    pub name: String,
    /// Prefix of physical names
    pub prefix: String,
    /// Region of the table data source
    pub region: String,
    /// Assets directory, relative to the project root
    pub assets_dir: String,
    /// Schema document, relative to the assets directory
    pub schema_path: String,
    /// Backing table
    pub table: TableConfig,
    /// Request authorizer function
    pub authorizer: FunctionConfig,
    /// Discovery pattern for query resolvers
    pub query_resolver_pattern: Option<String>,
    /// Discovery pattern for mutation resolvers
    pub mutation_resolver_pattern: Option<String>,
    /// Function-backed resolvers
    pub compute_resolvers: Vec<ComputeResolverConfig>,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            name: "keystone".to_string(),
            prefix: "dev".to_string(),
            region: "us-east-1".to_string(),
            assets_dir: DEFAULT_ASSETS_DIR.to_string(),
            schema_path: "schema/schema.graphql".to_string(),
            table: TableConfig::default(),
            authorizer: FunctionConfig::default(),
            query_resolver_pattern: None,
            mutation_resolver_pattern: None,
            compute_resolvers: Vec::new(),
        }
    }
}

impl StackConfig {
    /// Parse a configuration document
    ///
    /// # Errors
    ///
    /// Returns [`StackError::Config`] if the document is malformed
    pub fn from_json(path: &Path, json: &str) -> StackResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| StackError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        config.check(path)?;
        Ok(config)
    }

    /// Read the marker file of `root`
    ///
    /// # Errors
    ///
    /// Returns [`StackError::Config`] if the file cannot be read or parsed
    pub fn load(root: &ProjectRoot) -> StackResult<Self> {
        let path = root.marker_path();
        let json = std::fs::read_to_string(&path).map_err(|e| StackError::Config {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Self::from_json(&path, &json)
    }

    /// Physical name of a resource, `<prefix>-<suffix>`
    #[must_use]
    pub fn physical_name(&self, suffix: &str) -> String {
        format!("{}-{}", self.prefix, suffix)
    }

    /// Table name, defaulting to `<prefix>-table`
    #[must_use]
    pub fn table_name(&self) -> String {
        self.table
            .name
            .clone()
            .unwrap_or_else(|| self.physical_name("table"))
    }

    fn check(&self, path: &Path) -> StackResult<()> {
        let invalid = |reason: String| StackError::Config {
            path: path.to_path_buf(),
            reason,
        };
        if self.name.is_empty() {
            return Err(invalid("name must not be empty".to_string()));
        }
        if self.prefix.is_empty() {
            return Err(invalid("prefix must not be empty".to_string()));
        }
        for resolver in &self.compute_resolvers {
            if resolver.field.is_empty() {
                return Err(invalid(format!(
                    "compute resolver under {} has an empty field",
                    resolver.operation
                )));
            }
        }
        Ok(())
    }
}

/// Backing table settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TableConfig {
    /// Physical table name
    pub name: Option<String>,
    /// Partition key attribute
    pub partition_key: String,
    /// Sort key attribute
    pub sort_key: Option<String>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            name: None,
            partition_key: "pk".to_string(),
            sort_key: Some("sk".to_string()),
        }
    }
}

/// Function settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FunctionConfig {
    /// Code asset path, relative to the assets directory
    pub src: String,
    /// Runtime identifier
    pub runtime: String,
    /// Layer ARNs
    pub layers: Vec<String>,
    /// Environment variables
    pub env: BTreeMap<String, String>,
    /// Secret reference
    pub secret: Option<String>,
}

impl Default for FunctionConfig {
    fn default() -> Self {
        Self {
            src: "authorizer".to_string(),
            runtime: "python3.12".to_string(),
            layers: Vec::new(),
            env: BTreeMap::new(),
            secret: None,
        }
    }
}

/// A function-backed resolver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComputeResolverConfig {
    /// Operation type, checked when the resolver is attached
    pub operation: String,
    /// Field name
    pub field: String,
    /// Code asset path, defaulting to
    /// `compute_resolvers/<operation>/<field>`
    #[serde(default)]
    pub src: Option<String>,
    /// Runtime identifier, defaulting to the authorizer's
    #[serde(default)]
    pub runtime: Option<String>,
}

impl ComputeResolverConfig {
    /// Code asset path
    #[must_use]
    pub fn code_path(&self) -> String {
        self.src.clone().unwrap_or_else(|| {
            format!(
                "compute_resolvers/{}/{}",
                self.operation.to_ascii_lowercase(),
                self.field
            )
        })
    }
}

//! Typed resource declarations.
//!
//! Each [`ResourceKind`] carries the properties the deployment tool needs
//! to materialize it. Properties that point at another resource are
//! [`Value::Ref`]s; [`ResourceKind::references`] enumerates them so the
//! graph can turn every reference into an explicit edge.

use keystone_core::{LogicalId, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Resource kind - type and properties of a declared resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "properties")]
pub enum ResourceKind {
    /// Key-value table backing the API
    Table {
        /// Physical table name
        table_name: String,
        /// Partition key
        partition_key: KeyAttribute,
        /// Optional sort key
        sort_key: Option<KeyAttribute>,
        /// Billing mode
        billing_mode: String,
    },
    /// Access-control identity
    Role {
        /// Service principal allowed to assume the role
        assumed_by: String,
        /// Attached managed policies
        managed_policy_arns: Vec<String>,
        /// Inline policy statements
        statements: Vec<PolicyStatement>,
    },
    /// Isolation context for a function
    NetworkBinding {
        /// Display name of the owning function
        name: Option<String>,
    },
    /// Managed function
    Function {
        /// Physical function name
        function_name: Option<String>,
        /// Code asset path, relative to the assets directory
        code: String,
        /// Entry point
        handler: String,
        /// Runtime identifier
        runtime: String,
        /// Attached layer ARNs
        layers: Vec<String>,
        /// Environment variables
        environment: BTreeMap<String, String>,
        /// Network handle
        vpc_id: Value,
        /// Subnet handles
        subnet_ids: Value,
        /// Security boundary handles
        security_group_ids: Vec<Value>,
        /// Whether placement in a public subnet is allowed
        allow_public_subnet: bool,
        /// Execution timeout in seconds
        timeout_seconds: u32,
        /// Memory in megabytes
        memory_mb: u32,
        /// Execution role
        role: Option<Value>,
    },
    /// GraphQL API surface
    GraphqlApi {
        /// API name
        name: String,
        /// Authentication mode
        authentication_type: String,
        /// Request authorizer
        lambda_authorizer: LambdaAuthorizerConfig,
        /// Logging configuration
        log_config: LogConfig,
    },
    /// Schema attached to an API
    GraphqlSchema {
        /// Owning API
        api_id: Value,
        /// Schema document
        definition: String,
    },
    /// Data source attached to an API
    DataSource {
        /// Owning API
        api_id: Value,
        /// Data source name
        name: String,
        /// Backend configuration
        config: DataSourceConfig,
        /// Role the API assumes to reach the backend
        service_role_arn: Value,
    },
    /// Field resolver
    Resolver {
        /// Owning API
        api_id: Value,
        /// Operation type (`Query` or `Mutation`)
        type_name: String,
        /// Field name
        field_name: String,
        /// Data source serving the field
        data_source_name: Value,
        /// Resolver kind (`UNIT` or `PIPELINE`)
        kind: String,
        /// Request mapping document
        request_mapping_template: String,
        /// Response mapping document
        response_mapping_template: String,
    },
}

impl ResourceKind {
    /// Short type name
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Table { .. } => "Table",
            Self::Role { .. } => "Role",
            Self::NetworkBinding { .. } => "NetworkBinding",
            Self::Function { .. } => "Function",
            Self::GraphqlApi { .. } => "GraphqlApi",
            Self::GraphqlSchema { .. } => "GraphqlSchema",
            Self::DataSource { .. } => "DataSource",
            Self::Resolver { .. } => "Resolver",
        }
    }

    /// Every node this resource reads an attribute from, in property order
    #[must_use]
    pub fn references(&self) -> Vec<&LogicalId> {
        let values: Vec<&Value> = match self {
            Self::Table { .. } | Self::NetworkBinding { .. } => Vec::new(),
            Self::Role { statements, .. } => statements
                .iter()
                .flat_map(|s| s.resources.iter())
                .collect(),
            Self::Function {
                vpc_id,
                subnet_ids,
                security_group_ids,
                role,
                ..
            } => [vpc_id, subnet_ids]
                .into_iter()
                .chain(security_group_ids.iter())
                .chain(role.iter())
                .collect(),
            Self::GraphqlApi {
                lambda_authorizer,
                log_config,
                ..
            } => vec![&lambda_authorizer.authorizer_uri, &log_config.role_arn],
            Self::GraphqlSchema { api_id, .. } => vec![api_id],
            Self::DataSource {
                api_id,
                config,
                service_role_arn,
                ..
            } => {
                let mut v = vec![api_id];
                if let DataSourceConfig::Lambda { function_arn } = config {
                    v.push(function_arn);
                }
                v.push(service_role_arn);
                v
            }
            Self::Resolver {
                api_id,
                data_source_name,
                ..
            } => vec![api_id, data_source_name],
        };

        let mut out: Vec<&LogicalId> = Vec::new();
        for id in values.into_iter().filter_map(Value::node) {
            if !out.contains(&id) {
                out.push(id);
            }
        }
        out
    }
}

/// Table key attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyAttribute {
    /// Attribute name
    pub name: String,
    /// Attribute type (`S`, `N` or `B`)
    pub attribute_type: String,
}

impl KeyAttribute {
    /// String-typed key
    #[must_use]
    pub fn string(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attribute_type: "S".to_string(),
        }
    }
}

/// Inline policy statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyStatement {
    /// Allowed actions
    pub actions: Vec<String>,
    /// Resources the actions apply to
    pub resources: Vec<Value>,
}

impl PolicyStatement {
    /// Allow `actions` on `resources`
    #[must_use]
    pub fn allow<I, S>(actions: I, resources: Vec<Value>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            actions: actions.into_iter().map(Into::into).collect(),
            resources,
        }
    }
}

/// Lambda authorization settings of an API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LambdaAuthorizerConfig {
    /// How long an authorization result is cached
    pub result_ttl_seconds: u32,
    /// Authorizer function
    pub authorizer_uri: Value,
}

/// Logging settings of an API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Identity used to push logs
    pub role_arn: Value,
    /// Whether verbose request/response content is dropped
    pub exclude_verbose_content: bool,
    /// Field log level
    pub field_log_level: String,
}

/// Data source backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend")]
pub enum DataSourceConfig {
    /// Table-backed
    DynamoDb {
        /// Table region
        region: String,
        /// Table name
        table_name: String,
    },
    /// Compute-backed
    Lambda {
        /// Function invoked for every request
        function_arn: Value,
    },
}

impl DataSourceConfig {
    /// Data source type as the API expects it
    #[must_use]
    pub fn source_type(&self) -> &'static str {
        match self {
            Self::DynamoDb { .. } => "AMAZON_DYNAMODB",
            Self::Lambda { .. } => "AWS_LAMBDA",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keystone_core::Attribute;

    fn id(s: &str) -> LogicalId {
        LogicalId::new(s).unwrap()
    }

    #[test]
    fn test_table_has_no_references() {
        let table = ResourceKind::Table {
            table_name: "items".to_string(),
            partition_key: KeyAttribute::string("pk"),
            sort_key: None,
            billing_mode: "PAY_PER_REQUEST".to_string(),
        };
        assert!(table.references().is_empty());
        assert_eq!(table.type_name(), "Table");
    }

    #[test]
    fn test_resolver_references() {
        let api = id("s/api/graphql-api");
        let ds = id("s/api/datasource");
        let resolver = ResourceKind::Resolver {
            api_id: Value::reference(&api, Attribute::ApiId),
            type_name: "Query".to_string(),
            field_name: "getUser".to_string(),
            data_source_name: Value::reference(&ds, Attribute::Name),
            kind: "UNIT".to_string(),
            request_mapping_template: String::new(),
            response_mapping_template: String::new(),
        };
        assert_eq!(resolver.references(), vec![&api, &ds]);
    }

    #[test]
    fn test_references_deduplicated() {
        let net = id("s/fn/networking");
        let function = ResourceKind::Function {
            function_name: None,
            code: "authorizer".to_string(),
            handler: "handler.lambda_handler".to_string(),
            runtime: "python3.12".to_string(),
            layers: Vec::new(),
            environment: BTreeMap::new(),
            vpc_id: Value::reference(&net, Attribute::VpcId),
            subnet_ids: Value::reference(&net, Attribute::SubnetIds),
            security_group_ids: vec![Value::reference(&net, Attribute::SecurityGroupId)],
            allow_public_subnet: false,
            timeout_seconds: 900,
            memory_mb: 1024,
            role: None,
        };
        assert_eq!(function.references(), vec![&net]);
    }

    #[test]
    fn test_lambda_data_source_references_function() {
        let api = id("s/api/graphql-api");
        let f = id("s/fn/lambda");
        let role = id("s/api/role");
        let ds = ResourceKind::DataSource {
            api_id: Value::reference(&api, Attribute::ApiId),
            name: "graphqldatasourcex".to_string(),
            config: DataSourceConfig::Lambda {
                function_arn: Value::reference(&f, Attribute::Arn),
            },
            service_role_arn: Value::reference(&role, Attribute::Arn),
        };
        assert_eq!(ds.references(), vec![&api, &f, &role]);
    }

    #[test]
    fn test_resource_kind_serde_tagging() {
        let kind = ResourceKind::NetworkBinding {
            name: Some("authorizer".to_string()),
        };
        let json = serde_json::to_value(&kind).unwrap();
        assert_eq!(json["type"], "NetworkBinding");
        assert_eq!(json["properties"]["name"], "authorizer");
    }

    #[test]
    fn test_source_type() {
        let cfg = DataSourceConfig::DynamoDb {
            region: "eu-west-1".to_string(),
            table_name: "t".to_string(),
        };
        assert_eq!(cfg.source_type(), "AMAZON_DYNAMODB");
    }
}

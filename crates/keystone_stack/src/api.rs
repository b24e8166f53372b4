//! GraphQL API construct.
//!
//! The API owns its logging identity, the API resource, the schema, and
//! every data source and resolver attached to it. Resolver ids are
//! namespaced by operation type so the same field name may appear under
//! both `Query` and `Mutation`.

use crate::compute::ComputeNode;
use crate::error::StackResult;
use crate::resolver::{
    LoadedResolver, ResolverDeclaration, ResolverKind, discover_template_fields,
};
use keystone_assets::{ResolverCategory, TemplateResolver};
use keystone_core::{Attribute, LogicalId, OperationType, Value};
use keystone_graph::{
    DataSourceConfig, LambdaAuthorizerConfig, LogConfig, Node, PolicyStatement, ResourceGraph,
    ResourceKind,
};

/// Service principal the API assumes roles as
pub const API_SERVICE_PRINCIPAL: &str = "appsync.amazonaws.com";

/// Managed policy letting the API push logs
pub const LOG_POLICY_ARN: &str =
    "arn:aws:iam::aws:policy/service-role/AWSAppSyncPushToCloudwatchLogs";

/// How long an authorization result is cached, in seconds
pub const AUTHORIZER_RESULT_TTL_SECONDS: u32 = 300;

/// Name of the table-backed data source
pub const DATA_SOURCE_NAME: &str = "graphqldatasource";

/// A declared data source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSourceHandle {
    /// Data source node
    pub id: LogicalId,
}

impl DataSourceHandle {
    /// Name of the data source, as resolvers refer to it
    #[must_use]
    pub fn name(&self) -> Value {
        Value::reference(&self.id, Attribute::Name)
    }
}

/// API surface with schema, data sources and resolvers
#[derive(Debug, Clone)]
pub struct ApiNode {
    /// Construct id
    pub id: LogicalId,
    /// API name
    pub name: String,
    /// Logging identity
    pub log_role_id: LogicalId,
    /// API resource
    pub api_id: LogicalId,
    /// Schema resource
    pub schema_id: LogicalId,
    templates: TemplateResolver,
}

impl ApiNode {
    /// Declare an API under `parent/cid`
    ///
    /// The API is ordered after `authorizer`; the schema is loaded from
    /// `schema_path` with newlines stripped.
    ///
    /// # Errors
    ///
    /// Returns error if the schema is missing or an id is taken
    pub fn new(
        graph: &mut ResourceGraph,
        templates: TemplateResolver,
        parent: &LogicalId,
        cid: &str,
        name: &str,
        schema_path: &str,
        authorizer: &ComputeNode,
    ) -> StackResult<Self> {
        let id = parent.child(cid)?;
        let definition = templates.loader().load(schema_path, true)?;

        let log_role_id = id.child("log-role")?;
        let api_id = id.child("graphql-api")?;
        let schema_id = id.child("graphql-schema")?;

        let log_role = Node::new(
            log_role_id.clone(),
            ResourceKind::Role {
                assumed_by: API_SERVICE_PRINCIPAL.to_string(),
                managed_policy_arns: vec![LOG_POLICY_ARN.to_string()],
                statements: Vec::new(),
            },
        );

        let api = Node::new(
            api_id.clone(),
            ResourceKind::GraphqlApi {
                name: name.to_string(),
                authentication_type: "AWS_LAMBDA".to_string(),
                lambda_authorizer: LambdaAuthorizerConfig {
                    result_ttl_seconds: AUTHORIZER_RESULT_TTL_SECONDS,
                    authorizer_uri: authorizer.function_arn(),
                },
                log_config: LogConfig {
                    role_arn: Value::reference(&log_role_id, Attribute::Arn),
                    exclude_verbose_content: false,
                    field_log_level: "ALL".to_string(),
                },
            },
        )
        .with_dependency(&authorizer.function_id);

        let schema = Node::new(
            schema_id.clone(),
            ResourceKind::GraphqlSchema {
                api_id: Value::reference(&api_id, Attribute::ApiId),
                definition,
            },
        );

        graph.commit(vec![log_role, api, schema])?;
        tracing::debug!(api = %api_id, name, "declared api");

        Ok(Self {
            id,
            name: name.to_string(),
            log_role_id,
            api_id,
            schema_id,
            templates,
        })
    }

    /// Reference to the generated API id
    #[must_use]
    pub fn api_ref(&self) -> Value {
        Value::reference(&self.api_id, Attribute::ApiId)
    }

    /// Declare the table-backed data source
    ///
    /// # Errors
    ///
    /// Returns error if the data source is already declared
    pub fn add_data_source(
        &self,
        graph: &mut ResourceGraph,
        table_name: &str,
        region: &str,
        access_role_arn: Value,
    ) -> StackResult<DataSourceHandle> {
        let id = self.id.child("datasource")?;
        graph.add_node(Node::new(
            id.clone(),
            ResourceKind::DataSource {
                api_id: self.api_ref(),
                name: DATA_SOURCE_NAME.to_string(),
                config: DataSourceConfig::DynamoDb {
                    region: region.to_string(),
                    table_name: table_name.to_string(),
                },
                service_role_arn: access_role_arn,
            },
        ))?;
        Ok(DataSourceHandle { id })
    }

    /// Discover and attach every template-backed resolver of `operation`
    ///
    /// Fields are discovered with `search_pattern`, or
    /// `template_resolvers/<operation>/*_request.vtl` when absent, and
    /// attached in sorted order. Nothing is attached unless every field
    /// has both documents. Returns the attached resolver ids.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StackError::InvalidOperationType`],
    /// [`crate::StackError::IncompleteResolverPair`] or
    /// [`crate::StackError::Asset`]; the graph is unchanged on error
    pub fn add_template_resolvers(
        &self,
        graph: &mut ResourceGraph,
        operation: &str,
        data_source_name: Value,
        search_pattern: Option<&str>,
        kind: ResolverKind,
    ) -> StackResult<Vec<LogicalId>> {
        let op: OperationType = operation.parse()?;
        let fields = discover_template_fields(self.templates.loader(), op, search_pattern)?;

        let mut nodes = Vec::with_capacity(fields.len());
        for field in &fields {
            let loaded = ResolverDeclaration::new(operation, field, data_source_name.clone(), kind)
                .validate()?
                .load(&self.templates, ResolverCategory::Template)?;
            nodes.push(self.resolver_node(loaded)?);
        }

        let ids: Vec<LogicalId> = nodes.iter().map(|n| n.id.clone()).collect();
        graph.commit(nodes)?;
        tracing::info!(operation = %op, count = ids.len(), "attached template resolvers");
        Ok(ids)
    }

    /// Attach one resolver backed directly by a function
    ///
    /// Declares a role allowed to invoke exactly `compute_arn`, a
    /// function-backed data source using it, and the resolver. The
    /// documents are read from
    /// `compute_resolvers/<operation>/<field>/mapping_templates/`.
    /// Returns the resolver id.
    ///
    /// # Errors
    ///
    /// Returns error if the operation type is invalid, a document is
    /// missing, or an id is taken; the graph is unchanged on error
    pub fn add_compute_resolver(
        &self,
        graph: &mut ResourceGraph,
        operation: &str,
        field: &str,
        compute_arn: Value,
    ) -> StackResult<LogicalId> {
        let role_id = self.id.child(&format!("graphql-resolver-role-{}", field))?;
        let data_source_id = self.id.child(&format!("graphql-datasource-{}", field))?;
        let data_source = DataSourceHandle {
            id: data_source_id.clone(),
        };

        let loaded =
            ResolverDeclaration::new(operation, field, data_source.name(), ResolverKind::Unit)
                .validate()?
            .load(
                &self.templates,
                ResolverCategory::Compute {
                    resolver_name: field,
                },
            )?;

        let role = Node::new(
            role_id.clone(),
            ResourceKind::Role {
                assumed_by: API_SERVICE_PRINCIPAL.to_string(),
                managed_policy_arns: Vec::new(),
                statements: vec![PolicyStatement::allow(
                    ["lambda:InvokeFunction"],
                    vec![compute_arn.clone()],
                )],
            },
        );
        let ds = Node::new(
            data_source_id,
            ResourceKind::DataSource {
                api_id: self.api_ref(),
                name: format!("{}{}", DATA_SOURCE_NAME, field),
                config: DataSourceConfig::Lambda {
                    function_arn: compute_arn,
                },
                service_role_arn: Value::reference(&role_id, Attribute::Arn),
            },
        );
        let op = loaded.operation;
        let resolver = self.resolver_node(loaded)?;
        let resolver_id = resolver.id.clone();

        graph.commit(vec![role, ds, resolver])?;
        tracing::info!(operation = %op, field, "attached compute resolver");
        Ok(resolver_id)
    }

    /// Resolver node ordered after the API and the schema
    fn resolver_node(&self, loaded: LoadedResolver) -> StackResult<Node> {
        let id = self.id.child(&format!(
            "graphql-resolver-{}-{}",
            loaded.operation.dir_name(),
            loaded.field
        ))?;
        tracing::trace!(resolver = %id, "resolver edges attached");
        Ok(Node::new(
            id,
            ResourceKind::Resolver {
                api_id: self.api_ref(),
                type_name: loaded.operation.to_string(),
                field_name: loaded.field,
                data_source_name: loaded.data_source,
                kind: loaded.kind.as_str().to_string(),
                request_mapping_template: loaded.request,
                response_mapping_template: loaded.response,
            },
        )
        .with_dependency(&self.api_id)
        .with_dependency(&self.schema_id))
    }
}

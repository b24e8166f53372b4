//! Composition root.
//!
//! Assembly order: table, function role, authorizer, API, store access
//! role, data source, query pass, mutation pass, compute resolvers. Any
//! failure aborts the whole build and no stack is returned.

use crate::api::{ApiNode, DataSourceHandle};
use crate::compute::{ComputeNode, ComputeProps};
use crate::config::{FunctionConfig, StackConfig};
use crate::error::{StackError, StackResult};
use crate::network::{DefaultNetwork, NetworkProvider};
use crate::resolver::ResolverKind;
use keystone_assets::{AssetLoader, ProjectRoot, TemplateResolver};
use keystone_core::{Attribute, LogicalId, OperationType, Value};
use keystone_graph::{
    KeyAttribute, Manifest, Node, PolicyStatement, ResourceGraph, ResourceKind, Validator,
};

/// Service principal functions assume roles as
pub const FUNCTION_SERVICE_PRINCIPAL: &str = "lambda.amazonaws.com";

/// Managed policies attached to the shared function role
pub const FUNCTION_MANAGED_POLICIES: [&str; 2] = [
    "arn:aws:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole",
    "arn:aws:iam::aws:policy/service-role/AWSLambdaVPCAccessExecutionRole",
];

/// Table actions granted to the API
pub const TABLE_ACTIONS: [&str; 11] = [
    "dynamodb:UpdateTable",
    "dynamodb:Query",
    "dynamodb:DescribeTable",
    "dynamodb:BatchGetItem",
    "dynamodb:GetItem",
    "dynamodb:GetRecords",
    "dynamodb:Scan",
    "dynamodb:BatchWriteItem",
    "dynamodb:ConditionCheckItem",
    "dynamodb:UpdateItem",
    "dynamodb:PutItem",
];

/// A fully assembled stack
#[derive(Debug)]
pub struct Stack {
    config: StackConfig,
    id: LogicalId,
    graph: ResourceGraph,
    table_id: LogicalId,
    api: ApiNode,
    data_source: DataSourceHandle,
    resolvers: Vec<LogicalId>,
}

impl Stack {
    /// Load the configuration of `root` and assemble from its assets
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is unusable or assembly fails
    pub fn from_root(root: &ProjectRoot) -> StackResult<Self> {
        let config = StackConfig::load(root)?;
        let loader = AssetLoader::filesystem(root, &config.assets_dir);
        Self::assemble(config, loader)
    }

    /// Assemble with the default network binding
    ///
    /// # Errors
    ///
    /// Returns the first error raised by any construct
    pub fn assemble(config: StackConfig, loader: AssetLoader) -> StackResult<Self> {
        Self::assemble_with_network(config, loader, &DefaultNetwork)
    }

    /// Assemble with a custom network binding
    ///
    /// # Errors
    ///
    /// Returns the first error raised by any construct
    pub fn assemble_with_network(
        config: StackConfig,
        loader: AssetLoader,
        network: &dyn NetworkProvider,
    ) -> StackResult<Self> {
        let id = LogicalId::new(&config.name)?;
        let mut graph = ResourceGraph::new();
        let templates = TemplateResolver::new(loader);

        let table_id = id.child("table")?;
        let table_name = config.table_name();
        graph.add_node(Node::new(
            table_id.clone(),
            ResourceKind::Table {
                table_name: table_name.clone(),
                partition_key: KeyAttribute::string(&config.table.partition_key),
                sort_key: config.table.sort_key.as_deref().map(KeyAttribute::string),
                billing_mode: "PAY_PER_REQUEST".to_string(),
            },
        ))?;

        let function_role_id = id.child("function-role")?;
        graph.add_node(Node::new(
            function_role_id.clone(),
            ResourceKind::Role {
                assumed_by: FUNCTION_SERVICE_PRINCIPAL.to_string(),
                managed_policy_arns: FUNCTION_MANAGED_POLICIES.map(str::to_string).to_vec(),
                statements: Vec::new(),
            },
        ))?;
        let function_role = Value::reference(&function_role_id, Attribute::Arn);

        let authorizer = ComputeNode::new(
            &mut graph,
            network,
            &id,
            "authorizer",
            function_props(&config.authorizer, function_role.clone())
                .with_name(config.physical_name("authorizer")),
        )?;

        let api = ApiNode::new(
            &mut graph,
            templates,
            &id,
            &format!("{}-appsync", config.name),
            &config.physical_name("api"),
            &config.schema_path,
            &authorizer,
        )?;

        let access_role_id = id.child("graphql-dynamo-role")?;
        graph.add_node(Node::new(
            access_role_id.clone(),
            ResourceKind::Role {
                assumed_by: crate::api::API_SERVICE_PRINCIPAL.to_string(),
                managed_policy_arns: Vec::new(),
                statements: vec![PolicyStatement::allow(
                    TABLE_ACTIONS,
                    vec![Value::reference(&table_id, Attribute::Arn)],
                )],
            },
        ))?;

        let data_source = api.add_data_source(
            &mut graph,
            &table_name,
            &config.region,
            Value::reference(&access_role_id, Attribute::Arn),
        )?;
        graph.add_dependency(&data_source.id, &table_id)?;

        let mut resolvers = api.add_template_resolvers(
            &mut graph,
            OperationType::Query.as_str(),
            data_source.name(),
            config.query_resolver_pattern.as_deref(),
            ResolverKind::Unit,
        )?;
        resolvers.extend(api.add_template_resolvers(
            &mut graph,
            OperationType::Mutation.as_str(),
            data_source.name(),
            config.mutation_resolver_pattern.as_deref(),
            ResolverKind::Unit,
        )?);

        for resolver in &config.compute_resolvers {
            let operation: OperationType = resolver.operation.parse()?;
            let runtime = resolver
                .runtime
                .clone()
                .unwrap_or_else(|| config.authorizer.runtime.clone());
            let props = ComputeProps::new(resolver.code_path(), runtime)
                .with_name(config.physical_name(&resolver.field))
                .with_role(function_role.clone());
            let compute = ComputeNode::new(
                &mut graph,
                network,
                &id,
                &format!("{}-{}", operation.dir_name(), resolver.field),
                props,
            )?;
            resolvers.push(api.add_compute_resolver(
                &mut graph,
                operation.as_str(),
                &resolver.field,
                compute.function_arn(),
            )?);
        }

        tracing::info!(
            stack = %id,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            resolvers = resolvers.len(),
            "assembled stack"
        );

        Ok(Self {
            config,
            id,
            graph,
            table_id,
            api,
            data_source,
            resolvers,
        })
    }

    /// Validate the graph and produce the manifest
    ///
    /// # Errors
    ///
    /// Returns [`StackError::Invalid`] with every problem found, or
    /// [`StackError::Graph`] if encoding fails
    pub fn synth(&self) -> StackResult<Manifest> {
        Validator::new()
            .validate(&self.graph)
            .map_err(StackError::Invalid)?;
        let manifest = Manifest::from_graph(self.id.as_str(), &self.graph)?;
        tracing::info!(
            stack = %self.id,
            resources = manifest.resources.len(),
            fingerprint = %manifest.fingerprint,
            "synthesized manifest"
        );
        Ok(manifest)
    }

    /// Stack id
    #[must_use]
    pub fn id(&self) -> &LogicalId {
        &self.id
    }

    /// Configuration the stack was assembled from
    #[must_use]
    pub fn config(&self) -> &StackConfig {
        &self.config
    }

    /// Assembled graph
    #[must_use]
    pub fn graph(&self) -> &ResourceGraph {
        &self.graph
    }

    /// Table node
    #[must_use]
    pub fn table_id(&self) -> &LogicalId {
        &self.table_id
    }

    /// API construct
    #[must_use]
    pub fn api(&self) -> &ApiNode {
        &self.api
    }

    /// Table-backed data source
    #[must_use]
    pub fn data_source(&self) -> &DataSourceHandle {
        &self.data_source
    }

    /// Every attached resolver, in attachment order
    #[must_use]
    pub fn resolvers(&self) -> &[LogicalId] {
        &self.resolvers
    }
}

fn function_props(config: &FunctionConfig, role: Value) -> ComputeProps {
    let mut props = ComputeProps::new(config.src.clone(), config.runtime.clone())
        .with_layers(config.layers.clone())
        .with_role(role);
    if !config.env.is_empty() {
        props = props.with_env(config.env.clone());
    }
    if let Some(secret) = &config.secret {
        props = props.with_secret(secret.clone());
    }
    props
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ComputeResolverConfig;
    use crate::error::PairSide;
    use keystone_assets::MemoryAssets;
    use tempfile::TempDir;

    fn assets() -> MemoryAssets {
        MemoryAssets::new()
            .with_file("schema/schema.graphql", "type Query {\n  getUser: User\n}\n")
            .with_file("template_resolvers/query/getUser_request.vtl", "{}")
            .with_file("template_resolvers/query/getUser_response.vtl", "{}")
            .with_file("template_resolvers/query/listUsers_request.vtl", "{}")
            .with_file("template_resolvers/query/listUsers_response.vtl", "{}")
            .with_file("template_resolvers/mutation/createUser_request.vtl", "{}")
            .with_file("template_resolvers/mutation/createUser_response.vtl", "{}")
            .with_file(
                "compute_resolvers/mutation/deleteUser/mapping_templates/deleteUser_request.vtl",
                "{}",
            )
            .with_file(
                "compute_resolvers/mutation/deleteUser/mapping_templates/deleteUser_response.vtl",
                "{}",
            )
    }

    fn config() -> StackConfig {
        StackConfig {
            compute_resolvers: vec![ComputeResolverConfig {
                operation: "Mutation".to_string(),
                field: "deleteUser".to_string(),
                src: None,
                runtime: None,
            }],
            ..StackConfig::default()
        }
    }

    #[test]
    fn test_assemble_and_synth() {
        let stack = Stack::assemble(config(), AssetLoader::from_store(assets())).unwrap();
        let names: Vec<&str> = stack.resolvers().iter().map(LogicalId::name).collect();
        assert_eq!(
            names,
            vec![
                "graphql-resolver-query-getUser",
                "graphql-resolver-query-listUsers",
                "graphql-resolver-mutation-createUser",
                "graphql-resolver-mutation-deleteUser",
            ]
        );

        for resolver in stack.resolvers() {
            assert!(stack.graph().depends_on(resolver, &stack.api().api_id));
            assert!(stack.graph().depends_on(resolver, &stack.api().schema_id));
        }
        assert!(stack.graph().depends_on(&stack.data_source().id, stack.table_id()));

        let manifest = stack.synth().unwrap();
        assert_eq!(manifest.stack, "keystone");
        assert_eq!(manifest.resources.len(), stack.graph().node_count());
        assert_eq!(manifest.fingerprint.len(), 64);

        let position = |id: &LogicalId| manifest.resources.iter().position(|r| &r.id == id);
        let schema = position(&stack.api().schema_id).unwrap();
        for resolver in stack.resolvers() {
            assert!(position(resolver).unwrap() > schema);
        }
    }

    #[test]
    fn test_access_role_grants_table_actions() {
        let stack = Stack::assemble(config(), AssetLoader::from_store(assets())).unwrap();
        let role = stack.id().child("graphql-dynamo-role").unwrap();
        let Some(ResourceKind::Role { statements, assumed_by, .. }) =
            stack.graph().get(&role).map(|n| &n.kind)
        else {
            panic!("access role missing");
        };
        assert_eq!(assumed_by, "appsync.amazonaws.com");
        assert_eq!(statements[0].actions.len(), 11);
        assert!(stack.graph().depends_on(&role, stack.table_id()));
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let a = Stack::assemble(config(), AssetLoader::from_store(assets()))
            .unwrap()
            .synth()
            .unwrap();
        let b = Stack::assemble(config(), AssetLoader::from_store(assets()))
            .unwrap()
            .synth()
            .unwrap();
        assert_eq!(a.fingerprint, b.fingerprint);
        assert_eq!(a, Manifest::from_json(&a.to_json().unwrap()).unwrap());
    }

    #[test]
    fn test_incomplete_pair_aborts_build() {
        let assets = assets().with_file("template_resolvers/mutation/updateUser_request.vtl", "{}");
        let err = Stack::assemble(config(), AssetLoader::from_store(assets)).unwrap_err();
        assert!(matches!(
            err,
            StackError::IncompleteResolverPair { missing: PairSide::Response, .. }
        ));
    }

    #[test]
    fn test_invalid_compute_operation_aborts_build() {
        let mut config = config();
        config.compute_resolvers[0].operation = "Subscription".to_string();
        let err = Stack::assemble(config, AssetLoader::from_store(assets())).unwrap_err();
        assert!(matches!(err, StackError::InvalidOperationType(_)));
    }

    #[test]
    fn test_missing_schema_aborts_build() {
        let loader = AssetLoader::from_store(MemoryAssets::new());
        let err = Stack::assemble(StackConfig::default(), loader).unwrap_err();
        assert!(matches!(err, StackError::Asset(_)));
    }

    #[test]
    fn test_only_mutations_is_valid() {
        let assets = MemoryAssets::new()
            .with_file("schema/schema.graphql", "type Mutation { a: Int }")
            .with_file("template_resolvers/mutation/a_request.vtl", "{}")
            .with_file("template_resolvers/mutation/a_response.vtl", "{}");
        let stack =
            Stack::assemble(StackConfig::default(), AssetLoader::from_store(assets)).unwrap();
        assert_eq!(stack.resolvers().len(), 1);
        stack.synth().unwrap();
    }

    #[test]
    fn test_from_root_on_disk() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir_all(src.join("schema")).unwrap();
        std::fs::create_dir_all(src.join("template_resolvers/query")).unwrap();
        std::fs::write(dir.path().join("keystone.json"), r#"{ "name": "shop", "prefix": "prod" }"#)
            .unwrap();
        std::fs::write(
            src.join("schema/schema.graphql"),
            "type Query {\r\n  item: Int\r\n}\r\n",
        )
        .unwrap();
        std::fs::write(src.join("template_resolvers/query/item_request.vtl"), "{}\n").unwrap();
        std::fs::write(src.join("template_resolvers/query/item_response.vtl"), "{}\n").unwrap();

        let root =
            ProjectRoot::discover(&src.join("template_resolvers"), keystone_assets::MARKER_FILE)
                .unwrap();
        let stack = Stack::from_root(&root).unwrap();
        assert_eq!(stack.id().as_str(), "shop");
        assert_eq!(stack.resolvers().len(), 1);

        let manifest = stack.synth().unwrap();
        let Some(ResourceKind::GraphqlApi { name, .. }) = manifest
            .resource(&stack.api().api_id)
            .map(|r| &r.resource)
        else {
            panic!("api missing from manifest");
        };
        assert_eq!(name, "prod-api");
    }
}

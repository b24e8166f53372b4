//! Graph validator run before a manifest is handed out.

use crate::graph::ResourceGraph;
use crate::resource::ResourceKind;
use indexmap::IndexSet;
use keystone_core::{LogicalId, Value};

/// Validation error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Cycle detected in the graph
    Cycle { nodes: Vec<LogicalId> },
    /// Edge endpoint is not a declared node
    DanglingEdge { from: LogicalId, to: LogicalId },
    /// A resolver may be materialized before its API or schema
    UnorderedResolver { node_id: LogicalId, missing: String },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cycle { nodes } => write!(f, "Cycle detected involving nodes: {:?}", nodes),
            Self::DanglingEdge { from, to } => {
                write!(f, "Edge {} -> {} points outside the graph", from, to)
            }
            Self::UnorderedResolver { node_id, missing } => {
                write!(f, "Resolver {} is not ordered after its {}", node_id, missing)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validator for graph properties
pub struct Validator {
    /// Require every resolver to depend directly on its API and schema
    pub require_resolver_ordering: bool,
}

impl Validator {
    /// Create a new validator
    #[must_use]
    pub fn new() -> Self {
        Self {
            require_resolver_ordering: true,
        }
    }

    /// Validate a graph, collecting every problem found
    ///
    /// # Errors
    ///
    /// Returns all validation errors if the graph is invalid
    pub fn validate(&self, graph: &ResourceGraph) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        self.check_edges(graph, &mut errors);

        if let Err(e) = self.check_cycles(graph) {
            errors.push(e);
        }

        if self.require_resolver_ordering {
            self.check_resolver_ordering(graph, &mut errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn check_edges(&self, graph: &ResourceGraph, errors: &mut Vec<ValidationError>) {
        for edge in graph.edges() {
            if !graph.contains(&edge.from) || !graph.contains(&edge.to) {
                errors.push(ValidationError::DanglingEdge {
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                });
            }
        }
    }

    /// Check for cycles in the graph
    fn check_cycles(&self, graph: &ResourceGraph) -> Result<(), ValidationError> {
        let mut visited = IndexSet::new();
        let mut rec_stack = IndexSet::new();

        for node in graph.nodes() {
            if self.dfs_cycle(&node.id, graph, &mut visited, &mut rec_stack) {
                return Err(ValidationError::Cycle {
                    nodes: rec_stack.iter().map(|id| (*id).clone()).collect(),
                });
            }
        }

        Ok(())
    }

    /// DFS cycle detection
    fn dfs_cycle<'a>(
        &self,
        node_id: &'a LogicalId,
        graph: &'a ResourceGraph,
        visited: &mut IndexSet<&'a LogicalId>,
        rec_stack: &mut IndexSet<&'a LogicalId>,
    ) -> bool {
        if rec_stack.contains(node_id) {
            return true;
        }
        if visited.contains(node_id) {
            return false;
        }

        visited.insert(node_id);
        rec_stack.insert(node_id);

        for dep_id in graph.dependencies(node_id) {
            if self.dfs_cycle(dep_id, graph, visited, rec_stack) {
                return true;
            }
        }

        rec_stack.shift_remove(node_id);
        false
    }

    fn check_resolver_ordering(&self, graph: &ResourceGraph, errors: &mut Vec<ValidationError>) {
        for node in graph.nodes() {
            let ResourceKind::Resolver { api_id, .. } = &node.kind else {
                continue;
            };
            let Some(api) = api_id.node() else {
                continue;
            };

            if !graph.depends_on(&node.id, api) {
                errors.push(ValidationError::UnorderedResolver {
                    node_id: node.id.clone(),
                    missing: "API".to_string(),
                });
            }

            let ordered_after_schema = graph.dependencies(&node.id).into_iter().any(|dep| {
                matches!(
                    graph.get(dep).map(|n| &n.kind),
                    Some(ResourceKind::GraphqlSchema {
                        api_id: Value::Ref(r),
                        ..
                    }) if &r.node == api
                )
            });
            if !ordered_after_schema {
                errors.push(ValidationError::UnorderedResolver {
                    node_id: node.id.clone(),
                    missing: "schema".to_string(),
                });
            }
        }
    }

    /// Set whether resolver ordering is enforced
    #[must_use]
    pub fn with_resolver_ordering(mut self, require: bool) -> Self {
        self.require_resolver_ordering = require;
        self
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, EdgeKind, Node};
    use crate::resource::KeyAttribute;
    use keystone_core::Attribute;

    fn id(s: &str) -> LogicalId {
        LogicalId::new(s).unwrap()
    }

    fn table(name: &str) -> Node {
        Node::new(
            id(name),
            ResourceKind::Table {
                table_name: name.to_string(),
                partition_key: KeyAttribute::string("pk"),
                sort_key: None,
                billing_mode: "PAY_PER_REQUEST".to_string(),
            },
        )
    }

    fn resolver(name: &str) -> Node {
        Node::new(
            id(name),
            ResourceKind::Resolver {
                api_id: Value::reference(&id("api"), Attribute::ApiId),
                type_name: "Query".to_string(),
                field_name: name.to_string(),
                data_source_name: Value::from("ds"),
                kind: "UNIT".to_string(),
                request_mapping_template: String::new(),
                response_mapping_template: String::new(),
            },
        )
    }

    fn api_with_schema() -> ResourceGraph {
        let mut graph = ResourceGraph::new();
        graph.add_node(table("api")).unwrap();
        graph
            .add_node(Node::new(
                id("schema"),
                ResourceKind::GraphqlSchema {
                    api_id: Value::reference(&id("api"), Attribute::ApiId),
                    definition: String::new(),
                },
            ))
            .unwrap();
        graph
    }

    #[test]
    fn test_validator_new() {
        let validator = Validator::new();
        assert!(validator.require_resolver_ordering);
    }

    #[test]
    fn test_validate_empty_graph() {
        assert!(Validator::new().validate(&ResourceGraph::new()).is_ok());
    }

    #[test]
    fn test_validate_dangling_edge() {
        let mut graph = ResourceGraph::new();
        graph.add_node(table("a")).unwrap();
        graph
            .edges
            .push(Edge::new(id("a"), id("ghost"), EdgeKind::Explicit));

        let errors = Validator::new().validate(&graph).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::DanglingEdge { .. })));
    }

    #[test]
    fn test_validate_cycle() {
        let mut graph = ResourceGraph::new();
        graph.add_node(table("a")).unwrap();
        graph.add_node(table("b")).unwrap();
        graph.edges.push(Edge::new(id("a"), id("b"), EdgeKind::Explicit));
        graph.edges.push(Edge::new(id("b"), id("a"), EdgeKind::Explicit));

        let errors = Validator::new().validate(&graph).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::Cycle { .. })));
    }

    #[test]
    fn test_resolver_without_schema_edge_is_flagged() {
        let mut graph = api_with_schema();
        graph.add_node(resolver("getUser")).unwrap();

        let errors = Validator::new().validate(&graph).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::UnorderedResolver {
                node_id: id("getUser"),
                missing: "schema".to_string(),
            }]
        );

        assert!(Validator::new()
            .with_resolver_ordering(false)
            .validate(&graph)
            .is_ok());
    }

    #[test]
    fn test_resolver_with_both_edges_passes() {
        let mut graph = api_with_schema();
        graph
            .add_node(
                resolver("getUser")
                    .with_dependency(&id("api"))
                    .with_dependency(&id("schema")),
            )
            .unwrap();
        assert!(Validator::new().validate(&graph).is_ok());
    }
}

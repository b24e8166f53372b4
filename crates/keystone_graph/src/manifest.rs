//! Manifest handed to the deployment tool.

use crate::graph::ResourceGraph;
use crate::resource::ResourceKind;
use keystone_core::{CoreError, CoreResult, LogicalId};
use serde::{Deserialize, Serialize};

/// One resource declaration in materialization order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestResource {
    /// Logical id
    pub id: LogicalId,
    /// Type and properties
    pub resource: ResourceKind,
    /// Direct dependencies, sorted
    pub depends_on: Vec<LogicalId>,
}

/// Synthesized stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Stack name
    pub stack: String,
    /// Resources, dependencies first
    pub resources: Vec<ManifestResource>,
    /// blake3 digest of the resource list
    pub fingerprint: String,
}

impl Manifest {
    /// Build a manifest from a graph
    ///
    /// # Errors
    ///
    /// Returns error if the graph has a cycle or cannot be encoded
    pub fn from_graph(stack: &str, graph: &ResourceGraph) -> CoreResult<Self> {
        let mut resources = Vec::with_capacity(graph.node_count());
        for id in graph.materialization_order()? {
            let node = graph.get(id).ok_or_else(|| CoreError::UnknownNode {
                from: stack.to_string(),
                id: id.to_string(),
            })?;
            let mut depends_on: Vec<LogicalId> =
                graph.dependencies(id).into_iter().cloned().collect();
            depends_on.sort();
            depends_on.dedup();
            resources.push(ManifestResource {
                id: id.clone(),
                resource: node.kind.clone(),
                depends_on,
            });
        }

        let fingerprint = hex::encode(blake3::hash(&serde_json::to_vec(&resources)?).as_bytes());

        Ok(Self {
            stack: stack.to_string(),
            resources,
            fingerprint,
        })
    }

    /// Look up a resource by id
    #[must_use]
    pub fn resource(&self, id: &LogicalId) -> Option<&ManifestResource> {
        self.resources.iter().find(|r| &r.id == id)
    }

    /// Pretty JSON encoding
    ///
    /// # Errors
    ///
    /// Returns error if encoding fails
    pub fn to_json(&self) -> CoreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode from JSON
    ///
    /// # Errors
    ///
    /// Returns error if the JSON is malformed
    pub fn from_json(json: &str) -> CoreResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Node;
    use crate::resource::KeyAttribute;
    use keystone_core::{Attribute, Value};

    fn id(s: &str) -> LogicalId {
        LogicalId::new(s).unwrap()
    }

    fn sample_graph() -> ResourceGraph {
        let mut graph = ResourceGraph::new();
        graph
            .add_node(Node::new(
                id("s/table"),
                ResourceKind::Table {
                    table_name: "items".to_string(),
                    partition_key: KeyAttribute::string("pk"),
                    sort_key: Some(KeyAttribute::string("sk")),
                    billing_mode: "PAY_PER_REQUEST".to_string(),
                },
            ))
            .unwrap();
        graph
            .add_node(Node::new(
                id("s/schema"),
                ResourceKind::GraphqlSchema {
                    api_id: Value::reference(&id("s/table"), Attribute::ApiId),
                    definition: "type Query { a: Int }".to_string(),
                },
            ))
            .unwrap();
        graph
    }

    #[test]
    fn test_manifest_order_and_edges() {
        let manifest = Manifest::from_graph("s", &sample_graph()).unwrap();
        assert_eq!(manifest.stack, "s");
        assert_eq!(manifest.resources.len(), 2);
        assert_eq!(manifest.resources[0].id, id("s/table"));
        assert_eq!(manifest.resources[1].depends_on, vec![id("s/table")]);
        assert!(manifest.resource(&id("s/schema")).is_some());
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let a = Manifest::from_graph("s", &sample_graph()).unwrap();
        let b = Manifest::from_graph("s", &sample_graph()).unwrap();
        assert_eq!(a.fingerprint, b.fingerprint);
        assert_eq!(a.fingerprint.len(), 64);
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let a = Manifest::from_graph("s", &sample_graph()).unwrap();
        let mut graph = sample_graph();
        graph
            .add_node(Node::new(
                id("s/other"),
                ResourceKind::NetworkBinding { name: None },
            ))
            .unwrap();
        let b = Manifest::from_graph("s", &graph).unwrap();
        assert_ne!(a.fingerprint, b.fingerprint);
    }

    #[test]
    fn test_manifest_json_roundtrip() {
        let manifest = Manifest::from_graph("s", &sample_graph()).unwrap();
        let json = manifest.to_json().unwrap();
        assert!(json.contains("\"type\": \"Table\""));
        assert_eq!(Manifest::from_json(&json).unwrap(), manifest);
    }
}

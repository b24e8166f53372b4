//! Network isolation for compute nodes.
//!
//! A compute node never builds its own network. It asks a
//! [`NetworkProvider`] for a binding, wires the returned
//! [`IsolationContext`] into its function, and commits the binding's
//! nodes together with the function.

use crate::error::StackResult;
use keystone_core::{Attribute, LogicalId, Value};
use keystone_graph::{Node, ResourceKind};

/// Handles a function needs to run inside an isolated network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsolationContext {
    /// Network handle
    pub vpc_id: Value,
    /// Subnet handles
    pub subnet_ids: Value,
    /// Security boundary handle
    pub security_group: Value,
}

/// A declared network binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkBinding {
    /// Node backing the binding
    pub id: LogicalId,
    /// Handles exposed to the function
    pub isolation: IsolationContext,
}

/// A binding together with the nodes that back it, not yet in a graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkDeclaration {
    /// Nodes to commit before anything referencing the binding
    pub nodes: Vec<Node>,
    /// The binding
    pub binding: NetworkBinding,
}

/// Produces network bindings
pub trait NetworkProvider {
    /// Declare a binding as a child of `parent`
    ///
    /// The returned nodes are committed by the caller.
    ///
    /// # Errors
    ///
    /// Returns error if an id is invalid
    fn bind(&self, parent: &LogicalId, name: Option<&str>) -> StackResult<NetworkDeclaration>;
}

/// Declares one `networking` node per function and exposes its outputs
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNetwork;

impl NetworkProvider for DefaultNetwork {
    fn bind(&self, parent: &LogicalId, name: Option<&str>) -> StackResult<NetworkDeclaration> {
        let id = parent.child("networking")?;
        let node = Node::new(
            id.clone(),
            ResourceKind::NetworkBinding {
                name: name.map(str::to_string),
            },
        );

        let isolation = IsolationContext {
            vpc_id: Value::reference(&id, Attribute::VpcId),
            subnet_ids: Value::reference(&id, Attribute::SubnetIds),
            security_group: Value::reference(&id, Attribute::SecurityGroupId),
        };
        Ok(NetworkDeclaration {
            nodes: vec![node],
            binding: NetworkBinding { id, isolation },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keystone_graph::ResourceGraph;

    #[test]
    fn test_default_network_declares_one_node() {
        let parent = LogicalId::new("stack/authorizer").unwrap();
        let declared = DefaultNetwork.bind(&parent, Some("auth")).unwrap();

        assert_eq!(declared.binding.id.as_str(), "stack/authorizer/networking");
        assert_eq!(declared.nodes.len(), 1);
        assert_eq!(declared.nodes[0].id, declared.binding.id);
        assert_eq!(declared.binding.isolation.vpc_id.node(), Some(&declared.binding.id));
        assert_eq!(
            declared.binding.isolation.security_group.node(),
            Some(&declared.binding.id)
        );
    }

    #[test]
    fn test_default_network_twice_under_same_parent_fails_on_commit() {
        let mut graph = ResourceGraph::new();
        let parent = LogicalId::new("stack/fn").unwrap();
        let first = DefaultNetwork.bind(&parent, None).unwrap();
        let second = DefaultNetwork.bind(&parent, None).unwrap();
        graph.commit(first.nodes).unwrap();
        assert!(graph.commit(second.nodes).is_err());
        assert_eq!(graph.node_count(), 1);
    }
}

//! Append-only resource graph.
//!
//! Nodes are added once, in declaration order. Every attribute reference
//! a node holds becomes an edge when the node is added, and explicit
//! ordering constraints can be appended afterwards. An edge can only be
//! created once both of its endpoints exist.

use crate::resource::ResourceKind;
use indexmap::{IndexMap, IndexSet};
use keystone_core::{CoreError, CoreResult, LogicalId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A declared resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Unique node ID
    pub id: LogicalId,
    /// Resource type and properties
    pub kind: ResourceKind,
    /// Explicit dependencies requested at declaration
    pub depends_on: IndexSet<LogicalId>,
}

impl Node {
    /// Create a new node with no explicit dependencies
    #[must_use]
    pub fn new(id: LogicalId, kind: ResourceKind) -> Self {
        Self {
            id,
            kind,
            depends_on: IndexSet::new(),
        }
    }

    /// Add an explicit dependency
    #[must_use]
    pub fn with_dependency(mut self, on: &LogicalId) -> Self {
        self.depends_on.insert(on.clone());
        self
    }

    /// Every node this one must be materialized after
    fn targets(&self) -> impl Iterator<Item = (&LogicalId, EdgeKind)> {
        let explicit = self.depends_on.iter().map(|id| (id, EdgeKind::Explicit));
        let implied = self
            .kind
            .references()
            .into_iter()
            .filter(|id| !self.depends_on.contains(*id))
            .map(|id| (id, EdgeKind::Reference));
        explicit.chain(implied)
    }
}

/// How an edge came to exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Requested by the declaring construct
    Explicit,
    /// Derived from an attribute reference
    Reference,
}

/// `from` must be materialized no earlier than `to`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// Dependent node
    pub from: LogicalId,
    /// Dependency
    pub to: LogicalId,
    /// Origin of the edge
    pub kind: EdgeKind,
}

impl Edge {
    /// Create a new edge
    #[must_use]
    pub fn new(from: LogicalId, to: LogicalId, kind: EdgeKind) -> Self {
        Self { from, to, kind }
    }
}

/// The resource graph built during one stack assembly
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceGraph {
    /// All nodes, in declaration order
    pub(crate) nodes: IndexMap<LogicalId, Node>,
    /// All edges, in creation order
    pub(crate) edges: Vec<Edge>,
}

impl ResourceGraph {
    /// Create a new empty graph
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node to the graph
    ///
    /// Attribute references and explicit dependencies are recorded as
    /// edges.
    ///
    /// # Errors
    ///
    /// Returns error if the id is taken or a dependency is not declared yet
    pub fn add_node(&mut self, node: Node) -> CoreResult<()> {
        self.check_insertable(&node, &IndexSet::new())?;
        self.insert_unchecked(node);
        Ok(())
    }

    /// Add a batch of nodes, all or nothing
    ///
    /// Nodes may depend on nodes declared earlier in the same batch.
    ///
    /// # Errors
    ///
    /// Returns the first problem found; the graph is unchanged on error
    pub fn commit(&mut self, batch: Vec<Node>) -> CoreResult<()> {
        let mut pending = IndexSet::new();
        for node in &batch {
            self.check_insertable(node, &pending)?;
            pending.insert(node.id.clone());
        }
        for node in batch {
            self.insert_unchecked(node);
        }
        Ok(())
    }

    fn check_insertable(&self, node: &Node, pending: &IndexSet<LogicalId>) -> CoreResult<()> {
        if self.nodes.contains_key(&node.id) || pending.contains(&node.id) {
            return Err(CoreError::DuplicateNode {
                id: node.id.to_string(),
            });
        }
        for (target, _) in node.targets() {
            if *target == node.id {
                return Err(CoreError::SelfDependency {
                    id: node.id.to_string(),
                });
            }
            if !self.nodes.contains_key(target) && !pending.contains(target) {
                return Err(CoreError::UnknownNode {
                    from: node.id.to_string(),
                    id: target.to_string(),
                });
            }
        }
        Ok(())
    }

    fn insert_unchecked(&mut self, node: Node) {
        let edges: Vec<Edge> = node
            .targets()
            .map(|(to, kind)| Edge::new(node.id.clone(), to.clone(), kind))
            .collect();
        tracing::trace!(
            node = %node.id,
            kind = node.kind.type_name(),
            edges = edges.len(),
            "declared"
        );
        self.edges.extend(edges);
        self.nodes.insert(node.id.clone(), node);
    }

    /// Require `from` to be materialized after `on`
    ///
    /// Adding an edge that already exists is a no-op.
    ///
    /// # Errors
    ///
    /// Returns error if either node is missing or the edge would create a cycle
    pub fn add_dependency(&mut self, from: &LogicalId, on: &LogicalId) -> CoreResult<()> {
        for id in [from, on] {
            if !self.nodes.contains_key(id) {
                return Err(CoreError::UnknownNode {
                    from: from.to_string(),
                    id: id.to_string(),
                });
            }
        }
        if from == on {
            return Err(CoreError::SelfDependency {
                id: from.to_string(),
            });
        }
        if self.depends_on(from, on) {
            return Ok(());
        }
        if self.reaches(on, from) {
            return Err(CoreError::Cycle {
                from: from.to_string(),
                on: on.to_string(),
            });
        }
        self.edges
            .push(Edge::new(from.clone(), on.clone(), EdgeKind::Explicit));
        Ok(())
    }

    /// Whether a direct edge `from -> on` exists
    #[must_use]
    pub fn depends_on(&self, from: &LogicalId, on: &LogicalId) -> bool {
        self.edges.iter().any(|e| &e.from == from && &e.to == on)
    }

    /// Whether `target` is reachable from `start` following dependencies
    #[must_use]
    pub fn reaches(&self, start: &LogicalId, target: &LogicalId) -> bool {
        let mut visited = IndexSet::new();
        let mut stack = vec![start];

        while let Some(current) = stack.pop() {
            if current == target {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            for e in &self.edges {
                if &e.from == current {
                    stack.push(&e.to);
                }
            }
        }

        false
    }

    /// Get node by ID
    #[must_use]
    pub fn get(&self, id: &LogicalId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Whether a node is declared
    #[must_use]
    pub fn contains(&self, id: &LogicalId) -> bool {
        self.nodes.contains_key(id)
    }

    /// All nodes in declaration order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// All edges in creation order
    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Nodes whose kind has the given type name
    pub fn nodes_of_type<'a>(&'a self, type_name: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.nodes
            .values()
            .filter(move |n| n.kind.type_name() == type_name)
    }

    /// Nodes the given node depends on
    #[must_use]
    pub fn dependencies(&self, id: &LogicalId) -> Vec<&LogicalId> {
        self.edges
            .iter()
            .filter(|e| &e.from == id)
            .map(|e| &e.to)
            .collect()
    }

    /// Nodes that depend on the given node
    #[must_use]
    pub fn dependents(&self, id: &LogicalId) -> Vec<&LogicalId> {
        self.edges
            .iter()
            .filter(|e| &e.to == id)
            .map(|e| &e.from)
            .collect()
    }

    /// Order in which the deployment tool may materialize the nodes
    ///
    /// Dependencies always come first; ties are broken by declaration
    /// order, so the result is stable across runs.
    ///
    /// # Errors
    ///
    /// Returns error if the edges contain a cycle
    pub fn materialization_order(&self) -> CoreResult<Vec<&LogicalId>> {
        let mut remaining: Vec<usize> = vec![0; self.nodes.len()];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); self.nodes.len()];

        for e in &self.edges {
            let (Some(from), Some(to)) =
                (self.nodes.get_index_of(&e.from), self.nodes.get_index_of(&e.to))
            else {
                return Err(CoreError::UnknownNode {
                    from: e.from.to_string(),
                    id: e.to.to_string(),
                });
            };
            remaining[from] += 1;
            dependents[to].push(from);
        }

        let mut ready: BTreeSet<usize> = (0..self.nodes.len())
            .filter(|&i| remaining[i] == 0)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(next) = ready.pop_first() {
            order.push(next);
            for &d in &dependents[next] {
                remaining[d] -= 1;
                if remaining[d] == 0 {
                    ready.insert(d);
                }
            }
        }

        if order.len() != self.nodes.len() {
            let stuck = (0..self.nodes.len())
                .find(|&i| remaining[i] > 0)
                .and_then(|i| self.nodes.get_index(i))
                .map(|(id, _)| id.to_string())
                .unwrap_or_default();
            return Err(CoreError::Cycle {
                from: stuck.clone(),
                on: stuck,
            });
        }

        Ok(order
            .into_iter()
            .filter_map(|i| self.nodes.get_index(i).map(|(id, _)| id))
            .collect())
    }

    /// Get total node count
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get total edge count
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Check if graph is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

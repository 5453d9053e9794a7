//! Structural graph describing pipeline composition.

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::UnitPath;

/// A node of the structural graph.
#[derive(Debug, Clone)]
pub struct StructuralNode {
    /// Node name, unique within its level.
    pub name: String,
    /// Node payload.
    pub meta: StructuralMeta,
}

/// The payload of a structural node.
///
/// A tagged union rather than a shape-inspected value; the graph converter
/// matches on the variant.
#[derive(Debug, Clone)]
pub enum StructuralMeta {
    /// One or more underlying leaf units, addressed from the top pipeline.
    Leaf(Vec<UnitPath>),
    /// A nested structural graph representing a sub-pipeline.
    Group(StructuralGraph),
}

/// The hierarchical graph describing pipeline composition.
///
/// Wraps a petgraph `DiGraph`; nodes iterate in insertion order, which is
/// the order the converter relies on for deterministic output.
#[derive(Debug, Clone, Default)]
pub struct StructuralGraph {
    graph: DiGraph<StructuralNode, ()>,
    indices: HashMap<String, NodeIndex>,
}

impl StructuralGraph {
    /// Creates an empty structural graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a leaf node wrapping the given units.
    pub fn add_leaf(&mut self, name: impl Into<String>, units: Vec<UnitPath>) {
        self.add(name.into(), StructuralMeta::Leaf(units));
    }

    /// Adds a group node wrapping a nested graph.
    pub fn add_group(&mut self, name: impl Into<String>, nested: StructuralGraph) {
        self.add(name.into(), StructuralMeta::Group(nested));
    }

    fn add(&mut self, name: String, meta: StructuralMeta) {
        let index = self.graph.add_node(StructuralNode {
            name: name.clone(),
            meta,
        });
        self.indices.insert(name, index);
    }

    /// Adds an edge between two named nodes.
    ///
    /// Duplicate edges collapse.
    pub fn connect(&mut self, from: &str, to: &str) -> PipelineResult<()> {
        let from_index = self.index_of(from)?;
        let to_index = self.index_of(to)?;
        if !self.graph.contains_edge(from_index, to_index) {
            self.graph.add_edge(from_index, to_index, ());
        }
        Ok(())
    }

    fn index_of(&self, name: &str) -> PipelineResult<NodeIndex> {
        self.indices
            .get(name)
            .copied()
            .ok_or_else(|| PipelineError::UnknownNode { name: name.into() })
    }

    /// Returns a node by name.
    pub fn node(&self, name: &str) -> Option<&StructuralNode> {
        let index = self.indices.get(name)?;
        self.graph.node_weight(*index)
    }

    /// Returns whether a node exists.
    pub fn contains(&self, name: &str) -> bool {
        self.indices.contains_key(name)
    }

    /// Returns all nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &StructuralNode> {
        self.graph
            .node_indices()
            .filter_map(|index| self.graph.node_weight(index))
    }

    /// Returns the names of the nodes a node links to.
    pub fn links_to(&self, name: &str) -> Vec<&str> {
        let Some(index) = self.indices.get(name) else {
            return Vec::new();
        };
        self.graph
            .neighbors_directed(*index, Direction::Outgoing)
            .filter_map(|target| self.graph.node_weight(target))
            .map(|node| node.name.as_str())
            .collect()
    }

    /// Returns the number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns whether the graph is empty.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Returns whether the graph contains a cycle at this level.
    pub fn is_cyclic(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_and_links() {
        let mut graph = StructuralGraph::new();
        graph.add_leaf("b", vec![UnitPath::root().child("b")]);
        graph.add_leaf("a", vec![UnitPath::root().child("a")]);
        graph.connect("b", "a").unwrap();

        let names: Vec<_> = graph.nodes().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["b", "a"]);
        assert_eq!(graph.links_to("b"), ["a"]);
        assert!(graph.links_to("a").is_empty());
    }

    #[test]
    fn test_duplicate_edges_collapse() {
        let mut graph = StructuralGraph::new();
        graph.add_leaf("a", vec![]);
        graph.add_leaf("b", vec![]);
        graph.connect("a", "b").unwrap();
        graph.connect("a", "b").unwrap();
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_connect_unknown_node() {
        let mut graph = StructuralGraph::new();
        graph.add_leaf("a", vec![]);
        let err = graph.connect("a", "missing");
        assert!(matches!(err, Err(PipelineError::UnknownNode { .. })));
    }

    #[test]
    fn test_cycle_detection() {
        let mut graph = StructuralGraph::new();
        graph.add_leaf("a", vec![]);
        graph.add_leaf("b", vec![]);
        graph.connect("a", "b").unwrap();
        assert!(!graph.is_cyclic());
        graph.connect("b", "a").unwrap();
        assert!(graph.is_cyclic());
    }
}

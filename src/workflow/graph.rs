/// Dependency graph construction
///
/// Converts the flat node/edge lists into a petgraph arena where every node id
/// is a vertex and every usable edge points from a dependency to the node
/// that depends on it. Malformed edges are dropped, never rejected.

use crate::workflow::types::{Edge, Node};
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::HashMap;

/// "Node depends on" structure derived from one workflow invocation
///
/// Vertices are inserted in node-list order, so `NodeIndex` order is the key
/// iteration order used by the order resolver. Rebuilt per invocation.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Edge direction: dependency -> dependent
    graph: DiGraph<String, ()>,
    /// Mapping from node ID to graph index
    node_id_to_index: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Build the dependency structure for `nodes` and `edges`
    ///
    /// Every node id becomes a key with an empty dependency set. An edge adds
    /// its source to its target's dependencies when both ends are present and
    /// the target is a known node.
    pub fn build(nodes: &[Node], edges: &[Edge]) -> Self {
        let mut graph = DiGraph::new();
        let mut node_id_to_index = HashMap::new();
        let mut external_sources: HashMap<String, NodeIndex> = HashMap::new();

        for node in nodes {
            if node_id_to_index.contains_key(&node.id) {
                tracing::warn!("⚠️ Duplicate node id '{}' ignored for ordering", node.id);
                continue;
            }
            let index = graph.add_node(node.id.clone());
            node_id_to_index.insert(node.id.clone(), index);
        }

        for edge in edges {
            let (Some(source), Some(target)) = (edge.source(), edge.target()) else {
                tracing::debug!("⏭️ Skipping edge with missing source or target: {:?}", edge);
                continue;
            };
            let Some(&target_index) = node_id_to_index.get(target) else {
                tracing::debug!("⏭️ Skipping edge '{}' → '{}': unknown target", source, target);
                continue;
            };
            // Sources outside the node list still count as dependencies; they
            // get a vertex of their own but never become ordering keys.
            let source_index = match node_id_to_index.get(source) {
                Some(&index) => index,
                None => *external_sources.entry(source.to_string()).or_insert_with(|| {
                    tracing::debug!("🔗 Edge source '{}' is not a known node", source);
                    graph.add_node(source.to_string())
                }),
            };
            graph.add_edge(source_index, target_index, ());
        }

        Self {
            graph,
            node_id_to_index,
        }
    }

    /// Number of ordering keys (known node ids)
    pub fn len(&self) -> usize {
        self.node_id_to_index.len()
    }

    /// Number of vertices, including edge sources outside the node list
    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.node_id_to_index.is_empty()
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.node_id_to_index.contains_key(node_id)
    }

    /// Ordering keys in node-list order
    pub fn keys(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph
            .node_indices()
            .filter(|index| self.is_key(*index))
    }

    /// Whether the vertex is one of the known node ids
    pub fn is_key(&self, index: NodeIndex) -> bool {
        self.node_id_to_index.get(&self.graph[index]) == Some(&index)
    }

    /// Node id stored at `index`
    pub fn node_id(&self, index: NodeIndex) -> &str {
        &self.graph[index]
    }

    /// Dependencies of `index` in the order their edges were declared
    pub fn dependency_indices(&self, index: NodeIndex) -> Vec<NodeIndex> {
        // petgraph yields neighbors newest edge first
        let mut dependencies: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(index, Direction::Incoming)
            .collect();
        dependencies.reverse();
        dependencies
    }

    /// Dependency ids of `node_id`, in declaration order
    pub fn dependencies(&self, node_id: &str) -> Vec<&str> {
        self.node_id_to_index
            .get(node_id)
            .map(|&index| {
                self.dependency_indices(index)
                    .into_iter()
                    .map(|dependency| self.node_id(dependency))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether any dependency cycle (including self-loops) exists
    pub fn has_cycle(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_node(id: &str) -> Node {
        serde_json::from_value(json!({ "id": id })).unwrap()
    }

    fn make_edge(source: &str, target: &str) -> Edge {
        serde_json::from_value(json!({ "source": source, "target": target })).unwrap()
    }

    #[test]
    fn every_node_is_a_key_with_empty_dependencies() {
        let graph = DependencyGraph::build(&[make_node("a"), make_node("b")], &[]);
        assert_eq!(graph.len(), 2);
        assert!(graph.dependencies("a").is_empty());
        assert!(graph.dependencies("b").is_empty());
        let keys: Vec<&str> = graph.keys().map(|index| graph.node_id(index)).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn edge_adds_source_to_target_dependencies() {
        let nodes = [make_node("a"), make_node("b"), make_node("c")];
        let edges = [make_edge("a", "c"), make_edge("b", "c")];
        let graph = DependencyGraph::build(&nodes, &edges);
        assert_eq!(graph.dependencies("c"), vec!["a", "b"]);
        assert!(graph.dependencies("a").is_empty());
        assert!(!graph.has_cycle());
    }

    #[test]
    fn edge_with_unknown_target_is_ignored() {
        let nodes = [make_node("a")];
        let edges = [make_edge("a", "ghost")];
        let graph = DependencyGraph::build(&nodes, &edges);
        assert_eq!(graph.len(), 1);
        assert!(!graph.contains("ghost"));
        assert!(graph.dependencies("a").is_empty());
    }

    #[test]
    fn edges_missing_an_end_are_skipped() {
        let nodes = [make_node("a"), make_node("b")];
        let edges: Vec<Edge> = vec![
            serde_json::from_value(json!({ "target": "b" })).unwrap(),
            serde_json::from_value(json!({ "source": "a" })).unwrap(),
            serde_json::from_value(json!({ "source": "", "target": "b" })).unwrap(),
        ];
        let graph = DependencyGraph::build(&nodes, &edges);
        assert!(graph.dependencies("b").is_empty());
    }

    #[test]
    fn unknown_source_is_a_dependency_but_not_a_key() {
        let nodes = [make_node("b")];
        let edges = [make_edge("ghost", "b")];
        let graph = DependencyGraph::build(&nodes, &edges);
        assert_eq!(graph.dependencies("b"), vec!["ghost"]);
        assert_eq!(graph.keys().count(), 1);
    }

    #[test]
    fn duplicate_node_ids_collapse_to_one_key() {
        let graph = DependencyGraph::build(&[make_node("a"), make_node("a")], &[]);
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.keys().count(), 1);
    }

    #[test]
    fn cycles_are_detected_not_rejected() {
        let nodes = [make_node("a"), make_node("b")];
        let edges = [make_edge("a", "b"), make_edge("b", "a")];
        let graph = DependencyGraph::build(&nodes, &edges);
        assert!(graph.has_cycle());
        assert_eq!(graph.dependencies("a"), vec!["b"]);
        assert_eq!(graph.dependencies("b"), vec!["a"]);
    }
}

//! Strongly connected components over the whole graph.
//!
//! `find_cycles` answers "which cycles can I reach from here"; this answers
//! "which groups of symbols are mutually dependent anywhere". The graph is
//! projected into a petgraph `DiGraph` holding only the followed edges and
//! handed to Kosaraju's algorithm.

use std::collections::HashMap;

use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};

use super::options::follows;
use super::GraphTraversal;
use crate::graph::{EdgeKind, SymbolNode};

impl<'g> GraphTraversal<'g> {
    /// Groups of mutually reachable nodes.
    ///
    /// Only components that actually contain a cycle are returned: more
    /// than one node, or a single node with an edge to itself. Nodes within
    /// a component, and the components themselves, are ordered by node
    /// insertion order.
    pub fn strongly_connected(&self, edge_types: Option<&[EdgeKind]>) -> Vec<Vec<&'g SymbolNode>> {
        let mut projection: DiGraph<&'g SymbolNode, ()> = DiGraph::new();
        let mut index: HashMap<&'g str, NodeIndex> = HashMap::new();
        for node in self.graph.nodes() {
            index.insert(node.id.as_str(), projection.add_node(node));
        }
        for edge in self.graph.edges() {
            if !follows(edge_types, edge.kind) {
                continue;
            }
            if let (Some(&from), Some(&to)) =
                (index.get(edge.source.as_str()), index.get(edge.target.as_str()))
            {
                projection.update_edge(from, to, ());
            }
        }

        // Node indices follow insertion order, so sorting by index restores it.
        let mut components: Vec<Vec<NodeIndex>> = kosaraju_scc(&projection)
            .into_iter()
            .filter(|scc| scc.len() > 1 || projection.contains_edge(scc[0], scc[0]))
            .map(|mut scc| {
                scc.sort();
                scc
            })
            .collect();
        components.sort_by_key(|scc| scc[0]);

        components
            .into_iter()
            .map(|scc| scc.into_iter().map(|idx| projection[idx]).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;

    #[test]
    fn test_components_found_and_ordered() {
        let graph = calls(&[
            ("a", "b"),
            ("b", "a"),
            ("c", "d"),
            ("x", "y"),
            ("y", "z"),
            ("z", "x"),
        ]);
        let traversal = GraphTraversal::new(&graph);
        let components = traversal.strongly_connected(None);
        assert_eq!(components.len(), 2);
        assert_eq!(ids(&components[0]), vec!["a", "b"]);
        assert_eq!(ids(&components[1]), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_self_loop_is_a_component() {
        let graph = calls(&[("a", "a"), ("a", "b")]);
        let traversal = GraphTraversal::new(&graph);
        let components = traversal.strongly_connected(None);
        assert_eq!(components.len(), 1);
        assert_eq!(ids(&components[0]), vec!["a"]);
    }

    #[test]
    fn test_components_respect_edge_types() {
        let graph = graph_of(&[
            ("a", "b", EdgeKind::Imports),
            ("b", "a", EdgeKind::Calls),
        ]);
        let traversal = GraphTraversal::new(&graph);
        assert_eq!(traversal.strongly_connected(None).len(), 1);
        assert!(traversal
            .strongly_connected(Some(&[EdgeKind::Imports]))
            .is_empty());
    }
}

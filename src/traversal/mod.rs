//! Traversal engine over a [`SymbolGraph`].
//!
//! [`GraphTraversal`] borrows the graph immutably and keeps no state
//! between calls, so any number of traversals may run against the same
//! graph at once. Unknown ids never fail: they produce an empty or absent
//! result.
//!
//! Neighbours are produced in edge-insertion order (outgoing before
//! incoming for [`Direction::Both`]) with parallel edges collapsed, which
//! makes every walk order, and every tie-break, deterministic.
//!
//! Depth-first algorithms run on an explicit frame stack, so deep graphs
//! cannot exhaust the call stack.

mod components;
mod options;
mod paths;
mod structure;
mod walk;

use std::collections::HashSet;

pub use options::{Direction, NodeFilter, TraversalOptions, DEFAULT_MAX_DEPTH};

use crate::graph::{EdgeKind, SymbolGraph, SymbolNode};
use options::follows;

/// Stateless algorithms over a borrowed graph.
#[derive(Debug, Clone, Copy)]
pub struct GraphTraversal<'g> {
    graph: &'g SymbolGraph,
}

impl<'g> GraphTraversal<'g> {
    pub fn new(graph: &'g SymbolGraph) -> Self {
        Self { graph }
    }

    pub fn graph(&self) -> &'g SymbolGraph {
        self.graph
    }

    /// Distinct neighbours of `node`, in edge-insertion order.
    fn neighbors(
        &self,
        node: &SymbolNode,
        direction: Direction,
        edge_types: Option<&[EdgeKind]>,
    ) -> Vec<&'g SymbolNode> {
        let mut seen: HashSet<&'g str> = HashSet::new();
        let mut out = Vec::new();

        if matches!(direction, Direction::Outgoing | Direction::Both) {
            for edge in self.graph.outgoing_iter(&node.id) {
                if follows(edge_types, edge.kind) && seen.insert(edge.target.as_str()) {
                    out.extend(self.graph.get_node(&edge.target));
                }
            }
        }
        if matches!(direction, Direction::Incoming | Direction::Both) {
            for edge in self.graph.incoming_iter(&node.id) {
                if follows(edge_types, edge.kind) && seen.insert(edge.source.as_str()) {
                    out.extend(self.graph.get_node(&edge.source));
                }
            }
        }
        out
    }
}

/// One level of an explicit depth-first stack: the owning node's
/// neighbours and how far through them the walk has got.
struct Frame<'g> {
    node: &'g SymbolNode,
    neighbors: Vec<&'g SymbolNode>,
    cursor: usize,
}

impl<'g> Frame<'g> {
    fn new(node: &'g SymbolNode, neighbors: Vec<&'g SymbolNode>) -> Self {
        Self {
            node,
            neighbors,
            cursor: 0,
        }
    }

    fn next_neighbor(&mut self) -> Option<&'g SymbolNode> {
        let next = self.neighbors.get(self.cursor).copied();
        self.cursor += 1;
        next
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::graph::{EdgeKind, SymbolEdge, SymbolGraph, SymbolKind, SymbolNode};

    /// Build a graph of functions from `(source, target, kind)` triples.
    /// Nodes are inserted in first-mention order.
    pub fn graph_of(edges: &[(&str, &str, EdgeKind)]) -> SymbolGraph {
        let mut graph = SymbolGraph::new();
        for (source, target, _) in edges {
            for id in [source, target] {
                if !graph.contains_node(id) {
                    graph.insert_node(SymbolNode::new(*id, SymbolKind::Function, *id, "src/lib.ts"));
                }
            }
        }
        for (i, (source, target, kind)) in edges.iter().enumerate() {
            graph
                .insert_edge(SymbolEdge::new(format!("e{i}"), *source, *target, *kind))
                .unwrap();
        }
        graph
    }

    pub fn calls(edges: &[(&str, &str)]) -> SymbolGraph {
        let triples: Vec<(&str, &str, EdgeKind)> =
            edges.iter().map(|(s, t)| (*s, *t, EdgeKind::Calls)).collect();
        graph_of(&triples)
    }

    pub fn ids(nodes: &[&SymbolNode]) -> Vec<String> {
        nodes.iter().map(|n| n.id.clone()).collect()
    }

    /// The main/util/Logger scenario.
    pub fn scenario() -> SymbolGraph {
        let mut graph = SymbolGraph::new();
        graph.insert_node(SymbolNode::new("main", SymbolKind::Function, "main", "src/main.ts"));
        graph.insert_node(SymbolNode::new("util", SymbolKind::Function, "util", "src/util.ts"));
        graph.insert_node(SymbolNode::new("Logger", SymbolKind::Class, "Logger", "src/log.ts"));
        graph
            .insert_edge(SymbolEdge::new("e1", "main", "util", EdgeKind::Calls))
            .unwrap();
        graph
            .insert_edge(SymbolEdge::new("e2", "main", "Logger", EdgeKind::Uses))
            .unwrap();
        graph
    }
}

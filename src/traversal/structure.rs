//! Whole-structure questions: cycles, dependency depth, roots and leaves.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::options::follows;
use super::{Direction, Frame, GraphTraversal};
use crate::graph::{EdgeKind, SymbolNode};

impl<'g> GraphTraversal<'g> {
    /// Cycles reachable from `start_id` along outgoing edges.
    ///
    /// A cycle is reported whenever the walk meets a node that is still on
    /// the current path, as the path from that node's first occurrence
    /// back to itself: `A -> B -> C -> A` yields `[A, B, C, A]`. Each node
    /// is expanded once and parallel edges between the same pair of nodes
    /// collapse to one neighbour, so a cycle is reported once per distinct
    /// node pair that closes it, however many edges connect that pair.
    pub fn find_cycles(
        &self,
        start_id: &str,
        edge_types: Option<&[EdgeKind]>,
    ) -> Vec<Vec<&'g SymbolNode>> {
        let Some(start) = self.graph.get_node(start_id) else {
            return Vec::new();
        };

        let mut cycles = Vec::new();
        let mut visited: HashSet<&'g str> = HashSet::from([start.id.as_str()]);
        // Position of each node on the current path.
        let mut on_stack: HashMap<&'g str, usize> = HashMap::from([(start.id.as_str(), 0)]);
        let mut stack = vec![Frame::new(
            start,
            self.neighbors(start, Direction::Outgoing, edge_types),
        )];

        while let Some(frame) = stack.last_mut() {
            let Some(next) = frame.next_neighbor() else {
                if let Some(done) = stack.pop() {
                    on_stack.remove(done.node.id.as_str());
                }
                continue;
            };
            if let Some(&position) = on_stack.get(next.id.as_str()) {
                let mut cycle: Vec<&'g SymbolNode> =
                    stack[position..].iter().map(|f| f.node).collect();
                cycle.push(next);
                cycles.push(cycle);
                continue;
            }
            if !visited.insert(next.id.as_str()) {
                continue;
            }
            on_stack.insert(next.id.as_str(), stack.len());
            let neighbors = self.neighbors(next, Direction::Outgoing, edge_types);
            stack.push(Frame::new(next, neighbors));
        }

        debug!(start = start_id, cycles = cycles.len(), "cycle search finished");
        cycles
    }

    /// Length of the longest simple outgoing path starting at `node_id`.
    ///
    /// Zero for a node with no qualifying outgoing edges and for unknown
    /// ids. A node that sits on no cycle cannot reach any node on the
    /// chain leading to it, so its depth is the same from every path and
    /// is computed once per call; acyclic regions cost O(n + e). Nodes on
    /// a cycle are searched again for each path that reaches them, which
    /// is exponential in the worst case inside large strongly connected
    /// regions.
    pub fn get_dependency_depth(&self, node_id: &str, edge_types: Option<&[EdgeKind]>) -> usize {
        let Some(start) = self.graph.get_node(node_id) else {
            return 0;
        };

        let cyclic: HashSet<&'g str> = self
            .strongly_connected(edge_types)
            .into_iter()
            .flatten()
            .map(|n| n.id.as_str())
            .collect();
        let mut memo: HashMap<&'g str, usize> = HashMap::new();
        let mut on_stack: HashSet<&'g str> = HashSet::from([start.id.as_str()]);
        // Each frame carries the deepest chain found below its node so far.
        let mut stack: Vec<(Frame<'g>, usize)> = vec![(
            Frame::new(start, self.neighbors(start, Direction::Outgoing, edge_types)),
            0,
        )];
        let mut result = 0;

        while let Some((frame, best)) = stack.last_mut() {
            match frame.next_neighbor() {
                Some(child) => {
                    if let Some(&depth) = memo.get(child.id.as_str()) {
                        *best = (*best).max(depth + 1);
                    } else if on_stack.insert(child.id.as_str()) {
                        let neighbors = self.neighbors(child, Direction::Outgoing, edge_types);
                        stack.push((Frame::new(child, neighbors), 0));
                    }
                }
                None => {
                    let Some((done, depth)) = stack.pop() else {
                        break;
                    };
                    let id = done.node.id.as_str();
                    on_stack.remove(id);
                    if !cyclic.contains(id) {
                        memo.insert(id, depth);
                    }
                    match stack.last_mut() {
                        Some((_, parent_best)) => *parent_best = (*parent_best).max(depth + 1),
                        None => result = depth,
                    }
                }
            }
        }

        result
    }

    /// Nodes with no qualifying outgoing edges, in insertion order.
    pub fn get_leaf_nodes(&self, edge_types: Option<&[EdgeKind]>) -> Vec<&'g SymbolNode> {
        self.graph
            .nodes()
            .filter(|n| {
                !self
                    .graph
                    .outgoing_iter(&n.id)
                    .any(|e| follows(edge_types, e.kind))
            })
            .collect()
    }

    /// Nodes with no qualifying incoming edges, in insertion order.
    pub fn get_root_nodes(&self, edge_types: Option<&[EdgeKind]>) -> Vec<&'g SymbolNode> {
        self.graph
            .nodes()
            .filter(|n| {
                !self
                    .graph
                    .incoming_iter(&n.id)
                    .any(|e| follows(edge_types, e.kind))
            })
            .collect()
    }
}

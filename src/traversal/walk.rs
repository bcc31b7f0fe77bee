//! Visitor walks: depth-first, breadth-first and plain reachability.

use std::collections::{HashSet, VecDeque};

use super::{Frame, GraphTraversal, TraversalOptions};
use crate::graph::SymbolNode;

/// A BFS queue entry, kept in an arena so paths can be rebuilt from
/// parent links instead of copying a path per entry.
struct Discovered<'g> {
    node: &'g SymbolNode,
    parent: Option<usize>,
}

/// Names from the root of the walk down to `entry`, inclusive.
fn name_path<'g>(arena: &[Discovered<'g>], mut entry: usize) -> Vec<&'g str> {
    let mut names = vec![arena[entry].node.name.as_str()];
    while let Some(parent) = arena[entry].parent {
        names.push(arena[parent].node.name.as_str());
        entry = parent;
    }
    names.reverse();
    names
}

impl<'g> GraphTraversal<'g> {
    /// Pre-order depth-first walk from `start_id`.
    ///
    /// Each node is visited at most once per call. `callback` receives the
    /// node, its depth and the names along the current path (start first,
    /// node last); returning `false` stops descent below that node without
    /// affecting its siblings. Nodes rejected by the filter are skipped
    /// together with everything only reachable through them.
    pub fn depth_first<F>(&self, start_id: &str, mut callback: F, options: &TraversalOptions)
    where
        F: FnMut(&'g SymbolNode, usize, &[&'g str]) -> bool,
    {
        let Some(start) = self.graph.get_node(start_id) else {
            return;
        };
        if !options.admits(start) {
            return;
        }
        let edge_types = options.edge_types.as_deref();

        let mut visited: HashSet<&'g str> = HashSet::new();
        let mut path: Vec<&'g str> = Vec::new();
        let mut stack: Vec<Frame<'g>> = Vec::new();

        visited.insert(start.id.as_str());
        path.push(start.name.as_str());
        if callback(start, 0, &path) && options.max_depth > 0 {
            let neighbors = self.neighbors(start, options.direction, edge_types);
            stack.push(Frame::new(start, neighbors));
        }

        while let Some(frame) = stack.last_mut() {
            let Some(next) = frame.next_neighbor() else {
                stack.pop();
                path.pop();
                continue;
            };
            if visited.contains(next.id.as_str()) || !options.admits(next) {
                continue;
            }
            let depth = stack.len();
            visited.insert(next.id.as_str());
            path.push(next.name.as_str());
            if callback(next, depth, &path) && depth < options.max_depth {
                let neighbors = self.neighbors(next, options.direction, edge_types);
                stack.push(Frame::new(next, neighbors));
            } else {
                path.pop();
            }
        }
    }

    /// Level-order walk from `start_id` with the same visiting, pruning and
    /// filtering rules as [`depth_first`](Self::depth_first).
    pub fn breadth_first<F>(&self, start_id: &str, mut callback: F, options: &TraversalOptions)
    where
        F: FnMut(&'g SymbolNode, usize, &[&'g str]) -> bool,
    {
        let Some(start) = self.graph.get_node(start_id) else {
            return;
        };
        let edge_types = options.edge_types.as_deref();

        let mut visited: HashSet<&'g str> = HashSet::new();
        let mut arena = vec![Discovered {
            node: start,
            parent: None,
        }];
        let mut queue: VecDeque<(usize, usize)> = VecDeque::from([(0, 0)]);

        while let Some((entry, depth)) = queue.pop_front() {
            let node = arena[entry].node;
            if visited.contains(node.id.as_str()) || !options.admits(node) {
                continue;
            }
            visited.insert(node.id.as_str());

            let names = name_path(&arena, entry);
            if !callback(node, depth, &names) || depth >= options.max_depth {
                continue;
            }
            for next in self.neighbors(node, options.direction, edge_types) {
                if !visited.contains(next.id.as_str()) {
                    arena.push(Discovered {
                        node: next,
                        parent: Some(entry),
                    });
                    queue.push_back((arena.len() - 1, depth + 1));
                }
            }
        }
    }

    /// Every node reachable from `start_id` in breadth-first order. The
    /// start node is never included, even when a cycle leads back to it.
    pub fn get_reachable(&self, start_id: &str, options: &TraversalOptions) -> Vec<&'g SymbolNode> {
        let mut reachable = Vec::new();
        self.breadth_first(
            start_id,
            |node, depth, _| {
                if depth > 0 {
                    reachable.push(node);
                }
                true
            },
            options,
        );
        reachable
    }
}

//! Path queries between two nodes.

use std::collections::{HashSet, VecDeque};

use tracing::debug;

use super::{Frame, GraphTraversal, TraversalOptions};
use crate::graph::SymbolNode;

impl<'g> GraphTraversal<'g> {
    /// Every simple path from `source_id` to `target_id` with at most
    /// `max_depth` edges, in depth-first discovery order.
    ///
    /// A node may appear in many paths but never twice in one. The number
    /// of paths grows exponentially on dense or cyclic graphs; `max_depth`
    /// is the only bound, so keep it small on large graphs. The filter
    /// applies to every node on a path, endpoints included.
    pub fn find_paths(
        &self,
        source_id: &str,
        target_id: &str,
        options: &TraversalOptions,
    ) -> Vec<Vec<&'g SymbolNode>> {
        let (Some(source), Some(target)) =
            (self.graph.get_node(source_id), self.graph.get_node(target_id))
        else {
            return Vec::new();
        };
        if !options.admits(source) || !options.admits(target) {
            return Vec::new();
        }
        if source.id == target.id {
            return vec![vec![source]];
        }
        let edge_types = options.edge_types.as_deref();

        let mut paths = Vec::new();
        let mut path: Vec<&'g SymbolNode> = vec![source];
        let mut on_path: HashSet<&'g str> = HashSet::from([source.id.as_str()]);
        let mut stack: Vec<Frame<'g>> = Vec::new();
        if options.max_depth > 0 {
            let neighbors = self.neighbors(source, options.direction, edge_types);
            stack.push(Frame::new(source, neighbors));
        }

        while let Some(frame) = stack.last_mut() {
            let Some(next) = frame.next_neighbor() else {
                stack.pop();
                if let Some(done) = path.pop() {
                    on_path.remove(done.id.as_str());
                }
                continue;
            };
            if on_path.contains(next.id.as_str()) || !options.admits(next) {
                continue;
            }
            if next.id == target.id {
                let mut found = path.clone();
                found.push(next);
                paths.push(found);
                continue;
            }
            // Edges so far, counting the one to `next`, equal `path.len()`;
            // only descend if one more edge still fits.
            if path.len() < options.max_depth {
                path.push(next);
                on_path.insert(next.id.as_str());
                let neighbors = self.neighbors(next, options.direction, edge_types);
                stack.push(Frame::new(next, neighbors));
            }
        }

        debug!(
            source = source_id,
            target = target_id,
            paths = paths.len(),
            "path enumeration finished"
        );
        paths
    }

    /// The path with the fewest edges from `source_id` to `target_id`, or
    /// `None` if no path of at most `max_depth` edges exists.
    ///
    /// Ties are broken by discovery order: neighbours are expanded in the
    /// insertion order of the edges that reach them, so among equally
    /// short paths the one using earlier-inserted edges wins.
    pub fn shortest_path(
        &self,
        source_id: &str,
        target_id: &str,
        options: &TraversalOptions,
    ) -> Option<Vec<&'g SymbolNode>> {
        let source = self.graph.get_node(source_id)?;
        let target = self.graph.get_node(target_id)?;
        if !options.admits(source) || !options.admits(target) {
            return None;
        }
        if source.id == target.id {
            return Some(vec![source]);
        }
        let edge_types = options.edge_types.as_deref();

        // (node, parent slot) arena; the queue holds (slot, depth).
        let mut arena: Vec<(&'g SymbolNode, Option<usize>)> = vec![(source, None)];
        let mut visited: HashSet<&'g str> = HashSet::from([source.id.as_str()]);
        let mut queue: VecDeque<(usize, usize)> = VecDeque::from([(0, 0)]);

        while let Some((slot, depth)) = queue.pop_front() {
            if depth >= options.max_depth {
                continue;
            }
            let node = arena[slot].0;
            for next in self.neighbors(node, options.direction, edge_types) {
                if !visited.insert(next.id.as_str()) || !options.admits(next) {
                    continue;
                }
                arena.push((next, Some(slot)));
                let next_slot = arena.len() - 1;
                if next.id == target.id {
                    return Some(unwind(&arena, next_slot));
                }
                queue.push_back((next_slot, depth + 1));
            }
        }
        None
    }
}

fn unwind<'g>(arena: &[(&'g SymbolNode, Option<usize>)], mut slot: usize) -> Vec<&'g SymbolNode> {
    let mut path = vec![arena[slot].0];
    while let Some(parent) = arena[slot].1 {
        path.push(arena[parent].0);
        slot = parent;
    }
    path.reverse();
    path
}

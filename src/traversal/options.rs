//! The policy shared by every traversal: depth cap, direction, edge
//! allow-list and node filter.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::graph::{EdgeKind, SymbolNode};

pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Predicate over nodes. Nodes it rejects are neither reported nor expanded.
pub type NodeFilter = Arc<dyn Fn(&SymbolNode) -> bool + Send + Sync>;

/// Which edges to follow from a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Source to target: what a symbol depends on or calls.
    #[default]
    Outgoing,
    /// Target to source: what depends on or calls a symbol.
    Incoming,
    Both,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Outgoing => write!(f, "outgoing"),
            Direction::Incoming => write!(f, "incoming"),
            Direction::Both => write!(f, "both"),
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "outgoing" | "out" => Ok(Direction::Outgoing),
            "incoming" | "in" => Ok(Direction::Incoming),
            "both" => Ok(Direction::Both),
            other => Err(format!(
                "unknown direction '{other}' (expected outgoing, incoming or both)"
            )),
        }
    }
}

/// Options accepted by [`GraphTraversal`](super::GraphTraversal) walks.
#[derive(Clone)]
pub struct TraversalOptions {
    /// Nodes deeper than this are never visited, so paths stop growing here.
    pub max_depth: usize,
    /// Follow only these edge kinds; `None` follows every kind.
    pub edge_types: Option<Vec<EdgeKind>>,
    pub direction: Direction,
    pub filter: Option<NodeFilter>,
}

impl Default for TraversalOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            edge_types: None,
            direction: Direction::Outgoing,
            filter: None,
        }
    }
}

impl fmt::Debug for TraversalOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraversalOptions")
            .field("max_depth", &self.max_depth)
            .field("edge_types", &self.edge_types)
            .field("direction", &self.direction)
            .field("filter", &self.filter.as_ref().map(|_| ".."))
            .finish()
    }
}

impl TraversalOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn edge_types(mut self, kinds: impl IntoIterator<Item = EdgeKind>) -> Self {
        self.edge_types = Some(kinds.into_iter().collect());
        self
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&SymbolNode) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }

    pub(crate) fn admits(&self, node: &SymbolNode) -> bool {
        self.filter.as_ref().map_or(true, |f| f(node))
    }
}

pub(crate) fn follows(edge_types: Option<&[EdgeKind]>, kind: EdgeKind) -> bool {
    edge_types.map_or(true, |kinds| kinds.contains(&kind))
}

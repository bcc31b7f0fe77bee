//! The symbol graph store.
//!
//! Nodes and edges live in flat arenas; every relationship is an id pair.
//! Four indexes are kept in step with every insert: node id -> slot,
//! edge id -> slot, and per-node outgoing/incoming edge slot lists.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::types::*;
use crate::error::{Endpoint, GraphError, Result};

/// What to do with an edge whose source or target is unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DanglingPolicy {
    /// Fail the insert with [`GraphError::DanglingReference`].
    #[default]
    Reject,
    /// Discard the edge and log a warning.
    Drop,
}

/// Canonical storage of symbols and their relationships.
///
/// Re-inserting a node id replaces the stored node (last write wins) but
/// keeps its original position, so insertion order stays stable. Every
/// ordered result this type returns follows insertion order.
#[derive(Debug, Clone, Default)]
pub struct SymbolGraph {
    nodes: Vec<SymbolNode>,
    edges: Vec<SymbolEdge>,
    /// Index: node id -> slot in `nodes`.
    node_index: HashMap<String, usize>,
    /// Index: edge id -> slot in `edges`.
    edge_index: HashMap<String, usize>,
    /// Index: node id -> slots of edges leaving it, in insertion order.
    outgoing: HashMap<String, Vec<usize>>,
    /// Index: node id -> slots of edges entering it, in insertion order.
    incoming: HashMap<String, Vec<usize>>,
    /// Last-modified times reported at ingestion, by file path.
    file_modified: HashMap<String, DateTime<Utc>>,
    dangling: DanglingPolicy,
}

impl SymbolGraph {
    /// Create an empty graph that rejects dangling edges.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(dangling: DanglingPolicy) -> Self {
        Self {
            dangling,
            ..Self::default()
        }
    }

    /// Build a graph from a snapshot. Nodes are inserted first, then edges.
    pub fn from_document(doc: GraphDocument, dangling: DanglingPolicy) -> Result<Self> {
        let mut graph = Self::with_policy(dangling);
        graph.insert_nodes(doc.nodes);
        graph.insert_edges(doc.edges)?;
        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "graph loaded from document"
        );
        Ok(graph)
    }

    /// Snapshot every node and edge in insertion order.
    pub fn to_document(&self) -> GraphDocument {
        GraphDocument {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }

    /// Read a JSON [`GraphDocument`] from disk.
    pub fn load(path: &Path, dangling: DanglingPolicy) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let doc: GraphDocument = serde_json::from_str(&text)?;
        Self::from_document(doc, dangling)
    }

    /// Write the graph to disk as a JSON [`GraphDocument`].
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_vec(&self.to_document())?)?;
        debug!(path = %path.display(), nodes = self.nodes.len(), "graph saved");
        Ok(())
    }

    pub fn dangling_policy(&self) -> DanglingPolicy {
        self.dangling
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Drop every node and edge. The dangling policy is kept.
    pub fn clear(&mut self) {
        *self = Self::with_policy(self.dangling);
    }

    // ─── Node Operations ────────────────────────────────────────

    /// Add a node, or replace the node already stored under its id.
    pub fn insert_node(&mut self, node: SymbolNode) {
        if let Some(&slot) = self.node_index.get(&node.id) {
            debug!(id = %node.id, "replacing existing node");
            self.nodes[slot] = node;
            return;
        }
        self.node_index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
    }

    pub fn insert_nodes(&mut self, nodes: impl IntoIterator<Item = SymbolNode>) {
        for node in nodes {
            self.insert_node(node);
        }
    }

    // ─── Edge Operations ────────────────────────────────────────

    /// Add an edge.
    ///
    /// Returns `Ok(true)` when stored and `Ok(false)` when a dangling edge
    /// was dropped under [`DanglingPolicy::Drop`]. A dangling edge under
    /// [`DanglingPolicy::Reject`], or a reused edge id, is an error and
    /// leaves the graph unchanged.
    pub fn insert_edge(&mut self, edge: SymbolEdge) -> Result<bool> {
        if self.edge_index.contains_key(&edge.id) {
            return Err(GraphError::DuplicateEdge { id: edge.id });
        }
        if let Some((endpoint, node)) = self.missing_endpoint(&edge) {
            return match self.dangling {
                DanglingPolicy::Reject => Err(GraphError::DanglingReference {
                    edge: edge.id,
                    endpoint,
                    node,
                }),
                DanglingPolicy::Drop => {
                    warn!(edge = %edge.id, %endpoint, node = %node, "dropping dangling edge");
                    Ok(false)
                }
            };
        }

        let slot = self.edges.len();
        self.edge_index.insert(edge.id.clone(), slot);
        self.outgoing.entry(edge.source.clone()).or_default().push(slot);
        self.incoming.entry(edge.target.clone()).or_default().push(slot);
        self.edges.push(edge);
        Ok(true)
    }

    /// Insert edges in order, stopping at the first error. Returns how many
    /// were stored.
    pub fn insert_edges(&mut self, edges: impl IntoIterator<Item = SymbolEdge>) -> Result<usize> {
        let mut stored = 0;
        for edge in edges {
            if self.insert_edge(edge)? {
                stored += 1;
            }
        }
        Ok(stored)
    }

    fn missing_endpoint(&self, edge: &SymbolEdge) -> Option<(Endpoint, String)> {
        if !self.node_index.contains_key(&edge.source) {
            Some((Endpoint::Source, edge.source.clone()))
        } else if !self.node_index.contains_key(&edge.target) {
            Some((Endpoint::Target, edge.target.clone()))
        } else {
            None
        }
    }

    // ─── Point Queries ──────────────────────────────────────────

    pub fn get_node(&self, id: &str) -> Option<&SymbolNode> {
        self.node_index.get(id).map(|&slot| &self.nodes[slot])
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    pub fn get_edge(&self, id: &str) -> Option<&SymbolEdge> {
        self.edge_index.get(id).map(|&slot| &self.edges[slot])
    }

    /// Edges whose source is `id`, in insertion order.
    pub fn get_outgoing_edges(&self, id: &str) -> Vec<&SymbolEdge> {
        self.outgoing_iter(id).collect()
    }

    /// Edges whose target is `id`, in insertion order.
    pub fn get_incoming_edges(&self, id: &str) -> Vec<&SymbolEdge> {
        self.incoming_iter(id).collect()
    }

    pub(crate) fn outgoing_iter<'g>(&'g self, id: &str) -> impl Iterator<Item = &'g SymbolEdge> {
        self.outgoing
            .get(id)
            .into_iter()
            .flatten()
            .map(move |&slot| &self.edges[slot])
    }

    pub(crate) fn incoming_iter<'g>(&'g self, id: &str) -> impl Iterator<Item = &'g SymbolEdge> {
        self.incoming
            .get(id)
            .into_iter()
            .flatten()
            .map(move |&slot| &self.edges[slot])
    }

    /// Every node, in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &SymbolNode> {
        self.nodes.iter()
    }

    /// Every edge, in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &SymbolEdge> {
        self.edges.iter()
    }

    /// All nodes with the given short name.
    pub fn nodes_by_name(&self, name: &str) -> Vec<&SymbolNode> {
        self.nodes.iter().filter(|n| n.name == name).collect()
    }

    // ─── Filtered Scans ─────────────────────────────────────────

    /// Scan nodes in insertion order, keeping those that match `options`.
    pub fn query(&self, options: &QueryOptions) -> QueryResult<'_> {
        let mut nodes = Vec::new();
        let mut total_count = 0;
        for node in self.nodes.iter().filter(|n| options.matches(n)) {
            total_count += 1;
            if options.limit.map_or(true, |limit| nodes.len() < limit) {
                nodes.push(node);
            }
        }

        let edges = options.include_edges.then(|| {
            let ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
            self.edges
                .iter()
                .filter(|e| ids.contains(e.source.as_str()) && ids.contains(e.target.as_str()))
                .collect()
        });

        QueryResult {
            nodes,
            edges,
            total_count,
        }
    }

    // ─── Stats ──────────────────────────────────────────────────

    /// Full scan of the current state.
    pub fn get_stats(&self) -> GraphStats {
        let mut stats = GraphStats {
            total_nodes: self.nodes.len(),
            total_edges: self.edges.len(),
            ..GraphStats::default()
        };
        let mut files: HashSet<&str> = HashSet::new();

        for node in &self.nodes {
            *stats.nodes_by_kind.entry(node.kind).or_insert(0) += 1;
            files.insert(node.file_path.as_str());
            if node.exported {
                stats.exported_count += 1;
            }
        }
        for edge in &self.edges {
            *stats.edges_by_kind.entry(edge.kind).or_insert(0) += 1;
        }
        stats.file_count = files.len();
        stats
    }

    // ─── Files ──────────────────────────────────────────────────

    /// Record when a file was last modified.
    pub fn set_file_modified(&mut self, path: impl Into<String>, modified: DateTime<Utc>) {
        self.file_modified.insert(path.into(), modified);
    }

    /// Roll up a single file. `None` if no node lives in `path`.
    pub fn file_info(&self, path: &str) -> Option<FileInfo> {
        let members: Vec<&SymbolNode> =
            self.nodes.iter().filter(|n| n.file_path == path).collect();
        if members.is_empty() {
            return None;
        }

        let mut imports: BTreeSet<String> = BTreeSet::new();
        for node in &members {
            for edge in self.outgoing_iter(&node.id) {
                if edge.kind == EdgeKind::Imports {
                    if let Some(target) = self.get_node(&edge.target) {
                        imports.insert(target.qualified_name.clone());
                    }
                }
            }
        }

        let exports = members
            .iter()
            .filter(|n| n.exported)
            .map(|n| n.name.clone())
            .collect();

        Some(FileInfo {
            path: path.to_string(),
            symbol_count: members.len(),
            imports: imports.into_iter().collect(),
            exports,
            last_modified: self.file_modified.get(path).copied(),
        })
    }

    /// Roll up every file, ordered by path.
    pub fn files(&self) -> Vec<FileInfo> {
        let paths: BTreeSet<&str> = self.nodes.iter().map(|n| n.file_path.as_str()).collect();
        paths.into_iter().filter_map(|p| self.file_info(p)).collect()
    }

    // ─── Removal ────────────────────────────────────────────────

    /// Remove every node in `path` and every edge touching one of them.
    /// Returns the number of nodes removed.
    ///
    /// The arenas are compacted and all indexes rebuilt, so this is
    /// O(n + e); it is meant for incremental re-analysis, not hot loops.
    pub fn remove_file(&mut self, path: &str) -> usize {
        let removed: HashSet<String> = self
            .nodes
            .iter()
            .filter(|n| n.file_path == path)
            .map(|n| n.id.clone())
            .collect();
        self.file_modified.remove(path);
        if removed.is_empty() {
            return 0;
        }

        debug!(file = path, nodes = removed.len(), "removing file from graph");
        self.nodes.retain(|n| !removed.contains(&n.id));
        self.edges
            .retain(|e| !removed.contains(&e.source) && !removed.contains(&e.target));
        self.reindex();
        removed.len()
    }

    fn reindex(&mut self) {
        self.node_index.clear();
        self.edge_index.clear();
        self.outgoing.clear();
        self.incoming.clear();

        for (slot, node) in self.nodes.iter().enumerate() {
            self.node_index.insert(node.id.clone(), slot);
        }
        for (slot, edge) in self.edges.iter().enumerate() {
            self.edge_index.insert(edge.id.clone(), slot);
            self.outgoing.entry(edge.source.clone()).or_default().push(slot);
            self.incoming.entry(edge.target.clone()).or_default().push(slot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn func(id: &str, file: &str) -> SymbolNode {
        SymbolNode::new(id, SymbolKind::Function, id, file)
    }

    fn edge(id: &str, source: &str, target: &str, kind: EdgeKind) -> SymbolEdge {
        SymbolEdge::new(id, source, target, kind)
    }

    fn sample() -> SymbolGraph {
        let mut graph = SymbolGraph::new();
        graph.insert_node(func("main", "src/main.ts").exported(true));
        graph.insert_node(func("util", "src/util.ts").exported(true));
        graph.insert_node(SymbolNode::new(
            "Logger",
            SymbolKind::Class,
            "Logger",
            "src/log/logger.ts",
        ));
        graph.insert_edge(edge("e1", "main", "util", EdgeKind::Calls)).unwrap();
        graph.insert_edge(edge("e2", "main", "Logger", EdgeKind::Uses)).unwrap();
        graph
    }

    #[test]
    fn test_empty_graph() {
        let graph = SymbolGraph::new();
        let stats = graph.get_stats();
        assert_eq!(stats.total_nodes, 0);
        assert_eq!(stats.total_edges, 0);
        assert!(graph.is_empty());
    }

    #[test]
    fn test_lookup_consistency() {
        let graph = sample();
        for node in graph.to_document().nodes {
            assert_eq!(graph.get_node(&node.id), Some(&node));
        }
        assert!(graph.get_node("never_inserted").is_none());
    }

    #[test]
    fn test_edge_symmetry() {
        let graph = sample();
        for e in graph.edges() {
            assert!(graph.get_outgoing_edges(&e.source).contains(&e));
            assert!(graph.get_incoming_edges(&e.target).contains(&e));
        }
    }

    #[test]
    fn test_missing_adjacency_is_empty_not_absent() {
        let graph = sample();
        assert!(graph.get_outgoing_edges("util").is_empty());
        assert!(graph.get_incoming_edges("main").is_empty());
        assert!(graph.get_outgoing_edges("ghost").is_empty());
    }

    #[test]
    fn test_insert_node_last_write_wins() {
        let mut graph = sample();
        graph.insert_node(func("util", "src/other.ts"));
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.get_node("util").unwrap().file_path, "src/other.ts");
        // Position and attached edges survive the replacement.
        let ids: Vec<&str> = graph.nodes().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["main", "util", "Logger"]);
        assert_eq!(graph.get_incoming_edges("util").len(), 1);
    }

    #[test]
    fn test_dangling_edge_rejected() {
        let mut graph = sample();
        let err = graph
            .insert_edge(edge("e3", "main", "ghost", EdgeKind::Calls))
            .unwrap_err();
        match err {
            GraphError::DanglingReference { endpoint, node, .. } => {
                assert_eq!(endpoint, Endpoint::Target);
                assert_eq!(node, "ghost");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(graph.edge_count(), 2);
        assert!(graph.get_edge("e3").is_none());
    }

    #[test]
    fn test_dangling_edge_dropped_under_drop_policy() {
        let mut graph = SymbolGraph::with_policy(DanglingPolicy::Drop);
        graph.insert_node(func("a", "a.ts"));
        let stored = graph
            .insert_edge(edge("e1", "ghost", "a", EdgeKind::Calls))
            .unwrap();
        assert!(!stored);
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.get_incoming_edges("a").is_empty());
    }

    #[test]
    fn test_duplicate_edge_id_rejected() {
        let mut graph = sample();
        let err = graph
            .insert_edge(edge("e1", "util", "Logger", EdgeKind::Uses))
            .unwrap_err();
        assert!(matches!(err, GraphError::DuplicateEdge { .. }));
        assert!(err.is_insert_error());
    }

    #[test]
    fn test_parallel_edges_allowed() {
        let mut graph = sample();
        graph
            .insert_edge(edge("e3", "main", "util", EdgeKind::Calls).at_line(12))
            .unwrap();
        let out = graph.get_outgoing_edges("main");
        let ids: Vec<&str> = out.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["e1", "e2", "e3"]);
    }

    #[test]
    fn test_query_filters_and_order() {
        let graph = sample();

        let all = graph.query(&QueryOptions::new());
        assert_eq!(all.total_count, 3);
        assert!(all.edges.is_none());

        let funcs = graph.query(&QueryOptions::new().kinds([SymbolKind::Function]));
        let names: Vec<&str> = funcs.nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["main", "util"]);

        let exported = graph.query(&QueryOptions::new().exported_only(true).limit(1));
        assert_eq!(exported.nodes.len(), 1);
        assert_eq!(exported.total_count, 2);
        assert_eq!(exported.nodes[0].id, "main");

        let nested = graph.query(&QueryOptions::new().file_glob("src/*/*.ts").unwrap());
        assert_eq!(nested.nodes.len(), 1);
        assert_eq!(nested.nodes[0].id, "Logger");
    }

    #[test]
    fn test_query_includes_induced_edges() {
        let graph = sample();
        let result = graph.query(
            &QueryOptions::new()
                .kinds([SymbolKind::Function])
                .include_edges(true),
        );
        let edges = result.edges.unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].id, "e1");
    }

    #[test]
    fn test_stats() {
        let graph = sample();
        let stats = graph.get_stats();
        assert_eq!(stats.total_nodes, 3);
        assert_eq!(stats.total_edges, 2);
        assert_eq!(stats.nodes_by_kind.get(&SymbolKind::Function), Some(&2));
        assert_eq!(stats.nodes_by_kind.get(&SymbolKind::Class), Some(&1));
        assert_eq!(stats.edges_by_kind.get(&EdgeKind::Calls), Some(&1));
        assert_eq!(stats.file_count, 3);
        assert_eq!(stats.exported_count, 2);
    }

    #[test]
    fn test_file_info() {
        let mut graph = SymbolGraph::new();
        graph.insert_node(SymbolNode::new("m:a", SymbolKind::Module, "a", "a.ts"));
        graph.insert_node(SymbolNode::new("m:b", SymbolKind::Module, "b", "b.ts"));
        graph.insert_node(func("a.run", "a.ts").exported(true));
        graph
            .insert_edge(edge("i1", "m:a", "m:b", EdgeKind::Imports))
            .unwrap();
        let modified = DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        graph.set_file_modified("a.ts", modified);

        let info = graph.file_info("a.ts").unwrap();
        assert_eq!(info.symbol_count, 2);
        assert_eq!(info.imports, vec!["b".to_string()]);
        assert_eq!(info.exports, vec!["a.run".to_string()]);
        assert_eq!(info.last_modified, Some(modified));

        assert!(graph.file_info("missing.ts").is_none());
        assert_eq!(graph.files().len(), 2);
    }

    #[test]
    fn test_remove_file_clears_cross_references() {
        let mut graph = sample();
        let removed = graph.remove_file("src/util.ts");
        assert_eq!(removed, 1);
        assert!(graph.get_node("util").is_none());
        assert!(graph.get_edge("e1").is_none());
        assert_eq!(graph.get_outgoing_edges("main").len(), 1);
        // Surviving indexes point at the right slots after compaction.
        assert_eq!(graph.get_node("Logger").unwrap().kind, SymbolKind::Class);
        assert_eq!(graph.get_edge("e2").unwrap().target, "Logger");
    }

    #[test]
    fn test_remove_nonexistent_file() {
        let mut graph = sample();
        assert_eq!(graph.remove_file("nope.ts"), 0);
        assert_eq!(graph.node_count(), 3);
    }

    #[test]
    fn test_document_round_trip_preserves_order() {
        let graph = sample();
        let json = serde_json::to_string(&graph.to_document()).unwrap();
        let doc: GraphDocument = serde_json::from_str(&json).unwrap();
        let restored = SymbolGraph::from_document(doc, DanglingPolicy::Reject).unwrap();
        assert_eq!(restored.get_stats(), graph.get_stats());
        let ids: Vec<&str> = restored
            .get_outgoing_edges("main")
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(ids, vec!["e1", "e2"]);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cache").join("graph.json");
        let graph = sample();
        graph.save(&path).unwrap();

        let loaded = SymbolGraph::load(&path, DanglingPolicy::Reject).unwrap();
        assert_eq!(loaded.get_stats(), graph.get_stats());
        assert_eq!(loaded.get_node("Logger"), graph.get_node("Logger"));
    }

    #[test]
    fn test_load_failures() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = SymbolGraph::load(&dir.path().join("none.json"), DanglingPolicy::Reject);
        assert!(matches!(missing, Err(GraphError::Io(_))));

        let bad = dir.path().join("bad.json");
        fs::write(&bad, "{ not json").unwrap();
        let parsed = SymbolGraph::load(&bad, DanglingPolicy::Reject);
        assert!(matches!(parsed, Err(GraphError::Json(_))));
    }

    #[test]
    fn test_clear_keeps_policy() {
        let mut graph = SymbolGraph::with_policy(DanglingPolicy::Drop);
        graph.insert_node(func("a", "a.ts"));
        graph.clear();
        assert!(graph.is_empty());
        assert_eq!(graph.dangling_policy(), DanglingPolicy::Drop);
    }
}

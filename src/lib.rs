//! # symgraph
//!
//! An in-memory graph of code symbols and the relationships between them,
//! with the traversal queries used for code intelligence: reachability,
//! paths, cycles, dependency depth, and roots/leaves.
//!
//! The graph is fed from per-file extraction records (or a saved
//! [`GraphDocument`]) and is read-only once built: any number of
//! [`GraphTraversal`]s can borrow it at the same time.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use symgraph::{build_graph, DanglingPolicy, FileExtraction, GraphTraversal, TraversalOptions};
//!
//! let text = std::fs::read_to_string("extractions.json")?;
//! let files: Vec<FileExtraction> = serde_json::from_str(&text)?;
//! let (graph, report) = build_graph(&files, DanglingPolicy::Reject)?;
//! println!("{} symbols, {} unresolved calls", report.symbols, report.unresolved_calls);
//!
//! let traversal = GraphTraversal::new(&graph);
//! for node in traversal.get_reachable("src/main.ts#main:1", &TraversalOptions::default()) {
//!     println!("{}", node.qualified_name);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod traversal;

pub use config::SymgraphConfig;
pub use error::{GraphError, Result};

pub use graph::{
    build_graph, rebuild_file, DanglingPolicy, EdgeKind, FileExtraction, FileInfo, GraphDocument,
    GraphStats, IngestReport, QueryOptions, QueryResult, SymbolEdge, SymbolGraph, SymbolKind,
    SymbolNode,
};
pub use traversal::{Direction, GraphTraversal, TraversalOptions};

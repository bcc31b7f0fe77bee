//! Symbol graph: the data model, the in-memory store and the builder that
//! feeds it from extraction records.

pub mod builder;
pub mod engine;
pub mod types;

pub use builder::{build_graph, module_id, rebuild_file, symbol_id, IngestReport};
pub use engine::{DanglingPolicy, SymbolGraph};
pub use types::{
    EdgeKind, ExtractedCall, ExtractedSymbol, FileExtraction, FileInfo, GraphDocument, GraphStats,
    HttpRoute, Metadata, QueryOptions, QueryResult, SourceLocation, SymbolEdge, SymbolKind,
    SymbolNode, Visibility,
};

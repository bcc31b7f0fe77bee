//! Error types for graph construction and loading.
//!
//! Lookups and traversals never fail: an unknown id degrades to `None` or
//! an empty result. Errors are reserved for inserts that would corrupt the
//! graph and for the ambient config/document loading paths.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Which end of an edge failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Source,
    Target,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Source => write!(f, "source"),
            Endpoint::Target => write!(f, "target"),
        }
    }
}

/// Errors raised by the symbol graph.
#[derive(Debug, Error)]
pub enum GraphError {
    /// An edge references a node id that is not in the graph.
    #[error("edge {edge}: {endpoint} node '{node}' does not exist")]
    DanglingReference {
        edge: String,
        endpoint: Endpoint,
        node: String,
    },

    /// An edge with this id is already present.
    #[error("duplicate edge id: {id}")]
    DuplicateEdge { id: String },

    /// A file-path glob in a query could not be compiled.
    #[error("invalid file pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    /// The configuration file exists but could not be used.
    #[error("config {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl GraphError {
    /// Whether the error was raised by an insert (as opposed to loading).
    pub fn is_insert_error(&self) -> bool {
        matches!(
            self,
            GraphError::DanglingReference { .. } | GraphError::DuplicateEdge { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, GraphError>;

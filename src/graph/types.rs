//! Core types for the symbol graph.
//!
//! Defines symbol kinds, edge kinds, the node and edge records stored in
//! the graph, the query/result shapes, and the records consumed from the
//! extraction service.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GraphError, Result};

/// Free-form metadata attached to nodes and edges.
pub type Metadata = BTreeMap<String, Value>;

/// The kind of a symbol in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SymbolKind {
    /// A free function.
    Function,
    /// A function defined inside a class or impl.
    Method,
    /// A class definition.
    Class,
    /// An interface or trait.
    Interface,
    /// A type alias.
    TypeAlias,
    /// A mutable binding.
    Variable,
    /// An immutable binding.
    Constant,
    /// A module; the builder creates one per source file.
    Module,
    /// A namespace.
    Namespace,
    /// A field or property.
    Property,
    /// A function parameter.
    Parameter,
}

impl SymbolKind {
    pub const ALL: [SymbolKind; 11] = [
        SymbolKind::Function,
        SymbolKind::Method,
        SymbolKind::Class,
        SymbolKind::Interface,
        SymbolKind::TypeAlias,
        SymbolKind::Variable,
        SymbolKind::Constant,
        SymbolKind::Module,
        SymbolKind::Namespace,
        SymbolKind::Property,
        SymbolKind::Parameter,
    ];

    /// Parse the wire name (`"type-alias"`, `"function"`, ...).
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.to_string() == s)
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolKind::Function => write!(f, "function"),
            SymbolKind::Method => write!(f, "method"),
            SymbolKind::Class => write!(f, "class"),
            SymbolKind::Interface => write!(f, "interface"),
            SymbolKind::TypeAlias => write!(f, "type-alias"),
            SymbolKind::Variable => write!(f, "variable"),
            SymbolKind::Constant => write!(f, "constant"),
            SymbolKind::Module => write!(f, "module"),
            SymbolKind::Namespace => write!(f, "namespace"),
            SymbolKind::Property => write!(f, "property"),
            SymbolKind::Parameter => write!(f, "parameter"),
        }
    }
}

/// The kind of a directed relationship between two symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EdgeKind {
    /// Symbol calls another symbol.
    Calls,
    /// Module imports another module.
    Imports,
    /// Class extends another class.
    Extends,
    /// Class implements an interface.
    Implements,
    /// Generic use of another symbol.
    Uses,
    /// A container holds a symbol (Module -> Function, Class -> Method).
    Contains,
    /// Method overrides a method of a parent class.
    Overrides,
    /// Symbol is decorated by another symbol.
    DecoratedBy,
    /// Symbol has the target as its type.
    TypeOf,
    /// Function returns the target type.
    Returns,
    /// Parameter belongs to the target function.
    ParameterOf,
}

impl EdgeKind {
    pub const ALL: [EdgeKind; 11] = [
        EdgeKind::Calls,
        EdgeKind::Imports,
        EdgeKind::Extends,
        EdgeKind::Implements,
        EdgeKind::Uses,
        EdgeKind::Contains,
        EdgeKind::Overrides,
        EdgeKind::DecoratedBy,
        EdgeKind::TypeOf,
        EdgeKind::Returns,
        EdgeKind::ParameterOf,
    ];

    /// Parse the wire name (`"calls"`, `"decoratedBy"`, ...).
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.to_string() == s)
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeKind::Calls => write!(f, "calls"),
            EdgeKind::Imports => write!(f, "imports"),
            EdgeKind::Extends => write!(f, "extends"),
            EdgeKind::Implements => write!(f, "implements"),
            EdgeKind::Uses => write!(f, "uses"),
            EdgeKind::Contains => write!(f, "contains"),
            EdgeKind::Overrides => write!(f, "overrides"),
            EdgeKind::DecoratedBy => write!(f, "decoratedBy"),
            EdgeKind::TypeOf => write!(f, "typeOf"),
            EdgeKind::Returns => write!(f, "returns"),
            EdgeKind::ParameterOf => write!(f, "parameterOf"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
    Protected,
    Internal,
    Package,
}

/// A line/column range in a source file (lines 1-indexed, columns 0-indexed).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceLocation {
    pub start_line: usize,
    #[serde(default)]
    pub start_column: usize,
    pub end_line: usize,
    #[serde(default)]
    pub end_column: usize,
}

impl SourceLocation {
    pub fn lines(start_line: usize, end_line: usize) -> Self {
        Self {
            start_line,
            start_column: 0,
            end_line,
            end_column: 0,
        }
    }
}

/// One definition site in source code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolNode {
    /// Unique within a graph.
    pub id: String,
    #[serde(rename = "type")]
    pub kind: SymbolKind,
    pub name: String,
    /// Fully qualified name. Not unique: overloads and shadowing share one.
    pub qualified_name: String,
    pub file_path: String,
    #[serde(default)]
    pub location: SourceLocation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docstring: Option<String>,
    #[serde(default)]
    pub exported: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    #[serde(default, rename = "async")]
    pub is_async: bool,
    #[serde(default, rename = "static")]
    pub is_static: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_parameters: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl SymbolNode {
    /// Create a node with only the required fields set. The qualified name
    /// defaults to the short name.
    pub fn new(
        id: impl Into<String>,
        kind: SymbolKind,
        name: impl Into<String>,
        file_path: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            kind,
            qualified_name: name.clone(),
            name,
            file_path: file_path.into(),
            location: SourceLocation::default(),
            signature: None,
            docstring: None,
            exported: false,
            visibility: None,
            is_async: false,
            is_static: false,
            type_parameters: Vec::new(),
            return_type: None,
            parameter_count: None,
            metadata: Metadata::new(),
        }
    }

    pub fn with_qualified_name(mut self, qualified_name: impl Into<String>) -> Self {
        self.qualified_name = qualified_name.into();
        self
    }

    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = location;
        self
    }

    pub fn exported(mut self, exported: bool) -> Self {
        self.exported = exported;
        self
    }
}

/// A directed, typed relationship between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: EdgeKind,
    /// Importance from 1 to 10.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    /// Line of the occurrence; distinguishes parallel edges.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl SymbolEdge {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        kind: EdgeKind,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            kind,
            weight: None,
            line: None,
            metadata: Metadata::new(),
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }
}

/// Read-only summary of the graph, recomputed on every call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStats {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub nodes_by_kind: BTreeMap<SymbolKind, usize>,
    pub edges_by_kind: BTreeMap<EdgeKind, usize>,
    pub file_count: usize,
    pub exported_count: usize,
}

/// Per-file rollup derived from node and edge membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub path: String,
    pub symbol_count: usize,
    /// Qualified names of the symbols this file's symbols import.
    pub imports: Vec<String>,
    /// Names of exported symbols defined in this file.
    pub exports: Vec<String>,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Filters for [`SymbolGraph::query`](super::SymbolGraph::query).
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Only these kinds; empty means every kind.
    pub kinds: Vec<SymbolKind>,
    pub file_pattern: Option<glob::Pattern>,
    pub exported_only: bool,
    pub limit: Option<usize>,
    /// Also return edges whose endpoints are both in the result.
    pub include_edges: bool,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kinds(mut self, kinds: impl IntoIterator<Item = SymbolKind>) -> Self {
        self.kinds = kinds.into_iter().collect();
        self
    }

    /// Restrict results to files matching a glob such as `src/**/*.ts`.
    pub fn file_glob(mut self, pattern: &str) -> Result<Self> {
        let compiled = glob::Pattern::new(pattern).map_err(|source| GraphError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        self.file_pattern = Some(compiled);
        Ok(self)
    }

    pub fn exported_only(mut self, exported_only: bool) -> Self {
        self.exported_only = exported_only;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn include_edges(mut self, include_edges: bool) -> Self {
        self.include_edges = include_edges;
        self
    }

    pub(crate) fn matches(&self, node: &SymbolNode) -> bool {
        if !self.kinds.is_empty() && !self.kinds.contains(&node.kind) {
            return false;
        }
        if self.exported_only && !node.exported {
            return false;
        }
        match &self.file_pattern {
            Some(pattern) => pattern.matches(&node.file_path),
            None => true,
        }
    }
}

/// Result of a filtered scan.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult<'g> {
    pub nodes: Vec<&'g SymbolNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edges: Option<Vec<&'g SymbolEdge>>,
    /// Matches before `limit` was applied.
    pub total_count: usize,
}

/// A serialized snapshot of a graph: every node, then every edge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub nodes: Vec<SymbolNode>,
    #[serde(default)]
    pub edges: Vec<SymbolEdge>,
}

// ─── Extraction Records ───────────────────────────────────────────────────────

/// HTTP route metadata for endpoint symbols.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpRoute {
    pub method: String,
    pub path: String,
}

/// A symbol as reported by the extraction service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedSymbol {
    pub name: String,
    #[serde(alias = "type")]
    pub category: SymbolKind,
    /// Line where the symbol starts (1-indexed).
    pub line: usize,
    #[serde(default)]
    pub end_line: Option<usize>,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub exported: bool,
    #[serde(default)]
    pub is_async: bool,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub decorators: Vec<String>,
    /// Enclosing symbol name (for methods inside classes).
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub route: Option<HttpRoute>,
}

/// A call site reported by the extraction service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedCall {
    pub caller: String,
    pub callee: String,
    #[serde(default)]
    pub line: Option<usize>,
}

/// Everything the extraction service reports for one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileExtraction {
    pub path: String,
    pub language: String,
    #[serde(default)]
    pub line_count: usize,
    #[serde(default)]
    pub symbols: Vec<ExtractedSymbol>,
    /// Import specifiers as written in source.
    #[serde(default)]
    pub imports: Vec<String>,
    /// Exported names.
    #[serde(default)]
    pub exports: Vec<String>,
    #[serde(default)]
    pub token_estimate: usize,
    #[serde(default)]
    pub calls: Vec<ExtractedCall>,
    #[serde(default)]
    pub modified: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_wire_names_round_trip() {
        for kind in SymbolKind::ALL {
            assert_eq!(SymbolKind::parse(&kind.to_string()), Some(kind));
        }
        for kind in EdgeKind::ALL {
            assert_eq!(EdgeKind::parse(&kind.to_string()), Some(kind));
        }
        assert_eq!(SymbolKind::parse("struct"), None);
    }

    #[test]
    fn test_node_json_uses_extraction_field_names() {
        let json = r#"{
            "id": "src/app.ts#run:3",
            "type": "type-alias",
            "name": "run",
            "qualifiedName": "app.run",
            "filePath": "src/app.ts",
            "location": { "startLine": 3, "endLine": 9 },
            "async": true,
            "typeParameters": ["T"]
        }"#;
        let node: SymbolNode = serde_json::from_str(json).unwrap();
        assert_eq!(node.kind, SymbolKind::TypeAlias);
        assert_eq!(node.qualified_name, "app.run");
        assert!(node.is_async);
        assert!(!node.exported);
        assert_eq!(node.location.end_line, 9);
        assert_eq!(node.type_parameters, vec!["T".to_string()]);
    }

    #[test]
    fn test_edge_kind_serializes_camel_case() {
        let edge = SymbolEdge::new("e1", "a", "b", EdgeKind::DecoratedBy);
        let value = serde_json::to_value(&edge).unwrap();
        assert_eq!(value["type"], "decoratedBy");
        assert!(value.get("weight").is_none());
    }

    #[test]
    fn test_query_options_reject_bad_glob() {
        let err = QueryOptions::new().file_glob("src/[").unwrap_err();
        assert!(matches!(err, GraphError::InvalidPattern { .. }));
    }

    #[test]
    fn test_extracted_symbol_accepts_type_alias() {
        let json = r#"{ "name": "Logger", "type": "class", "line": 4, "isAsync": false }"#;
        let symbol: ExtractedSymbol = serde_json::from_str(json).unwrap();
        assert_eq!(symbol.category, SymbolKind::Class);
        assert!(symbol.decorators.is_empty());
    }
}

//! Graph builder: turns extraction records into nodes and edges.
//!
//! Each analysed file becomes a `module` node and each extracted symbol a
//! node under it. Declared relationships (containment, imports, calls,
//! decorators) become edges once both endpoints are known. Anything that
//! cannot be resolved is counted in the [`IngestReport`] instead of being
//! inserted as a dangling edge.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::engine::{DanglingPolicy, SymbolGraph};
use super::types::*;
use crate::error::Result;

/// Extensions stripped when matching import specifiers against file paths.
const SOURCE_EXTENSIONS: &[&str] = &[
    "ts", "tsx", "js", "jsx", "mjs", "cjs", "py", "rs", "go", "java", "rb", "cs",
];

/// Counts from one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub files: usize,
    pub symbols: usize,
    pub edges: usize,
    pub unresolved_imports: usize,
    pub unresolved_calls: usize,
    /// Edges from other files into a rebuilt file that were removed with it.
    pub detached_edges: usize,
}

/// Build a fresh graph from a batch of extraction records.
pub fn build_graph(
    extractions: &[FileExtraction],
    dangling: DanglingPolicy,
) -> Result<(SymbolGraph, IngestReport)> {
    let mut graph = SymbolGraph::with_policy(dangling);
    let report = graph.ingest(extractions)?;
    Ok((graph, report))
}

/// Replace one file's symbols with a fresh extraction of it.
///
/// Every edge touching the old symbols goes with them, including calls
/// and imports from other files. Those are not re-created here: re-ingest
/// the referring files to restore them. The number lost is reported as
/// [`IngestReport::detached_edges`].
pub fn rebuild_file(graph: &mut SymbolGraph, extraction: &FileExtraction) -> Result<IngestReport> {
    let path = extraction.path.as_str();
    let detached = graph
        .nodes()
        .filter(|n| n.file_path == path)
        .flat_map(|n| graph.get_incoming_edges(&n.id))
        .filter(|e| {
            graph
                .get_node(&e.source)
                .map_or(true, |source| source.file_path != path)
        })
        .count();
    if detached > 0 {
        warn!(file = path, edges = detached, "rebuild drops edges from other files");
    }

    graph.remove_file(path);
    let mut report = graph.ingest(std::slice::from_ref(extraction))?;
    report.detached_edges = detached;
    Ok(report)
}

/// Id of the module node for a file.
pub fn module_id(path: &str) -> String {
    path.to_string()
}

/// Id of a symbol node. The line keeps same-named symbols in one file apart.
pub fn symbol_id(path: &str, name: &str, line: usize) -> String {
    format!("{path}#{name}:{line}")
}

impl SymbolGraph {
    /// Add every file in `extractions` to the graph.
    ///
    /// Files are processed in two passes: all nodes first, then all edges,
    /// so relationships between files in the same batch resolve regardless
    /// of order. Symbols already in the graph from earlier batches are also
    /// valid targets.
    pub fn ingest(&mut self, extractions: &[FileExtraction]) -> Result<IngestReport> {
        debug!(file_count = extractions.len(), "ingesting extractions into graph");
        let mut report = IngestReport::default();
        let mut builder = EdgeWriter::new();

        // Phase 1: module and symbol nodes
        for file in extractions {
            self.insert_node(module_node(file));
            for symbol in &file.symbols {
                self.insert_node(symbol_node(file, symbol));
                report.symbols += 1;
            }
            if let Some(modified) = file.modified {
                self.set_file_modified(file.path.clone(), modified);
            }
            report.files += 1;
        }

        let names = NameIndex::new(self);

        for file in extractions {
            let module = module_id(&file.path);

            // Phase 2: containment
            for symbol in &file.symbols {
                let child = symbol_id(&file.path, &symbol.name, symbol.line);
                let parent = symbol
                    .parent
                    .as_deref()
                    .and_then(|p| names.in_file(&file.path, p))
                    .unwrap_or(module.as_str());
                builder.write(self, parent, &child, EdgeKind::Contains, Some(symbol.line))?;
            }

            // Phase 3: imports
            for specifier in &file.imports {
                match names.resolve_import(&file.path, specifier) {
                    Some(target) if target != module => {
                        builder.write(self, &module, target, EdgeKind::Imports, None)?;
                    }
                    Some(_) => {}
                    None => {
                        debug!(file = %file.path, specifier = %specifier, "unresolved import");
                        report.unresolved_imports += 1;
                    }
                }
            }

            // Phase 4: calls
            for call in &file.calls {
                let caller = names.in_file(&file.path, &call.caller);
                let callee = names.lookup(&file.path, &call.callee);
                match (caller, callee) {
                    (Some(caller), Some(callee)) => {
                        builder.write(self, caller, callee, EdgeKind::Calls, call.line)?;
                    }
                    _ => {
                        debug!(file = %file.path, caller = %call.caller, callee = %call.callee, "unresolved call");
                        report.unresolved_calls += 1;
                    }
                }
            }

            // Phase 5: decorators
            for symbol in &file.symbols {
                let decorated = symbol_id(&file.path, &symbol.name, symbol.line);
                for decorator in &symbol.decorators {
                    if let Some(target) = names.lookup(&file.path, decorator_name(decorator)) {
                        builder.write(
                            self,
                            &decorated,
                            target,
                            EdgeKind::DecoratedBy,
                            Some(symbol.line),
                        )?;
                    }
                }
            }
        }

        report.edges = builder.written;
        info!(
            files = report.files,
            symbols = report.symbols,
            edges = report.edges,
            unresolved_imports = report.unresolved_imports,
            unresolved_calls = report.unresolved_calls,
            "ingest complete"
        );
        Ok(report)
    }
}

fn module_node(file: &FileExtraction) -> SymbolNode {
    let stem = strip_extension(&file.path);
    let name = stem.rsplit('/').next().unwrap_or(stem);
    let mut node = SymbolNode::new(module_id(&file.path), SymbolKind::Module, name, &file.path)
        .with_qualified_name(qualify(stem))
        .with_location(SourceLocation::lines(1, file.line_count.max(1)));
    node.metadata
        .insert("language".to_string(), Value::from(file.language.clone()));
    node.metadata
        .insert("lineCount".to_string(), Value::from(file.line_count));
    node.metadata
        .insert("tokenEstimate".to_string(), Value::from(file.token_estimate));
    node
}

fn symbol_node(file: &FileExtraction, symbol: &ExtractedSymbol) -> SymbolNode {
    let mut qualified = qualify(strip_extension(&file.path));
    if let Some(parent) = &symbol.parent {
        qualified.push('.');
        qualified.push_str(parent);
    }
    qualified.push('.');
    qualified.push_str(&symbol.name);

    let exported = symbol.exported || file.exports.iter().any(|e| e == &symbol.name);
    let end_line = symbol.end_line.unwrap_or(symbol.line);

    let mut node = SymbolNode::new(
        symbol_id(&file.path, &symbol.name, symbol.line),
        symbol.category,
        &symbol.name,
        &file.path,
    )
    .with_qualified_name(qualified)
    .with_location(SourceLocation::lines(symbol.line, end_line))
    .exported(exported);
    node.signature = symbol.signature.clone();
    node.is_async = symbol.is_async;
    node.is_static = symbol.is_static;

    if !symbol.decorators.is_empty() {
        node.metadata
            .insert("decorators".to_string(), Value::from(symbol.decorators.clone()));
    }
    if let Some(route) = &symbol.route {
        node.metadata
            .insert("httpMethod".to_string(), Value::from(route.method.clone()));
        node.metadata
            .insert("route".to_string(), Value::from(route.path.clone()));
    }
    node
}

fn strip_extension(path: &str) -> &str {
    match path.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.contains('/') => {
            if SOURCE_EXTENSIONS.contains(&ext) {
                stem
            } else {
                path
            }
        }
        _ => path,
    }
}

/// `src/app/util` -> `src.app.util`
fn qualify(stem: &str) -> String {
    stem.trim_start_matches("./").replace('/', ".")
}

/// `@Injectable()` -> `Injectable`
fn decorator_name(raw: &str) -> &str {
    let name = raw.trim().trim_start_matches('@');
    name.split('(').next().unwrap_or(name).trim()
}

/// Resolve `./x` and `../x` against the importing file's directory.
fn join_relative(importer: &str, specifier: &str) -> String {
    let mut parts: Vec<&str> = importer.split('/').collect();
    parts.pop();
    for segment in specifier.split('/') {
        match segment {
            "." | "" => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// Name lookups used while writing edges.
struct NameIndex {
    /// (file path, symbol name) -> first symbol id with that name in the file.
    by_file: HashMap<(String, String), String>,
    /// symbol name -> ids across the whole graph, insertion order.
    by_name: HashMap<String, Vec<String>>,
    /// file path and extension-less path -> module id.
    module_paths: HashMap<String, String>,
    /// module short name -> module ids.
    module_names: HashMap<String, Vec<String>>,
}

impl NameIndex {
    fn new(graph: &SymbolGraph) -> Self {
        let mut index = Self {
            by_file: HashMap::new(),
            by_name: HashMap::new(),
            module_paths: HashMap::new(),
            module_names: HashMap::new(),
        };
        for node in graph.nodes() {
            if node.kind == SymbolKind::Module {
                index
                    .module_paths
                    .insert(node.file_path.clone(), node.id.clone());
                index
                    .module_paths
                    .entry(strip_extension(&node.file_path).to_string())
                    .or_insert_with(|| node.id.clone());
                index
                    .module_names
                    .entry(node.name.clone())
                    .or_default()
                    .push(node.id.clone());
                continue;
            }
            index
                .by_file
                .entry((node.file_path.clone(), node.name.clone()))
                .or_insert_with(|| node.id.clone());
            index
                .by_name
                .entry(node.name.clone())
                .or_default()
                .push(node.id.clone());
        }
        index
    }

    fn in_file(&self, path: &str, name: &str) -> Option<&str> {
        self.by_file
            .get(&(path.to_string(), name.to_string()))
            .map(String::as_str)
    }

    /// Same file first, then the first match anywhere in the graph.
    fn lookup(&self, path: &str, name: &str) -> Option<&str> {
        self.in_file(path, name).or_else(|| {
            self.by_name
                .get(name)
                .and_then(|ids| ids.first())
                .map(String::as_str)
        })
    }

    fn resolve_import(&self, importer: &str, specifier: &str) -> Option<&str> {
        if let Some(id) = self.module_paths.get(specifier) {
            return Some(id.as_str());
        }
        if specifier.starts_with('.') {
            let joined = join_relative(importer, specifier);
            return self
                .module_paths
                .get(&joined)
                .or_else(|| self.module_paths.get(strip_extension(&joined)))
                .map(String::as_str);
        }
        // Bare specifiers (`app.util`, `crate::util`, `util`): match on the
        // last segment, but only when exactly one module has that name.
        let last = specifier
            .rsplit(|c: char| c == '/' || c == '.' || c == ':')
            .find(|s| !s.is_empty())?;
        match self.module_names.get(last).map(Vec::as_slice) {
            Some([only]) => Some(only.as_str()),
            _ => None,
        }
    }
}

/// Allocates edge ids and counts stored edges.
struct EdgeWriter {
    written: usize,
    seq: usize,
}

impl EdgeWriter {
    fn new() -> Self {
        Self { written: 0, seq: 0 }
    }

    fn write(
        &mut self,
        graph: &mut SymbolGraph,
        source: &str,
        target: &str,
        kind: EdgeKind,
        line: Option<usize>,
    ) -> Result<()> {
        let id = loop {
            let candidate = format!("{kind}:{source}->{target}#{}", self.seq);
            self.seq += 1;
            if graph.get_edge(&candidate).is_none() {
                break candidate;
            }
        };
        let mut edge = SymbolEdge::new(id, source, target, kind);
        edge.line = line;
        if graph.insert_edge(edge)? {
            self.written += 1;
        }
        Ok(())
    }
}

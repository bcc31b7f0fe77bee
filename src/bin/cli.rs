//! symgraph CLI - query a code symbol graph from the command line.
//!
//! Usage:
//!   symgraph --graph graph.json stats                 # Graph statistics
//!   symgraph --graph graph.json files                 # Per-file rollups
//!   symgraph --extractions files.json query --kind class --file 'src/**'
//!   symgraph --graph graph.json reachable <node>      # Everything reachable
//!   symgraph --graph graph.json path <from> <to>      # Shortest path (--all for every path)
//!   symgraph --graph graph.json cycles <node>         # Cycles reachable from a node
//!   symgraph --graph graph.json sccs                  # Mutually dependent groups
//!   symgraph --graph graph.json depth <node>          # Longest dependency chain
//!   symgraph --graph graph.json roots | leaves
//!
//! Nodes may be given by id or, when unambiguous, by short name. Results are
//! printed to stdout as JSON; logs go to stderr.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use symgraph::config::CONFIG_FILE_NAME;
use symgraph::{
    build_graph, Direction, EdgeKind, FileExtraction, GraphTraversal, QueryOptions,
    SymbolGraph, SymbolKind, SymbolNode, SymgraphConfig,
};

#[derive(Parser)]
#[command(name = "symgraph")]
#[command(about = "symgraph - code symbol graph queries", long_about = None)]
struct Cli {
    /// Saved graph document (JSON with `nodes` and `edges`)
    #[arg(long, conflicts_with = "extractions", required_unless_present = "extractions")]
    graph: Option<PathBuf>,

    /// Extraction records to build the graph from (JSON array)
    #[arg(long)]
    extractions: Option<PathBuf>,

    /// Configuration file
    #[arg(long, default_value = CONFIG_FILE_NAME)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct EdgeFilter {
    /// Only follow these edge kinds (repeatable)
    #[arg(long = "edge-type", value_parser = parse_edge_kind)]
    edge_types: Vec<EdgeKind>,
}

impl EdgeFilter {
    fn as_option(&self) -> Option<&[EdgeKind]> {
        (!self.edge_types.is_empty()).then_some(self.edge_types.as_slice())
    }
}

#[derive(Args)]
struct WalkArgs {
    /// Maximum number of edges to follow (default from config)
    #[arg(long)]
    depth: Option<usize>,

    /// outgoing, incoming or both
    #[arg(long, default_value = "outgoing")]
    direction: Direction,

    #[command(flatten)]
    edges: EdgeFilter,
}

#[derive(Subcommand)]
enum Commands {
    /// Show graph statistics
    Stats,

    /// List files with their symbol counts, imports and exports
    Files,

    /// Filter symbols by kind, file glob and export status
    Query {
        /// Symbol kinds to keep (repeatable)
        #[arg(long = "kind", value_parser = parse_symbol_kind)]
        kinds: Vec<SymbolKind>,

        /// File path glob, e.g. 'src/**/*.ts'
        #[arg(long)]
        file: Option<String>,

        /// Only exported symbols
        #[arg(long)]
        exported: bool,

        #[arg(long)]
        limit: Option<usize>,

        /// Include edges between the matched symbols
        #[arg(long)]
        edges: bool,
    },

    /// Every node reachable from a node
    Reachable {
        node: String,

        #[command(flatten)]
        walk: WalkArgs,
    },

    /// Shortest path between two nodes
    Path {
        from: String,
        to: String,

        /// Every simple path instead of the shortest
        #[arg(long)]
        all: bool,

        #[command(flatten)]
        walk: WalkArgs,
    },

    /// Cycles reachable from a node
    Cycles {
        node: String,

        #[command(flatten)]
        edges: EdgeFilter,
    },

    /// Strongly connected components across the whole graph
    Sccs {
        #[command(flatten)]
        edges: EdgeFilter,
    },

    /// Length of the longest dependency chain below a node
    Depth {
        node: String,

        #[command(flatten)]
        edges: EdgeFilter,
    },

    /// Nodes with no incoming edges
    Roots {
        #[command(flatten)]
        edges: EdgeFilter,
    },

    /// Nodes with no outgoing edges
    Leaves {
        #[command(flatten)]
        edges: EdgeFilter,
    },
}

fn parse_edge_kind(s: &str) -> std::result::Result<EdgeKind, String> {
    EdgeKind::parse(s).ok_or_else(|| format!("unknown edge type '{s}'"))
}

fn parse_symbol_kind(s: &str) -> std::result::Result<SymbolKind, String> {
    SymbolKind::parse(s).ok_or_else(|| format!("unknown symbol kind '{s}'"))
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = SymgraphConfig::load(&cli.config)?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log.level)),
        )
        .init();

    let graph = load_graph(&cli, &config)?;
    let traversal = GraphTraversal::new(&graph);

    match &cli.command {
        Commands::Stats => print_json(&graph.get_stats()),

        Commands::Files => print_json(&graph.files()),

        Commands::Query {
            kinds,
            file,
            exported,
            limit,
            edges,
        } => {
            let mut options = QueryOptions::new()
                .kinds(kinds.iter().copied())
                .exported_only(*exported)
                .include_edges(*edges);
            if let Some(pattern) = file {
                options = options.file_glob(pattern)?;
            }
            if let Some(limit) = limit {
                options = options.limit(*limit);
            }
            print_json(&graph.query(&options))
        }

        Commands::Reachable { node, walk } => {
            let start = resolve(&graph, node)?;
            let options = walk_options(&config, walk);
            print_json(&traversal.get_reachable(&start.id, &options))
        }

        Commands::Path {
            from,
            to,
            all,
            walk,
        } => {
            let source = resolve(&graph, from)?;
            let target = resolve(&graph, to)?;
            let options = walk_options(&config, walk);
            if *all {
                print_json(&traversal.find_paths(&source.id, &target.id, &options))
            } else {
                print_json(&traversal.shortest_path(&source.id, &target.id, &options))
            }
        }

        Commands::Cycles { node, edges } => {
            let start = resolve(&graph, node)?;
            print_json(&traversal.find_cycles(&start.id, edges.as_option()))
        }

        Commands::Sccs { edges } => print_json(&traversal.strongly_connected(edges.as_option())),

        Commands::Depth { node, edges } => {
            let start = resolve(&graph, node)?;
            let depth = traversal.get_dependency_depth(&start.id, edges.as_option());
            print_json(&serde_json::json!({ "node": start.id, "depth": depth }))
        }

        Commands::Roots { edges } => print_json(&traversal.get_root_nodes(edges.as_option())),

        Commands::Leaves { edges } => print_json(&traversal.get_leaf_nodes(edges.as_option())),
    }
}

fn load_graph(cli: &Cli, config: &SymgraphConfig) -> Result<SymbolGraph> {
    let dangling = config.graph.dangling;
    if let Some(path) = &cli.graph {
        return SymbolGraph::load(path, dangling)
            .with_context(|| format!("loading graph from {}", path.display()));
    }
    if let Some(path) = &cli.extractions {
        let files: Vec<FileExtraction> = read_json(path)?;
        let (graph, report) = build_graph(&files, dangling)
            .with_context(|| format!("building graph from {}", path.display()))?;
        info!(
            files = report.files,
            symbols = report.symbols,
            edges = report.edges,
            unresolved_imports = report.unresolved_imports,
            unresolved_calls = report.unresolved_calls,
            "graph built from extractions"
        );
        return Ok(graph);
    }
    bail!("one of --graph or --extractions is required")
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Find a node by id, falling back to a unique short name.
fn resolve<'g>(graph: &'g SymbolGraph, key: &str) -> Result<&'g SymbolNode> {
    if let Some(node) = graph.get_node(key) {
        return Ok(node);
    }
    match graph.nodes_by_name(key).as_slice() {
        [] => bail!("no node with id or name '{key}'"),
        [only] => Ok(*only),
        many => {
            let ids: Vec<&str> = many.iter().map(|n| n.id.as_str()).collect();
            bail!("'{key}' is ambiguous, candidates: {}", ids.join(", "))
        }
    }
}

fn walk_options(config: &SymgraphConfig, walk: &WalkArgs) -> symgraph::TraversalOptions {
    let mut options = config
        .traversal_options()
        .max_depth(walk.depth.unwrap_or(config.traversal.max_depth))
        .direction(walk.direction);
    if let Some(kinds) = walk.edges.as_option() {
        options = options.edge_types(kinds.iter().copied());
    }
    options
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

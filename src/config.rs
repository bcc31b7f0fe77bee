//! Configuration loaded from `symgraph.toml`.
//!
//! ```toml
//! [graph]
//! dangling = "drop"
//!
//! [traversal]
//! max_depth = 6
//!
//! [log]
//! level = "debug"
//! ```
//!
//! Every section and key is optional.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GraphError, Result};
use crate::graph::DanglingPolicy;
use crate::traversal::{TraversalOptions, DEFAULT_MAX_DEPTH};

/// File name looked up when no explicit config path is given.
pub const CONFIG_FILE_NAME: &str = "symgraph.toml";

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default)]
    pub dangling: DanglingPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalConfig {
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymgraphConfig {
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub traversal: TraversalConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl SymgraphConfig {
    /// Load from `path`. A missing file yields the defaults; a file that
    /// exists but cannot be read or parsed is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(GraphError::Config {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })
            }
        };
        Self::parse(&text).map_err(|message| GraphError::Config {
            path: path.to_path_buf(),
            message,
        })
    }

    fn parse(text: &str) -> std::result::Result<Self, String> {
        toml::from_str(text).map_err(|e| e.to_string())
    }

    /// Traversal options seeded with the configured depth bound.
    pub fn traversal_options(&self) -> TraversalOptions {
        TraversalOptions::new().max_depth(self.traversal.max_depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = SymgraphConfig::load(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(config, SymgraphConfig::default());
        assert_eq!(config.graph.dangling, DanglingPolicy::Reject);
        assert_eq!(config.traversal.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_load_full_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            "[graph]\ndangling = \"drop\"\n\n[traversal]\nmax_depth = 4\n\n[log]\nlevel = \"debug\"\n",
        )
        .unwrap();

        let config = SymgraphConfig::load(&path).unwrap();
        assert_eq!(config.graph.dangling, DanglingPolicy::Drop);
        assert_eq!(config.traversal.max_depth, 4);
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.traversal_options().max_depth, 4);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[traversal]\nmax_depth = 2\n").unwrap();

        let config = SymgraphConfig::load(&path).unwrap();
        assert_eq!(config.traversal.max_depth, 2);
        assert_eq!(config.graph.dangling, DanglingPolicy::Reject);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[graph]\ndangling = \"sometimes\"\n").unwrap();

        let err = SymgraphConfig::load(&path).unwrap_err();
        assert!(matches!(err, GraphError::Config { .. }));
        assert!(!err.is_insert_error());
    }
}

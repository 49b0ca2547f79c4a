//! Error type shared by the stores, the engine and the CLI host.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::{EdgeId, NodeId};

/// Errors raised by rowgraph.
#[derive(Error, Debug)]
pub enum GraphError {
    /// The SQLite store failed; passed through untouched.
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// A writer panicked while holding the in-memory store lock.
    #[error("store lock poisoned")]
    StorePoisoned,

    /// A query argument could not be parsed at the call boundary.
    #[error("invalid {name}: '{value}'")]
    InvalidArgument { name: &'static str, value: String },

    /// An edge row references a vertex the store does not hold.
    #[error("edge {edge_id} references missing vertex {node_id}")]
    DanglingEdge { edge_id: EdgeId, node_id: NodeId },

    /// A read-only host was pointed at a database file that does not exist.
    #[error("database not found: {}", .0.display())]
    DatabaseNotFound(PathBuf),

    /// No id is left above the largest stored node id.
    #[error("node id space exhausted")]
    IdExhausted,

    #[error("config error: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GraphError {
    pub fn invalid_argument(name: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name,
            value: value.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GraphError>;

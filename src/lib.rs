//! rowgraph: directed-graph queries over persisted node and edge rows.
//!
//! Vertices and edges live in a [`graph::store::GraphStore`] (SQLite or in
//! memory); [`graph::engine::GraphEngine`] answers membership, adjacency,
//! source and sink queries against whatever the store holds right now.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod graph;
pub mod observability;
pub mod types;

pub use error::{GraphError, Result};
pub use graph::engine::GraphEngine;
pub use graph::memory::{MemorySnapshot, MemoryStore};
pub use graph::store::{GraphStore, SqliteSnapshot, SqliteStore};
pub use types::{Adjacency, Arc, Direction, EdgeRecord, NewNode, Node, NodeId, ResultShape};

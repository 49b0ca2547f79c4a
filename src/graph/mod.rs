//! Graph layer: the store contract, its two backends and the query engine.

pub mod engine;
pub mod memory;
pub mod store;

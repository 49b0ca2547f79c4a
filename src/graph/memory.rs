//! In-memory [`GraphStore`] for embedders and tests.
//!
//! Rows live behind an `RwLock`, so any number of readers can query at
//! once while writes go through `&self`. The same invariants as the SQLite
//! schema apply: edges must reference existing nodes and deleting a node
//! deletes its edges.
//!
//! A [`MemorySnapshot`] holds the read lock, so writers block until it is
//! dropped. Writing from the thread that holds a snapshot deadlocks.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{GraphError, Result};
use crate::graph::store::GraphStore;
use crate::types::{EdgeId, EdgeRecord, NewNode, Node, NodeId};

#[derive(Debug, Default)]
struct Rows {
    nodes: BTreeMap<NodeId, Node>,
    edges: BTreeMap<EdgeId, EdgeRecord>,
    next_edge_id: EdgeId,
}

/// A [`GraphStore`] backed by ordered maps.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: RwLock<Rows>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Rows>> {
        self.rows.read().map_err(|_| GraphError::StorePoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Rows>> {
        self.rows.write().map_err(|_| GraphError::StorePoisoned)
    }

    /// Insert a node with the next free id (one past the current maximum).
    pub fn insert_node(&self, node: &NewNode) -> Result<Node> {
        let mut rows = self.write()?;
        let id = match rows.nodes.keys().next_back() {
            Some(max) => max.checked_add(1).ok_or(GraphError::IdExhausted)?,
            None => 1,
        };
        let stored = Node {
            id,
            name: node.name.clone(),
            properties: node.properties.clone(),
        };
        rows.nodes.insert(id, stored.clone());
        Ok(stored)
    }

    /// Insert or replace a node with a caller-chosen id.
    pub fn upsert_node(&self, node: &Node) -> Result<()> {
        self.write()?.nodes.insert(node.id, node.clone());
        Ok(())
    }

    /// Insert or replace several nodes under one write lock.
    pub fn upsert_nodes(&self, nodes: &[Node]) -> Result<()> {
        let mut rows = self.write()?;
        for node in nodes {
            rows.nodes.insert(node.id, node.clone());
        }
        Ok(())
    }

    /// Insert one edge row. Both endpoints must already exist.
    pub fn insert_edge(&self, source_id: NodeId, target_id: NodeId) -> Result<EdgeRecord> {
        let mut rows = self.write()?;
        let id = rows.next_edge_id + 1;
        for endpoint in [source_id, target_id] {
            if !rows.nodes.contains_key(&endpoint) {
                return Err(GraphError::DanglingEdge {
                    edge_id: id,
                    node_id: endpoint,
                });
            }
        }
        rows.next_edge_id = id;
        let edge = EdgeRecord::new(id, source_id, target_id);
        rows.edges.insert(id, edge.clone());
        Ok(edge)
    }

    /// Insert several edges; all endpoints are checked before any row is
    /// written.
    pub fn insert_edges(&self, pairs: &[(NodeId, NodeId)]) -> Result<Vec<EdgeRecord>> {
        let mut rows = self.write()?;
        let first_id = rows.next_edge_id + 1;
        for (offset, &(source_id, target_id)) in pairs.iter().enumerate() {
            for endpoint in [source_id, target_id] {
                if !rows.nodes.contains_key(&endpoint) {
                    return Err(GraphError::DanglingEdge {
                        edge_id: first_id + offset as EdgeId,
                        node_id: endpoint,
                    });
                }
            }
        }

        let mut inserted = Vec::with_capacity(pairs.len());
        for &(source_id, target_id) in pairs {
            rows.next_edge_id += 1;
            let edge = EdgeRecord::new(rows.next_edge_id, source_id, target_id);
            rows.edges.insert(edge.id, edge.clone());
            inserted.push(edge);
        }
        Ok(inserted)
    }

    /// Delete a node and every edge touching it.
    pub fn delete_node(&self, id: NodeId) -> Result<bool> {
        let mut rows = self.write()?;
        if rows.nodes.remove(&id).is_none() {
            return Ok(false);
        }
        rows.edges
            .retain(|_, e| e.source_id != id && e.target_id != id);
        Ok(true)
    }

    pub fn delete_edge(&self, id: EdgeId) -> Result<bool> {
        Ok(self.write()?.edges.remove(&id).is_some())
    }
}

impl GraphStore for MemoryStore {
    type Snapshot<'a> = MemorySnapshot<'a>;

    fn snapshot(&self) -> Result<MemorySnapshot<'_>> {
        Ok(MemorySnapshot { rows: self.read()? })
    }

    fn fetch_all_vertices(&self) -> Result<Vec<Node>> {
        self.snapshot()?.fetch_all_vertices()
    }

    fn fetch_all_edges(&self) -> Result<Vec<EdgeRecord>> {
        self.snapshot()?.fetch_all_edges()
    }

    fn fetch_vertices(&self, ids: &[NodeId]) -> Result<Vec<Node>> {
        self.snapshot()?.fetch_vertices(ids)
    }

    fn contains_vertex(&self, id: NodeId) -> Result<bool> {
        self.snapshot()?.contains_vertex(id)
    }

    fn count_vertices(&self) -> Result<usize> {
        self.snapshot()?.count_vertices()
    }

    fn count_edges(&self) -> Result<usize> {
        self.snapshot()?.count_edges()
    }
}

/// A [`MemoryStore`] read view that holds the read lock until dropped.
pub struct MemorySnapshot<'a> {
    rows: RwLockReadGuard<'a, Rows>,
}

impl GraphStore for MemorySnapshot<'_> {
    type Snapshot<'b> = &'b Self
    where
        Self: 'b;

    fn snapshot(&self) -> Result<&Self> {
        Ok(self)
    }

    fn fetch_all_vertices(&self) -> Result<Vec<Node>> {
        Ok(self.rows.nodes.values().cloned().collect())
    }

    fn fetch_all_edges(&self) -> Result<Vec<EdgeRecord>> {
        Ok(self.rows.edges.values().cloned().collect())
    }

    fn fetch_vertices(&self, ids: &[NodeId]) -> Result<Vec<Node>> {
        let mut found: Vec<Node> = ids
            .iter()
            .filter_map(|id| self.rows.nodes.get(id).cloned())
            .collect();
        found.sort();
        found.dedup();
        Ok(found)
    }

    fn contains_vertex(&self, id: NodeId) -> Result<bool> {
        Ok(self.rows.nodes.contains_key(&id))
    }

    fn count_vertices(&self) -> Result<usize> {
        Ok(self.rows.nodes.len())
    }

    fn count_edges(&self) -> Result<usize> {
        Ok(self.rows.edges.len())
    }
}

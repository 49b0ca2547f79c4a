//! Structural graph queries over a [`GraphStore`].
//!
//! [`GraphEngine`] keeps no graph state of its own. Every query reads the
//! store afresh, so writes made between two queries are always visible.
//! A query that needs several reads makes them all through one
//! [`GraphStore::snapshot`], so it never mixes two committed states.
//! Endpoints are resolved with one batched [`GraphStore::fetch_vertices`]
//! per query rather than one lookup per edge.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::error::{GraphError, Result};
use crate::graph::store::GraphStore;
use crate::types::{
    Adjacency, Arc, Degree, Direction, EdgeId, EdgeRecord, GraphStats, Node, NodeId,
    ResultShape, VertexKey,
};

/// Read-only query engine bound to a store.
#[derive(Debug, Clone)]
pub struct GraphEngine<S> {
    store: S,
}

impl<S: GraphStore> GraphEngine<S> {
    /// Create an engine over `store`. Pass `&store` to keep using the store
    /// for writes alongside the engine.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    // -------------------------------------------------------------------
    // Membership
    // -------------------------------------------------------------------

    /// Every vertex in the store.
    pub fn vertices(&self) -> Result<BTreeSet<Node>> {
        let vertices: BTreeSet<Node> = self.store.fetch_all_vertices()?.into_iter().collect();
        tracing::debug!(count = vertices.len(), "vertices");
        Ok(vertices)
    }

    /// Whether `vertex` is persisted. Unsaved or unknown vertices give
    /// `false`.
    pub fn has_vertex(&self, vertex: &impl VertexKey) -> Result<bool> {
        match vertex.vertex_id() {
            Some(id) => self.store.contains_vertex(id),
            None => Ok(false),
        }
    }

    /// One arc per edge row, with both endpoints resolved.
    pub fn edges(&self) -> Result<Vec<Arc>> {
        let snap = self.store.snapshot()?;
        let rows = snap.fetch_all_edges()?;
        let index: HashMap<NodeId, Node> = snap
            .fetch_all_vertices()?
            .into_iter()
            .map(|n| (n.id, n))
            .collect();
        let arcs = rows
            .iter()
            .map(|edge| arc_from(&index, edge))
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!(count = arcs.len(), "edges");
        Ok(arcs)
    }

    /// Whether some edge row joins the arc's endpoints in its direction.
    pub fn has_edge(&self, arc: &Arc) -> Result<bool> {
        self.has_edge_between(&arc.source, &arc.target)
    }

    /// [`has_edge`](Self::has_edge) for bare endpoints. An endpoint without
    /// an id gives `false`.
    pub fn has_edge_between(
        &self,
        source: &impl VertexKey,
        target: &impl VertexKey,
    ) -> Result<bool> {
        match (source.vertex_id(), target.vertex_id()) {
            (Some(source_id), Some(target_id)) => self.store.contains_edge(source_id, target_id),
            _ => Ok(false),
        }
    }

    // -------------------------------------------------------------------
    // Adjacency
    // -------------------------------------------------------------------

    /// Neighbours or incident arcs of `vertex`.
    ///
    /// Unknown or unsaved vertices yield an empty result of the requested
    /// shape.
    pub fn adjacent(
        &self,
        vertex: &impl VertexKey,
        direction: Direction,
        shape: ResultShape,
    ) -> Result<Adjacency> {
        let adjacency = match shape {
            ResultShape::Vertices => Adjacency::Vertices(self.adjacent_vertices(vertex, direction)?),
            ResultShape::Edges => Adjacency::Edges(self.adjacent_edges(vertex, direction)?),
        };
        tracing::debug!(
            vertex = ?vertex.vertex_id(),
            %direction,
            %shape,
            count = adjacency.len(),
            "adjacent"
        );
        Ok(adjacency)
    }

    /// Distinct neighbour vertices in `direction`.
    pub fn adjacent_vertices(
        &self,
        vertex: &impl VertexKey,
        direction: Direction,
    ) -> Result<BTreeSet<Node>> {
        let Some(id) = vertex.vertex_id() else {
            return Ok(BTreeSet::new());
        };

        let snap = self.store.snapshot()?;
        // neighbour id -> an edge that reaches it, kept for error reporting
        let mut neighbours: BTreeMap<NodeId, EdgeId> = BTreeMap::new();
        if matches!(direction, Direction::In | Direction::All) {
            for edge in snap.fetch_edges_to(id)? {
                neighbours.entry(edge.source_id).or_insert(edge.id);
            }
        }
        if matches!(direction, Direction::Out | Direction::All) {
            for edge in snap.fetch_edges_from(id)? {
                neighbours.entry(edge.target_id).or_insert(edge.id);
            }
        }

        let index = resolve(&snap, &neighbours)?;
        Ok(index.into_values().collect())
    }

    /// Incident arcs in `direction`, one per edge row.
    ///
    /// For [`Direction::All`] the incoming and outgoing rows are merged by
    /// edge id, so a self-loop is reported once.
    pub fn adjacent_edges(&self, vertex: &impl VertexKey, direction: Direction) -> Result<Vec<Arc>> {
        let Some(id) = vertex.vertex_id() else {
            return Ok(Vec::new());
        };

        let snap = self.store.snapshot()?;
        let rows = match direction {
            Direction::In => snap.fetch_edges_to(id)?,
            Direction::Out => snap.fetch_edges_from(id)?,
            Direction::All => {
                let mut merged: BTreeMap<EdgeId, EdgeRecord> = BTreeMap::new();
                for edge in snap.fetch_edges_to(id)? {
                    merged.insert(edge.id, edge);
                }
                for edge in snap.fetch_edges_from(id)? {
                    merged.entry(edge.id).or_insert(edge);
                }
                merged.into_values().collect()
            }
        };

        resolve_arcs(&snap, &rows)
    }

    // -------------------------------------------------------------------
    // Classification
    // -------------------------------------------------------------------

    /// Vertices with no incoming edges. Isolated vertices are included.
    pub fn sources(&self) -> Result<BTreeSet<Node>> {
        let sources = without_endpoint(&self.store.snapshot()?, |edge| edge.target_id)?;
        tracing::debug!(count = sources.len(), "sources");
        Ok(sources)
    }

    /// Vertices with no outgoing edges. Isolated vertices are included.
    pub fn sinks(&self) -> Result<BTreeSet<Node>> {
        let sinks = without_endpoint(&self.store.snapshot()?, |edge| edge.source_id)?;
        tracing::debug!(count = sinks.len(), "sinks");
        Ok(sinks)
    }

    /// In/out degree of every vertex, from a single pass over the edges.
    pub fn degrees(&self) -> Result<HashMap<NodeId, Degree>> {
        let snap = self.store.snapshot()?;
        let mut tally: HashMap<NodeId, Degree> = snap
            .fetch_all_vertices()?
            .into_iter()
            .map(|n| (n.id, Degree::default()))
            .collect();
        for edge in snap.fetch_all_edges()? {
            tally.entry(edge.source_id).or_default().outgoing += 1;
            tally.entry(edge.target_id).or_default().incoming += 1;
        }
        Ok(tally)
    }

    /// In/out degree of one vertex. Unknown vertices have degree zero.
    pub fn degree(&self, vertex: &impl VertexKey) -> Result<Degree> {
        let Some(id) = vertex.vertex_id() else {
            return Ok(Degree::default());
        };
        let snap = self.store.snapshot()?;
        Ok(Degree {
            incoming: snap.fetch_edges_to(id)?.len(),
            outgoing: snap.fetch_edges_from(id)?.len(),
        })
    }

    pub fn stats(&self) -> Result<GraphStats> {
        let snap = self.store.snapshot()?;
        Ok(GraphStats {
            vertices: snap.count_vertices()?,
            edges: snap.count_edges()?,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Vertices that never appear as `endpoint(edge)` for any edge.
fn without_endpoint<R: GraphStore>(
    snap: &R,
    endpoint: impl Fn(&EdgeRecord) -> NodeId,
) -> Result<BTreeSet<Node>> {
    let edges = snap.fetch_all_edges()?;
    let touched: HashSet<NodeId> = edges.iter().map(endpoint).collect();
    Ok(snap
        .fetch_all_vertices()?
        .into_iter()
        .filter(|n| !touched.contains(&n.id))
        .collect())
}

/// Load the vertices named in `wanted` (id -> referencing edge).
fn resolve<R: GraphStore>(
    snap: &R,
    wanted: &BTreeMap<NodeId, EdgeId>,
) -> Result<HashMap<NodeId, Node>> {
    if wanted.is_empty() {
        return Ok(HashMap::new());
    }
    let ids: Vec<NodeId> = wanted.keys().copied().collect();
    let index: HashMap<NodeId, Node> = snap
        .fetch_vertices(&ids)?
        .into_iter()
        .map(|n| (n.id, n))
        .collect();
    if let Some((&node_id, &edge_id)) = wanted.iter().find(|(id, _)| !index.contains_key(*id)) {
        return Err(GraphError::DanglingEdge { edge_id, node_id });
    }
    Ok(index)
}

fn resolve_arcs<R: GraphStore>(snap: &R, rows: &[EdgeRecord]) -> Result<Vec<Arc>> {
    let mut wanted: BTreeMap<NodeId, EdgeId> = BTreeMap::new();
    for edge in rows {
        wanted.entry(edge.source_id).or_insert(edge.id);
        wanted.entry(edge.target_id).or_insert(edge.id);
    }
    let index = resolve(snap, &wanted)?;
    rows.iter().map(|edge| arc_from(&index, edge)).collect()
}

fn arc_from(index: &HashMap<NodeId, Node>, edge: &EdgeRecord) -> Result<Arc> {
    let lookup = |node_id: NodeId| {
        index.get(&node_id).cloned().ok_or(GraphError::DanglingEdge {
            edge_id: edge.id,
            node_id,
        })
    };
    Ok(Arc::new(lookup(edge.source_id)?, lookup(edge.target_id)?))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

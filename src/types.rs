//! Core domain types for rowgraph.
//!
//! Vertices are persisted node rows, arcs are directed edge rows with both
//! endpoints resolved. Identity is always the row id: two [`Node`] values
//! with the same id are the same vertex no matter what their other columns
//! say, and two [`Arc`]s are equal when their endpoint ids are.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GraphError;

/// Row id of a node.
pub type NodeId = i64;

/// Row id of an edge.
pub type EdgeId = i64;

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// A persisted vertex.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<serde_json::Value>,
}

impl Node {
    pub fn new(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            properties: None,
        }
    }

    pub fn with_properties(mut self, properties: serde_json::Value) -> Self {
        self.properties = Some(properties);
        self
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

/// A vertex that has not been saved yet. It has no id and is never a member
/// of the graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<serde_json::Value>,
}

impl NewNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: None,
        }
    }
}

// ---------------------------------------------------------------------------
// VertexKey
// ---------------------------------------------------------------------------

/// Anything a membership or adjacency query can be asked about.
///
/// Returns `None` for values that carry no row id; queries treat those as
/// "not in the graph" instead of failing.
pub trait VertexKey {
    fn vertex_id(&self) -> Option<NodeId>;
}

impl VertexKey for Node {
    fn vertex_id(&self) -> Option<NodeId> {
        Some(self.id)
    }
}

impl VertexKey for NewNode {
    fn vertex_id(&self) -> Option<NodeId> {
        None
    }
}

impl VertexKey for NodeId {
    fn vertex_id(&self) -> Option<NodeId> {
        Some(*self)
    }
}

impl VertexKey for Option<NodeId> {
    fn vertex_id(&self) -> Option<NodeId> {
        *self
    }
}

impl<T: VertexKey + ?Sized> VertexKey for &T {
    fn vertex_id(&self) -> Option<NodeId> {
        (**self).vertex_id()
    }
}

// ---------------------------------------------------------------------------
// EdgeRecord
// ---------------------------------------------------------------------------

/// A raw edge row as the store returns it: endpoints are ids only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub id: EdgeId,
    pub source_id: NodeId,
    pub target_id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<serde_json::Value>,
}

impl EdgeRecord {
    pub fn new(id: EdgeId, source_id: NodeId, target_id: NodeId) -> Self {
        Self {
            id,
            source_id,
            target_id,
            properties: None,
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.source_id == self.target_id
    }
}

// ---------------------------------------------------------------------------
// Arc
// ---------------------------------------------------------------------------

/// A directed edge between two resolved vertices.
///
/// Equality and hashing use the `(source.id, target.id)` pair, so
/// `Arc::new(a, b) != Arc::new(b, a)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arc {
    pub source: Node,
    pub target: Node,
}

impl Arc {
    pub fn new(source: Node, target: Node) -> Self {
        Self { source, target }
    }

    pub fn endpoint_ids(&self) -> (NodeId, NodeId) {
        (self.source.id, self.target.id)
    }

    /// The same arc pointing the other way.
    pub fn reversed(&self) -> Self {
        Self {
            source: self.target.clone(),
            target: self.source.clone(),
        }
    }
}

impl PartialEq for Arc {
    fn eq(&self, other: &Self) -> bool {
        self.endpoint_ids() == other.endpoint_ids()
    }
}

impl Eq for Arc {}

impl Hash for Arc {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.endpoint_ids().hash(state);
    }
}

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// Which incident edges an adjacency query follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Edges whose target is the queried vertex.
    In,
    /// Edges whose source is the queried vertex.
    Out,
    /// Both of the above.
    #[default]
    All,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
            Self::All => "all",
        }
    }

    pub fn reverse(self) -> Self {
        match self {
            Self::In => Self::Out,
            Self::Out => Self::In,
            Self::All => Self::All,
        }
    }
}

impl FromStr for Direction {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "in" | "incoming" => Ok(Self::In),
            "out" | "outgoing" => Ok(Self::Out),
            "all" | "both" => Ok(Self::All),
            _ => Err(GraphError::invalid_argument("direction", s)),
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ResultShape
// ---------------------------------------------------------------------------

/// Whether an adjacency query returns neighbour vertices or incident arcs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultShape {
    #[default]
    Vertices,
    Edges,
}

impl ResultShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vertices => "vertices",
            Self::Edges => "edges",
        }
    }
}

impl FromStr for ResultShape {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "vertices" | "vertex" | "nodes" => Ok(Self::Vertices),
            "edges" | "edge" | "arcs" => Ok(Self::Edges),
            _ => Err(GraphError::invalid_argument("type", s)),
        }
    }
}

impl std::fmt::Display for ResultShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Query results
// ---------------------------------------------------------------------------

/// Result of an adjacency query, shaped by [`ResultShape`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "items", rename_all = "lowercase")]
pub enum Adjacency {
    /// Neighbours, one per distinct vertex.
    Vertices(BTreeSet<Node>),
    /// Incident arcs, one per edge row.
    Edges(Vec<Arc>),
}

impl Adjacency {
    pub fn len(&self) -> usize {
        match self {
            Self::Vertices(v) => v.len(),
            Self::Edges(e) => e.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_vertices(self) -> Option<BTreeSet<Node>> {
        match self {
            Self::Vertices(v) => Some(v),
            Self::Edges(_) => None,
        }
    }

    pub fn into_edges(self) -> Option<Vec<Arc>> {
        match self {
            Self::Edges(e) => Some(e),
            Self::Vertices(_) => None,
        }
    }
}

/// In- and out-degree of a single vertex. Parallel edges count separately.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Degree {
    pub incoming: usize,
    pub outgoing: usize,
}

impl Degree {
    pub fn total(&self) -> usize {
        self.incoming + self.outgoing
    }

    pub fn is_isolated(&self) -> bool {
        self.total() == 0
    }
}

/// Aggregate statistics about the stored graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub vertices: usize,
    pub edges: usize,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;
    use test_case::test_case;

    #[test]
    fn node_equality_ignores_attributes() {
        let a = Node::new(1, "a");
        let renamed = Node::new(1, "renamed").with_properties(serde_json::json!({"k": 1}));
        assert_eq!(a, renamed);
        assert_ne!(a, Node::new(2, "a"));
    }

    #[test]
    fn node_set_dedups_by_id() {
        let set: HashSet<Node> = [Node::new(1, "x"), Node::new(1, "y"), Node::new(2, "x")]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn arc_equality_is_direction_sensitive() {
        let a = Node::new(1, "a");
        let b = Node::new(2, "b");
        let ab = Arc::new(a.clone(), b.clone());
        assert_eq!(ab, Arc::new(a.clone(), b.clone()));
        assert_ne!(ab, Arc::new(b, a));
        assert_eq!(ab.reversed().endpoint_ids(), (2, 1));
    }

    #[test]
    fn vertex_key_for_unsaved_node_is_none() {
        assert_eq!(NewNode::new("draft").vertex_id(), None);
        assert_eq!(Node::new(9, "n").vertex_id(), Some(9));
        assert_eq!(7i64.vertex_id(), Some(7));
        assert_eq!(None::<NodeId>.vertex_id(), None);
    }

    #[test_case("in", Direction::In ; "in")]
    #[test_case("OUT", Direction::Out ; "out uppercase")]
    #[test_case(" all ", Direction::All ; "all padded")]
    #[test_case("incoming", Direction::In ; "incoming alias")]
    #[test_case("both", Direction::All ; "both alias")]
    fn direction_parses(input: &str, expected: Direction) {
        assert_eq!(input.parse::<Direction>().unwrap(), expected);
    }

    #[test_case("sideways" ; "unknown word")]
    #[test_case("" ; "empty")]
    fn direction_rejects_unknown(input: &str) {
        let err = input.parse::<Direction>().unwrap_err();
        assert!(matches!(err, GraphError::InvalidArgument { .. }));
    }

    #[test_case("vertices", ResultShape::Vertices ; "vertices")]
    #[test_case("Edges", ResultShape::Edges ; "edges mixed case")]
    #[test_case("arcs", ResultShape::Edges ; "arcs alias")]
    fn result_shape_parses(input: &str, expected: ResultShape) {
        assert_eq!(input.parse::<ResultShape>().unwrap(), expected);
    }

    #[test]
    fn result_shape_rejects_unknown() {
        let err = "paths".parse::<ResultShape>().unwrap_err();
        assert_eq!(err.to_string(), "invalid type: 'paths'");
    }

    #[test]
    fn direction_reverse() {
        assert_eq!(Direction::In.reverse(), Direction::Out);
        assert_eq!(Direction::Out.reverse(), Direction::In);
        assert_eq!(Direction::All.reverse(), Direction::All);
    }

    #[test]
    fn direction_display_roundtrip() {
        for d in [Direction::In, Direction::Out, Direction::All] {
            assert_eq!(d.to_string().parse::<Direction>().unwrap(), d);
        }
    }

    #[test]
    fn adjacency_accessors() {
        let verts = Adjacency::Vertices(BTreeSet::from([Node::new(1, "a")]));
        assert_eq!(verts.len(), 1);
        assert!(verts.clone().into_edges().is_none());
        assert_eq!(verts.into_vertices().unwrap().len(), 1);

        let empty = Adjacency::Edges(Vec::new());
        assert!(empty.is_empty());
    }

    #[test]
    fn adjacency_serializes_with_tag() {
        let adj = Adjacency::Vertices(BTreeSet::from([Node::new(3, "c")]));
        let json = serde_json::to_value(&adj).unwrap();
        assert_eq!(json["type"], "vertices");
        assert_eq!(json["items"][0]["id"], 3);
    }

    #[test]
    fn degree_isolated() {
        assert!(Degree::default().is_isolated());
        let d = Degree {
            incoming: 2,
            outgoing: 1,
        };
        assert_eq!(d.total(), 3);
        assert!(!d.is_isolated());
    }
}

//! Node/edge storage: the [`GraphStore`] contract and its SQLite backend.
//!
//! The engine only ever reads through [`GraphStore`]. The two required
//! methods return every row; the narrower fetches have default bodies in
//! terms of those and [`SqliteStore`] overrides them with indexed queries.
//! Statements go through [`Connection::prepare_cached`], so repeated
//! queries reuse their compiled form.
//!
//! A query that needs more than one read takes a [`GraphStore::snapshot`]
//! first and reads only through it. For SQLite the snapshot is a deferred
//! read transaction, so commits from other connections stay invisible
//! until the query finishes.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use rusqlite::{params, params_from_iter, Connection, Transaction};

use crate::config::DatabaseConfig;
use crate::db::converters::{properties_to_sql, row_to_edge, row_to_node};
use crate::db::schema::{
    apply_schema, initialize_database, open_existing_database, DEFAULT_BUSY_TIMEOUT,
};
use crate::error::{GraphError, Result};
use crate::types::{EdgeId, EdgeRecord, NewNode, Node, NodeId};

// ---------------------------------------------------------------------------
// GraphStore
// ---------------------------------------------------------------------------

/// Read access to persisted vertices and edges.
///
/// Implementations must return current contents on every call; the engine
/// never caches.
pub trait GraphStore {
    /// A read view that stays fixed for as long as it is held.
    type Snapshot<'a>: GraphStore
    where
        Self: 'a;

    /// Pin the current contents. Every read through the returned view sees
    /// the same committed state. Stores that are already fixed return
    /// `self`.
    fn snapshot(&self) -> Result<Self::Snapshot<'_>>;

    /// Every vertex row.
    fn fetch_all_vertices(&self) -> Result<Vec<Node>>;

    /// Every edge row, ordered by edge id.
    fn fetch_all_edges(&self) -> Result<Vec<EdgeRecord>>;

    /// The vertices whose ids appear in `ids`. Unknown ids are skipped.
    fn fetch_vertices(&self, ids: &[NodeId]) -> Result<Vec<Node>> {
        let wanted: HashSet<NodeId> = ids.iter().copied().collect();
        Ok(self
            .fetch_all_vertices()?
            .into_iter()
            .filter(|n| wanted.contains(&n.id))
            .collect())
    }

    fn contains_vertex(&self, id: NodeId) -> Result<bool> {
        Ok(self.fetch_all_vertices()?.iter().any(|n| n.id == id))
    }

    /// Edge rows whose source is `id`.
    fn fetch_edges_from(&self, id: NodeId) -> Result<Vec<EdgeRecord>> {
        Ok(self
            .fetch_all_edges()?
            .into_iter()
            .filter(|e| e.source_id == id)
            .collect())
    }

    /// Edge rows whose target is `id`.
    fn fetch_edges_to(&self, id: NodeId) -> Result<Vec<EdgeRecord>> {
        Ok(self
            .fetch_all_edges()?
            .into_iter()
            .filter(|e| e.target_id == id)
            .collect())
    }

    fn contains_edge(&self, source_id: NodeId, target_id: NodeId) -> Result<bool> {
        Ok(self
            .fetch_all_edges()?
            .iter()
            .any(|e| e.source_id == source_id && e.target_id == target_id))
    }

    fn count_vertices(&self) -> Result<usize> {
        Ok(self.fetch_all_vertices()?.len())
    }

    fn count_edges(&self) -> Result<usize> {
        Ok(self.fetch_all_edges()?.len())
    }
}

impl<S: GraphStore + ?Sized> GraphStore for &S {
    type Snapshot<'a> = S::Snapshot<'a>
    where
        Self: 'a;

    fn snapshot(&self) -> Result<Self::Snapshot<'_>> {
        (**self).snapshot()
    }

    fn fetch_all_vertices(&self) -> Result<Vec<Node>> {
        (**self).fetch_all_vertices()
    }

    fn fetch_all_edges(&self) -> Result<Vec<EdgeRecord>> {
        (**self).fetch_all_edges()
    }

    fn fetch_vertices(&self, ids: &[NodeId]) -> Result<Vec<Node>> {
        (**self).fetch_vertices(ids)
    }

    fn contains_vertex(&self, id: NodeId) -> Result<bool> {
        (**self).contains_vertex(id)
    }

    fn fetch_edges_from(&self, id: NodeId) -> Result<Vec<EdgeRecord>> {
        (**self).fetch_edges_from(id)
    }

    fn fetch_edges_to(&self, id: NodeId) -> Result<Vec<EdgeRecord>> {
        (**self).fetch_edges_to(id)
    }

    fn contains_edge(&self, source_id: NodeId, target_id: NodeId) -> Result<bool> {
        (**self).contains_edge(source_id, target_id)
    }

    fn count_vertices(&self) -> Result<usize> {
        (**self).count_vertices()
    }

    fn count_edges(&self) -> Result<usize> {
        (**self).count_edges()
    }
}

// ---------------------------------------------------------------------------
// SqliteStore
// ---------------------------------------------------------------------------

/// Typed wrapper around the rowgraph SQLite database.
pub struct SqliteStore {
    pub conn: Connection,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// SQL constants
// ---------------------------------------------------------------------------

const INSERT_NODE_SQL: &str = "INSERT INTO nodes (name, properties) VALUES (?1, ?2)";

const UPSERT_NODE_SQL: &str = "\
INSERT INTO nodes (id, name, properties)
VALUES (?1, ?2, ?3)
ON CONFLICT(id) DO UPDATE SET
  name = excluded.name,
  properties = excluded.properties";

const INSERT_EDGE_SQL: &str = "\
INSERT INTO edges (source_id, target_id, properties) VALUES (?1, ?2, ?3)";

const SELECT_ALL_NODES_SQL: &str = "SELECT id, name, properties FROM nodes ORDER BY id";

const SELECT_ALL_EDGES_SQL: &str = "\
SELECT id, source_id, target_id, properties FROM edges ORDER BY id";

const SELECT_EDGES_FROM_SQL: &str = "\
SELECT id, source_id, target_id, properties FROM edges WHERE source_id = ?1 ORDER BY id";

const SELECT_EDGES_TO_SQL: &str = "\
SELECT id, source_id, target_id, properties FROM edges WHERE target_id = ?1 ORDER BY id";

/// Ids per `IN (...)` lookup; stays well under SQLite's host parameter limit.
const ID_CHUNK: usize = 500;

impl SqliteStore {
    /// Open (or create) the database at `db_path` with the default busy
    /// timeout.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_timeout(db_path, DEFAULT_BUSY_TIMEOUT)
    }

    pub fn open_with_timeout(db_path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self> {
        let path = db_path.as_ref().to_string_lossy();
        let conn = initialize_database(&path, busy_timeout)?;
        Ok(Self { conn })
    }

    /// A private in-memory database. Each call gets a fresh, empty graph.
    pub fn open_in_memory() -> Result<Self> {
        Self::open(":memory:")
    }

    pub fn from_config(config: &DatabaseConfig) -> Result<Self> {
        Self::open_with_timeout(
            &config.path,
            Duration::from_millis(config.busy_timeout_ms),
        )
    }

    /// Open a database that must already exist. Nothing is created when
    /// `db_path` is missing.
    pub fn open_existing(db_path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self> {
        let db_path = db_path.as_ref();
        if !db_path.is_file() {
            return Err(GraphError::DatabaseNotFound(db_path.to_path_buf()));
        }
        let conn = open_existing_database(&db_path.to_string_lossy(), busy_timeout)?;
        Ok(Self { conn })
    }

    /// [`open_existing`](Self::open_existing) with the configured path and
    /// busy timeout.
    pub fn existing_from_config(config: &DatabaseConfig) -> Result<Self> {
        Self::open_existing(&config.path, Duration::from_millis(config.busy_timeout_ms))
    }

    /// Wrap an already-open connection, applying the schema if missing.
    pub fn from_connection(conn: Connection) -> Result<Self> {
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    // -------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------

    /// Insert a new node and return it with its assigned id.
    pub fn insert_node(&self, node: &NewNode) -> Result<Node> {
        let mut stmt = self.conn.prepare_cached(INSERT_NODE_SQL)?;
        stmt.execute(params![
            node.name,
            properties_to_sql(node.properties.as_ref())
        ])?;
        Ok(Node {
            id: self.conn.last_insert_rowid(),
            name: node.name.clone(),
            properties: node.properties.clone(),
        })
    }

    /// Insert or update a node with a caller-chosen id.
    pub fn upsert_node(&self, node: &Node) -> Result<()> {
        let mut stmt = self.conn.prepare_cached(UPSERT_NODE_SQL)?;
        stmt.execute(params![
            node.id,
            node.name,
            properties_to_sql(node.properties.as_ref())
        ])?;
        Ok(())
    }

    /// Batch-upsert nodes inside a single transaction.
    pub fn upsert_nodes(&self, nodes: &[Node]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(UPSERT_NODE_SQL)?;
            for node in nodes {
                stmt.execute(params![
                    node.id,
                    node.name,
                    properties_to_sql(node.properties.as_ref())
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Insert one edge row. Parallel edges are separate rows.
    pub fn insert_edge(&self, source_id: NodeId, target_id: NodeId) -> Result<EdgeRecord> {
        self.insert_edge_with_properties(source_id, target_id, None)
    }

    pub fn insert_edge_with_properties(
        &self,
        source_id: NodeId,
        target_id: NodeId,
        properties: Option<serde_json::Value>,
    ) -> Result<EdgeRecord> {
        let mut stmt = self.conn.prepare_cached(INSERT_EDGE_SQL)?;
        stmt.execute(params![
            source_id,
            target_id,
            properties_to_sql(properties.as_ref())
        ])?;
        Ok(EdgeRecord {
            id: self.conn.last_insert_rowid(),
            source_id,
            target_id,
            properties,
        })
    }

    /// Batch-insert `(source, target)` edges inside a single transaction.
    pub fn insert_edges(&self, pairs: &[(NodeId, NodeId)]) -> Result<Vec<EdgeRecord>> {
        let tx = self.conn.unchecked_transaction()?;
        let mut inserted = Vec::with_capacity(pairs.len());
        {
            let mut stmt = tx.prepare_cached(INSERT_EDGE_SQL)?;
            for &(source_id, target_id) in pairs {
                stmt.execute(params![source_id, target_id, None::<String>])?;
                inserted.push(EdgeRecord::new(
                    tx.last_insert_rowid(),
                    source_id,
                    target_id,
                ));
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    /// Delete a node; its edges go with it. Returns whether a row existed.
    pub fn delete_node(&self, id: NodeId) -> Result<bool> {
        let mut stmt = self.conn.prepare_cached("DELETE FROM nodes WHERE id = ?1")?;
        Ok(stmt.execute(params![id])? > 0)
    }

    /// Delete one edge row. Returns whether a row existed.
    pub fn delete_edge(&self, id: EdgeId) -> Result<bool> {
        let mut stmt = self.conn.prepare_cached("DELETE FROM edges WHERE id = ?1")?;
        Ok(stmt.execute(params![id])? > 0)
    }

    /// Reads outside any transaction; each call sees the latest commit.
    fn live(&self) -> SqliteSnapshot<'_> {
        SqliteSnapshot {
            conn: &self.conn,
            _tx: None,
        }
    }
}

impl GraphStore for SqliteStore {
    type Snapshot<'a> = SqliteSnapshot<'a>;

    /// Opens a deferred read transaction. When the connection is already
    /// inside a transaction that one is used as is.
    fn snapshot(&self) -> Result<SqliteSnapshot<'_>> {
        let tx = if self.conn.is_autocommit() {
            Some(self.conn.unchecked_transaction()?)
        } else {
            None
        };
        Ok(SqliteSnapshot {
            conn: &self.conn,
            _tx: tx,
        })
    }

    fn fetch_all_vertices(&self) -> Result<Vec<Node>> {
        self.live().fetch_all_vertices()
    }

    fn fetch_all_edges(&self) -> Result<Vec<EdgeRecord>> {
        self.live().fetch_all_edges()
    }

    fn fetch_vertices(&self, ids: &[NodeId]) -> Result<Vec<Node>> {
        self.live().fetch_vertices(ids)
    }

    fn contains_vertex(&self, id: NodeId) -> Result<bool> {
        self.live().contains_vertex(id)
    }

    fn fetch_edges_from(&self, id: NodeId) -> Result<Vec<EdgeRecord>> {
        self.live().fetch_edges_from(id)
    }

    fn fetch_edges_to(&self, id: NodeId) -> Result<Vec<EdgeRecord>> {
        self.live().fetch_edges_to(id)
    }

    fn contains_edge(&self, source_id: NodeId, target_id: NodeId) -> Result<bool> {
        self.live().contains_edge(source_id, target_id)
    }

    fn count_vertices(&self) -> Result<usize> {
        self.live().count_vertices()
    }

    fn count_edges(&self) -> Result<usize> {
        self.live().count_edges()
    }
}

// ---------------------------------------------------------------------------
// SqliteSnapshot
// ---------------------------------------------------------------------------

/// Reads against one [`SqliteStore`] connection, pinned by a read
/// transaction that is rolled back on drop.
pub struct SqliteSnapshot<'a> {
    conn: &'a Connection,
    _tx: Option<Transaction<'a>>,
}

impl SqliteSnapshot<'_> {
    fn query_edges(&self, sql: &str, id: NodeId) -> Result<Vec<EdgeRecord>> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let rows = stmt.query_and_then(params![id], row_to_edge)?;
        rows.collect()
    }
}

impl GraphStore for SqliteSnapshot<'_> {
    type Snapshot<'b> = &'b Self
    where
        Self: 'b;

    fn snapshot(&self) -> Result<&Self> {
        Ok(self)
    }

    fn fetch_all_vertices(&self) -> Result<Vec<Node>> {
        let mut stmt = self.conn.prepare_cached(SELECT_ALL_NODES_SQL)?;
        let rows = stmt.query_and_then([], row_to_node)?;
        rows.collect()
    }

    fn fetch_all_edges(&self) -> Result<Vec<EdgeRecord>> {
        let mut stmt = self.conn.prepare_cached(SELECT_ALL_EDGES_SQL)?;
        let rows = stmt.query_and_then([], row_to_edge)?;
        rows.collect()
    }

    fn fetch_vertices(&self, ids: &[NodeId]) -> Result<Vec<Node>> {
        let mut nodes = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(ID_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                "SELECT id, name, properties FROM nodes WHERE id IN ({placeholders}) ORDER BY id"
            );
            let mut stmt = self.conn.prepare_cached(&sql)?;
            let rows = stmt.query_and_then(params_from_iter(chunk.iter()), row_to_node)?;
            for node in rows {
                nodes.push(node?);
            }
        }
        tracing::trace!(requested = ids.len(), found = nodes.len(), "fetch_vertices");
        Ok(nodes)
    }

    fn contains_vertex(&self, id: NodeId) -> Result<bool> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT EXISTS(SELECT 1 FROM nodes WHERE id = ?1)")?;
        let exists: bool = stmt.query_row(params![id], |row| row.get(0))?;
        Ok(exists)
    }

    fn fetch_edges_from(&self, id: NodeId) -> Result<Vec<EdgeRecord>> {
        self.query_edges(SELECT_EDGES_FROM_SQL, id)
    }

    fn fetch_edges_to(&self, id: NodeId) -> Result<Vec<EdgeRecord>> {
        self.query_edges(SELECT_EDGES_TO_SQL, id)
    }

    fn contains_edge(&self, source_id: NodeId, target_id: NodeId) -> Result<bool> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT EXISTS(SELECT 1 FROM edges WHERE source_id = ?1 AND target_id = ?2)",
        )?;
        let exists: bool = stmt.query_row(params![source_id, target_id], |row| row.get(0))?;
        Ok(exists)
    }

    fn count_vertices(&self) -> Result<usize> {
        let mut stmt = self.conn.prepare_cached("SELECT count(*) FROM nodes")?;
        let count: i64 = stmt.query_row([], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn count_edges(&self) -> Result<usize> {
        let mut stmt = self.conn.prepare_cached("SELECT count(*) FROM edges")?;
        let count: i64 = stmt.query_row([], |row| row.get(0))?;
        Ok(count as usize)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GraphError;
    use pretty_assertions::assert_eq;

    fn setup() -> SqliteStore {
        SqliteStore::open_in_memory().expect("in-memory store should open")
    }

    fn seed(store: &SqliteStore, ids: &[NodeId]) {
        let nodes: Vec<Node> = ids
            .iter()
            .map(|&id| Node::new(id, format!("node-{id}")))
            .collect();
        store.upsert_nodes(&nodes).unwrap();
    }

    // -- vertices ----------------------------------------------------------

    #[test]
    fn empty_store_returns_empty_vecs() {
        let store = setup();
        assert!(store.fetch_all_vertices().unwrap().is_empty());
        assert!(store.fetch_all_edges().unwrap().is_empty());
        assert_eq!(store.count_vertices().unwrap(), 0);
        assert_eq!(store.count_edges().unwrap(), 0);
    }

    #[test]
    fn insert_node_assigns_increasing_ids() {
        let store = setup();
        let a = store.insert_node(&NewNode::new("a")).unwrap();
        let b = store.insert_node(&NewNode::new("b")).unwrap();
        assert!(b.id > a.id);
        assert_eq!(store.count_vertices().unwrap(), 2);
    }

    #[test]
    fn upsert_node_updates_in_place() {
        let store = setup();
        store.upsert_node(&Node::new(5, "before")).unwrap();
        store.upsert_node(&Node::new(5, "after")).unwrap();

        let all = store.fetch_all_vertices().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "after");
    }

    #[test]
    fn node_properties_roundtrip_through_json_column() {
        let store = setup();
        let props = serde_json::json!({"color": "red", "weight": 3});
        store
            .upsert_node(&Node::new(1, "a").with_properties(props.clone()))
            .unwrap();
        let node = store.fetch_all_vertices().unwrap().remove(0);
        assert_eq!(node.properties, Some(props));
    }

    #[test]
    fn fetch_all_vertices_is_ordered_by_id() {
        let store = setup();
        seed(&store, &[7, 1, 4]);
        let ids: Vec<NodeId> = store
            .fetch_all_vertices()
            .unwrap()
            .iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(ids, vec![1, 4, 7]);
    }

    #[test]
    fn contains_vertex_checks_row() {
        let store = setup();
        seed(&store, &[1]);
        assert!(store.contains_vertex(1).unwrap());
        assert!(!store.contains_vertex(2).unwrap());
    }

    #[test]
    fn fetch_vertices_skips_unknown_ids() {
        let store = setup();
        seed(&store, &[1, 2, 3]);
        let found = store.fetch_vertices(&[3, 1, 99]).unwrap();
        let ids: Vec<NodeId> = found.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn fetch_vertices_handles_more_ids_than_one_chunk() {
        let store = setup();
        let ids: Vec<NodeId> = (1..=(ID_CHUNK as i64 * 2 + 7)).collect();
        seed(&store, &ids);
        assert_eq!(store.fetch_vertices(&ids).unwrap().len(), ids.len());
    }

    #[test]
    fn fetch_vertices_with_no_ids() {
        let store = setup();
        seed(&store, &[1]);
        assert!(store.fetch_vertices(&[]).unwrap().is_empty());
    }

    // -- edges -------------------------------------------------------------

    #[test]
    fn insert_edge_and_query_by_endpoint() {
        let store = setup();
        seed(&store, &[1, 2, 3]);
        store.insert_edge(1, 2).unwrap();
        store.insert_edge(3, 2).unwrap();

        assert_eq!(store.fetch_edges_from(1).unwrap().len(), 1);
        assert_eq!(store.fetch_edges_to(2).unwrap().len(), 2);
        assert!(store.fetch_edges_from(2).unwrap().is_empty());
    }

    #[test]
    fn contains_edge_is_direction_sensitive() {
        let store = setup();
        seed(&store, &[1, 2]);
        store.insert_edge(2, 1).unwrap();
        assert!(store.contains_edge(2, 1).unwrap());
        assert!(!store.contains_edge(1, 2).unwrap());
    }

    #[test]
    fn parallel_edges_are_distinct_rows() {
        let store = setup();
        seed(&store, &[1, 2]);
        let first = store.insert_edge(1, 2).unwrap();
        let second = store.insert_edge(1, 2).unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(store.fetch_all_edges().unwrap().len(), 2);
    }

    #[test]
    fn insert_edges_batch() {
        let store = setup();
        seed(&store, &[1, 2, 3]);
        let inserted = store.insert_edges(&[(1, 2), (2, 3), (3, 1)]).unwrap();
        assert_eq!(inserted.len(), 3);
        assert_eq!(store.fetch_all_edges().unwrap(), inserted);
    }

    #[test]
    fn insert_edge_to_missing_node_fails() {
        let store = setup();
        seed(&store, &[1]);
        let err = store.insert_edge(1, 42).unwrap_err();
        assert!(matches!(err, GraphError::Store(_)));
        assert_eq!(store.count_edges().unwrap(), 0);
    }

    #[test]
    fn insert_edges_batch_rolls_back_on_failure() {
        let store = setup();
        seed(&store, &[1, 2]);
        assert!(store.insert_edges(&[(1, 2), (2, 99)]).is_err());
        assert_eq!(store.count_edges().unwrap(), 0);
    }

    #[test]
    fn edge_properties_are_stored() {
        let store = setup();
        seed(&store, &[1, 2]);
        let props = serde_json::json!({"label": "depends_on"});
        store
            .insert_edge_with_properties(1, 2, Some(props.clone()))
            .unwrap();
        let edge = store.fetch_all_edges().unwrap().remove(0);
        assert_eq!(edge.properties, Some(props));
    }

    // -- deletes -----------------------------------------------------------

    #[test]
    fn delete_node_cascades_edges() {
        let store = setup();
        seed(&store, &[1, 2, 3]);
        store.insert_edges(&[(1, 2), (2, 3), (3, 1)]).unwrap();

        assert!(store.delete_node(2).unwrap());
        assert!(!store.delete_node(2).unwrap());
        let remaining = store.fetch_all_edges().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!((remaining[0].source_id, remaining[0].target_id), (3, 1));
    }

    #[test]
    fn delete_edge_removes_single_row() {
        let store = setup();
        seed(&store, &[1, 2]);
        let first = store.insert_edge(1, 2).unwrap();
        store.insert_edge(1, 2).unwrap();

        assert!(store.delete_edge(first.id).unwrap());
        assert_eq!(store.count_edges().unwrap(), 1);
        assert!(store.contains_edge(1, 2).unwrap());
    }

    // -- trait defaults agree with SQL overrides ----------------------------

    /// Exposes only the two required methods so the trait defaults run.
    struct DefaultsOnly<'a>(&'a SqliteStore);

    impl GraphStore for DefaultsOnly<'_> {
        type Snapshot<'b> = &'b Self
        where
            Self: 'b;

        fn snapshot(&self) -> Result<&Self> {
            Ok(self)
        }

        fn fetch_all_vertices(&self) -> Result<Vec<Node>> {
            self.0.fetch_all_vertices()
        }

        fn fetch_all_edges(&self) -> Result<Vec<EdgeRecord>> {
            self.0.fetch_all_edges()
        }
    }

    #[test]
    fn default_methods_match_sql_overrides() {
        let store = setup();
        seed(&store, &[1, 2, 3, 4]);
        store.insert_edges(&[(1, 2), (1, 3), (3, 2), (2, 2)]).unwrap();
        let defaults = DefaultsOnly(&store);

        for id in 0..=5 {
            assert_eq!(
                defaults.contains_vertex(id).unwrap(),
                store.contains_vertex(id).unwrap()
            );
            assert_eq!(
                defaults.fetch_edges_from(id).unwrap(),
                store.fetch_edges_from(id).unwrap()
            );
            assert_eq!(
                defaults.fetch_edges_to(id).unwrap(),
                store.fetch_edges_to(id).unwrap()
            );
            for other in 0..=5 {
                assert_eq!(
                    defaults.contains_edge(id, other).unwrap(),
                    store.contains_edge(id, other).unwrap()
                );
            }
        }
        assert_eq!(
            defaults.fetch_vertices(&[4, 2]).unwrap(),
            store.fetch_vertices(&[4, 2]).unwrap()
        );
        assert_eq!(defaults.count_edges().unwrap(), 4);
    }

    #[test]
    fn from_connection_applies_schema() {
        let conn = Connection::open_in_memory().unwrap();
        let store = SqliteStore::from_connection(conn).unwrap();
        store.upsert_node(&Node::new(1, "a")).unwrap();
        assert_eq!(store.count_vertices().unwrap(), 1);
    }

    #[test]
    fn reads_see_writes_immediately() {
        let store = setup();
        seed(&store, &[1, 2]);
        assert_eq!(store.count_edges().unwrap(), 0);
        store.insert_edge(1, 2).unwrap();
        assert_eq!(store.count_edges().unwrap(), 1);
        store.upsert_node(&Node::new(3, "late")).unwrap();
        assert!(store.contains_vertex(3).unwrap());
    }

    // -- snapshots ----------------------------------------------------------

    #[test]
    fn snapshot_ignores_commits_from_other_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.db");
        let reader = SqliteStore::open(&path).unwrap();
        let writer = SqliteStore::open(&path).unwrap();
        seed(&writer, &[1, 2]);
        writer.insert_edge(1, 2).unwrap();

        let snap = reader.snapshot().unwrap();
        assert_eq!(snap.count_edges().unwrap(), 1);

        assert!(writer.delete_node(2).unwrap());
        assert_eq!(snap.count_edges().unwrap(), 1);
        assert!(snap.contains_vertex(2).unwrap());
        assert_eq!(snap.fetch_vertices(&[1, 2]).unwrap().len(), 2);
        drop(snap);

        assert_eq!(reader.count_edges().unwrap(), 0);
        assert!(!reader.contains_vertex(2).unwrap());
    }

    #[test]
    fn snapshot_inside_open_transaction_reuses_it() {
        let store = setup();
        seed(&store, &[1]);
        let tx = store.conn.unchecked_transaction().unwrap();
        tx.execute("INSERT INTO nodes (id, name) VALUES (2, 'b')", [])
            .unwrap();
        {
            let snap = store.snapshot().unwrap();
            assert_eq!(snap.count_vertices().unwrap(), 2);
        }
        tx.rollback().unwrap();
        assert_eq!(store.count_vertices().unwrap(), 1);
    }

    #[test]
    fn snapshot_of_snapshot_is_itself() {
        let store = setup();
        seed(&store, &[1, 2, 3]);
        let snap = store.snapshot().unwrap();
        let again = snap.snapshot().unwrap();
        assert_eq!(again.count_vertices().unwrap(), 3);
    }

    // -- open_existing ------------------------------------------------------

    #[test]
    fn open_existing_rejects_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("typo.db");
        let err = SqliteStore::open_existing(&path, DEFAULT_BUSY_TIMEOUT).unwrap_err();
        assert!(matches!(err, GraphError::DatabaseNotFound(ref p) if *p == path));
        assert!(!path.exists());
    }

    #[test]
    fn existing_from_config_opens_created_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.db");
        seed(&SqliteStore::open(&path).unwrap(), &[1, 2]);

        let config = DatabaseConfig {
            path,
            busy_timeout_ms: 100,
        };
        let store = SqliteStore::existing_from_config(&config).unwrap();
        assert_eq!(store.count_vertices().unwrap(), 2);
    }
}

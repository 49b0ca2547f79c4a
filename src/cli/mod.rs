//! Command-line host for the query engine.
//!
//! Opens the configured SQLite store and runs one query per invocation.
//! The database must already exist; a mistyped path is an error rather than
//! a fresh empty graph.
//! Direction and type arguments go through their `FromStr` impls, so an
//! unknown value is rejected before any query runs.

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::config::RowGraphConfig;
use crate::error::Result;
use crate::graph::engine::GraphEngine;
use crate::graph::store::{GraphStore, SqliteStore};
use crate::types::{Adjacency, Arc, Direction, Node, NodeId, ResultShape};

/// rowgraph - directed-graph queries over a SQLite node/edge store
#[derive(Parser, Debug)]
#[command(name = "rowgraph")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// SQLite database file (overrides config and ROWGRAPH_DB)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Path to a YAML configuration file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List every vertex
    Vertices,
    /// List every edge as an arc
    Edges,
    /// List vertices with no incoming edges
    Sources,
    /// List vertices with no outgoing edges
    Sinks,
    /// Show vertex and edge counts
    Stats,
    /// Check whether a vertex id is in the graph
    Vertex { id: NodeId },
    /// Check whether a directed edge exists
    Edge { source: NodeId, target: NodeId },
    /// List neighbours or incident edges of a vertex
    Adjacent {
        id: NodeId,
        /// in, out or all
        #[arg(long, short = 'd', default_value = "all", value_parser = parse_direction)]
        direction: Direction,
        /// vertices or edges
        #[arg(long = "type", short = 't', default_value = "vertices", value_parser = parse_shape)]
        shape: ResultShape,
    },
}

fn parse_direction(s: &str) -> std::result::Result<Direction, String> {
    s.parse().map_err(|e: crate::error::GraphError| e.to_string())
}

fn parse_shape(s: &str) -> std::result::Result<ResultShape, String> {
    s.parse().map_err(|e: crate::error::GraphError| e.to_string())
}

impl Cli {
    /// Resolve the effective config: file, then environment, then `--db`.
    pub fn resolve_config(&self) -> Result<RowGraphConfig> {
        let mut config = RowGraphConfig::load_or_default(self.config.as_deref())?;
        config.apply_env_overrides();
        if let Some(db) = &self.db {
            config.database.path = db.clone();
        }
        Ok(config)
    }
}

/// Run `cli` against the configured store, writing results to `out`.
pub fn run(cli: &Cli, out: &mut impl Write) -> Result<()> {
    let config = cli.resolve_config()?;
    tracing::debug!(db = %config.database.path.display(), "opening store");
    let store = SqliteStore::existing_from_config(&config.database)?;
    execute(&GraphEngine::new(&store), &cli.command, cli.json, out)
}

/// Run one command against an engine. Split from [`run`] so any store can
/// be used.
pub fn execute<S: GraphStore>(
    engine: &GraphEngine<S>,
    command: &Command,
    json: bool,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        Command::Vertices => emit_nodes(out, json, engine.vertices()?),
        Command::Edges => emit_arcs(out, json, &engine.edges()?),
        Command::Sources => emit_nodes(out, json, engine.sources()?),
        Command::Sinks => emit_nodes(out, json, engine.sinks()?),
        Command::Stats => {
            let stats = engine.stats()?;
            if json {
                emit_json(out, &stats)
            } else {
                writeln!(out, "vertices: {}", stats.vertices)?;
                writeln!(out, "edges: {}", stats.edges)?;
                Ok(())
            }
        }
        Command::Vertex { id } => emit_bool(out, json, engine.has_vertex(id)?),
        Command::Edge { source, target } => {
            emit_bool(out, json, engine.has_edge_between(source, target)?)
        }
        Command::Adjacent {
            id,
            direction,
            shape,
        } => match engine.adjacent(id, *direction, *shape)? {
            Adjacency::Vertices(nodes) => emit_nodes(out, json, nodes),
            Adjacency::Edges(arcs) => emit_arcs(out, json, &arcs),
        },
    }
}

fn emit_json(out: &mut impl Write, value: &impl Serialize) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

fn emit_bool(out: &mut impl Write, json: bool, value: bool) -> Result<()> {
    if json {
        return emit_json(out, &value);
    }
    writeln!(out, "{value}")?;
    Ok(())
}

fn emit_nodes(
    out: &mut impl Write,
    json: bool,
    nodes: impl IntoIterator<Item = Node>,
) -> Result<()> {
    let nodes: Vec<Node> = nodes.into_iter().collect();
    if json {
        return emit_json(out, &nodes);
    }
    for node in nodes {
        writeln!(out, "{}\t{}", node.id, node.name)?;
    }
    Ok(())
}

fn emit_arcs(out: &mut impl Write, json: bool, arcs: &[Arc]) -> Result<()> {
    if json {
        return emit_json(out, &arcs);
    }
    for arc in arcs {
        writeln!(out, "{} -> {}", arc.source.id, arc.target.id)?;
    }
    Ok(())
}

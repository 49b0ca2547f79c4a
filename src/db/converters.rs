//! Row mappers from `nodes` / `edges` rows to domain types.

use rusqlite::Row;

use crate::error::Result;
use crate::types::{EdgeRecord, Node};

/// Decode the optional JSON `properties` column.
fn properties_column(row: &Row<'_>) -> Result<Option<serde_json::Value>> {
    let raw: Option<String> = row.get("properties")?;
    match raw {
        Some(text) if !text.is_empty() => Ok(Some(serde_json::from_str(&text)?)),
        _ => Ok(None),
    }
}

/// Map a `nodes` row to a [`Node`].
pub fn row_to_node(row: &Row<'_>) -> Result<Node> {
    Ok(Node {
        id: row.get("id")?,
        name: row.get("name")?,
        properties: properties_column(row)?,
    })
}

/// Map an `edges` row to an [`EdgeRecord`].
pub fn row_to_edge(row: &Row<'_>) -> Result<EdgeRecord> {
    Ok(EdgeRecord {
        id: row.get("id")?,
        source_id: row.get("source_id")?,
        target_id: row.get("target_id")?,
        properties: properties_column(row)?,
    })
}

/// Encode properties for the `properties` column.
pub fn properties_to_sql(properties: Option<&serde_json::Value>) -> Option<String> {
    properties.map(|v| v.to_string())
}

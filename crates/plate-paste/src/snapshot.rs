use thiserror::Error;

use crate::core::Node;
use crate::schema::{Schema, SchemaError};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("node snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("node snapshot does not fit the schema: {0}")]
    Schema(#[from] SchemaError),
}

/// Serializes a node into the `text/node` clipboard format.
pub fn encode_node_snapshot(node: &Node) -> Result<String, serde_json::Error> {
    serde_json::to_string(node)
}

/// Parses a `text/node` value, filling unset attributes from the schema defaults.
pub fn decode_node_snapshot(raw: &str, schema: &Schema) -> Result<Node, SnapshotError> {
    let mut node: Node = serde_json::from_str(raw)?;
    schema.fill_default_attrs(&mut node);
    if !schema.is_inline(&node) {
        schema.check_block(&node)?;
    }
    Ok(node)
}

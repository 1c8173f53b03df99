//! Serializes a `Graph` to and from its JSON document.
pub mod document;
pub mod error;

pub use document::{Document, NodeRecord};
pub use error::CodecError;

use crate::store::{Graph, GraphError};
use serde_json::Value;
use tracing::warn;

/// Captures every node field and every connection. No derived state.
pub fn serialize(graph: &Graph) -> Document {
    Document {
        nodes: graph.nodes().iter().map(NodeRecord::from).collect(),
        connections: graph.connections().to_vec(),
        paths: None,
    }
}

/// Rebuilds a graph from a document. Node order (and so sweep order) follows
/// the document. Connections with missing endpoints are kept; they read as
/// OFF during propagation.
pub fn deserialize(document: Document) -> Result<Graph, CodecError> {
    let mut graph = Graph::new();
    for record in document.nodes {
        let id = record.id;
        let node = record
            .into_node()
            .map_err(|reason| CodecError::InvalidNode { id, reason })?;
        graph.insert_node(node).map_err(|e| match e {
            GraphError::DuplicateNodeId(id) => CodecError::DuplicateNodeId(id),
            other => CodecError::InvalidNode { id, reason: other.to_string() },
        })?;
    }

    let mut dangling = 0usize;
    for conn in document.connections {
        if !graph.contains(conn.from) || !graph.contains(conn.to) {
            dangling += 1;
        }
        graph.push_connection_unchecked(conn);
    }
    if dangling > 0 {
        warn!(dangling, "document contains connections to missing nodes");
    }
    Ok(graph)
}

/// Checks the top-level shape before decoding so a missing array is
/// reported by name. `paths` stands in for `connections` only when the
/// latter is absent.
pub fn document_from_value(value: Value) -> Result<Document, CodecError> {
    let Some(obj) = value.as_object() else {
        return Err(CodecError::MissingArray("nodes"));
    };
    if !obj.get("nodes").is_some_and(Value::is_array) {
        return Err(CodecError::MissingArray("nodes"));
    }
    let is_array = |key: &str| obj.get(key).is_some_and(Value::is_array);
    let use_paths = match (is_array("connections"), is_array("paths")) {
        (true, _) => false,
        (false, true) => true,
        (false, false) => return Err(CodecError::MissingArray("connections")),
    };

    let mut document: Document = serde_json::from_value(value)?;
    let paths = document.paths.take();
    if use_paths {
        document.connections = paths.unwrap_or_default();
    }
    Ok(document)
}

pub fn from_json(text: &str) -> Result<Graph, CodecError> {
    let value: Value = serde_json::from_str(text)?;
    deserialize(document_from_value(value)?)
}

pub fn to_json(graph: &Graph) -> Result<String, CodecError> {
    Ok(serde_json::to_string(&serialize(graph))?)
}

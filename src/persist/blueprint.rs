//! Human-downloadable export files ("blueprints").
//!
//! A blueprint is the slot document plus an `exportedAt` stamp. The stamp
//! is informational and dropped on import.

use super::error::StorageError;
use crate::codec::{self, CodecError, Document};
use crate::store::Graph;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(Serialize)]
struct Blueprint {
    #[serde(flatten)]
    document: Document,
    #[serde(rename = "exportedAt")]
    exported_at: String,
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Pretty-printed blueprint text stamped with `at`.
pub fn export_blueprint_at(graph: &Graph, at: DateTime<Utc>) -> Result<String, CodecError> {
    let blueprint = Blueprint { document: codec::serialize(graph), exported_at: format_timestamp(at) };
    Ok(serde_json::to_string_pretty(&blueprint)?)
}

pub fn export_blueprint(graph: &Graph) -> Result<String, CodecError> {
    export_blueprint_at(graph, Utc::now())
}

pub fn import_blueprint(text: &str) -> Result<Graph, CodecError> {
    codec::from_json(text)
}

pub fn write_blueprint(path: &Path, graph: &Graph) -> Result<(), StorageError> {
    let text = export_blueprint(graph)?;
    fs::write(path, text).map_err(|e| StorageError::io(path, e))?;
    info!(path = %path.display(), nodes = graph.len(), "blueprint exported");
    Ok(())
}

pub fn read_blueprint(path: &Path) -> Result<Graph, StorageError> {
    let text = fs::read_to_string(path).map_err(|e| StorageError::io(path, e))?;
    let graph = import_blueprint(&text)?;
    info!(path = %path.display(), nodes = graph.len(), "blueprint imported");
    Ok(graph)
}

//! Defines the error types for the persistence codec.
use crate::store::NodeId;
use thiserror::Error;

/// A document that cannot become a graph. Decoding never touches any
/// existing graph, so callers keep their current state on error.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Malformed document: {0}")]
    Format(#[from] serde_json::Error),
    #[error("Document is missing the '{0}' array")]
    MissingArray(&'static str),
    #[error("Duplicate node id {0} in document")]
    DuplicateNodeId(NodeId),
    #[error("Invalid node {id}: {reason}")]
    InvalidNode { id: NodeId, reason: String },
}

use super::types::{NodeId, NodeKind};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Node {0} not found")]
    NodeNotFound(NodeId),
    #[error("Node {id} is {kind}; only INPUT values can be set directly")]
    NotAnInput { id: NodeId, kind: NodeKind },
    #[error("Invalid value {value} for node {id}: input signals must be >= 0")]
    InvalidValue { id: NodeId, value: f64 },
    #[error("Tolerance must be non-negative, got {0}")]
    NegativeTolerance(f64),
    #[error("Field '{field}' must be a finite number")]
    NonFinite { field: &'static str },
    #[error("Grid cell ({x}, {y}) is already occupied")]
    CellOccupied { x: f64, y: f64 },
    #[error("Duplicate node id {0}")]
    DuplicateNodeId(NodeId),
}

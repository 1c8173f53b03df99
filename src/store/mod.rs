//! The graph model: nodes, connections and the owning `Graph`.
pub mod error;
pub mod registry;
pub mod types;

pub use error::GraphError;
pub use registry::{Graph, Incoming};
pub use types::{
    AggregateOp, CompareMode, Connection, Node, NodeId, NodeKind, NodePatch, Position, Signal,
};

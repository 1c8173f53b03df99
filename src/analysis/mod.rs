//! Structural and spatial queries over a graph. Nothing here mutates.
pub mod geometry;
pub mod topology;

pub use topology::TopologyReport;

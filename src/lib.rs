//! Signal network core: a graph of INPUT, THRESHOLD, COMPETITIVE and OUTPUT
//! nodes, bounded sweep propagation, and the JSON document shared by the
//! save slot and blueprint files.
//!
//! With the `python` feature this also builds the `_core` extension module.

pub mod analysis;
pub mod codec;
pub mod compute;
pub mod config;
pub mod display;
pub mod persist;
pub mod session;
pub mod store;

#[cfg(feature = "python")]
pub mod bindings;

pub use compute::{propagate, Engine, PropagationReport};
pub use config::EngineConfig;
pub use session::{Network, NetworkError};
pub use store::{
    AggregateOp, CompareMode, Connection, Graph, GraphError, Node, NodeId, NodeKind, NodePatch,
    Position, Signal,
};

#[cfg(feature = "python")]
use pyo3::prelude::*;

#[cfg(feature = "python")]
#[pyfunction]
fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Defines the `_core` Python module.
#[cfg(feature = "python")]
#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(core_version, m)?)?;
    m.add_class::<bindings::PyNetwork>()?;
    Ok(())
}

//! The propagation engine.
pub mod engine;
pub mod kernel;
pub mod plan;

pub use engine::{propagate, Engine, PropagationReport, DEFAULT_SWEEPS};
pub use plan::SweepPlan;

//! Human-facing views of engine state.
pub mod inspect;

pub use inspect::{
    connection_tooltip, describe_kind, format_inspection, inspect, node_tooltip, Inspection,
    PassBand,
};

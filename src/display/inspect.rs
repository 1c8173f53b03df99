//! Read-only views of a node for inspectors and tooltips.

use crate::compute::kernel;
use crate::store::{AggregateOp, CompareMode, Connection, Graph, Node, NodeId, NodeKind, Signal};
use std::fmt::{self, Write};

/// The range of first-signal values a THRESHOLD node lets through.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PassBand {
    /// Strictly above the bound.
    Above(f64),
    /// Strictly below the bound.
    Below(f64),
    /// Inclusive on both ends.
    Within { low: f64, high: f64 },
}

impl PassBand {
    pub fn of(node: &Node) -> Self {
        let (t, tol) = (node.threshold, node.tolerance);
        match node.compare_mode {
            CompareMode::Gt => PassBand::Above(t - tol),
            CompareMode::Lt => PassBand::Below(t + tol),
            CompareMode::Eq => PassBand::Within { low: t - tol, high: t + tol },
        }
    }

    pub fn contains(&self, signal: f64) -> bool {
        match *self {
            PassBand::Above(bound) => signal > bound,
            PassBand::Below(bound) => signal < bound,
            PassBand::Within { low, high } => low <= signal && signal <= high,
        }
    }
}

impl fmt::Display for PassBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassBand::Above(b) => write!(f, "> {:.1}", b),
            PassBand::Below(b) => write!(f, "< {:.1}", b),
            PassBand::Within { low, high } => write!(f, "[{:.1}, {:.1}]", low, high),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Inspection {
    pub id: NodeId,
    pub kind: NodeKind,
    pub output: Signal,
    /// Live incoming signals in connection order.
    pub incoming: Vec<f64>,
    pub pass_band: Option<PassBand>,
    pub aggregate_op: Option<AggregateOp>,
}

pub fn inspect(graph: &Graph, id: NodeId) -> Option<Inspection> {
    let node = graph.node(id)?;
    Some(Inspection {
        id,
        kind: node.kind,
        output: node.value,
        incoming: graph.incoming_values(id).into_vec(),
        pass_band: (node.kind == NodeKind::Threshold).then(|| PassBand::of(node)),
        aggregate_op: (node.kind == NodeKind::Competitive).then_some(node.aggregate_op),
    })
}

pub fn format_inspection(inspection: &Inspection) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "INSPECT {} {}", inspection.kind, inspection.id);
    let _ = writeln!(out, "--------------------------------------------------");
    if let Some(band) = &inspection.pass_band {
        let _ = writeln!(out, "Passing side: {}", band);
    }
    if let Some(op) = inspection.aggregate_op {
        let _ = writeln!(out, "Operation: {}", op);
    }
    if inspection.incoming.is_empty() {
        let _ = writeln!(out, "Incoming: (none)");
    } else {
        let signals: Vec<String> = inspection.incoming.iter().map(|v| format!("{:.1}", v)).collect();
        let _ = writeln!(out, "Incoming: {}", signals.join(", "));
    }
    let _ = writeln!(out, "Output: {}", inspection.output);
    out
}

pub fn describe_kind(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Input => "Provides a fixed signal value.",
        NodeKind::Threshold => "Compares input to threshold and outputs based on logic.",
        NodeKind::Competitive => "Combines multiple inputs using selected operation.",
        NodeKind::Output => "Displays the final signal.",
    }
}

pub fn node_tooltip(graph: &Graph, id: NodeId) -> Option<String> {
    let node = graph.node(id)?;
    Some(format!("{}: {}\n{}", node.kind, node.value, describe_kind(node.kind)))
}

pub fn connection_tooltip(graph: &Graph, connection: &Connection) -> String {
    let from = graph.node(connection.from);
    let to = graph.node(connection.to);
    let kind = |n: Option<&Node>| n.map_or("?", |n| n.kind.as_str());
    let signal = from.map_or(Signal::OFF, |n| n.value);
    format!("Connection: {} -> {}\nSignal: {}", kind(from), kind(to), signal)
}

/// Whether the node's current first signal sits inside its pass band.
/// `None` for non-THRESHOLD nodes or when nothing live is incoming.
pub fn first_signal_passes(graph: &Graph, id: NodeId) -> Option<bool> {
    let node = graph.node(id).filter(|n| n.kind == NodeKind::Threshold)?;
    let first = *graph.incoming_values(id).first()?;
    Some(kernel::passes(node.compare_mode, first, node.threshold, node.tolerance))
}

use crate::store::{AggregateOp, CompareMode, Node, NodeKind, Signal};

/// Computes a node's next value from its live incoming signals.
///
/// No incoming signal means OFF for every kind. INPUT nodes are exogenous
/// and keep their value.
#[inline(always)]
pub fn evaluate(node: &Node, incoming: &[f64]) -> Signal {
    if node.kind == NodeKind::Input {
        return node.value;
    }
    let Some(&first) = incoming.first() else {
        return Signal::OFF;
    };

    match node.kind {
        // Only the first incoming connection is consulted.
        NodeKind::Threshold => {
            if passes(node.compare_mode, first, node.threshold, node.tolerance) {
                Signal::on(first)
            } else {
                Signal::OFF
            }
        }
        NodeKind::Competitive => Signal::on(aggregate(node.aggregate_op, incoming)),
        NodeKind::Output | NodeKind::Input => Signal::on(max(incoming)),
    }
}

/// The tolerance widens the boundary toward the failing side.
#[inline(always)]
pub fn passes(mode: CompareMode, signal: f64, threshold: f64, tolerance: f64) -> bool {
    match mode {
        CompareMode::Gt => signal > threshold - tolerance,
        CompareMode::Lt => signal < threshold + tolerance,
        CompareMode::Eq => (signal - threshold).abs() <= tolerance,
    }
}

/// Caller guarantees `values` is non-empty.
pub fn aggregate(op: AggregateOp, values: &[f64]) -> f64 {
    match op {
        AggregateOp::Sum => values.iter().sum(),
        AggregateOp::Max => max(values),
        AggregateOp::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
        AggregateOp::Avg => values.iter().sum::<f64>() / values.len() as f64,
    }
}

fn max(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

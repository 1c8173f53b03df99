use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Sentinel the earlier browser tool stored for "no signal". Any stored value
/// at or below it is read back as `Signal::OFF`.
pub const LEGACY_OFF_SENTINEL: f64 = -0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl NodeId {
    pub fn new(raw: u64) -> Self { Self(raw) }
    pub fn raw(&self) -> u64 { self.0 }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The value carried by a node: a number, or OFF ("no signal").
///
/// OFF is a distinct state, not a number. `Signal::on(0.0)` is a live zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Signal(Option<f64>);

impl Signal {
    pub const OFF: Signal = Signal(None);

    pub fn on(value: f64) -> Self { Self(Some(value)) }

    #[inline(always)]
    pub fn value(&self) -> Option<f64> { self.0 }

    #[inline(always)]
    pub fn is_off(&self) -> bool { self.0.is_none() }
}

impl From<Option<f64>> for Signal {
    fn from(value: Option<f64>) -> Self { Self(value) }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{:.1}", v),
            None => f.write_str("OFF"),
        }
    }
}

// OFF travels as JSON `null`.
impl Serialize for Signal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Signal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<f64>::deserialize(deserializer)?;
        Ok(match raw {
            Some(v) if v <= LEGACY_OFF_SENTINEL => Signal::OFF,
            other => Signal(other),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NodeKind {
    Input,
    Threshold,
    Competitive,
    Output,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Input => "INPUT",
            NodeKind::Threshold => "THRESHOLD",
            NodeKind::Competitive => "COMPETITIVE",
            NodeKind::Output => "OUTPUT",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NodeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INPUT" => Ok(NodeKind::Input),
            "THRESHOLD" => Ok(NodeKind::Threshold),
            "COMPETITIVE" => Ok(NodeKind::Competitive),
            "OUTPUT" => Ok(NodeKind::Output),
            other => Err(format!("Unknown node type: '{}'", other)),
        }
    }
}

/// Comparison a THRESHOLD node applies to its first incoming signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CompareMode {
    #[default]
    Gt,
    Lt,
    Eq,
}

impl CompareMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareMode::Gt => "GT",
            CompareMode::Lt => "LT",
            CompareMode::Eq => "EQ",
        }
    }
}

impl fmt::Display for CompareMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CompareMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GT" => Ok(CompareMode::Gt),
            "LT" => Ok(CompareMode::Lt),
            "EQ" => Ok(CompareMode::Eq),
            other => Err(format!("Unknown compare mode: '{}'", other)),
        }
    }
}

/// Reduction a COMPETITIVE node applies over all incoming signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AggregateOp {
    #[default]
    Sum,
    Max,
    Min,
    Avg,
}

impl AggregateOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateOp::Sum => "SUM",
            AggregateOp::Max => "MAX",
            AggregateOp::Min => "MIN",
            AggregateOp::Avg => "AVG",
        }
    }
}

impl fmt::Display for AggregateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AggregateOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUM" => Ok(AggregateOp::Sum),
            "MAX" => Ok(AggregateOp::Max),
            "MIN" => Ok(AggregateOp::Min),
            "AVG" => Ok(AggregateOp::Avg),
            other => Err(format!("Unknown aggregate op: '{}'", other)),
        }
    }
}

/// Canvas coordinates. Cosmetic; the engine never reads them.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self { Self { x, y } }

    pub fn distance_to(&self, other: Position) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

pub const DEFAULT_THRESHOLD: f64 = 5.0;

/// A single node. Every node carries the settings of every kind, so a
/// THRESHOLD keeps an aggregate op and a COMPETITIVE keeps a threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub position: Position,
    pub kind: NodeKind,
    pub value: Signal,
    pub threshold: f64,
    pub compare_mode: CompareMode,
    pub tolerance: f64,
    pub aggregate_op: AggregateOp,
}

impl Node {
    pub fn new(id: NodeId, kind: NodeKind, position: Position) -> Self {
        Self {
            id,
            position,
            kind,
            value: Signal::OFF,
            threshold: DEFAULT_THRESHOLD,
            compare_mode: CompareMode::default(),
            tolerance: 0.0,
            aggregate_op: AggregateOp::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    #[serde(rename = "fromId")]
    pub from: NodeId,
    #[serde(rename = "toId")]
    pub to: NodeId,
}

impl Connection {
    pub fn new(from: NodeId, to: NodeId) -> Self { Self { from, to } }

    pub fn touches(&self, id: NodeId) -> bool { self.from == id || self.to == id }

    pub fn is_self_loop(&self) -> bool { self.from == self.to }
}

/// A partial update of a node's user-editable fields.
///
/// `value` is only accepted for INPUT nodes; every other node's value is
/// owned by the propagation engine.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NodePatch {
    pub value: Option<Signal>,
    pub threshold: Option<f64>,
    pub compare_mode: Option<CompareMode>,
    pub tolerance: Option<f64>,
    pub aggregate_op: Option<AggregateOp>,
}

impl NodePatch {
    pub fn value(value: Signal) -> Self {
        Self { value: Some(value), ..Default::default() }
    }

    pub fn is_empty(&self) -> bool { *self == Self::default() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AggregateOp::Sum)]
    #[case(AggregateOp::Max)]
    #[case(AggregateOp::Min)]
    #[case(AggregateOp::Avg)]
    fn test_aggregate_op_display_matches_wire(#[case] op: AggregateOp) {
        let wire = serde_json::to_value(op).unwrap();
        assert_eq!(wire, serde_json::Value::from(op.to_string()));
        assert_eq!(op.as_str().parse::<AggregateOp>(), Ok(op));
    }

    #[rstest]
    #[case(CompareMode::Gt)]
    #[case(CompareMode::Lt)]
    #[case(CompareMode::Eq)]
    fn test_compare_mode_display_matches_wire(#[case] mode: CompareMode) {
        let wire = serde_json::to_value(mode).unwrap();
        assert_eq!(wire, serde_json::Value::from(mode.to_string()));
        assert_eq!(mode.as_str().parse::<CompareMode>(), Ok(mode));
    }

    #[test]
    fn test_legacy_sentinel_reads_as_off() {
        let s: Signal = serde_json::from_str("-0.1").unwrap();
        assert!(s.is_off());
        let s: Signal = serde_json::from_str("0.0").unwrap();
        assert_eq!(s, Signal::on(0.0));
    }
}

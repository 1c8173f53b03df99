//! The persisted JSON shape shared by the slot store and blueprint files.

use crate::store::{AggregateOp, CompareMode, Connection, Node, NodeId, NodeKind, Position, Signal};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

/// `{ "nodes": [...], "connections": [...] }`
///
/// Files written by the earlier browser tool name the second array `paths`.
/// It is read only when `connections` is absent and never written.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default, skip_serializing)]
    pub paths: Option<Vec<Connection>>,
}

/// Unknown compare modes (the browser tool stamps `NOT` on every new node)
/// fall back to the default instead of failing the whole document.
fn lenient_compare_mode<'de, D>(deserializer: D) -> Result<CompareMode, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(match raw {
        None => CompareMode::default(),
        Some(text) => text.parse().unwrap_or_else(|_| {
            warn!(logic = %text, "unknown compare mode, using default");
            CompareMode::default()
        }),
    })
}

/// One node on the wire. Every kind's settings are written for every node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default)]
    pub val: Signal,
    #[serde(default)]
    pub thresh: f64,
    #[serde(default, deserialize_with = "lenient_compare_mode")]
    pub logic: CompareMode,
    #[serde(default)]
    pub op: AggregateOp,
    #[serde(default)]
    pub strict: f64,
}

impl From<&Node> for NodeRecord {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id,
            x: node.position.x,
            y: node.position.y,
            kind: node.kind,
            val: node.value,
            thresh: node.threshold,
            logic: node.compare_mode,
            op: node.aggregate_op,
            strict: node.tolerance,
        }
    }
}

impl NodeRecord {
    pub fn into_node(self) -> Result<Node, String> {
        if self.strict < 0.0 {
            return Err(format!("negative tolerance {}", self.strict));
        }
        if self.kind == NodeKind::Input {
            if let Some(v) = self.val.value().filter(|v| *v < 0.0) {
                return Err(format!("input signals must be >= 0, got {}", v));
            }
        }
        Ok(Node {
            id: self.id,
            position: Position::new(self.x, self.y),
            kind: self.kind,
            value: self.val,
            threshold: self.thresh,
            compare_mode: self.logic,
            tolerance: self.strict,
            aggregate_op: self.op,
        })
    }
}

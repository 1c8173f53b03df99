//! The single owner of a live network.
//!
//! A presentation layer drives everything through `Network`: each edit is
//! applied to the graph and followed by exactly one propagation, so the
//! values it reads back are always current. Failed imports and failed saves
//! leave the in-memory graph as it was.

use crate::analysis::{geometry, topology, TopologyReport};
use crate::codec::{self, CodecError};
use crate::compute::{Engine, PropagationReport};
use crate::config::{ConfigError, EngineConfig};
use crate::display::{self, Inspection};
use crate::persist::{self, SlotStore, StorageError};
use crate::store::{Graph, GraphError, Node, NodeId, NodeKind, NodePatch, Position, Signal};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug)]
pub struct Network<S: SlotStore> {
    graph: Graph,
    config: EngineConfig,
    engine: Engine,
    store: S,
    last_report: Option<PropagationReport>,
}

impl<S: SlotStore> Network<S> {
    /// Starts an empty network without touching the store.
    pub fn new(store: S, config: EngineConfig) -> Result<Self, NetworkError> {
        config.validate()?;
        let engine = Engine::new(config.sweeps);
        Ok(Self { graph: Graph::new(), config, engine, store, last_report: None })
    }

    /// Starts a network from the configured slot, if it holds one. A slot
    /// that fails to decode is an error rather than an empty network.
    pub fn open(store: S, config: EngineConfig) -> Result<Self, NetworkError> {
        let mut network = Self::new(store, config)?;
        network.restore().map_err(|e| {
            warn!(slot = %network.config.storage_slot, error = %e, "saved network could not be loaded");
            NetworkError::from(e)
        })?;
        Ok(network)
    }

    /// Like `open`, but an unreadable slot is logged and skipped so the
    /// network starts empty. The next `save` overwrites the slot.
    pub fn open_or_empty(store: S, config: EngineConfig) -> Result<Self, NetworkError> {
        let mut network = Self::new(store, config)?;
        if let Err(e) = network.restore() {
            warn!(slot = %network.config.storage_slot, error = %e, "discarding saved network, starting empty");
        }
        Ok(network)
    }

    fn restore(&mut self) -> Result<(), StorageError> {
        match persist::load_from_slot(&self.store, &self.config.storage_slot)? {
            Some(graph) => {
                self.replace_graph(graph);
            }
            None => info!(slot = %self.config.storage_slot, "no saved network, starting empty"),
        }
        Ok(())
    }

    pub fn graph(&self) -> &Graph { &self.graph }
    pub fn config(&self) -> &EngineConfig { &self.config }
    pub fn store(&self) -> &S { &self.store }
    pub fn last_report(&self) -> Option<PropagationReport> { self.last_report }

    pub fn value(&self, id: NodeId) -> Option<Signal> { self.graph.value_of(id) }

    pub fn propagate(&mut self) -> PropagationReport {
        let report = self.engine.run(&mut self.graph);
        if !report.settled {
            let shape = self.topology();
            warn!(
                sweeps = report.sweeps,
                cyclic_groups = shape.cyclic_groups.len(),
                longest_chain = ?shape.longest_chain,
                "network still changing after the sweep budget; values may not be final"
            );
        }
        self.last_report = Some(report);
        report
    }

    /// True when some node order or feedback loop can keep values moving
    /// past the configured sweep budget.
    pub fn exceeds_sweep_budget(&self) -> bool {
        !self.topology().fits_sweep_budget(self.engine.sweeps())
    }

    fn replace_graph(&mut self, graph: Graph) -> PropagationReport {
        self.graph = graph;
        self.propagate()
    }

    // --- Edits ---

    /// Places a node on the grid cell nearest `point`.
    pub fn place_node(&mut self, kind: NodeKind, point: Position) -> Result<NodeId, NetworkError> {
        let cell = geometry::snap_to_grid(point, self.config.grid_size);
        if self.graph.is_occupied(cell) {
            let occupied = GraphError::CellOccupied { x: cell.x, y: cell.y };
            return Err(rejected::<GraphError>("place node")(occupied));
        }
        let id = self.graph.add_node(kind, cell);
        self.propagate();
        Ok(id)
    }

    pub fn remove_node(&mut self, id: NodeId) -> Result<Node, NetworkError> {
        let node = self.graph.remove_node(id).map_err(rejected("remove node"))?;
        self.propagate();
        Ok(node)
    }

    /// Removes the node under `point`, if any.
    pub fn remove_node_at(&mut self, point: Position) -> Result<Option<Node>, NetworkError> {
        match self.graph.node_at(point, self.config.hit_radius) {
            Some(id) => self.remove_node(id).map(Some),
            None => Ok(None),
        }
    }

    pub fn node_at(&self, point: Position) -> Option<NodeId> {
        self.graph.node_at(point, self.config.hit_radius)
    }

    pub fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), NetworkError> {
        self.graph.add_connection(from, to).map_err(rejected("connect"))?;
        if self.exceeds_sweep_budget() {
            warn!(%from, %to, sweeps = self.engine.sweeps(), "connection may exceed the sweep budget");
        }
        self.propagate();
        Ok(())
    }

    /// Removes every connection whose segment passes within the configured
    /// pick distance of `point`. Returns how many were removed.
    pub fn disconnect_near(&mut self, point: Position) -> usize {
        let hits = geometry::connections_near(&self.graph, point, self.config.pick_distance);
        let mut index = 0;
        let removed = self.graph.remove_connections(|_| {
            let hit = hits[index];
            index += 1;
            hit
        });
        self.propagate();
        removed
    }

    pub fn update_node(&mut self, id: NodeId, patch: NodePatch) -> Result<(), NetworkError> {
        self.graph.update_node(id, patch).map_err(rejected("update node"))?;
        self.propagate();
        Ok(())
    }

    pub fn set_input(&mut self, id: NodeId, value: Signal) -> Result<(), NetworkError> {
        self.update_node(id, NodePatch::value(value))
    }

    /// Wipes the whole network.
    pub fn clear(&mut self) {
        self.graph.clear();
        self.last_report = None;
    }

    /// Turns every computed node OFF. No propagation follows, so the UI can
    /// show the blank state until the next edit.
    pub fn reset_values(&mut self) {
        self.graph.reset_values();
    }

    // --- Persistence ---

    /// Writes the current graph to the configured slot.
    pub fn save(&mut self) -> Result<(), NetworkError> {
        persist::save_to_slot(&mut self.store, &self.config.storage_slot, &self.graph).map_err(|e| {
            warn!(error = %e, "save failed; in-memory network is unchanged");
            NetworkError::from(e)
        })
    }

    /// Exports a blueprint to `dir` under the configured file name.
    pub fn export_to(&self, dir: &Path) -> Result<PathBuf, NetworkError> {
        let path = dir.join(&self.config.export_file_name);
        persist::write_blueprint(&path, &self.graph).map_err(|e| {
            warn!(error = %e, "export failed");
            NetworkError::from(e)
        })?;
        Ok(path)
    }

    pub fn export_string(&self) -> Result<String, NetworkError> {
        persist::export_blueprint(&self.graph).map_err(rejected("export"))
    }

    /// Replaces the graph from a blueprint file, then propagates.
    pub fn import_from(&mut self, path: &Path) -> Result<PropagationReport, NetworkError> {
        let graph = persist::read_blueprint(path).map_err(|e| {
            warn!(path = %path.display(), error = %e, "import rejected; keeping current network");
            NetworkError::from(e)
        })?;
        Ok(self.replace_graph(graph))
    }

    /// Replaces the graph from blueprint text, then propagates.
    pub fn import_str(&mut self, text: &str) -> Result<PropagationReport, NetworkError> {
        let graph = codec::from_json(text).map_err(|e| {
            warn!(error = %e, "import rejected; keeping current network");
            NetworkError::from(e)
        })?;
        Ok(self.replace_graph(graph))
    }

    // --- Views ---

    pub fn inspect(&self, id: NodeId) -> Option<Inspection> {
        display::inspect(&self.graph, id)
    }

    pub fn topology(&self) -> TopologyReport {
        topology::analyze(&self.graph)
    }
}

/// Logs an error surfaced to the caller and converts it.
fn rejected<E: Into<NetworkError>>(action: &'static str) -> impl FnOnce(E) -> NetworkError {
    move |e| {
        let e = e.into();
        warn!(action, error = %e, "request rejected");
        e
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::MemoryStore;
    use crate::store::{AggregateOp, CompareMode};

    fn network() -> Network<MemoryStore> {
        Network::new(MemoryStore::new(), EngineConfig::default()).unwrap()
    }

    fn p(x: f64, y: f64) -> Position { Position::new(x, y) }

    /// INPUT(7) -> THRESHOLD(GT 5) -> OUTPUT laid out left to right.
    fn chain(net: &mut Network<MemoryStore>) -> (NodeId, NodeId, NodeId) {
        let i = net.place_node(NodeKind::Input, p(40.0, 40.0)).unwrap();
        let t = net.place_node(NodeKind::Threshold, p(120.0, 40.0)).unwrap();
        let o = net.place_node(NodeKind::Output, p(200.0, 40.0)).unwrap();
        net.set_input(i, Signal::on(7.0)).unwrap();
        net.connect(i, t).unwrap();
        net.connect(t, o).unwrap();
        (i, t, o)
    }

    #[test]
    fn test_every_edit_is_propagated() {
        let mut net = network();
        let (i, t, o) = chain(&mut net);
        assert_eq!(net.value(o), Some(Signal::on(7.0)));

        net.set_input(i, Signal::on(3.0)).unwrap();
        assert_eq!(net.value(t), Some(Signal::OFF));
        assert_eq!(net.value(o), Some(Signal::OFF));

        net.update_node(t, NodePatch { compare_mode: Some(CompareMode::Lt), ..Default::default() })
            .unwrap();
        assert_eq!(net.value(o), Some(Signal::on(3.0)));
        assert!(net.last_report().unwrap().settled);
    }

    #[test]
    fn test_place_node_snaps_and_rejects_occupied_cell() {
        let mut net = network();
        let a = net.place_node(NodeKind::Input, p(43.0, 38.0)).unwrap();
        assert_eq!(net.graph().node(a).unwrap().position, p(40.0, 40.0));

        let err = net.place_node(NodeKind::Output, p(52.0, 30.0)).unwrap_err();
        assert!(matches!(err, NetworkError::Graph(GraphError::CellOccupied { .. })));
        assert_eq!(net.graph().len(), 1);
    }

    #[test]
    fn test_remove_node_at_point_cascades() {
        let mut net = network();
        let (_, t, o) = chain(&mut net);

        let removed = net.remove_node_at(p(125.0, 45.0)).unwrap().unwrap();
        assert_eq!(removed.id, t);
        assert_eq!(net.graph().connections().len(), 0);
        assert_eq!(net.value(o), Some(Signal::OFF));

        assert!(net.remove_node_at(p(500.0, 500.0)).unwrap().is_none());
    }

    #[test]
    fn test_disconnect_near_removes_only_hit_connection() {
        let mut net = network();
        let (i, t, o) = chain(&mut net);

        // Midway between INPUT and THRESHOLD.
        assert_eq!(net.disconnect_near(p(80.0, 42.0)), 1);
        assert_eq!(net.graph().connections().len(), 1);
        assert_eq!(net.graph().connections()[0].from, t);
        assert_eq!(net.value(o), Some(Signal::OFF));
        assert_eq!(net.value(i), Some(Signal::on(7.0)));

        assert_eq!(net.disconnect_near(p(80.0, 200.0)), 0);
    }

    #[test]
    fn test_bad_edits_are_reported() {
        let mut net = network();
        let (_, t, _) = chain(&mut net);
        assert!(matches!(
            net.set_input(t, Signal::on(1.0)),
            Err(NetworkError::Graph(GraphError::NotAnInput { .. }))
        ));
        assert!(matches!(
            net.connect(t, NodeId(9999)),
            Err(NetworkError::Graph(GraphError::NodeNotFound(_)))
        ));
    }

    #[test]
    fn test_save_then_open_restores_and_propagates() {
        let mut net = network();
        let (_, _, o) = chain(&mut net);
        net.save().unwrap();

        let mut store = net.store().clone();
        // Values in the slot are stale on purpose; open must recompute.
        let mut stale = persist::load_from_slot(&store, "ads_logic_save").unwrap().unwrap();
        stale.reset_values();
        persist::save_to_slot(&mut store, "ads_logic_save", &stale).unwrap();

        let reopened = Network::open(store, EngineConfig::default()).unwrap();
        assert_eq!(reopened.value(o), Some(Signal::on(7.0)));
        assert_eq!(reopened.graph(), net.graph());
    }

    #[test]
    fn test_open_empty_and_corrupt_slots() {
        let empty = Network::open(MemoryStore::new(), EngineConfig::default()).unwrap();
        assert!(empty.graph().is_empty());

        let mut store = MemoryStore::new();
        store.write("ads_logic_save", "{\"connections\": []}").unwrap();
        assert!(matches!(
            Network::open(store, EngineConfig::default()),
            Err(NetworkError::Storage(StorageError::Codec(CodecError::MissingArray("nodes"))))
        ));
    }

    #[test]
    fn test_open_or_empty_recovers_from_corrupt_slot() {
        let mut store = MemoryStore::new();
        store.write("ads_logic_save", "{not json").unwrap();

        let mut net = Network::open_or_empty(store, EngineConfig::default()).unwrap();
        assert!(net.graph().is_empty());

        let (_, _, o) = chain(&mut net);
        net.save().unwrap();
        let reopened = Network::open(net.store().clone(), EngineConfig::default()).unwrap();
        assert_eq!(reopened.value(o), Some(Signal::on(7.0)));

        let bad = EngineConfig { sweeps: 0, ..Default::default() };
        assert!(Network::open_or_empty(MemoryStore::new(), bad).is_err());
    }

    #[test]
    fn test_sweep_budget_check() {
        let mut net = network();
        let (_, _, o) = chain(&mut net);
        assert!(!net.exceeds_sweep_budget());

        net.connect(o, o).unwrap();
        assert!(net.exceeds_sweep_budget());
        // OUTPUT max over [7, 7] stays put, so the loop still settles.
        assert!(net.last_report().unwrap().settled);
    }

    #[test]
    fn test_failed_import_keeps_current_graph() {
        let mut net = network();
        chain(&mut net);
        let before = net.graph().clone();

        let err = net.import_str(r#"{"nodes": []}"#).unwrap_err();
        assert!(matches!(err, NetworkError::Codec(CodecError::MissingArray("connections"))));
        assert_eq!(net.graph(), &before);

        assert!(net.import_str("garbage").is_err());
        assert_eq!(net.graph(), &before);
    }

    #[test]
    fn test_import_replaces_and_propagates() {
        let mut net = network();
        chain(&mut net);

        let text = r#"{
            "nodes": [
                {"id": 1, "x": 0, "y": 0, "type": "INPUT", "val": 2},
                {"id": 2, "x": 40, "y": 0, "type": "INPUT", "val": 3},
                {"id": 3, "x": 80, "y": 0, "type": "COMPETITIVE", "val": null, "op": "MAX"}
            ],
            "connections": [{"fromId": 1, "toId": 3}, {"fromId": 2, "toId": 3}],
            "exportedAt": "yesterday"
        }"#;
        let report = net.import_str(text).unwrap();

        assert!(report.settled);
        assert_eq!(net.graph().len(), 3);
        assert_eq!(net.value(NodeId(3)), Some(Signal::on(3.0)));
        assert_eq!(net.graph().node(NodeId(3)).unwrap().aggregate_op, AggregateOp::Max);
    }

    #[test]
    fn test_save_over_quota_keeps_network_usable() {
        let mut net = Network::new(MemoryStore::with_quota(16), EngineConfig::default()).unwrap();
        let (i, _, o) = chain(&mut net);

        let err = net.save().unwrap_err();
        assert!(matches!(err, NetworkError::Storage(StorageError::QuotaExceeded { .. })));

        net.set_input(i, Signal::on(9.0)).unwrap();
        assert_eq!(net.value(o), Some(Signal::on(9.0)));
    }

    #[test]
    fn test_export_then_import_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut net = network();
        chain(&mut net);
        let path = net.export_to(dir.path()).unwrap();
        assert!(path.ends_with("ads_network.json"));
        let exported = net.graph().clone();

        net.clear();
        assert!(net.graph().is_empty());

        net.import_from(&path).unwrap();
        assert_eq!(net.graph(), &exported);

        assert!(net.import_from(&dir.path().join("missing.json")).is_err());
        assert_eq!(net.graph(), &exported);
    }

    #[test]
    fn test_reset_values_waits_for_next_edit() {
        let mut net = network();
        let (i, _, o) = chain(&mut net);

        net.reset_values();
        assert_eq!(net.value(o), Some(Signal::OFF));
        assert_eq!(net.value(i), Some(Signal::on(7.0)));

        net.propagate();
        assert_eq!(net.value(o), Some(Signal::on(7.0)));
    }

    #[test]
    fn test_views() {
        let mut net = network();
        let (_, t, _) = chain(&mut net);
        assert_eq!(net.node_at(p(118.0, 41.0)), Some(t));
        assert_eq!(net.inspect(t).unwrap().incoming, vec![7.0]);
        assert_eq!(net.topology().longest_chain, Some(2));
    }

    #[test]
    fn test_custom_sweep_budget() {
        let config = EngineConfig { sweeps: 1, ..Default::default() };
        let mut net = Network::new(MemoryStore::new(), config).unwrap();
        let c = net.place_node(NodeKind::Competitive, p(0.0, 0.0)).unwrap();
        let i = net.place_node(NodeKind::Input, p(40.0, 0.0)).unwrap();
        net.set_input(i, Signal::on(1.0)).unwrap();
        net.connect(i, c).unwrap();
        net.connect(c, c).unwrap();
        // One sweep per edit: [1] then [1, 1].
        assert_eq!(net.value(c), Some(Signal::on(2.0)));
        assert_eq!(net.last_report().unwrap().sweeps, 1);

        let bad = EngineConfig { sweeps: 0, ..Default::default() };
        assert!(matches!(
            Network::new(MemoryStore::new(), bad),
            Err(NetworkError::Config(ConfigError::Invalid(_)))
        ));
    }
}

use crate::config::EngineConfig;
use crate::display;
use crate::persist::{DirectoryStore, MemoryStore, SlotStore, StorageError};
use crate::session::{Network, NetworkError};
use crate::store::{GraphError, NodeId, NodeKind, NodePatch, Position, Signal};
use pyo3::exceptions::{PyKeyError, PyValueError};
use pyo3::prelude::*;
use std::path::PathBuf;

fn to_py_err(e: NetworkError) -> PyErr {
    match e {
        NetworkError::Graph(GraphError::NodeNotFound(_)) => PyKeyError::new_err(e.to_string()),
        other => PyValueError::new_err(other.to_string()),
    }
}

fn parse<T: std::str::FromStr<Err = String>>(raw: &str) -> PyResult<T> {
    raw.parse::<T>().map_err(PyValueError::new_err)
}

/// Slot store picked at construction time from Python.
#[derive(Debug)]
pub enum AnyStore {
    Memory(MemoryStore),
    Directory(DirectoryStore),
}

impl SlotStore for AnyStore {
    fn read(&self, slot: &str) -> Result<Option<String>, StorageError> {
        match self {
            AnyStore::Memory(s) => s.read(slot),
            AnyStore::Directory(s) => s.read(slot),
        }
    }

    fn write(&mut self, slot: &str, contents: &str) -> Result<(), StorageError> {
        match self {
            AnyStore::Memory(s) => s.write(slot, contents),
            AnyStore::Directory(s) => s.write(slot, contents),
        }
    }

    fn remove(&mut self, slot: &str) -> Result<bool, StorageError> {
        match self {
            AnyStore::Memory(s) => s.remove(slot),
            AnyStore::Directory(s) => s.remove(slot),
        }
    }
}

#[pyclass(name = "_Network")]
#[derive(Debug)]
pub struct PyNetwork {
    inner: Network<AnyStore>,
}

#[pymethods]
impl PyNetwork {
    /// With `store_dir`, the saved slot in that directory is loaded on open.
    /// `discard_corrupt` starts empty instead of raising when that slot is
    /// unreadable.
    #[new]
    #[pyo3(signature = (store_dir=None, config_json=None, discard_corrupt=false))]
    pub fn new(
        store_dir: Option<PathBuf>,
        config_json: Option<&str>,
        discard_corrupt: bool,
    ) -> PyResult<Self> {
        let config = match config_json {
            Some(text) => EngineConfig::from_json_str(text)
                .map_err(|e| to_py_err(NetworkError::from(e)))?,
            None => EngineConfig::default(),
        };
        let inner = match store_dir {
            Some(dir) => {
                let store = DirectoryStore::open(dir).map_err(|e| to_py_err(e.into()))?;
                let store = AnyStore::Directory(store);
                if discard_corrupt {
                    Network::open_or_empty(store, config)
                } else {
                    Network::open(store, config)
                }
            }
            None => Network::new(AnyStore::Memory(MemoryStore::new()), config),
        }
        .map_err(to_py_err)?;
        Ok(Self { inner })
    }

    pub fn add_node(&mut self, kind: &str, x: f64, y: f64) -> PyResult<u64> {
        let kind: NodeKind = parse(kind)?;
        self.inner.place_node(kind, Position::new(x, y)).map(|id| id.raw()).map_err(to_py_err)
    }

    pub fn remove_node(&mut self, id: u64) -> PyResult<()> {
        self.inner.remove_node(NodeId(id)).map(|_| ()).map_err(to_py_err)
    }

    pub fn connect(&mut self, from_id: u64, to_id: u64) -> PyResult<()> {
        self.inner.connect(NodeId(from_id), NodeId(to_id)).map_err(to_py_err)
    }

    pub fn disconnect_near(&mut self, x: f64, y: f64) -> usize {
        self.inner.disconnect_near(Position::new(x, y))
    }

    /// `None` turns the input OFF.
    #[pyo3(signature = (id, value=None))]
    pub fn set_input(&mut self, id: u64, value: Option<f64>) -> PyResult<()> {
        self.inner.set_input(NodeId(id), Signal::from(value)).map_err(to_py_err)
    }

    #[pyo3(signature = (id, threshold=None, logic=None, tolerance=None, op=None))]
    pub fn update_node(
        &mut self,
        id: u64,
        threshold: Option<f64>,
        logic: Option<&str>,
        tolerance: Option<f64>,
        op: Option<&str>,
    ) -> PyResult<()> {
        let patch = NodePatch {
            value: None,
            threshold,
            compare_mode: logic.map(parse).transpose()?,
            tolerance,
            aggregate_op: op.map(parse).transpose()?,
        };
        self.inner.update_node(NodeId(id), patch).map_err(to_py_err)
    }

    /// Returns `(sweeps, updates, settled)`.
    pub fn propagate(&mut self) -> (usize, usize, bool) {
        let r = self.inner.propagate();
        (r.sweeps, r.updates, r.settled)
    }

    pub fn value(&self, id: u64) -> PyResult<Option<f64>> {
        self.inner
            .value(NodeId(id))
            .map(|s| s.value())
            .ok_or_else(|| PyKeyError::new_err(format!("Node {} not found", id)))
    }

    pub fn values(&self) -> Vec<(u64, Option<f64>)> {
        self.inner.graph().nodes().iter().map(|n| (n.id.raw(), n.value.value())).collect()
    }

    pub fn inspect(&self, id: u64) -> PyResult<String> {
        self.inner
            .inspect(NodeId(id))
            .map(|i| display::format_inspection(&i))
            .ok_or_else(|| PyKeyError::new_err(format!("Node {} not found", id)))
    }

    pub fn save(&mut self) -> PyResult<()> {
        self.inner.save().map_err(to_py_err)
    }

    pub fn export_to(&self, dir: PathBuf) -> PyResult<PathBuf> {
        self.inner.export_to(&dir).map_err(to_py_err)
    }

    pub fn export_json(&self) -> PyResult<String> {
        self.inner.export_string().map_err(to_py_err)
    }

    pub fn import_file(&mut self, path: PathBuf) -> PyResult<()> {
        self.inner.import_from(&path).map(|_| ()).map_err(to_py_err)
    }

    pub fn import_json(&mut self, text: &str) -> PyResult<()> {
        self.inner.import_str(text).map(|_| ()).map_err(to_py_err)
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn reset_values(&mut self) {
        self.inner.reset_values();
    }

    pub fn node_count(&self) -> usize {
        self.inner.graph().len()
    }
}

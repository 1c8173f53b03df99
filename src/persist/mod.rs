//! Storage channels: a named slot in a key-value store, and blueprint files.
//! Both carry the same codec document.
pub mod blueprint;
pub mod error;
pub mod slots;

pub use blueprint::{export_blueprint, import_blueprint, read_blueprint, write_blueprint};
pub use error::StorageError;
pub use slots::{DirectoryStore, MemoryStore, SlotStore};

use crate::codec;
use crate::store::Graph;
use tracing::info;

pub fn save_to_slot<S: SlotStore + ?Sized>(
    store: &mut S,
    slot: &str,
    graph: &Graph,
) -> Result<(), StorageError> {
    let text = codec::to_json(graph)?;
    store.write(slot, &text)?;
    info!(slot, nodes = graph.len(), bytes = text.len(), "network saved");
    Ok(())
}

/// `Ok(None)` when the slot has never been written.
pub fn load_from_slot<S: SlotStore + ?Sized>(
    store: &S,
    slot: &str,
) -> Result<Option<Graph>, StorageError> {
    let Some(text) = store.read(slot)? else {
        return Ok(None);
    };
    let graph = codec::from_json(&text)?;
    info!(slot, nodes = graph.len(), "network loaded");
    Ok(Some(graph))
}

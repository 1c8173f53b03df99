//! Named-slot key-value stores holding one serialized document each.

use super::error::StorageError;
use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

pub trait SlotStore {
    fn read(&self, slot: &str) -> Result<Option<String>, StorageError>;
    fn write(&mut self, slot: &str, contents: &str) -> Result<(), StorageError>;
    /// Returns whether the slot existed.
    fn remove(&mut self, slot: &str) -> Result<bool, StorageError>;
}

fn check_slot_name(slot: &str) -> Result<(), StorageError> {
    let valid = !slot.is_empty()
        && slot
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        && !slot.starts_with('.');
    if valid { Ok(()) } else { Err(StorageError::InvalidSlot(slot.to_string())) }
}

/// One `<slot>.json` file per slot under a root directory.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    /// Creates the root directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| StorageError::io(&root, e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path { &self.root }

    fn slot_path(&self, slot: &str) -> Result<PathBuf, StorageError> {
        check_slot_name(slot)?;
        Ok(self.root.join(format!("{}.json", slot)))
    }
}

impl SlotStore for DirectoryStore {
    fn read(&self, slot: &str) -> Result<Option<String>, StorageError> {
        let path = self.slot_path(slot)?;
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io(path, e)),
        }
    }

    /// Writes through a temp file in the same directory and renames it over
    /// the slot, so a failed save never leaves a half-written document.
    fn write(&mut self, slot: &str, contents: &str) -> Result<(), StorageError> {
        let path = self.slot_path(slot)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.root)
            .map_err(|e| StorageError::io(&self.root, e))?;
        tmp.write_all(contents.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| StorageError::io(tmp.path(), e))?;
        tmp.persist(&path).map_err(|e| StorageError::io(&path, e.error))?;
        Ok(())
    }

    fn remove(&mut self, slot: &str) -> Result<bool, StorageError> {
        let path = self.slot_path(slot)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::io(path, e)),
        }
    }
}

/// In-process store with an optional total byte quota.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slots: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    pub fn with_quota(quota: usize) -> Self {
        Self { slots: HashMap::new(), quota: Some(quota) }
    }

    fn used_excluding(&self, slot: &str) -> usize {
        self.slots.iter().filter(|(k, _)| k.as_str() != slot).map(|(_, v)| v.len()).sum()
    }
}

impl SlotStore for MemoryStore {
    fn read(&self, slot: &str) -> Result<Option<String>, StorageError> {
        check_slot_name(slot)?;
        Ok(self.slots.get(slot).cloned())
    }

    fn write(&mut self, slot: &str, contents: &str) -> Result<(), StorageError> {
        check_slot_name(slot)?;
        if let Some(quota) = self.quota {
            let needed = self.used_excluding(slot) + contents.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded { slot: slot.to_string(), needed, quota });
            }
        }
        self.slots.insert(slot.to_string(), contents.to_string());
        Ok(())
    }

    fn remove(&mut self, slot: &str) -> Result<bool, StorageError> {
        check_slot_name(slot)?;
        Ok(self.slots.remove(slot).is_some())
    }
}

use crate::codec::CodecError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O failed for '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Slot '{slot}' needs {needed} bytes but the store quota is {quota}")]
    QuotaExceeded { slot: String, needed: usize, quota: usize },
    #[error("Invalid slot name '{0}'")]
    InvalidSlot(String),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

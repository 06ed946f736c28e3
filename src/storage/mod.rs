mod entry;
mod file;
mod memory;

pub use entry::Entry;
pub use file::FileStorage;
pub use memory::MemoryStorage;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to access storage file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Storage content is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage lock was poisoned")]
    Poisoned,
}

/// Key/value persistence for request lists.
///
/// Each key holds an ordered list of [`Entry`] values; writers always replace
/// the whole list for a key.
pub trait EntryStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Vec<Entry>, StorageError>;

    fn overwrite(&self, key: &str, entries: Vec<Entry>) -> Result<(), StorageError>;
}

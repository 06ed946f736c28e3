use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{Entry, EntryStorage, StorageError};

/// JSON file holding every key's entry list in one document.
///
/// The file is re-read on every `get` and rewritten on every `overwrite`;
/// a missing file reads as empty.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

type Document = BTreeMap<String, Vec<Entry>>;

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn read_document(&self) -> Result<Document, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(Document::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Document::new()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

impl EntryStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Vec<Entry>, StorageError> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        let mut document = self.read_document()?;
        Ok(document.remove(key).unwrap_or_default())
    }

    fn overwrite(&self, key: &str, entries: Vec<Entry>) -> Result<(), StorageError> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        let mut document = self.read_document()?;
        document.insert(key.to_string(), entries);

        let content = serde_json::to_string_pretty(&document)?;
        std::fs::write(&self.path, content).map_err(|e| self.io_error(e))?;

        tracing::debug!("Stored key {} in {}", key, self.path.display());
        Ok(())
    }
}

use std::collections::HashMap;
use std::sync::Mutex;

use super::{Entry, EntryStorage, StorageError};

/// In-process storage, used by tests and by sessions without a backing file
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, Vec<Entry>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EntryStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Vec<Entry>, StorageError> {
        let entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned().unwrap_or_default())
    }

    fn overwrite(&self, key: &str, entries: Vec<Entry>) -> Result<(), StorageError> {
        let mut stored = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        tracing::debug!("Overwriting {} entries under key {}", entries.len(), key);
        stored.insert(key.to_string(), entries);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_is_empty() {
        let storage = MemoryStorage::new();
        assert!(storage.get("filters").unwrap().is_empty());
    }

    #[test]
    fn test_overwrite_replaces_previous_list() {
        let storage = MemoryStorage::new();
        storage
            .overwrite("filters", vec![Entry::new("a", "{}"), Entry::new("b", "{}")])
            .unwrap();
        storage
            .overwrite("filters", vec![Entry::new("c", "{}")])
            .unwrap();

        let entries = storage.get("filters").unwrap();
        assert_eq!(entries, vec![Entry::new("c", "{}")]);
    }
}

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tokio::sync::{RwLock, broadcast};

use crate::search::request::Request;
use crate::storage::{Entry, EntryStorage, StorageError};
use crate::types::{Guid, Key};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Cannot move request from {prev} to {curt}: store holds {len}")]
    OutOfBounds { prev: usize, curt: usize, len: usize },

    #[error("Failed to serialize request {uuid}: {source}")]
    Serialize {
        uuid: Guid,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("The {0} store is sealed")]
    Sealed(Key),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreChange {
    Added(Guid),
    Removed(Guid),
    Updated(Guid),
    Reordered { prev: usize, curt: usize },
    Cleared,
    Overwritten { count: usize },
}

/// Change notification emitted by a [`RequestStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEvent {
    pub key: Key,
    pub change: StoreChange,
}

/// Ordered, hash-deduplicated list of requests of one kind
#[derive(Debug, Clone)]
pub struct RequestStore<T: Request> {
    requests: Arc<RwLock<Vec<T>>>,
    events: broadcast::Sender<StoreEvent>,
    limit: Option<usize>,
    sealed: Arc<AtomicBool>,
}

impl<T: Request> RequestStore<T> {
    pub fn new(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        Self {
            requests: Arc::new(RwLock::new(Vec::new())),
            events,
            limit: None,
            sealed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Keep at most `limit` requests, dropping the oldest first
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn key(&self) -> Key {
        T::KEY
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Refuse every later change, in this handle and all its clones
    pub fn seal(&self) {
        self.sealed.store(true, Ordering::SeqCst);
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::SeqCst)
    }

    fn refuse(&self) -> bool {
        let sealed = self.is_sealed();
        if sealed {
            tracing::warn!("Ignoring change to sealed {} store", T::KEY);
        }
        sealed
    }

    fn emit(&self, change: StoreChange) {
        // No subscribers is fine
        let _ = self.events.send(StoreEvent { key: T::KEY, change });
    }

    fn trim(&self, requests: &mut Vec<T>) {
        if let Some(limit) = self.limit
            && requests.len() > limit
        {
            let remove_count = requests.len() - limit;
            requests.drain(..remove_count);
            tracing::debug!("Trimmed {} old {} requests", remove_count, T::KEY);
        }
    }

    /// Append a request; returns false if one with the same hash is stored
    pub async fn add(&self, request: T) -> bool {
        if self.refuse() {
            return false;
        }
        let mut requests = self.requests.write().await;
        let hash = request.hash();
        if requests.iter().any(|r| r.hash() == hash) {
            tracing::debug!("Ignoring duplicate {} request {}", T::KEY, hash);
            return false;
        }
        let uuid = request.uuid().clone();
        requests.push(request);
        self.trim(&mut requests);
        drop(requests);

        tracing::info!("Added {} request {}", T::KEY, uuid);
        self.emit(StoreChange::Added(uuid));
        true
    }

    pub async fn remove(&self, uuid: &Guid) -> Option<T> {
        if self.refuse() {
            return None;
        }
        let mut requests = self.requests.write().await;
        let pos = requests.iter().position(|r| r.uuid() == uuid)?;
        let removed = requests.remove(pos);
        drop(requests);

        tracing::info!("Removed {} request {}", T::KEY, uuid);
        self.emit(StoreChange::Removed(uuid.clone()));
        Some(removed)
    }

    /// Apply `f` to the request with `uuid`.
    ///
    /// The change is rolled back (and false returned) if it would make the
    /// request a duplicate of another stored one.
    pub async fn update(&self, uuid: &Guid, f: impl FnOnce(&mut T)) -> bool {
        if self.refuse() {
            return false;
        }
        let mut requests = self.requests.write().await;
        let Some(pos) = requests.iter().position(|r| r.uuid() == uuid) else {
            return false;
        };
        let mut updated = requests[pos].clone();
        f(&mut updated);

        let hash = updated.hash();
        let collides = requests
            .iter()
            .enumerate()
            .any(|(i, r)| i != pos && r.hash() == hash);
        if collides {
            tracing::warn!("Update of {} request {} would duplicate {}", T::KEY, uuid, hash);
            return false;
        }
        requests[pos] = updated;
        drop(requests);

        self.emit(StoreChange::Updated(uuid.clone()));
        true
    }

    /// Move the request at `prev` to position `curt`
    pub async fn reorder(&self, prev: usize, curt: usize) -> Result<(), StoreError> {
        if self.refuse() {
            return Err(StoreError::Sealed(T::KEY));
        }
        let mut requests = self.requests.write().await;
        let len = requests.len();
        if prev >= len || curt >= len {
            return Err(StoreError::OutOfBounds { prev, curt, len });
        }
        let request = requests.remove(prev);
        requests.insert(curt, request);
        drop(requests);

        tracing::debug!("Reordered {} requests: {} -> {}", T::KEY, prev, curt);
        self.emit(StoreChange::Reordered { prev, curt });
        Ok(())
    }

    pub async fn get(&self) -> Vec<T> {
        self.requests.read().await.clone()
    }

    pub async fn find(&self, uuid: &Guid) -> Option<T> {
        self.requests
            .read()
            .await
            .iter()
            .find(|r| r.uuid() == uuid)
            .cloned()
    }

    pub async fn has(&self, request: &T) -> bool {
        let hash = request.hash();
        self.requests.read().await.iter().any(|r| r.hash() == hash)
    }

    pub async fn len(&self) -> usize {
        self.requests.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.requests.read().await.is_empty()
    }

    pub async fn clear(&self) {
        if self.refuse() {
            return;
        }
        self.requests.write().await.clear();
        tracing::info!("Cleared {} requests", T::KEY);
        self.emit(StoreChange::Cleared);
    }

    /// Replace the whole list, dropping duplicates by hash (first one wins)
    pub async fn overwrite(&self, incoming: Vec<T>) -> usize {
        if self.refuse() {
            return 0;
        }
        let mut unique: Vec<T> = Vec::with_capacity(incoming.len());
        for request in incoming {
            let hash = request.hash();
            if !unique.iter().any(|r| r.hash() == hash) {
                unique.push(request);
            }
        }
        let mut requests = self.requests.write().await;
        *requests = unique;
        self.trim(&mut requests);
        let count = requests.len();
        drop(requests);

        tracing::info!("Overwrote {} store with {} requests", T::KEY, count);
        self.emit(StoreChange::Overwritten { count });
        count
    }

    pub async fn entries(&self) -> Result<Vec<Entry>, StoreError> {
        self.requests
            .read()
            .await
            .iter()
            .map(|r| {
                r.to_entry().map_err(|source| StoreError::Serialize {
                    uuid: r.uuid().clone(),
                    source,
                })
            })
            .collect()
    }

    /// Write this store under its key
    pub async fn save(&self, storage: &dyn EntryStorage) -> Result<(), StoreError> {
        let entries = self.entries().await?;
        storage.overwrite(T::KEY.as_str(), entries)?;
        Ok(())
    }

    /// Replace the content with what `storage` holds under this store's key.
    ///
    /// Entries that fail to decode are skipped with a warning. Returns the
    /// number of requests loaded.
    pub async fn load(&self, storage: &dyn EntryStorage) -> Result<usize, StoreError> {
        let entries = storage.get(T::KEY.as_str())?;
        let mut restored = Vec::with_capacity(entries.len());
        for entry in &entries {
            match T::from_entry(entry) {
                Ok(request) => restored.push(request),
                Err(e) => tracing::warn!("Skipping stored {} entry {}: {}", T::KEY, entry.uuid, e),
            }
        }
        Ok(self.overwrite(restored).await)
    }
}

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::RwLock;

use crate::search::request::Request;
use crate::types::Guid;

/// UI-facing handle over a request.
///
/// The handle outlives refreshes of the backing list: the request inside is
/// swapped in place, so holders of the `Arc` and the selection flag survive.
#[derive(Debug)]
pub struct Entity<T> {
    guid: Guid,
    request: RwLock<T>,
    selected: AtomicBool,
}

impl<T: Clone> Entity<T> {
    pub fn new(guid: Guid, request: T) -> Self {
        Self {
            guid,
            request: RwLock::new(request),
            selected: AtomicBool::new(false),
        }
    }

    pub fn guid(&self) -> &Guid {
        &self.guid
    }

    pub async fn request(&self) -> T {
        self.request.read().await.clone()
    }

    pub async fn set_request(&self, request: T) {
        *self.request.write().await = request;
    }

    pub fn select(&self) {
        self.selected.store(true, Ordering::SeqCst);
    }

    pub fn unselect(&self) {
        self.selected.store(false, Ordering::SeqCst);
    }

    pub fn is_selected(&self) -> bool {
        self.selected.load(Ordering::SeqCst)
    }
}

/// GUID → entity map kept in step with a request list
#[derive(Debug)]
pub struct EntityCache<T> {
    entities: HashMap<Guid, Arc<Entity<T>>>,
}

impl<T> Default for EntityCache<T> {
    fn default() -> Self {
        Self {
            entities: HashMap::new(),
        }
    }
}

impl<T: Request> EntityCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sync the cache with `snapshot` and return its entities in snapshot order.
    ///
    /// Known GUIDs get their request updated in place, new ones get a fresh
    /// entity, and GUIDs missing from the snapshot are evicted.
    pub async fn refresh(&mut self, snapshot: Vec<T>) -> Vec<Arc<Entity<T>>> {
        let mut refreshed = Vec::with_capacity(snapshot.len());
        let mut seen: HashMap<Guid, Arc<Entity<T>>> = HashMap::with_capacity(snapshot.len());

        for request in snapshot {
            let guid = request.uuid().clone();
            let entity = match self.entities.remove(&guid) {
                Some(entity) => {
                    entity.set_request(request).await;
                    entity
                }
                None => Arc::new(Entity::new(guid.clone(), request)),
            };
            seen.insert(guid, entity.clone());
            refreshed.push(entity);
        }

        if !self.entities.is_empty() {
            tracing::debug!("Evicted {} {} entities", self.entities.len(), T::KEY);
        }
        self.entities = seen;
        refreshed
    }

    pub fn get(&self, guid: &Guid) -> Option<Arc<Entity<T>>> {
        self.entities.get(guid).cloned()
    }

    pub fn contains(&self, guid: &Guid) -> bool {
        self.entities.contains_key(guid)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn selected(&self) -> Vec<Arc<Entity<T>>> {
        self.entities
            .values()
            .filter(|e| e.is_selected())
            .cloned()
            .collect()
    }
}

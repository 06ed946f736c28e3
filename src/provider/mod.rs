use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tokio::sync::Mutex;

use crate::entity::{Entity, EntityCache};
use crate::search::request::{ChartRequest, FilterRequest, RangeRequest, Request};
use crate::search::{DisabledRequest, RequestStore, Search, StoreError};
use crate::types::Guid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Filters,
    Charts,
    Ranges,
    Disabled,
}

impl ProviderKind {
    pub fn title(&self) -> &'static str {
        match self {
            ProviderKind::Filters => "Filters",
            ProviderKind::Charts => "Charts",
            ProviderKind::Ranges => "Time Ranges",
            ProviderKind::Disabled => "Disabled",
        }
    }

    fn noun(&self) -> &'static str {
        match self {
            ProviderKind::Filters => "filter",
            ProviderKind::Charts => "chart",
            ProviderKind::Ranges => "range",
            ProviderKind::Disabled => "disabled request",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Summary shown in a provider's panel header
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub title: String,
    pub total: usize,
    pub info: Vec<String>,
}

/// Binds one request store to an entity cache for the UI
#[derive(Debug)]
pub struct RequestProvider<T: Request> {
    kind: ProviderKind,
    store: RequestStore<T>,
    cache: Mutex<EntityCache<T>>,
    aborted: AtomicBool,
}

impl<T: Request> RequestProvider<T> {
    pub fn new(kind: ProviderKind, store: RequestStore<T>) -> Self {
        Self {
            kind,
            store,
            cache: Mutex::new(EntityCache::new()),
            aborted: AtomicBool::new(false),
        }
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    pub fn title(&self) -> &'static str {
        self.kind.title()
    }

    pub fn store(&self) -> &RequestStore<T> {
        &self.store
    }

    /// Current entities, in store order
    pub async fn entities(&self) -> Vec<Arc<Entity<T>>> {
        if self.is_aborted() {
            return Vec::new();
        }
        let snapshot = self.store.get().await;
        self.cache.lock().await.refresh(snapshot).await
    }

    pub async fn entity(&self, guid: &Guid) -> Option<Arc<Entity<T>>> {
        self.cache.lock().await.get(guid)
    }

    pub async fn reorder(&self, prev: usize, curt: usize) -> Result<(), StoreError> {
        self.store.reorder(prev, curt).await
    }

    pub async fn stat(&self) -> Statistics {
        let requests = self.store.get().await;
        Statistics {
            title: self.title().to_string(),
            total: requests.len(),
            info: T::info(&requests),
        }
    }

    pub async fn panel_desc(&self) -> String {
        let count = self.store.len().await;
        format!(
            "{count} {}{}",
            self.kind.noun(),
            if count > 1 { "s" } else { "" }
        )
    }

    pub fn destroy(&self) {
        self.aborted.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    async fn mark(&self, guid: &Guid, selected: bool) -> bool {
        // Make sure the cache reflects the store before looking up
        self.entities().await;
        match self.entity(guid).await {
            Some(entity) if selected => {
                entity.select();
                true
            }
            Some(entity) => {
                entity.unselect();
                true
            }
            None => false,
        }
    }
}

/// The fixed, ordered set of request providers of a session
#[derive(Debug)]
pub struct Providers {
    pub filters: RequestProvider<FilterRequest>,
    pub charts: RequestProvider<ChartRequest>,
    pub ranges: RequestProvider<RangeRequest>,
    pub disabled: RequestProvider<DisabledRequest>,
    selection: Mutex<Option<(ProviderKind, Guid)>>,
}

impl Providers {
    pub fn new(search: &Search) -> Self {
        Self {
            filters: RequestProvider::new(ProviderKind::Filters, search.filters().clone()),
            charts: RequestProvider::new(ProviderKind::Charts, search.charts().clone()),
            ranges: RequestProvider::new(ProviderKind::Ranges, search.ranges().clone()),
            disabled: RequestProvider::new(ProviderKind::Disabled, search.disabled().clone()),
            selection: Mutex::new(None),
        }
    }

    pub fn list(&self) -> [ProviderKind; 4] {
        [
            ProviderKind::Filters,
            ProviderKind::Charts,
            ProviderKind::Ranges,
            ProviderKind::Disabled,
        ]
    }

    async fn mark(&self, kind: ProviderKind, guid: &Guid, selected: bool) -> bool {
        match kind {
            ProviderKind::Filters => self.filters.mark(guid, selected).await,
            ProviderKind::Charts => self.charts.mark(guid, selected).await,
            ProviderKind::Ranges => self.ranges.mark(guid, selected).await,
            ProviderKind::Disabled => self.disabled.mark(guid, selected).await,
        }
    }

    /// Toggle selection of an entity.
    ///
    /// Selecting the currently selected entity clears the selection; any other
    /// entity replaces it. Returns the selection after the call.
    pub async fn select(&self, kind: ProviderKind, guid: &Guid) -> Option<(ProviderKind, Guid)> {
        let mut selection = self.selection.lock().await;
        if let Some((prev_kind, prev_guid)) = selection.take() {
            self.mark(prev_kind, &prev_guid, false).await;
            if prev_kind == kind && &prev_guid == guid {
                return None;
            }
        }
        if self.mark(kind, guid, true).await {
            *selection = Some((kind, guid.clone()));
        } else {
            tracing::warn!("Cannot select unknown entity {} in {}", guid, kind);
        }
        selection.clone()
    }

    pub async fn reorder(&self, kind: ProviderKind, prev: usize, curt: usize) -> Result<(), StoreError> {
        match kind {
            ProviderKind::Filters => self.filters.reorder(prev, curt).await,
            ProviderKind::Charts => self.charts.reorder(prev, curt).await,
            ProviderKind::Ranges => self.ranges.reorder(prev, curt).await,
            ProviderKind::Disabled => self.disabled.reorder(prev, curt).await,
        }
    }

    pub async fn selected(&self) -> Option<(ProviderKind, Guid)> {
        self.selection.lock().await.clone()
    }

    pub async fn stats(&self) -> Vec<Statistics> {
        vec![
            self.filters.stat().await,
            self.charts.stat().await,
            self.ranges.stat().await,
            self.disabled.stat().await,
        ]
    }

    pub fn destroy(&self) {
        self.filters.destroy();
        self.charts.destroy();
        self.ranges.destroy();
        self.disabled.destroy();
    }
}

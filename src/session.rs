use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::observe::{DataSource, ObserveError, ObserveEvent, ObservedSources};
use crate::provider::{ProviderKind, Providers};
use crate::search::request::{ChartRequest, FilterRequest, RangeRequest};
use crate::search::{Search, SearchError, SearchResults, StoreError, StoreEvent};
use crate::storage::EntryStorage;
use crate::types::Guid;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session {0} is closed")]
    Closed(Guid),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Observe(#[from] ObserveError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Change notification of anything a session owns
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Search(StoreEvent),
    Observe(ObserveEvent),
}

/// One open log session: what it observes and how it searches
pub struct Session {
    uuid: Guid,
    search: Search,
    observed: ObservedSources,
    providers: Providers,
    storage: Option<Arc<dyn EntryStorage>>,
    events: broadcast::Sender<SessionEvent>,
    subscriptions: Mutex<Vec<JoinHandle<()>>>,
    closed: AtomicBool,
}

fn forward<E, F>(
    mut rx: broadcast::Receiver<E>,
    tx: broadcast::Sender<SessionEvent>,
    wrap: F,
) -> JoinHandle<()>
where
    E: Clone + Send + 'static,
    F: Fn(E) -> SessionEvent + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let _ = tx.send(wrap(event));
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Session subscriber lagged, skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

impl Session {
    /// Create an empty session. Must be called within a tokio runtime.
    pub fn new(config: &Config, storage: Option<Arc<dyn EntryStorage>>) -> Self {
        let search = Search::new(&config.search);
        let observed = ObservedSources::new(config.search.events_capacity);
        let providers = Providers::new(&search);
        let (events, _) = broadcast::channel(config.search.events_capacity.max(1));

        let mut subscriptions: Vec<JoinHandle<()>> = search
            .subscribe()
            .into_iter()
            .map(|rx| forward(rx, events.clone(), SessionEvent::Search))
            .collect();
        subscriptions.push(forward(
            observed.subscribe(),
            events.clone(),
            SessionEvent::Observe,
        ));

        let uuid = Guid::generate();
        tracing::info!("Session {} created", uuid);

        Self {
            uuid,
            search,
            observed,
            providers,
            storage,
            events,
            subscriptions: Mutex::new(subscriptions),
            closed: AtomicBool::new(false),
        }
    }

    /// Create a session and restore its requests from `storage`
    pub async fn open(config: &Config, storage: Arc<dyn EntryStorage>) -> Result<Self, SessionError> {
        let session = Self::new(config, Some(storage.clone()));
        session.search.load(storage.as_ref()).await?;
        Ok(session)
    }

    pub fn uuid(&self) -> &Guid {
        &self.uuid
    }

    pub fn search(&self) -> &Search {
        &self.search
    }

    pub fn observed(&self) -> &ObservedSources {
        &self.observed
    }

    pub fn providers(&self) -> &Providers {
        &self.providers
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.is_closed() {
            Err(SessionError::Closed(self.uuid.clone()))
        } else {
            Ok(())
        }
    }

    async fn persist(&self) -> Result<(), SessionError> {
        if let Some(storage) = &self.storage {
            self.search.save(storage.as_ref()).await?;
        }
        Ok(())
    }

    pub async fn observe(&self, source: DataSource) -> Result<Guid, SessionError> {
        self.ensure_open()?;
        Ok(self.observed.start(source).await)
    }

    /// Add a filter; `false` if an equal one is already stored
    pub async fn add_filter(&self, filter: FilterRequest) -> Result<bool, SessionError> {
        self.ensure_open()?;
        let added = self.search.filters().add(filter).await;
        self.persist().await?;
        Ok(added)
    }

    pub async fn add_chart(&self, chart: ChartRequest) -> Result<bool, SessionError> {
        self.ensure_open()?;
        let added = self.search.charts().add(chart).await;
        self.persist().await?;
        Ok(added)
    }

    pub async fn toggle(&self, uuid: &Guid) -> Result<(), SessionError> {
        self.ensure_open()?;
        self.search.toggle(uuid).await?;
        self.persist().await
    }

    pub async fn create_range(&self, points: &[Guid]) -> Result<Option<RangeRequest>, SessionError> {
        self.ensure_open()?;
        let range = self.search.create_range(points).await?;
        self.persist().await?;
        Ok(range)
    }

    pub async fn reorder(
        &self,
        kind: ProviderKind,
        prev: usize,
        curt: usize,
    ) -> Result<(), SessionError> {
        self.ensure_open()?;
        self.providers.reorder(kind, prev, curt).await?;
        self.persist().await
    }

    /// Run the active filters over `lines`
    pub async fn run_search<'a>(
        &self,
        lines: impl Iterator<Item = &'a str>,
        cancel: &CancellationToken,
    ) -> Result<SearchResults, SessionError> {
        self.ensure_open()?;
        Ok(self.search.search(lines, cancel).await?)
    }

    pub async fn disable(&self, uuid: &Guid) -> Result<(), SessionError> {
        self.ensure_open()?;
        self.search.disable(uuid).await?;
        self.persist().await
    }

    pub async fn enable(&self, uuid: &Guid) -> Result<(), SessionError> {
        self.ensure_open()?;
        self.search.enable(uuid).await?;
        self.persist().await
    }

    /// Tear down subscriptions, stop running observers and persist requests.
    /// The stores are sealed, so handles obtained through [`Session::search`]
    /// stop accepting changes too.
    ///
    /// Closing twice is a no-op.
    pub async fn close(&self) -> Result<(), SessionError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let aborted = self.observed.abort_all().await;
        for handle in self.subscriptions.lock().await.drain(..) {
            handle.abort();
        }
        self.providers.destroy();
        self.search.seal();
        self.persist().await?;

        tracing::info!(
            "Session {} closed, {} running observers aborted",
            self.uuid,
            aborted
        );
        Ok(())
    }
}

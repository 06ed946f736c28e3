mod disabled;
mod holder;
pub mod request;
mod store;

pub use disabled::DisabledRequest;
pub use holder::{FilterHits, FilterMatch, FilterStats, SearchHolder, SearchResults};
pub use store::{RequestStore, StoreChange, StoreError, StoreEvent};

use thiserror::Error;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::config::SearchConfig;
use crate::storage::EntryStorage;
use crate::types::Guid;
use request::{
    Activatable, AnyRequest, ChartRequest, FilterRequest, RangeRequest, Request, RequestError,
};

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("No request with uuid {0}")]
    NotFound(Guid),

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Search was cancelled")]
    Cancelled,
}

/// Search state of a session: active filters, charts and ranges, plus the
/// requests the user has disabled.
#[derive(Debug, Clone)]
pub struct Search {
    filters: RequestStore<FilterRequest>,
    charts: RequestStore<ChartRequest>,
    ranges: RequestStore<RangeRequest>,
    disabled: RequestStore<DisabledRequest>,
}

impl Search {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            filters: RequestStore::new(config.events_capacity),
            charts: RequestStore::new(config.events_capacity),
            ranges: RequestStore::new(config.events_capacity),
            disabled: RequestStore::new(config.events_capacity).with_limit(config.max_disabled),
        }
    }

    pub fn filters(&self) -> &RequestStore<FilterRequest> {
        &self.filters
    }

    pub fn charts(&self) -> &RequestStore<ChartRequest> {
        &self.charts
    }

    pub fn ranges(&self) -> &RequestStore<RangeRequest> {
        &self.ranges
    }

    pub fn disabled(&self) -> &RequestStore<DisabledRequest> {
        &self.disabled
    }

    pub fn subscribe(&self) -> Vec<broadcast::Receiver<StoreEvent>> {
        vec![
            self.filters.subscribe(),
            self.charts.subscribe(),
            self.ranges.subscribe(),
            self.disabled.subscribe(),
        ]
    }

    /// Move the request with `uuid` out of its store into the disabled store.
    ///
    /// If an equal request is already disabled the store keeps a single copy.
    pub async fn disable(&self, uuid: &Guid) -> Result<(), SearchError> {
        let request: AnyRequest = if let Some(filter) = self.filters.remove(uuid).await {
            filter.into()
        } else if let Some(chart) = self.charts.remove(uuid).await {
            chart.into()
        } else if let Some(range) = self.ranges.remove(uuid).await {
            range.into()
        } else {
            return Err(SearchError::NotFound(uuid.clone()));
        };

        let key = request.key();
        if !self.disabled.add(DisabledRequest::new(request)).await {
            tracing::debug!("Equal {} request is already disabled", key);
        }
        Ok(())
    }

    /// Move a disabled request back into the store of its kind
    pub async fn enable(&self, uuid: &Guid) -> Result<(), SearchError> {
        let disabled = self
            .disabled
            .remove(uuid)
            .await
            .ok_or_else(|| SearchError::NotFound(uuid.clone()))?;

        let key = disabled.key();
        let added = match disabled.into_request() {
            AnyRequest::Filter(filter) => self.filters.add(filter).await,
            AnyRequest::Chart(chart) => self.charts.add(chart).await,
            AnyRequest::Range(range) => self.ranges.add(range).await,
        };
        if !added {
            tracing::debug!("Enabled {} request {} was already active", key, uuid);
        }
        Ok(())
    }

    /// Flip the active state of a filter, chart or range
    pub async fn toggle(&self, uuid: &Guid) -> Result<(), SearchError> {
        if self.filters.update(uuid, |r| r.set_active(!r.is_active())).await
            || self.charts.update(uuid, |r| r.set_active(!r.is_active())).await
            || self.ranges.update(uuid, |r| r.set_active(!r.is_active())).await
        {
            Ok(())
        } else {
            Err(SearchError::NotFound(uuid.clone()))
        }
    }

    /// Create a time range from two stored filters, in the given order
    pub async fn create_range(&self, points: &[Guid]) -> Result<Option<RangeRequest>, SearchError> {
        let mut filters = Vec::with_capacity(points.len());
        for uuid in points {
            let filter = self
                .filters
                .find(uuid)
                .await
                .ok_or_else(|| SearchError::NotFound(uuid.clone()))?;
            filters.push(filter);
        }
        let range = RangeRequest::from_filters(&filters)?;
        Ok(self.ranges.add(range.clone()).await.then_some(range))
    }

    pub async fn active_filters(&self) -> Vec<FilterRequest> {
        self.filters
            .get()
            .await
            .into_iter()
            .filter(|f| f.is_active())
            .collect()
    }

    /// Run the active filters over `lines` until done or `cancel` fires
    pub async fn search<'a>(
        &self,
        lines: impl Iterator<Item = &'a str>,
        cancel: &CancellationToken,
    ) -> Result<SearchResults, SearchError> {
        let filters = self.active_filters().await;
        let mut holder = SearchHolder::new();
        holder.set_filters(filters.iter())?;
        holder.execute(lines, cancel).ok_or(SearchError::Cancelled)
    }

    /// Refuse further changes to every store
    pub fn seal(&self) {
        self.filters.seal();
        self.charts.seal();
        self.ranges.seal();
        self.disabled.seal();
    }

    pub async fn save(&self, storage: &dyn EntryStorage) -> Result<(), SearchError> {
        self.filters.save(storage).await?;
        self.charts.save(storage).await?;
        self.ranges.save(storage).await?;
        self.disabled.save(storage).await?;
        Ok(())
    }

    pub async fn load(&self, storage: &dyn EntryStorage) -> Result<(), SearchError> {
        let filters = self.filters.load(storage).await?;
        let charts = self.charts.load(storage).await?;
        let ranges = self.ranges.load(storage).await?;
        let disabled = self.disabled.load(storage).await?;
        tracing::info!(
            "Restored search: {filters} filters, {charts} charts, {ranges} ranges, {disabled} disabled"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use request::SearchFilter;

    fn search() -> Search {
        Search::new(&SearchConfig::default())
    }

    fn filter(text: &str) -> FilterRequest {
        FilterRequest::new(SearchFilter::new(text)).unwrap()
    }

    #[tokio::test]
    async fn test_disable_then_enable_restores_filter() {
        let search = search();
        let f = filter("error");
        search.filters().add(f.clone()).await;

        search.disable(f.uuid()).await.unwrap();
        assert!(search.filters().is_empty().await);
        let disabled = search.disabled().get().await;
        assert_eq!(disabled.len(), 1);
        assert_eq!(disabled[0].as_filter(), Some(&f));

        search.enable(f.uuid()).await.unwrap();
        assert!(search.disabled().is_empty().await);
        assert_eq!(search.filters().get().await, vec![f]);
    }

    #[tokio::test]
    async fn test_disable_dedups_by_content() {
        let search = search();
        let first = filter("timeout");
        search.filters().add(first.clone()).await;
        search.disable(first.uuid()).await.unwrap();

        let second = filter("timeout");
        search.filters().add(second.clone()).await;
        search.disable(second.uuid()).await.unwrap();

        assert_eq!(search.disabled().len().await, 1);
        assert!(search.filters().is_empty().await);
    }

    #[tokio::test]
    async fn test_enable_does_not_duplicate_active() {
        let search = search();
        let original = filter("x");
        search.filters().add(original.clone()).await;
        search.disable(original.uuid()).await.unwrap();
        search.filters().add(filter("x")).await;

        search.enable(original.uuid()).await.unwrap();
        assert_eq!(search.filters().len().await, 1);
        assert!(search.disabled().is_empty().await);
    }

    #[tokio::test]
    async fn test_disable_chart_and_range() {
        let search = search();
        let chart = ChartRequest::new(r"v=(\d+)", "#FF0000").unwrap();
        let range = RangeRequest::new(filter("a"), filter("b")).unwrap();
        search.charts().add(chart.clone()).await;
        search.ranges().add(range.clone()).await;

        search.disable(chart.uuid()).await.unwrap();
        search.disable(range.uuid()).await.unwrap();
        assert_eq!(search.disabled().len().await, 2);

        search.enable(range.uuid()).await.unwrap();
        assert_eq!(search.ranges().get().await, vec![range]);
        assert!(search.charts().is_empty().await);
    }

    #[tokio::test]
    async fn test_unknown_uuid_not_found() {
        let search = search();
        let missing = Guid::generate();
        assert!(matches!(
            search.disable(&missing).await,
            Err(SearchError::NotFound(_))
        ));
        assert!(matches!(
            search.enable(&missing).await,
            Err(SearchError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_toggle_excludes_filter_from_search() {
        let search = search();
        let f = filter("error");
        search.filters().add(f.clone()).await;

        let results = search
            .search(["error one", "fine"].into_iter(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(results.found(), 1);

        search.toggle(f.uuid()).await.unwrap();
        let results = search
            .search(["error one", "fine"].into_iter(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(results.found(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_search_reports_error() {
        let search = search();
        search.filters().add(filter("error")).await;
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert!(matches!(
            search.search(["error one"].into_iter(), &cancel).await,
            Err(SearchError::Cancelled)
        ));
    }

    #[tokio::test]
    async fn test_sealed_stores_refuse_changes() {
        let search = search();
        let f = filter("error");
        search.filters().add(f.clone()).await;
        search.seal();

        assert!(!search.filters().add(filter("late")).await);
        assert!(search.toggle(f.uuid()).await.is_err());
        assert!(matches!(
            search.disable(f.uuid()).await,
            Err(SearchError::NotFound(_))
        ));
        assert_eq!(search.filters().get().await, vec![f]);
    }

    #[tokio::test]
    async fn test_ranges_with_separators_in_points_both_kept() {
        let search = search();
        let first = RangeRequest::new(filter("a|false|true|false>b"), filter("c")).unwrap();
        let second = RangeRequest::new(filter("a"), filter("b|false|true|false>c")).unwrap();
        assert!(search.ranges().add(first.clone()).await);
        assert!(search.ranges().add(second.clone()).await);

        search.disable(first.uuid()).await.unwrap();
        search.disable(second.uuid()).await.unwrap();
        assert_eq!(search.disabled().len().await, 2);
    }

    #[tokio::test]
    async fn test_create_range_from_two_filters() {
        let search = search();
        let start = filter("start");
        let end = filter("end");
        search.filters().add(start.clone()).await;
        search.filters().add(end.clone()).await;

        let range = search
            .create_range(&[start.uuid().clone(), end.uuid().clone()])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(range.start(), &start);

        // Same pair again is a duplicate
        let again = search
            .create_range(&[start.uuid().clone(), end.uuid().clone()])
            .await
            .unwrap();
        assert!(again.is_none());

        assert!(matches!(
            search.create_range(&[start.uuid().clone()]).await,
            Err(SearchError::Request(RequestError::RangePoints(1)))
        ));
    }

    #[tokio::test]
    async fn test_save_and_load_all_stores() {
        let storage = MemoryStorage::new();
        let search = search();
        let keep = filter("keep");
        let park = filter("park");
        search.filters().add(keep.clone()).await;
        search.filters().add(park.clone()).await;
        search
            .charts()
            .add(ChartRequest::new(r"c=(\d+)", "#00FF00").unwrap())
            .await;
        search.disable(park.uuid()).await.unwrap();
        search.save(&storage).await.unwrap();

        let restored = Search::new(&SearchConfig::default());
        restored.load(&storage).await.unwrap();
        assert_eq!(restored.filters().get().await, vec![keep]);
        assert_eq!(restored.charts().len().await, 1);
        assert_eq!(
            restored.disabled().get().await[0].as_filter().map(|f| f.hash()),
            Some(park.hash())
        );
    }
}

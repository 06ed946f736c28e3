#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chipmunk_search::observe::{DataSource, Parser, Transport};
    use chipmunk_search::provider::ProviderKind;
    use chipmunk_search::search::DisabledRequest;
    use chipmunk_search::search::request::{
        ChartRequest, FilterFlags, FilterRequest, Request, SearchFilter,
    };
    use chipmunk_search::stat::{DltStatistic, LevelDistribution, StatSections};
    use chipmunk_search::storage::{EntryStorage, FileStorage};
    use chipmunk_search::{Config, Session};
    use tokio_util::sync::CancellationToken;

    fn filter(text: &str) -> FilterRequest {
        FilterRequest::new(SearchFilter::new(text)).unwrap()
    }

    fn temp_storage() -> (std::path::PathBuf, Arc<FileStorage>) {
        let path =
            std::env::temp_dir().join(format!("chipmunk-search-it-{}.json", uuid_suffix()));
        (path.clone(), Arc::new(FileStorage::new(path)))
    }

    fn uuid_suffix() -> String {
        chipmunk_search::types::Guid::generate().into_inner()
    }

    #[tokio::test]
    async fn test_session_round_trip_through_file() {
        let (path, storage) = temp_storage();
        let config = Config::default();

        let session = Session::open(&config, storage.clone()).await.unwrap();
        let error = filter("error");
        let warn = filter("warn");
        session.search().filters().add(error.clone()).await;
        session.search().filters().add(warn.clone()).await;
        session
            .search()
            .charts()
            .add(ChartRequest::new(r"cpu=(\d+)", "#FF0000").unwrap())
            .await;
        session.disable(warn.uuid()).await.unwrap();
        session.close().await.unwrap();

        let reopened = Session::open(&config, storage.clone()).await.unwrap();
        assert_eq!(reopened.search().filters().get().await, vec![error]);
        assert_eq!(reopened.search().charts().len().await, 1);

        let disabled = reopened.search().disabled().get().await;
        assert_eq!(disabled.len(), 1);
        assert!(disabled[0].is_same(&DisabledRequest::new(filter("warn"))));

        // Raw envelope on disk carries the discriminator
        let entries = storage.get("disabled").unwrap();
        let envelope: serde_json::Value = serde_json::from_str(&entries[0].content).unwrap();
        assert_eq!(envelope["key"], "filters");

        reopened.enable(warn.uuid()).await.unwrap();
        assert_eq!(reopened.search().filters().len().await, 2);
        reopened.close().await.unwrap();

        std::fs::remove_file(path).unwrap();
    }

    #[tokio::test]
    async fn test_disabled_json_restores_hash_for_every_kind() {
        let flags = FilterFlags {
            cases: true,
            reg: false,
            word: true,
        };
        let requests: Vec<DisabledRequest> = vec![
            DisabledRequest::new(
                FilterRequest::new(SearchFilter::new("a+b").with_flags(flags)).unwrap(),
            ),
            DisabledRequest::new(ChartRequest::new(r"mem=(\d+)", "#00FF00").unwrap()),
        ];
        for request in requests {
            let restored = DisabledRequest::from_json(&request.to_json().unwrap()).unwrap();
            assert_eq!(restored.hash(), request.hash());
        }
    }

    #[tokio::test]
    async fn test_provider_entities_track_store() {
        let session = Session::new(&Config::default(), None);
        let a = filter("a");
        let b = filter("b");
        let c = filter("c");
        for f in [&a, &b, &c] {
            session.search().filters().add(f.clone()).await;
        }

        let providers = session.providers();
        let before = providers.filters.entities().await;
        providers.select(ProviderKind::Filters, c.uuid()).await;

        session.disable(b.uuid()).await.unwrap();
        let after = providers.filters.entities().await;

        assert_eq!(after.len(), 2);
        assert!(Arc::ptr_eq(&before[0], &after[0]));
        assert!(Arc::ptr_eq(&before[2], &after[1]));
        assert!(after[1].is_selected());
        assert!(providers.filters.entity(b.uuid()).await.is_none());

        let disabled = providers.disabled.entities().await;
        assert_eq!(disabled.len(), 1);
        assert_eq!(disabled[0].guid(), b.uuid());
        assert_eq!(providers.disabled.panel_desc().await, "1 disabled request");
    }

    #[tokio::test]
    async fn test_search_over_observed_lines() {
        let session = Session::new(&Config::default(), None);
        let uuid = session
            .observe(DataSource::stream(
                Transport::Udp {
                    bind_addr: "0.0.0.0:3490".to_string(),
                    multicast: vec!["239.0.0.1".to_string()],
                },
                Parser::Text,
            ))
            .await
            .unwrap();

        session.add_filter(filter("fail")).await.unwrap();
        let lines = ["start", "job failed", "FAIL again", "done"];
        let results = session
            .run_search(lines.into_iter(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(results.found(), 2);
        assert_eq!(results.stats.stats[0].hits, 2);

        session.observed().finish(&uuid).await.unwrap();
        assert_eq!(session.observed().done().await.len(), 1);
    }

    #[test]
    fn test_stat_sections_filtering() {
        let level = |fatal| LevelDistribution {
            log_fatal: fatal,
            ..Default::default()
        };
        let stat = DltStatistic {
            ecu_ids: vec![("ECU".to_string(), level(1))],
            app_ids: vec![("APP1".to_string(), level(2)), ("LOG".to_string(), level(3))],
            context_ids: vec![],
        };
        let mut sections = StatSections::new(&stat);
        sections.filter("app");

        let apps = sections.section("app_ids").unwrap();
        assert_eq!(apps.visible().count(), 1);
        assert_eq!(apps.entities[0].html_id(), "<span>APP</span>1");
        assert_eq!(apps.total().log_fatal, 5);
    }
}

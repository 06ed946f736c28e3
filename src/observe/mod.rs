mod source;

pub use source::{DataSource, Origin, Parser, Transport};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::{RwLock, broadcast};

use crate::types::Guid;

#[derive(Debug, Error)]
pub enum ObserveError {
    #[error("No running observe operation {0}")]
    NotRunning(Guid),
}

/// A live observe operation over one data source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObserveOperation {
    pub uuid: Guid,
    pub source: DataSource,
    pub started: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObserveEvent {
    Started(Guid),
    Finished(Guid),
    Aborted(Guid),
}

/// Flattened view of an observed source for listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceHolder {
    pub source: DataSource,
    /// Operation still feeding this source, if any
    pub operation: Option<Guid>,
}

#[derive(Debug, Default)]
struct Observed {
    running: Vec<ObserveOperation>,
    done: Vec<DataSource>,
}

/// Sources observed by a session, split into running and finished ones
#[derive(Debug, Clone)]
pub struct ObservedSources {
    observed: Arc<RwLock<Observed>>,
    events: broadcast::Sender<ObserveEvent>,
}

impl ObservedSources {
    pub fn new(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        Self {
            observed: Arc::new(RwLock::new(Observed::default())),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ObserveEvent> {
        self.events.subscribe()
    }

    /// Register a new running operation for `source`
    pub async fn start(&self, source: DataSource) -> Guid {
        let uuid = Guid::generate();
        tracing::info!("Observe {} started for {}", uuid, source);
        self.observed.write().await.running.push(ObserveOperation {
            uuid: uuid.clone(),
            source,
            started: Utc::now(),
        });
        let _ = self.events.send(ObserveEvent::Started(uuid.clone()));
        uuid
    }

    /// Move a running operation's source to the finished list
    pub async fn finish(&self, uuid: &Guid) -> Result<(), ObserveError> {
        let mut observed = self.observed.write().await;
        let pos = observed
            .running
            .iter()
            .position(|op| &op.uuid == uuid)
            .ok_or_else(|| ObserveError::NotRunning(uuid.clone()))?;
        let operation = observed.running.remove(pos);
        tracing::info!(
            "Observe {} finished after {}ms",
            uuid,
            (Utc::now() - operation.started).num_milliseconds()
        );
        observed.done.push(operation.source);
        drop(observed);

        let _ = self.events.send(ObserveEvent::Finished(uuid.clone()));
        Ok(())
    }

    /// Drop a running operation without keeping its source
    pub async fn abort(&self, uuid: &Guid) -> Result<DataSource, ObserveError> {
        let mut observed = self.observed.write().await;
        let pos = observed
            .running
            .iter()
            .position(|op| &op.uuid == uuid)
            .ok_or_else(|| ObserveError::NotRunning(uuid.clone()))?;
        let operation = observed.running.remove(pos);
        drop(observed);

        tracing::warn!("Observe {} aborted", uuid);
        let _ = self.events.send(ObserveEvent::Aborted(uuid.clone()));
        Ok(operation.source)
    }

    /// Abort everything still running; returns how many were aborted
    pub async fn abort_all(&self) -> usize {
        let running: Vec<Guid> = self
            .observed
            .read()
            .await
            .running
            .iter()
            .map(|op| op.uuid.clone())
            .collect();
        let mut aborted = 0;
        for uuid in running {
            if self.abort(&uuid).await.is_ok() {
                aborted += 1;
            }
        }
        aborted
    }

    pub async fn running(&self) -> Vec<ObserveOperation> {
        self.observed.read().await.running.clone()
    }

    pub async fn done(&self) -> Vec<DataSource> {
        self.observed.read().await.done.clone()
    }

    /// Running sources, then finished ones, with grouped sources expanded
    pub async fn list(&self) -> (Vec<SourceHolder>, Vec<SourceHolder>) {
        let observed = self.observed.read().await;
        let running = observed
            .running
            .iter()
            .flat_map(|op| {
                op.source.flatten().into_iter().map(move |s| SourceHolder {
                    source: s.clone(),
                    operation: Some(op.uuid.clone()),
                })
            })
            .collect();
        let done = observed
            .done
            .iter()
            .flat_map(|source| {
                source.flatten().into_iter().map(|s| SourceHolder {
                    source: s.clone(),
                    operation: None,
                })
            })
            .collect();
        (running, done)
    }

    /// A lone running file source that is not plain text cannot take a stream
    pub async fn is_attaching_disabled(&self) -> bool {
        let (running, _) = self.list().await;
        match running.as_slice() {
            [holder] => holder.source.as_file().is_some() && !holder.source.is_text(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn udp(port: u16) -> DataSource {
        DataSource::stream(
            Transport::Udp {
                bind_addr: format!("0.0.0.0:{port}"),
                multicast: vec![],
            },
            Parser::Dlt,
        )
    }

    #[tokio::test]
    async fn test_multiple_sources_run_concurrently() {
        let observed = ObservedSources::new(16);
        let first = observed.start(udp(3490)).await;
        let second = observed.start(udp(3491)).await;
        assert_eq!(observed.running().await.len(), 2);

        observed.finish(&first).await.unwrap();
        let running = observed.running().await;
        assert_eq!(running.len(), 1);
        assert_eq!(running[0].uuid, second);
        assert_eq!(observed.done().await.len(), 1);
    }

    #[tokio::test]
    async fn test_abort_does_not_keep_source() {
        let observed = ObservedSources::new(16);
        let uuid = observed.start(udp(3490)).await;
        observed.abort(&uuid).await.unwrap();
        assert!(observed.running().await.is_empty());
        assert!(observed.done().await.is_empty());

        assert!(matches!(
            observed.finish(&uuid).await,
            Err(ObserveError::NotRunning(_))
        ));
    }

    #[tokio::test]
    async fn test_list_expands_concat() {
        let observed = ObservedSources::new(16);
        let concat = DataSource::concat(
            vec![
                DataSource::file("a.dlt", Parser::Dlt),
                DataSource::file("b.dlt", Parser::Dlt),
            ],
            Parser::Dlt,
        );
        let uuid = observed.start(concat).await;

        let (running, done) = observed.list().await;
        assert_eq!(running.len(), 2);
        assert!(running.iter().all(|h| h.operation.as_ref() == Some(&uuid)));
        assert!(done.is_empty());
    }

    #[tokio::test]
    async fn test_attaching_disabled_for_single_binary_file() {
        let observed = ObservedSources::new(16);
        let dlt = observed.start(DataSource::file("a.dlt", Parser::Dlt)).await;
        assert!(observed.is_attaching_disabled().await);

        observed.finish(&dlt).await.unwrap();
        observed
            .start(DataSource::file("a.log", Parser::Text))
            .await;
        assert!(!observed.is_attaching_disabled().await);
    }

    #[tokio::test]
    async fn test_events_emitted() {
        let observed = ObservedSources::new(16);
        let mut rx = observed.subscribe();
        let uuid = observed.start(udp(1)).await;
        observed.finish(&uuid).await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), ObserveEvent::Started(uuid.clone()));
        assert_eq!(rx.recv().await.unwrap(), ObserveEvent::Finished(uuid));
    }

    #[tokio::test]
    async fn test_abort_all() {
        let observed = ObservedSources::new(16);
        observed.start(udp(1)).await;
        observed.start(udp(2)).await;
        assert_eq!(observed.abort_all().await, 2);
        assert!(observed.running().await.is_empty());
    }
}

use regex::Regex;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::search::request::{Activatable, FilterRequest, Request, RequestError};
use crate::types::Guid;

/// Hit count of one filter over a search run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterHits {
    pub uuid: Guid,
    pub filter: String,
    pub hits: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterStats {
    pub stats: Vec<FilterHits>,
}

impl FilterStats {
    pub fn new(stats: Vec<FilterHits>) -> Self {
        Self { stats }
    }

    pub fn hits(&self, uuid: &Guid) -> Option<usize> {
        self.stats.iter().find(|s| &s.uuid == uuid).map(|s| s.hits)
    }
}

/// A matching line and the positions of the filters that matched it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterMatch {
    pub line: usize,
    pub filters: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchResults {
    pub processed: usize,
    pub matches: Vec<FilterMatch>,
    pub stats: FilterStats,
}

impl SearchResults {
    pub fn found(&self) -> usize {
        self.matches.len()
    }
}

/// Compiled set of active filters ready to run over lines
#[derive(Debug, Default)]
pub struct SearchHolder {
    filters: Vec<(FilterRequest, Regex)>,
}

impl SearchHolder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile the active filters; inactive ones are skipped
    pub fn set_filters<'a>(
        &mut self,
        filters: impl Iterator<Item = &'a FilterRequest>,
    ) -> Result<(), RequestError> {
        let mut compiled = Vec::new();
        for filter in filters.filter(|f| f.is_active()) {
            compiled.push((filter.clone(), filter.as_regex()?));
        }
        tracing::debug!("Search holder compiled {} filters", compiled.len());
        self.filters = compiled;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Run the filters over `lines`.
    ///
    /// The token is checked before every line; a cancelled run yields `None`
    /// and its partial results are dropped.
    pub fn execute<'a>(
        &self,
        lines: impl Iterator<Item = &'a str>,
        cancel: &CancellationToken,
    ) -> Option<SearchResults> {
        let mut hits = vec![0usize; self.filters.len()];
        let mut matches = Vec::new();
        let mut processed = 0;

        if !self.filters.is_empty() {
            for (line, text) in lines.enumerate() {
                if cancel.is_cancelled() {
                    tracing::warn!("Search cancelled after {} lines", processed);
                    return None;
                }
                processed += 1;
                let matched: Vec<usize> = self
                    .filters
                    .iter()
                    .enumerate()
                    .filter(|(_, (_, regex))| regex.is_match(text))
                    .map(|(i, _)| i)
                    .collect();
                if matched.is_empty() {
                    continue;
                }
                for &i in &matched {
                    hits[i] += 1;
                }
                matches.push(FilterMatch {
                    line,
                    filters: matched,
                });
            }
        }

        let stats = self
            .filters
            .iter()
            .zip(hits)
            .map(|((request, _), hits)| FilterHits {
                uuid: request.uuid().clone(),
                filter: request.filter().filter.clone(),
                hits,
            })
            .collect();

        tracing::info!(
            "Search processed {} lines, found {}",
            processed,
            matches.len()
        );

        Some(SearchResults {
            processed,
            matches,
            stats: FilterStats::new(stats),
        })
    }
}

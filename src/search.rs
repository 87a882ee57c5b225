use std::sync::Arc;

use jiff::Timestamp;
use tracing::{debug, info};

use crate::{
    error::AppResult,
    models::MovieRecord,
    fetcher::RateLimitedFetcher,
    staleness::StalenessChecker,
    store::CatalogStore,
};

pub const SEARCH_LIMIT: u64 = 20;
/// Fewer local hits than this counts as thin coverage.
pub const MIN_LOCAL_RESULTS: usize = 5;

/// Local text search that falls back to the upstream search endpoint when
/// local coverage is thin and the catalog is due for a refresh anyway.
pub struct SearchBackfill {
    store: CatalogStore,
    staleness: StalenessChecker,
    fetcher: Arc<RateLimitedFetcher>,
}

impl SearchBackfill {
    pub fn new(
        store: CatalogStore,
        staleness: StalenessChecker,
        fetcher: Arc<RateLimitedFetcher>,
    ) -> Self {
        Self { store, staleness, fetcher }
    }

    pub async fn search(&self, query: &str) -> AppResult<Vec<MovieRecord>> {
        let local = self.store.search_text(query, SEARCH_LIMIT).await?;
        if local.len() >= MIN_LOCAL_RESULTS {
            return Ok(local);
        }
        if !self.staleness.is_stale().await? {
            debug!(query, hits = local.len(), "sparse search results, catalog fresh");
            return Ok(local);
        }

        let found = self.fetcher.search(query).await?;

        let now = Timestamp::now();
        let records: Vec<MovieRecord> =
            found.into_iter().map(|m| m.into_record(None, now)).collect();
        let written = self.store.upsert_many(&records).await?;
        info!(query, written, "backfilled search results from upstream");

        Ok(self.store.search_text(query, SEARCH_LIMIT).await?)
    }
}

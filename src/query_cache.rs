use std::{future::Future, num::NonZeroUsize};

use lru::LruCache;
use tokio::sync::Mutex;

use crate::models::{CatalogFilter, MovieSummary, SortMode};

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
struct QueryKey {
    filter: CatalogFilter,
    sort: SortMode,
    offset: u64,
    limit: u64,
}

/// Process-lifetime memo of list queries. Entries never expire; the least
/// recently used one is evicted once `capacity` is reached.
pub struct QueryCache {
    entries: Mutex<LruCache<QueryKey, Vec<MovieSummary>>>,
}

impl QueryCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self { entries: Mutex::new(LruCache::new(capacity)) }
    }

    pub async fn get_or_compute<F, Fut, E>(
        &self,
        filter: &CatalogFilter,
        sort: SortMode,
        offset: u64,
        limit: u64,
        compute: F,
    ) -> Result<Vec<MovieSummary>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<MovieSummary>, E>>,
    {
        let key = QueryKey { filter: filter.clone(), sort, offset, limit };

        if let Some(hit) = self.entries.lock().await.get(&key) {
            return Ok(hit.clone());
        }

        // Not held while computing; two identical misses may both hit the store.
        let movies = compute().await?;
        self.entries.lock().await.put(key, movies.clone());
        Ok(movies)
    }
}

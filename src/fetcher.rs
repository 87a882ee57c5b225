use std::{future::Future, sync::Arc, time::Duration};

use tokio::{sync::Mutex, time::Instant};

use crate::{
    error::UpstreamError,
    tmdb::{MovieSource, UpstreamMovie},
};

/// Cool-down applied after each upstream call before the next one may start.
#[derive(Clone, Copy, Debug)]
pub struct FetchPolicy {
    pub success_delay: Duration,
    pub failure_delay: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            success_delay: Duration::from_millis(500),
            failure_delay: Duration::from_millis(2000),
        }
    }
}

/// Serializes upstream calls, category pages and searches alike, and enforces
/// the cool-down between them.
pub struct RateLimitedFetcher {
    source: Arc<dyn MovieSource>,
    policy: FetchPolicy,
    next_call_at: Mutex<Option<Instant>>,
}

impl RateLimitedFetcher {
    pub fn new(source: Arc<dyn MovieSource>, policy: FetchPolicy) -> Self {
        Self { source, policy, next_call_at: Mutex::new(None) }
    }

    pub async fn fetch_page(
        &self,
        category: &str,
        page: u32,
    ) -> Result<Vec<UpstreamMovie>, UpstreamError> {
        self.gated(|| self.source.movie_list(category, page)).await
    }

    pub async fn search(&self, query: &str) -> Result<Vec<UpstreamMovie>, UpstreamError> {
        self.gated(|| self.source.search_movies(query)).await
    }

    async fn gated<F, Fut>(&self, call: F) -> Result<Vec<UpstreamMovie>, UpstreamError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<UpstreamMovie>, UpstreamError>>,
    {
        // Held across the call so concurrent callers queue behind the cool-down.
        let mut next_call_at = self.next_call_at.lock().await;
        if let Some(at) = *next_call_at {
            tokio::time::sleep_until(at).await;
        }

        let result = call().await;

        let cooldown =
            if result.is_ok() { self.policy.success_delay } else { self.policy.failure_delay };
        *next_call_at = Some(Instant::now() + cooldown);

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockSource, page_of};

    #[tokio::test(start_paused = true)]
    async fn waits_short_after_success_and_long_after_failure() {
        let source = Arc::new(MockSource::new());
        source.set_page("popular", 1, page_of(1, 20)).await;
        source.fail_page("popular", 2).await;
        let fetcher = RateLimitedFetcher::new(source.clone(), FetchPolicy::default());

        let start = Instant::now();
        assert_eq!(fetcher.fetch_page("popular", 1).await.unwrap().len(), 20);
        assert_eq!(start.elapsed(), Duration::ZERO);

        assert!(fetcher.fetch_page("popular", 2).await.is_err());
        assert_eq!(start.elapsed(), Duration::from_millis(500));

        fetcher.fetch_page("popular", 3).await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(2500));

        assert_eq!(source.list_calls().await.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn elapsed_cooldown_is_not_waited_twice() {
        let source = Arc::new(MockSource::new());
        let fetcher = RateLimitedFetcher::new(source, FetchPolicy::default());

        fetcher.fetch_page("upcoming", 1).await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        let before = Instant::now();
        fetcher.fetch_page("upcoming", 2).await.unwrap();
        assert_eq!(before.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn search_shares_the_page_cooldown() {
        let source = Arc::new(MockSource::new());
        source.fail_page("popular", 1).await;
        let fetcher = RateLimitedFetcher::new(source.clone(), FetchPolicy::default());

        let start = Instant::now();
        assert!(fetcher.fetch_page("popular", 1).await.is_err());
        fetcher.search("heat").await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(2000));

        source.fail_search().await;
        assert!(fetcher.search("heat").await.is_err());
        fetcher.fetch_page("popular", 2).await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(4500));
        assert_eq!(source.search_calls().await.len(), 2);
    }
}

use std::{net::SocketAddr, time::Duration};

use anyhow::Context;

use crate::{
    fetcher::FetchPolicy,
    sync::{SyncTask, default_tasks},
};

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub tmdb_api_key: String,
    pub tmdb_base_url: String,
    pub tmdb_language: String,
    pub tmdb_region: String,
    pub tmdb_rps: u32,
    pub sync_interval: Duration,
    pub staleness_window: Duration,
    pub fetch_policy: FetchPolicy,
    pub sync_max_failures: u32,
    pub sync_tasks: Vec<SyncTask>,
    pub query_cache_capacity: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 =
            std::env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().context("PORT")?;

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://cinecache.db?mode=rwc".to_string());

        let tmdb_api_key = std::env::var("TMDB_API_KEY").unwrap_or_default();
        let tmdb_base_url = std::env::var("TMDB_BASE_URL")
            .unwrap_or_else(|_| "https://api.themoviedb.org/3".to_string());
        let tmdb_language = std::env::var("TMDB_LANGUAGE").unwrap_or_else(|_| "tr-TR".to_string());
        let tmdb_region = std::env::var("TMDB_REGION").unwrap_or_else(|_| "TR".to_string());
        let tmdb_rps: u32 = env_or("TMDB_RPS", 4);

        let sync_interval_hours: u64 = env_or("SYNC_INTERVAL_HOURS", 24);
        let staleness_hours: u64 = env_or("STALENESS_HOURS", 24);

        let fetch_policy = FetchPolicy {
            success_delay: Duration::from_millis(env_or("SYNC_SUCCESS_DELAY_MS", 500)),
            failure_delay: Duration::from_millis(env_or("SYNC_FAILURE_DELAY_MS", 2000)),
        };

        let sync_tasks = match std::env::var("SYNC_TASKS") {
            Ok(raw) => parse_sync_tasks(&raw).context("SYNC_TASKS")?,
            Err(_) => default_tasks(),
        };

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            database_url,
            tmdb_api_key,
            tmdb_base_url,
            tmdb_language,
            tmdb_region,
            tmdb_rps,
            sync_interval: hours("SYNC_INTERVAL_HOURS", sync_interval_hours.max(1))?,
            staleness_window: hours("STALENESS_HOURS", staleness_hours)?,
            fetch_policy,
            sync_max_failures: env_or("SYNC_MAX_FAILURES", 10),
            sync_tasks,
            query_cache_capacity: env_or("QUERY_CACHE_CAPACITY", 1024),
        })
    }
}

fn hours(key: &str, value: u64) -> anyhow::Result<Duration> {
    value
        .checked_mul(3600)
        .map(Duration::from_secs)
        .with_context(|| format!("{key}: {value} hours is out of range"))
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|s| s.parse().ok()).unwrap_or(default)
}

/// Parses `category:pages` pairs separated by commas, keeping their order.
pub fn parse_sync_tasks(raw: &str) -> anyhow::Result<Vec<SyncTask>> {
    let mut tasks = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (category, pages) = entry
            .split_once(':')
            .with_context(|| format!("expected category:pages, got {entry:?}"))?;
        let category = category.trim();
        if category.is_empty() {
            anyhow::bail!("empty category in {entry:?}");
        }
        let pages: u32 = pages.trim().parse().with_context(|| format!("page count in {entry:?}"))?;
        tasks.push(SyncTask::new(category, pages));
    }
    if tasks.is_empty() {
        anyhow::bail!("no sync tasks configured");
    }
    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ordered_task_list() {
        let tasks = parse_sync_tasks("upcoming:50, popular:100 ,top_rated:5").unwrap();
        assert_eq!(
            tasks,
            vec![
                SyncTask::new("upcoming", 50),
                SyncTask::new("popular", 100),
                SyncTask::new("top_rated", 5),
            ]
        );
    }

    #[test]
    fn hour_values_are_range_checked() {
        assert_eq!(hours("STALENESS_HOURS", 24).unwrap(), Duration::from_secs(86_400));
        let err = hours("STALENESS_HOURS", u64::MAX).unwrap_err();
        assert!(err.to_string().contains("STALENESS_HOURS"));
    }

    #[test]
    fn rejects_malformed_entries() {
        assert!(parse_sync_tasks("popular").is_err());
        assert!(parse_sync_tasks("popular:many").is_err());
        assert!(parse_sync_tasks(":10").is_err());
        assert!(parse_sync_tasks(" , ").is_err());
    }
}

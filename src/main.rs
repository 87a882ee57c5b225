mod config;
mod db;
mod dedup;
mod entities;
mod error;
mod fetcher;
mod models;
mod query_cache;
mod routes;
mod scheduler;
mod search;
mod staleness;
mod store;
mod sync;
mod tmdb;

#[cfg(test)]
mod testing;

use std::{sync::Arc, time::Duration};

use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    config::Config,
    fetcher::RateLimitedFetcher,
    query_cache::QueryCache,
    scheduler::Scheduler,
    search::SearchBackfill,
    staleness::StalenessChecker,
    store::CatalogStore,
    sync::{CatalogRefresh, CatalogSyncJob},
    tmdb::TmdbClient,
};

#[derive(Clone)]
pub struct AppState {
    pub store: CatalogStore,
    pub query_cache: Arc<QueryCache>,
    pub search: Arc<SearchBackfill>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,cinecache=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Config::from_env()?;

    let http = reqwest::Client::builder()
        .user_agent("cinecache/0.1")
        .timeout(Duration::from_secs(30))
        .build()?;

    let db = db::connect_and_migrate(&config.database_url).await?;
    let store = CatalogStore::new(db);

    let tmdb = Arc::new(TmdbClient::new(
        http,
        config.tmdb_api_key.clone(),
        config.tmdb_base_url.clone(),
        config.tmdb_language.clone(),
        config.tmdb_region.clone(),
        config.tmdb_rps,
    ));

    let staleness = StalenessChecker::new(store.clone(), config.staleness_window);
    let sync_fetcher = Arc::new(RateLimitedFetcher::new(tmdb.clone(), config.fetch_policy));
    let sync_job = CatalogSyncJob::new(
        sync_fetcher,
        store.clone(),
        config.sync_tasks.clone(),
        config.sync_max_failures,
    );
    Scheduler::new(config.sync_interval)
        .spawn(Arc::new(CatalogRefresh::new(staleness.clone(), sync_job)));

    // Separate gate so searches never queue behind a running sync.
    let search_fetcher = Arc::new(RateLimitedFetcher::new(tmdb, config.fetch_policy));
    let state = Arc::new(AppState {
        store: store.clone(),
        query_cache: Arc::new(QueryCache::new(config.query_cache_capacity)),
        search: Arc::new(SearchBackfill::new(store, staleness, search_fetcher)),
    });

    let app = routes::router(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}

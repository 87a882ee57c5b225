//! Shared fixtures for unit tests: an in-memory catalog and a scripted upstream.

use std::collections::HashMap;

use async_trait::async_trait;
use jiff::Timestamp;
use sea_orm::DatabaseConnection;
use tokio::sync::Mutex;

use crate::{
    db,
    error::UpstreamError,
    models::MovieRecord,
    store::CatalogStore,
    tmdb::{MovieSource, UpstreamMovie},
};

pub async fn memory_db() -> DatabaseConnection {
    db::connect_and_migrate("sqlite::memory:").await.expect("in-memory catalog")
}

pub async fn memory_store() -> CatalogStore {
    CatalogStore::new(memory_db().await)
}

pub fn record(id: i64, title: &str, category: Option<&str>, last_updated: i64) -> MovieRecord {
    upstream(id, title).into_record(category, Timestamp::from_second(last_updated).unwrap())
}

pub fn upstream(id: i64, title: &str) -> UpstreamMovie {
    UpstreamMovie {
        id,
        title: title.to_string(),
        original_title: title.to_string(),
        original_language: "en".to_string(),
        overview: format!("Overview of {title}"),
        poster_path: Some(format!("/poster-{id}.jpg")),
        backdrop_path: None,
        release_date: Some("2001-01-01".to_string()),
        vote_average: Some(7.0),
        vote_count: Some(100),
        popularity: Some(id as f64),
        genre_ids: vec![18],
        adult: false,
    }
}

/// Page of `count` movies with ids starting at `first_id`.
pub fn page_of(first_id: i64, count: i64) -> Vec<UpstreamMovie> {
    (first_id..first_id + count).map(|id| upstream(id, &format!("Movie {id}"))).collect()
}

#[derive(Clone, Debug)]
enum Outcome {
    Page(Vec<UpstreamMovie>),
    Fail,
}

/// Scripted [`MovieSource`]. Unscripted list pages come back empty.
#[derive(Debug, Default)]
pub struct MockSource {
    pages: Mutex<HashMap<(String, u32), Outcome>>,
    search_results: Mutex<Vec<UpstreamMovie>>,
    search_fails: Mutex<bool>,
    list_calls: Mutex<Vec<(String, u32)>>,
    search_calls: Mutex<Vec<String>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_page(&self, category: &str, page: u32, movies: Vec<UpstreamMovie>) {
        self.pages.lock().await.insert((category.to_string(), page), Outcome::Page(movies));
    }

    pub async fn fail_page(&self, category: &str, page: u32) {
        self.pages.lock().await.insert((category.to_string(), page), Outcome::Fail);
    }

    pub async fn set_search_results(&self, movies: Vec<UpstreamMovie>) {
        *self.search_results.lock().await = movies;
    }

    /// Every later search answers with an upstream 503.
    pub async fn fail_search(&self) {
        *self.search_fails.lock().await = true;
    }

    pub async fn list_calls(&self) -> Vec<(String, u32)> {
        self.list_calls.lock().await.clone()
    }

    pub async fn search_calls(&self) -> Vec<String> {
        self.search_calls.lock().await.clone()
    }
}

#[async_trait]
impl MovieSource for MockSource {
    async fn movie_list(
        &self,
        category: &str,
        page: u32,
    ) -> Result<Vec<UpstreamMovie>, UpstreamError> {
        self.list_calls.lock().await.push((category.to_string(), page));
        match self.pages.lock().await.get(&(category.to_string(), page)).cloned() {
            Some(Outcome::Page(movies)) => Ok(movies),
            Some(Outcome::Fail) => Err(UpstreamError::Status {
                status: 503,
                endpoint: format!("movie/{category}"),
            }),
            None => Ok(Vec::new()),
        }
    }

    async fn search_movies(&self, query: &str) -> Result<Vec<UpstreamMovie>, UpstreamError> {
        self.search_calls.lock().await.push(query.to_string());
        if *self.search_fails.lock().await {
            return Err(UpstreamError::Status {
                status: 503,
                endpoint: "search/movie".to_string(),
            });
        }
        Ok(self.search_results.lock().await.clone())
    }
}

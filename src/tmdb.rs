use std::{num::NonZeroU32, sync::Arc};

use async_trait::async_trait;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use jiff::{Timestamp, civil::Date};
use serde::Deserialize;

use crate::{error::UpstreamError, models::MovieRecord};

/// Read side of the upstream movie provider.
#[async_trait]
pub trait MovieSource: Send + Sync {
    /// One page of a category list such as `popular` or `top_rated`.
    async fn movie_list(
        &self,
        category: &str,
        page: u32,
    ) -> Result<Vec<UpstreamMovie>, UpstreamError>;

    async fn search_movies(&self, query: &str) -> Result<Vec<UpstreamMovie>, UpstreamError>;
}

pub struct TmdbClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    language: String,
    region: String,
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl TmdbClient {
    pub fn new(
        client: reqwest::Client,
        api_key: String,
        base_url: String,
        language: String,
        region: String,
        rps: u32,
    ) -> Self {
        if api_key.trim().is_empty() {
            tracing::warn!("TMDB_API_KEY is not set, upstream requests will be rejected");
        }

        let limiter = Arc::new(RateLimiter::direct(Quota::per_second(
            NonZeroU32::new(rps.max(1)).unwrap_or(NonZeroU32::MIN),
        )));
        Self { client, api_key, base_url, language, region, limiter }
    }

    async fn get_results(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<UpstreamMovie>, UpstreamError> {
        self.limiter.until_ready().await;

        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        let resp = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                endpoint: path.to_string(),
            });
        }

        let body: ResultsPage = resp.json().await?;
        Ok(body.results)
    }
}

#[async_trait]
impl MovieSource for TmdbClient {
    async fn movie_list(
        &self,
        category: &str,
        page: u32,
    ) -> Result<Vec<UpstreamMovie>, UpstreamError> {
        let path = format!("movie/{category}");
        self.get_results(
            &path,
            &[
                ("page", page.to_string()),
                ("language", self.language.clone()),
                ("region", self.region.clone()),
            ],
        )
        .await
    }

    async fn search_movies(&self, query: &str) -> Result<Vec<UpstreamMovie>, UpstreamError> {
        self.get_results(
            "search/movie",
            &[("query", query.to_string()), ("language", self.language.clone())],
        )
        .await
    }
}

#[derive(Debug, Deserialize)]
struct ResultsPage {
    results: Vec<UpstreamMovie>,
}

/// Movie object as it appears in upstream `results` arrays.
#[derive(Clone, Debug, Deserialize)]
pub struct UpstreamMovie {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub original_title: String,
    #[serde(default)]
    pub original_language: String,
    #[serde(default)]
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<String>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<i64>,
    pub popularity: Option<f64>,
    #[serde(default)]
    pub genre_ids: Vec<i32>,
    #[serde(default)]
    pub adult: bool,
}

impl UpstreamMovie {
    pub fn into_record(self, category: Option<&str>, now: Timestamp) -> MovieRecord {
        let release_date = self
            .release_date
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .and_then(|s| s.parse::<Date>().ok());

        MovieRecord {
            id: self.id,
            title: self.title,
            original_title: self.original_title,
            original_language: self.original_language,
            overview: self.overview,
            poster_path: self.poster_path,
            backdrop_path: self.backdrop_path,
            release_date,
            vote_average: self.vote_average.unwrap_or(0.0),
            vote_count: self.vote_count.unwrap_or(0),
            popularity: self.popularity.unwrap_or(0.0),
            genre_ids: self.genre_ids,
            adult: self.adult,
            category: category.map(str::to_string),
            last_updated: now,
        }
    }
}

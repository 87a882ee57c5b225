use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    AppState,
    error::{AppError, AppResult},
    models::{
        CatalogFilter, MovieListResponse, MovieRecord, MoviesResponse, SearchRequest, SortMode,
    },
};

pub const PAGE_SIZE: u64 = 20;
const LOCAL_SEARCH_LIMIT: u64 = 10;
const MAX_BATCH_IDS: usize = 100;
const LIST_CACHE_CONTROL: &str = "public, s-maxage=60, stale-while-revalidate=300";
/// Largest page whose offset still fits SQLite's signed 64-bit OFFSET.
const MAX_PAGE: u64 = i64::MAX as u64 / PAGE_SIZE;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/movies", get(list_movies))
        .route("/movies/search", get(search_local).post(search_backfill))
        .route("/movies/batch", get(movies_by_ids))
        .route("/movies/{id}", get(movie_detail))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    page: Option<String>,
    category: Option<String>,
    sort: Option<String>,
}

pub async fn list_movies(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ListQuery>,
) -> AppResult<Response> {
    let page = parse_page(q.page.as_deref())?;
    let skip = (page - 1) * PAGE_SIZE;
    let filter = CatalogFilter::from_param(q.category.as_deref());
    let sort = SortMode::from_param(q.sort.as_deref().filter(|s| !s.is_empty()));

    let store = &state.store;
    let movies = state
        .query_cache
        .get_or_compute(&filter, sort, skip, PAGE_SIZE, || {
            store.find(&filter, sort, skip, PAGE_SIZE)
        })
        .await?;
    let total = store.count(&filter).await?;

    let has_more = total > skip.saturating_add(PAGE_SIZE);
    let body = MovieListResponse { movies, has_more, total };
    Ok(([(header::CACHE_CONTROL, LIST_CACHE_CONTROL)], Json(body)).into_response())
}

fn parse_page(raw: Option<&str>) -> AppResult<u64> {
    match raw.map(str::trim) {
        None | Some("") => Ok(1),
        Some(value) => match value.parse::<u64>() {
            Ok(page) if page > MAX_PAGE => {
                Err(AppError::Validation("page is out of range".to_string()))
            },
            Ok(page) if page >= 1 => Ok(page),
            _ => Err(AppError::Validation("page must be a positive integer".to_string())),
        },
    }
}

pub async fn movie_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<MovieRecord>> {
    let id: i64 =
        id.parse().map_err(|_| AppError::Validation("movie id must be an integer".to_string()))?;

    let movie = state.store.find_by_id(id).await?;
    movie.map(Json).ok_or_else(|| AppError::NotFound("movie not found".to_string()))
}

#[derive(Debug, Deserialize)]
pub struct LocalSearchQuery {
    q: Option<String>,
}

pub async fn search_local(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LocalSearchQuery>,
) -> AppResult<Json<MoviesResponse>> {
    let query = params.q.as_deref().map(str::trim).unwrap_or_default();
    if query.is_empty() {
        return Ok(Json(MoviesResponse { movies: Vec::new() }));
    }

    let movies = state.store.search_text(query, LOCAL_SEARCH_LIMIT).await?;
    Ok(Json(MoviesResponse { movies }))
}

pub async fn search_backfill(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchRequest>,
) -> AppResult<Json<MoviesResponse>> {
    let query = req.query.trim();
    if query.is_empty() {
        return Err(AppError::Validation("query is required".to_string()));
    }

    let movies = state.search.search(query).await?;
    Ok(Json(MoviesResponse { movies }))
}

#[derive(Debug, Deserialize)]
pub struct BatchQuery {
    ids: Option<String>,
}

/// Hydrates a list of ids held elsewhere, e.g. a user's watchlist.
pub async fn movies_by_ids(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BatchQuery>,
) -> AppResult<Json<MoviesResponse>> {
    let ids = params
        .ids
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<i64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| AppError::Validation("ids must be comma-separated integers".to_string()))?;

    if ids.len() > MAX_BATCH_IDS {
        return Err(AppError::Validation(format!("at most {MAX_BATCH_IDS} ids per request")));
    }

    let movies = state.store.find_by_ids(&ids).await?;
    Ok(Json(MoviesResponse { movies }))
}

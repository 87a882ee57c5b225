use jiff::{Timestamp, civil::Date};
use serde::{Deserialize, Serialize};

/// Full catalog entry, returned by the detail, search and batch endpoints.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MovieRecord {
    pub id: i64,
    pub title: String,
    pub original_title: String,
    pub original_language: String,
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<Date>,
    pub vote_average: f64,
    pub vote_count: i64,
    pub popularity: f64,
    pub genre_ids: Vec<i32>,
    pub adult: bool,
    /// Upstream list this record was last fetched under. Search backfill leaves it untouched.
    pub category: Option<String>,
    pub last_updated: Timestamp,
}

/// List-view projection of a [`MovieRecord`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MovieSummary {
    pub id: i64,
    pub title: String,
    pub poster_path: Option<String>,
    pub vote_average: f64,
    pub release_date: Option<Date>,
}

#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub enum CatalogFilter {
    #[default]
    All,
    Category(String),
    Genre(i32),
}

impl CatalogFilter {
    /// Numeric values select a genre code, anything else a category name.
    pub fn from_param(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => CatalogFilter::All,
            Some(value) => match value.parse::<i32>() {
                Ok(genre) => CatalogFilter::Genre(genre),
                Err(_) => CatalogFilter::Category(value.to_string()),
            },
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SortMode {
    ReleaseDate,
    Rating,
    Popularity,
    Title,
}

impl SortMode {
    /// An omitted `sort` means newest first, while an unrecognized one falls
    /// through to title order. The two cases are intentionally distinct.
    pub fn from_param(raw: Option<&str>) -> Self {
        match raw {
            None => SortMode::ReleaseDate,
            Some("date") => SortMode::ReleaseDate,
            Some("rating") => SortMode::Rating,
            Some("popularity") => SortMode::Popularity,
            Some(_) => SortMode::Title,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MovieListResponse {
    pub movies: Vec<MovieSummary>,
    #[serde(rename = "hasMore")]
    pub has_more: bool,
    pub total: u64,
}

#[derive(Debug, Serialize)]
pub struct MoviesResponse {
    pub movies: Vec<MovieRecord>,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omitted_and_unrecognized_sort_differ() {
        assert_eq!(SortMode::from_param(None), SortMode::ReleaseDate);
        assert_eq!(SortMode::from_param(Some("date")), SortMode::ReleaseDate);
        assert_eq!(SortMode::from_param(Some("rating")), SortMode::Rating);
        assert_eq!(SortMode::from_param(Some("popularity")), SortMode::Popularity);
        assert_eq!(SortMode::from_param(Some("title")), SortMode::Title);
        assert_eq!(SortMode::from_param(Some("bogus")), SortMode::Title);
    }

    #[test]
    fn filter_param_splits_genres_from_categories() {
        assert_eq!(CatalogFilter::from_param(None), CatalogFilter::All);
        assert_eq!(CatalogFilter::from_param(Some("  ")), CatalogFilter::All);
        assert_eq!(CatalogFilter::from_param(Some("28")), CatalogFilter::Genre(28));
        assert_eq!(
            CatalogFilter::from_param(Some("popular")),
            CatalogFilter::Category("popular".to_string())
        );
    }

    #[test]
    fn list_response_uses_camel_case_envelope() {
        let body = MovieListResponse { movies: vec![], has_more: true, total: 41 };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["hasMore"], true);
        assert_eq!(json["total"], 41);
    }
}

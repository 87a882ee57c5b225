use jiff::{Timestamp, civil::Date};
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, FromQueryResult,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
    sea_query::{Expr, LikeExpr, OnConflict},
};

use crate::{
    entities::movie::{self, GenreIds},
    models::{CatalogFilter, MovieRecord, MovieSummary, SortMode},
};

/// Persistent movie catalog keyed by the upstream identifier.
#[derive(Clone)]
pub struct CatalogStore {
    db: DatabaseConnection,
}

impl CatalogStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Insert or overwrite by `id`. A record without a category keeps whatever
    /// category the stored row already has.
    pub async fn upsert_many(&self, records: &[MovieRecord]) -> Result<u64, DbErr> {
        if records.is_empty() {
            return Ok(0);
        }

        let models = records.iter().map(|r| movie::ActiveModel {
            id: Set(r.id),
            title: Set(r.title.clone()),
            original_title: Set(r.original_title.clone()),
            original_language: Set(r.original_language.clone()),
            overview: Set(r.overview.clone()),
            poster_path: Set(r.poster_path.clone()),
            backdrop_path: Set(r.backdrop_path.clone()),
            release_date: Set(r.release_date.map(|d| d.to_string())),
            vote_average: Set(r.vote_average),
            vote_count: Set(r.vote_count),
            popularity: Set(r.popularity),
            genre_ids: Set(GenreIds(r.genre_ids.clone())),
            adult: Set(r.adult),
            category: Set(r.category.clone()),
            last_updated: Set(r.last_updated.as_second()),
            search_key: Set(search_key(&format!("{}\n{}", r.title, r.overview))),
        });

        movie::Entity::insert_many(models)
            .on_conflict(
                OnConflict::column(movie::Column::Id)
                    .update_columns([
                        movie::Column::Title,
                        movie::Column::OriginalTitle,
                        movie::Column::OriginalLanguage,
                        movie::Column::Overview,
                        movie::Column::PosterPath,
                        movie::Column::BackdropPath,
                        movie::Column::ReleaseDate,
                        movie::Column::VoteAverage,
                        movie::Column::VoteCount,
                        movie::Column::Popularity,
                        movie::Column::GenreIds,
                        movie::Column::Adult,
                        movie::Column::LastUpdated,
                        movie::Column::SearchKey,
                    ])
                    .value(
                        movie::Column::Category,
                        Expr::cust("COALESCE(excluded.category, movie.category)"),
                    )
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(records.len() as u64)
    }

    pub async fn find(
        &self,
        filter: &CatalogFilter,
        sort: SortMode,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<MovieSummary>, DbErr> {
        let query = apply_filter(movie::Entity::find(), filter);
        let query = match sort {
            SortMode::ReleaseDate => query.order_by_desc(movie::Column::ReleaseDate),
            SortMode::Rating => query.order_by_desc(movie::Column::VoteAverage),
            SortMode::Popularity => query.order_by_desc(movie::Column::Popularity),
            SortMode::Title => query.order_by_asc(movie::Column::Title),
        };

        let rows = query
            .order_by_asc(movie::Column::Id)
            .select_only()
            .columns([
                movie::Column::Id,
                movie::Column::Title,
                movie::Column::PosterPath,
                movie::Column::VoteAverage,
                movie::Column::ReleaseDate,
            ])
            .offset(offset)
            .limit(limit)
            .into_model::<SummaryRow>()
            .all(&self.db)
            .await?;

        Ok(rows.into_iter().map(MovieSummary::from).collect())
    }

    pub async fn count(&self, filter: &CatalogFilter) -> Result<u64, DbErr> {
        apply_filter(movie::Entity::find(), filter).count(&self.db).await
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<MovieRecord>, DbErr> {
        let movie = movie::Entity::find_by_id(id).one(&self.db).await?;
        Ok(movie.map(MovieRecord::from))
    }

    pub async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<MovieRecord>, DbErr> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let movies = movie::Entity::find()
            .filter(movie::Column::Id.is_in(ids.iter().copied()))
            .order_by_asc(movie::Column::Id)
            .all(&self.db)
            .await?;
        Ok(movies.into_iter().map(MovieRecord::from).collect())
    }

    /// Case-insensitive substring match on title or overview, most popular first.
    pub async fn search_text(&self, query: &str, limit: u64) -> Result<Vec<MovieRecord>, DbErr> {
        let pattern = format!("%{}%", escape_like(&search_key(query)));

        let movies = movie::Entity::find()
            .filter(movie::Column::SearchKey.like(LikeExpr::new(pattern).escape('\\')))
            .order_by_desc(movie::Column::Popularity)
            .order_by_asc(movie::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await?;
        Ok(movies.into_iter().map(MovieRecord::from).collect())
    }

    /// `last_updated` of the most recently written record.
    pub async fn latest_update(&self) -> Result<Option<Timestamp>, DbErr> {
        let newest = movie::Entity::find()
            .order_by_desc(movie::Column::LastUpdated)
            .one(&self.db)
            .await?;
        Ok(newest.map(|m| from_second(m.last_updated)))
    }
}

fn apply_filter(query: Select<movie::Entity>, filter: &CatalogFilter) -> Select<movie::Entity> {
    match filter {
        CatalogFilter::All => query,
        CatalogFilter::Category(category) => {
            query.filter(movie::Column::Category.eq(category.as_str()))
        },
        CatalogFilter::Genre(genre) => query.filter(Expr::cust_with_values(
            "EXISTS (SELECT 1 FROM json_each(movie.genre_ids) WHERE json_each.value = ?)",
            [*genre],
        )),
    }
}

/// Unicode lowercase with the dotted/dotless `i` pair collapsed, so Turkish
/// `İ`, `I`, `ı` and `i` all compare equal.
fn search_key(raw: &str) -> String {
    raw.chars()
        .flat_map(char::to_lowercase)
        .filter(|&c| c != '\u{307}')
        .map(|c| if c == 'ı' { 'i' } else { c })
        .collect()
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn from_second(secs: i64) -> Timestamp {
    Timestamp::from_second(secs).unwrap_or(Timestamp::UNIX_EPOCH)
}

fn parse_date(raw: Option<String>) -> Option<Date> {
    raw.and_then(|s| s.parse().ok())
}

#[derive(Debug, FromQueryResult)]
struct SummaryRow {
    id: i64,
    title: String,
    poster_path: Option<String>,
    vote_average: f64,
    release_date: Option<String>,
}

impl From<SummaryRow> for MovieSummary {
    fn from(row: SummaryRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            poster_path: row.poster_path,
            vote_average: row.vote_average,
            release_date: parse_date(row.release_date),
        }
    }
}

impl From<movie::Model> for MovieRecord {
    fn from(m: movie::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            original_title: m.original_title,
            original_language: m.original_language,
            overview: m.overview,
            poster_path: m.poster_path,
            backdrop_path: m.backdrop_path,
            release_date: parse_date(m.release_date),
            vote_average: m.vote_average,
            vote_count: m.vote_count,
            popularity: m.popularity,
            genre_ids: m.genre_ids.0,
            adult: m.adult,
            category: m.category,
            last_updated: from_second(m.last_updated),
        }
    }
}

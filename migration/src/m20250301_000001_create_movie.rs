use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Movie::Table)
                    .if_not_exists()
                    .col(big_integer(Movie::Id).primary_key())
                    .col(string(Movie::Title))
                    .col(string(Movie::OriginalTitle).default(""))
                    .col(string(Movie::OriginalLanguage).default(""))
                    .col(text(Movie::Overview).default(""))
                    .col(string_null(Movie::PosterPath))
                    .col(string_null(Movie::BackdropPath))
                    .col(string_null(Movie::ReleaseDate))
                    .col(double(Movie::VoteAverage).default(0.0))
                    .col(big_integer(Movie::VoteCount).default(0))
                    .col(double(Movie::Popularity).default(0.0))
                    .col(json(Movie::GenreIds))
                    .col(boolean(Movie::Adult).default(false))
                    .col(string_null(Movie::Category))
                    .col(big_integer(Movie::LastUpdated))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movie_last_updated")
                    .table(Movie::Table)
                    .col(Movie::LastUpdated)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movie_category")
                    .table(Movie::Table)
                    .col(Movie::Category)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Movie::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Movie {
    Table,
    Id,
    Title,
    OriginalTitle,
    OriginalLanguage,
    Overview,
    PosterPath,
    BackdropPath,
    ReleaseDate,
    VoteAverage,
    VoteCount,
    Popularity,
    GenreIds,
    Adult,
    Category,
    LastUpdated,
}

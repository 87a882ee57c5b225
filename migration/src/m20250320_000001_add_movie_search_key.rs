use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Movie::Table)
                    .add_column(text(Movie::SearchKey).default(""))
                    .to_owned(),
            )
            .await?;

        // SQLite's lower() only folds ASCII; rows are re-keyed on their next write.
        manager
            .get_connection()
            .execute_unprepared("UPDATE movie SET search_key = lower(title || char(10) || overview)")
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(Table::alter().table(Movie::Table).drop_column(Movie::SearchKey).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Movie {
    Table,
    SearchKey,
}

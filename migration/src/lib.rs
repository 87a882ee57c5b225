pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_movie;
mod m20250312_000001_add_movie_search_indexes;
mod m20250320_000001_add_movie_search_key;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_movie::Migration),
            Box::new(m20250312_000001_add_movie_search_indexes::Migration),
            Box::new(m20250320_000001_add_movie_search_key::Migration),
        ]
    }
}

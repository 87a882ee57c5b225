use std::time::Duration;

use jiff::Timestamp;
use sea_orm::DbErr;

use crate::store::CatalogStore;

#[derive(Clone)]
pub struct StalenessChecker {
    store: CatalogStore,
    window_seconds: i64,
}

impl StalenessChecker {
    pub fn new(store: CatalogStore, window: Duration) -> Self {
        Self { store, window_seconds: i64::try_from(window.as_secs()).unwrap_or(i64::MAX) }
    }

    /// True when the catalog is empty or its newest record is at least one
    /// window old.
    pub async fn is_stale(&self) -> Result<bool, DbErr> {
        self.is_stale_at(Timestamp::now()).await
    }

    pub async fn is_stale_at(&self, now: Timestamp) -> Result<bool, DbErr> {
        let Some(newest) = self.store.latest_update().await? else {
            return Ok(true);
        };
        Ok(now.as_second().saturating_sub(newest.as_second()) >= self.window_seconds)
    }
}

use std::{collections::VecDeque, sync::Arc};

use anyhow::Context;
use async_trait::async_trait;
use jiff::Timestamp;
use tracing::{debug, error, info, warn};

use crate::{
    dedup::Deduplicator,
    error::SyncError,
    fetcher::RateLimitedFetcher,
    models::MovieRecord,
    scheduler::ScheduledJob,
    staleness::StalenessChecker,
    store::CatalogStore,
};

/// One upstream category list and how many of its pages to walk.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SyncTask {
    pub category: String,
    pub pages: u32,
}

impl SyncTask {
    pub fn new(category: impl Into<String>, pages: u32) -> Self {
        Self { category: category.into(), pages }
    }
}

pub fn default_tasks() -> Vec<SyncTask> {
    vec![
        SyncTask::new("upcoming", 50),
        SyncTask::new("now_playing", 50),
        SyncTask::new("popular", 100),
        SyncTask::new("top_rated", 100),
    ]
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SyncReport {
    pub written: u64,
    pub failures: u32,
    pub unique_ids: usize,
}

struct PageTask {
    category: String,
    page: u32,
}

/// State of a single run. Dropped when the run ends.
struct SyncRun {
    dedup: Deduplicator,
    written: u64,
    failures: u32,
    remaining: VecDeque<PageTask>,
    started_at: Timestamp,
}

impl SyncRun {
    fn new(tasks: &[SyncTask], started_at: Timestamp) -> Self {
        let remaining = tasks
            .iter()
            .flat_map(|t| (1..=t.pages).map(|page| PageTask { category: t.category.clone(), page }))
            .collect();
        Self { dedup: Deduplicator::new(), written: 0, failures: 0, remaining, started_at }
    }
}

pub struct CatalogSyncJob {
    fetcher: Arc<RateLimitedFetcher>,
    store: CatalogStore,
    tasks: Vec<SyncTask>,
    max_failures: u32,
}

impl CatalogSyncJob {
    pub fn new(
        fetcher: Arc<RateLimitedFetcher>,
        store: CatalogStore,
        tasks: Vec<SyncTask>,
        max_failures: u32,
    ) -> Self {
        Self { fetcher, store, tasks, max_failures }
    }

    /// Walks every task's pages in order. Failed pages are abandoned; once more
    /// than `max_failures` pages have failed the run stops, keeping whatever was
    /// already written.
    pub async fn run(&self) -> Result<SyncReport, SyncError> {
        let mut run = SyncRun::new(&self.tasks, Timestamp::now());
        info!(pages = run.remaining.len(), "starting catalog sync");

        while let Some(task) = run.remaining.pop_front() {
            match self.sync_page(&mut run, &task).await {
                Ok(written) => {
                    run.written += written;
                    if written > 0 {
                        debug!(category = %task.category, page = task.page, written, "stored page");
                    }
                },
                Err(err) => {
                    run.failures += 1;
                    warn!(
                        category = %task.category,
                        page = task.page,
                        failures = run.failures,
                        error = %err,
                        "page sync failed"
                    );
                    if run.failures > self.max_failures {
                        error!(
                            failures = run.failures,
                            written = run.written,
                            "too many failed pages, aborting sync"
                        );
                        return Err(SyncError::FailureCeiling {
                            failures: run.failures,
                            written: run.written,
                        });
                    }
                },
            }
        }

        let report = SyncReport {
            written: run.written,
            failures: run.failures,
            unique_ids: run.dedup.len(),
        };
        info!(
            written = report.written,
            failures = report.failures,
            unique_ids = report.unique_ids,
            "catalog sync finished"
        );
        Ok(report)
    }

    async fn sync_page(&self, run: &mut SyncRun, task: &PageTask) -> Result<u64, SyncError> {
        let movies = self.fetcher.fetch_page(&task.category, task.page).await?;

        let records: Vec<MovieRecord> = run
            .dedup
            .unseen(movies)
            .into_iter()
            .map(|m| m.into_record(Some(&task.category), run.started_at))
            .collect();
        if records.is_empty() {
            return Ok(0);
        }

        // Claimed before writing: a failed batch is not retried by later pages.
        for record in &records {
            run.dedup.mark_seen(record.id);
        }
        Ok(self.store.upsert_many(&records).await?)
    }
}

/// Scheduled entry point: sync only when the catalog has gone stale.
pub struct CatalogRefresh {
    staleness: StalenessChecker,
    job: CatalogSyncJob,
}

impl CatalogRefresh {
    pub fn new(staleness: StalenessChecker, job: CatalogSyncJob) -> Self {
        Self { staleness, job }
    }
}

#[async_trait]
impl ScheduledJob for CatalogRefresh {
    fn name(&self) -> &'static str {
        "catalog-refresh"
    }

    async fn execute(&self) -> anyhow::Result<()> {
        if !self.staleness.is_stale().await.context("staleness check")? {
            info!("catalog is fresh, skipping sync");
            return Ok(());
        }
        self.job.run().await?;
        Ok(())
    }
}

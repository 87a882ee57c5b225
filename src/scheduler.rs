use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio::{task::JoinHandle, time::MissedTickBehavior};

/// Work triggered on every scheduler tick.
#[async_trait]
pub trait ScheduledJob: Send + Sync {
    fn name(&self) -> &'static str;

    async fn execute(&self) -> anyhow::Result<()>;
}

/// Fires a job on a fixed cadence, never running two executions at once.
/// A tick that lands while a run is still going is dropped, not queued.
#[derive(Clone)]
pub struct Scheduler {
    cadence: Duration,
    running: Arc<AtomicBool>,
}

impl Scheduler {
    pub fn new(cadence: Duration) -> Self {
        Self { cadence, running: Arc::new(AtomicBool::new(false)) }
    }

    /// Starts the tick loop. The first tick fires immediately.
    pub fn spawn(self, job: Arc<dyn ScheduledJob>) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!(
                job = job.name(),
                cadence_secs = self.cadence.as_secs(),
                "scheduler started"
            );

            let mut timer = tokio::time::interval(self.cadence);
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                timer.tick().await;
                self.trigger(Arc::clone(&job));
            }
        })
    }

    /// Starts one execution unless another is in progress. Returns the handle
    /// of the spawned run, or `None` if the tick was skipped.
    pub fn trigger(&self, job: Arc<dyn ScheduledJob>) -> Option<JoinHandle<()>> {
        let claimed =
            self.running.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire);
        if claimed.is_err() {
            tracing::info!(job = job.name(), "previous run still in progress, skipping tick");
            return None;
        }

        let guard = RunGuard(Arc::clone(&self.running));
        Some(tokio::spawn(async move {
            let _guard = guard;
            match job.execute().await {
                Ok(()) => tracing::debug!(job = job.name(), "job completed"),
                Err(err) => tracing::error!(job = job.name(), error = ?err, "job failed"),
            }
        }))
    }
}

/// Clears the in-progress flag when a run ends, including by panic.
struct RunGuard(Arc<AtomicBool>);

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

//! Job poller
//!
//! Polls the jobs table for queued work and executes it. Each job runs in
//! its own task; a semaphore bounds parallelism. A job without a resolvable
//! model descriptor is skipped and stays queued, so registering the model
//! later lets it proceed.

use anyhow::Result;
use segint_core::domain::job::JobOutcome;
use segint_core::storage::BlobStore;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::time;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::backend::Backends;
use crate::config::Config;
use crate::dispatcher;
use crate::repository;

/// Job poller that continuously claims and executes queued jobs
pub struct JobPoller {
    config: Config,
    pool: PgPool,
    blobs: BlobStore,
    backends: Arc<Backends>,
    semaphore: Arc<Semaphore>,
}

impl JobPoller {
    /// Creates a new job poller
    pub fn new(config: Config, pool: PgPool, blobs: BlobStore, backends: Backends) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_parallel_jobs));
        Self {
            config,
            pool,
            blobs,
            backends: Arc::new(backends),
            semaphore,
        }
    }

    /// Starts the polling loop
    pub async fn run(&self) -> Result<()> {
        info!(
            "Starting job poller (interval: {:?})",
            self.config.poll_interval
        );

        let mut interval = time::interval(self.config.poll_interval);

        loop {
            interval.tick().await;

            debug!("Polling for queued jobs");

            match self.poll_and_execute_once().await {
                Ok(dispatched) => {
                    if dispatched > 0 {
                        info!("Dispatched {} job(s) this cycle", dispatched);
                    }
                }
                Err(e) => {
                    error!("Error during poll cycle: {:#}", e);
                }
            }
        }
    }

    /// Performs a single poll cycle.
    ///
    /// Dispatched jobs are not awaited. The semaphore alone bounds
    /// parallelism, so a slow inference job never delays claiming newly
    /// queued work on later cycles. A job dispatched but not yet claimed may
    /// be listed again next cycle; the compare-and-swap claim makes the
    /// duplicate dispatch a no-op.
    async fn poll_and_execute_once(&self) -> Result<usize> {
        let job_ids = repository::list_queued(&self.pool).await?;

        if job_ids.is_empty() {
            debug!("No jobs available");
            return Ok(0);
        }

        info!("Found {} queued job(s)", job_ids.len());

        Ok(self.spawn_up_to_capacity(job_ids))
    }

    /// Spawns a detached task per job while semaphore permits last.
    fn spawn_up_to_capacity(&self, job_ids: Vec<Uuid>) -> usize {
        let mut dispatched = 0;

        for job_id in job_ids {
            let Ok(permit) = self.semaphore.clone().try_acquire_owned() else {
                debug!("Max parallel jobs reached, deferring remaining queued jobs");
                break;
            };
            self.spawn_job_task(job_id, permit);
            dispatched += 1;
        }

        dispatched
    }

    /// Spawns a task to execute a single job. The permit moves into the task
    /// so the parallelism slot stays held until the job reaches its terminal
    /// state.
    fn spawn_job_task(&self, job_id: Uuid, permit: tokio::sync::OwnedSemaphorePermit) {
        let pool = self.pool.clone();
        let blobs = self.blobs.clone();
        let backends = Arc::clone(&self.backends);

        tokio::spawn(async move {
            let _permit = permit;
            if let Err(e) = Self::execute_job(job_id, pool, blobs, backends).await {
                error!("Failed to execute job {}: {:#}", job_id, e);
            }
        });
    }

    /// Executes a single queued job to its terminal state
    async fn execute_job(
        job_id: Uuid,
        pool: PgPool,
        blobs: BlobStore,
        backends: Arc<Backends>,
    ) -> Result<()> {
        // Resolve the model before claiming: a job whose descriptor is
        // missing stays queued instead of burning a Running slot.
        let queued = sqlx::query_as::<_, (String,)>(
            "SELECT model_id FROM segmentation_jobs WHERE id = $1",
        )
        .bind(job_id)
        .fetch_optional(&pool)
        .await?;

        let Some((model_id,)) = queued else {
            debug!("Job {} vanished before claim", job_id);
            return Ok(());
        };

        let Some((model, structure)) = repository::find_model(&pool, &model_id).await? else {
            warn!(
                "Job {} references model {} with no registered descriptor, leaving queued",
                job_id, model_id
            );
            return Ok(());
        };

        let Some(job) = repository::claim(&pool, job_id).await? else {
            debug!("Job {} already claimed by another worker", job_id);
            return Ok(());
        };

        info!(
            "Claimed job {} (model {}, backend {})",
            job.id,
            model.model_id,
            model.backend.as_str()
        );

        let outcome = match dispatcher::execute(&job, &model, &structure, &backends, &blobs).await
        {
            Ok(output_ref) => {
                info!("Job {} succeeded", job.id);
                JobOutcome::Succeeded { output_ref }
            }
            Err(e) => {
                warn!("Job {} failed: {:#}", job.id, e);
                JobOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };

        repository::complete(&pool, job.id, &outcome).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    fn test_poller(max_parallel_jobs: usize) -> JobPoller {
        let config = Config {
            max_parallel_jobs,
            ..Config::default()
        };
        // Lazy pool: never connected by these tests.
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap();
        let blobs = BlobStore::new(
            std::env::temp_dir().join(format!("segint-poller-{}", Uuid::new_v4())),
        );
        let backends = Backends::from_config(&config);
        JobPoller::new(config, pool, blobs, backends)
    }

    #[tokio::test]
    async fn test_saturated_cycle_returns_without_waiting() {
        let poller = test_poller(2);

        // Two in-flight jobs hold every permit.
        let _p1 = poller.semaphore.clone().try_acquire_owned().unwrap();
        let _p2 = poller.semaphore.clone().try_acquire_owned().unwrap();

        // Claiming is synchronous: with the semaphore saturated the cycle
        // dispatches nothing and completes instead of waiting on the
        // in-flight jobs.
        assert_eq!(
            poller.spawn_up_to_capacity(vec![Uuid::new_v4(), Uuid::new_v4()]),
            0
        );
    }

    #[tokio::test]
    async fn test_dispatch_is_capped_by_free_permits() {
        let poller = test_poller(2);

        // One in-flight job holds one of the two permits.
        let _held = poller.semaphore.clone().try_acquire_owned().unwrap();

        let ids = vec![Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        assert_eq!(poller.spawn_up_to_capacity(ids), 1);
    }
}

//! Worker mode
//!
//! Pulls jobs from the shared queue without serving HTTP. Several worker
//! processes can run against the same Redis.

use anyhow::{Result, bail};
use std::sync::Arc;
use tracing::info;

use crate::config::StaticConfig;
use crate::jobs::{JobHandler, WorkerPool};
use crate::runtime::lifetime;

pub async fn run_worker(config: &StaticConfig, workers: Option<usize>) -> Result<()> {
    let context = lifetime::startup::prepare_context(config).await?;
    if context.store.backend_name() == "memory" {
        bail!("Worker mode needs a shared store; set store.backend = \"redis\"");
    }

    let workers = workers.unwrap_or(config.dispatch.workers);
    let handler: Arc<dyn JobHandler> = context.clone();
    let pool = WorkerPool::spawn(
        workers,
        context.jobs.clone(),
        handler,
        config.dispatch.job_poll_interval(),
    );
    info!("Worker mode running with {} workers", pool.size());

    lifetime::shutdown::wait_for_signal().await;
    lifetime::shutdown::stop_workers(pool).await;
    Ok(())
}

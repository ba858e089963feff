use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::{Job, JobQueue};
use crate::errors::Result;

#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, job: Job) -> Result<()>;
}

/// 固定数量的后台 worker，从同一个队列取任务
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
    shutdown: watch::Sender<bool>,
}

impl WorkerPool {
    pub fn spawn(
        workers: usize,
        queue: Arc<dyn JobQueue>,
        handler: Arc<dyn JobHandler>,
        idle: Duration,
    ) -> Self {
        let (shutdown, rx) = watch::channel(false);
        let workers = workers.max(1);

        let handles = (0..workers)
            .map(|id| {
                let queue = queue.clone();
                let handler = handler.clone();
                let rx = rx.clone();
                tokio::spawn(worker_loop(id, queue, handler, idle, rx))
            })
            .collect();

        info!("Started {} job workers", workers);
        Self { handles, shutdown }
    }

    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// 通知所有 worker 停止，并等待正在执行的任务结束
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Job worker terminated abnormally: {}", e);
            }
        }
        info!("All job workers stopped");
    }
}

async fn worker_loop(
    id: usize,
    queue: Arc<dyn JobQueue>,
    handler: Arc<dyn JobHandler>,
    idle: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    debug!("Job worker {} started", id);
    loop {
        if *shutdown.borrow() {
            break;
        }

        match queue.try_next().await {
            Ok(Some(job)) => {
                let kind = job.kind();
                if let Err(e) = handler.handle(job).await {
                    error!("Worker {}: {} job failed: {}", id, kind, e);
                }
            }
            Ok(None) => {
                tokio::select! {
                    _ = queue.wait(idle) => {}
                    changed = shutdown.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
            Err(e) => {
                warn!("Worker {}: failed to fetch job: {}", id, e);
                tokio::select! {
                    _ = tokio::time::sleep(idle) => {}
                    changed = shutdown.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
        }
    }
    debug!("Job worker {} stopped", id);
}

/// 在当前任务中顺序执行队列里的全部任务，直到队列为空
///
/// 任务执行过程中新投递的任务也会被执行。返回执行的任务数。
pub async fn drain(queue: &dyn JobQueue, handler: &dyn JobHandler) -> Result<usize> {
    let mut processed = 0;
    while let Some(job) = queue.try_next().await? {
        let kind = job.kind();
        if let Err(e) = handler.handle(job).await {
            warn!("{} job failed while draining: {}", kind, e);
        }
        processed += 1;
    }
    Ok(processed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::MemoryJobQueue;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingHandler {
        handled: AtomicUsize,
    }

    #[async_trait]
    impl JobHandler for CountingHandler {
        async fn handle(&self, _job: Job) -> Result<()> {
            self.handled.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn dispatch(id: &str) -> Job {
        Job::Dispatch {
            campaign_id: id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_pool_processes_jobs_and_shuts_down() {
        let queue = Arc::new(MemoryJobQueue::new());
        let handler = Arc::new(CountingHandler {
            handled: AtomicUsize::new(0),
        });

        let pool = WorkerPool::spawn(3, queue.clone(), handler.clone(), Duration::from_millis(10));
        assert_eq!(pool.size(), 3);

        for i in 0..20 {
            queue.enqueue(dispatch(&i.to_string())).await.unwrap();
        }

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while handler.handled.load(Ordering::SeqCst) < 20 {
            assert!(tokio::time::Instant::now() < deadline, "jobs not processed in time");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        pool.shutdown().await;
        assert_eq!(handler.handled.load(Ordering::SeqCst), 20);
    }

    #[tokio::test]
    async fn test_drain_runs_until_empty() {
        let queue = MemoryJobQueue::new();
        let handler = CountingHandler {
            handled: AtomicUsize::new(0),
        };
        queue.enqueue(dispatch("a")).await.unwrap();
        queue.enqueue(dispatch("b")).await.unwrap();

        let processed = drain(&queue, &handler).await.unwrap();
        assert_eq!(processed, 2);
        assert_eq!(handler.handled.load(Ordering::SeqCst), 2);
    }
}

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::warn;

use super::Job;
use crate::errors::Result;
use crate::store::KvStore;

#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, job: Job) -> Result<()>;

    /// 非阻塞取出下一个任务
    async fn try_next(&self) -> Result<Option<Job>>;

    /// 队列为空时等待新任务，最多等待 `idle`
    async fn wait(&self, idle: Duration) {
        tokio::time::sleep(idle).await;
    }

    async fn len(&self) -> Result<u64>;
}

/// 进程内任务队列
#[derive(Default)]
pub struct MemoryJobQueue {
    jobs: Mutex<VecDeque<Job>>,
    notify: Notify,
}

impl MemoryJobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前排队任务的快照（测试用）
    pub fn snapshot(&self) -> Vec<Job> {
        self.jobs.lock().iter().cloned().collect()
    }
}

#[async_trait]
impl JobQueue for MemoryJobQueue {
    async fn enqueue(&self, job: Job) -> Result<()> {
        self.jobs.lock().push_back(job);
        self.notify.notify_one();
        Ok(())
    }

    async fn try_next(&self) -> Result<Option<Job>> {
        Ok(self.jobs.lock().pop_front())
    }

    async fn wait(&self, idle: Duration) {
        let _ = tokio::time::timeout(idle, self.notify.notified()).await;
    }

    async fn len(&self) -> Result<u64> {
        Ok(self.jobs.lock().len() as u64)
    }
}

/// 基于共享存储列表的任务队列，多进程共享
///
/// 任务以 JSON 存放；LPOP 轮询而不是 BLPOP，空闲时由 `wait` 退避。
pub struct StoreJobQueue {
    store: Arc<dyn KvStore>,
    key: String,
}

impl StoreJobQueue {
    pub fn new(store: Arc<dyn KvStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }
}

#[async_trait]
impl JobQueue for StoreJobQueue {
    async fn enqueue(&self, job: Job) -> Result<()> {
        let payload = serde_json::to_string(&job)?;
        self.store.list_push_back(&self.key, &[payload]).await
    }

    async fn try_next(&self) -> Result<Option<Job>> {
        loop {
            let Some(payload) = self.store.list_pop_front(&self.key, 1).await?.pop() else {
                return Ok(None);
            };
            match serde_json::from_str::<Job>(&payload) {
                Ok(job) => return Ok(Some(job)),
                Err(e) => {
                    // 无法解析的任务直接丢弃，继续取下一个
                    warn!("Discarding malformed job payload: {} ({})", payload, e);
                }
            }
        }
    }

    async fn len(&self) -> Result<u64> {
        self.store.list_len(&self.key).await
    }
}

//! 调度协调器
//!
//! 每次被触发时：
//! 1. 活动不在 Sending 状态则直接返回
//! 2. 非阻塞获取活动的调度锁，拿不到就返回 LockBusy
//! 3. 在锁内按 `max_inflight - inflight` 计算可用名额，逐个弹出 chunk 并交给调度器
//! 4. 本次一个 chunk 都没有派发时，执行完成检查
//!
//! 协调器本身从不等待 chunk 执行结束；chunk worker 退出时会再次触发它。

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{DistributedLock, InflightCounter, RecipientQueue};
use crate::errors::Result;
use crate::jobs::{Job, JobQueue};
use crate::storage::{CampaignStatus, SeaOrmStorage};
use crate::store::KeySpace;

use super::DispatchSettings;

/// chunk 交付接口
///
/// 生产环境中即投递一个 `SendChunk` 任务；测试可以直接记录下来。
#[async_trait]
pub trait ChunkScheduler: Send + Sync {
    async fn schedule_chunk(&self, campaign_id: &str, emails: Vec<String>) -> Result<()>;
}

#[async_trait]
impl ChunkScheduler for Arc<dyn JobQueue> {
    async fn schedule_chunk(&self, campaign_id: &str, emails: Vec<String>) -> Result<()> {
        self.enqueue(Job::SendChunk {
            campaign_id: campaign_id.to_string(),
            emails,
        })
        .await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "reason", content = "status")]
pub enum NotDispatchingReason {
    CampaignNotFound,
    NotSending(CampaignStatus),
    LockBusy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum FinalizeOutcome {
    /// 队列与在途均为 0；`transitioned` 表示是否由本次调用完成了状态迁移
    Completed { transitioned: bool },
    /// 仍有工作未结束，不是错误
    NotDone { remaining: u64, inflight: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "result")]
pub enum DispatchOutcome {
    Dispatched { dispatched: usize, inflight_now: i64 },
    NotDispatching { reason: NotDispatchingReason },
    Finalize(FinalizeOutcome),
}

#[derive(Clone)]
pub struct Coordinator {
    storage: Arc<SeaOrmStorage>,
    queue: RecipientQueue,
    inflight: InflightCounter,
    lock: DistributedLock,
    keys: KeySpace,
    settings: DispatchSettings,
}

impl Coordinator {
    pub fn new(
        storage: Arc<SeaOrmStorage>,
        queue: RecipientQueue,
        inflight: InflightCounter,
        lock: DistributedLock,
        keys: KeySpace,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            storage,
            queue,
            inflight,
            lock,
            keys,
            settings,
        }
    }

    pub async fn dispatch(
        &self,
        campaign_id: &str,
        scheduler: &dyn ChunkScheduler,
    ) -> Result<DispatchOutcome> {
        match self.storage.campaign_status(campaign_id).await? {
            None => {
                debug!("Campaign {} not found, nothing to dispatch", campaign_id);
                return Ok(DispatchOutcome::NotDispatching {
                    reason: NotDispatchingReason::CampaignNotFound,
                });
            }
            Some(status) if status != CampaignStatus::Sending => {
                debug!("Campaign {} is {}, not dispatching", campaign_id, status);
                return Ok(DispatchOutcome::NotDispatching {
                    reason: NotDispatchingReason::NotSending(status),
                });
            }
            Some(_) => {}
        }

        let lock_key = self.keys.dispatch_lock(campaign_id);
        let Some(guard) = self
            .lock
            .try_acquire(&lock_key, self.settings.lock_ttl)
            .await?
        else {
            debug!("Dispatch lock busy for campaign {}", campaign_id);
            return Ok(DispatchOutcome::NotDispatching {
                reason: NotDispatchingReason::LockBusy,
            });
        };

        let outcome = self.dispatch_locked(campaign_id, scheduler).await;

        if let Err(e) = self.lock.release(guard).await {
            warn!(
                "Failed to release dispatch lock for campaign {}: {}",
                campaign_id, e
            );
        }

        outcome
    }

    async fn dispatch_locked(
        &self,
        campaign_id: &str,
        scheduler: &dyn ChunkScheduler,
    ) -> Result<DispatchOutcome> {
        let mut inflight_now = self.inflight.get(campaign_id).await?;
        let need = (self.settings.max_inflight as i64 - inflight_now).max(0);
        let mut dispatched = 0usize;

        for _ in 0..need {
            let chunk = self
                .queue
                .pop_chunk(campaign_id, self.settings.chunk_size)
                .await?;
            if chunk.is_empty() {
                break;
            }

            inflight_now = self.inflight.increment(campaign_id).await?;
            if let Err(e) = scheduler.schedule_chunk(campaign_id, chunk.clone()).await {
                // 交付失败：收件人放回队首，撤销名额
                warn!(
                    "Failed to schedule chunk of {} for campaign {}: {}",
                    chunk.len(),
                    campaign_id,
                    e
                );
                self.queue.push_front(campaign_id, &chunk).await?;
                self.inflight.decrement(campaign_id).await?;
                return Err(e);
            }
            dispatched += 1;
        }

        if dispatched == 0 {
            return Ok(DispatchOutcome::Finalize(self.finalize(campaign_id).await?));
        }

        debug!(
            "Campaign {}: dispatched {} chunk(s), inflight now {}",
            campaign_id, dispatched, inflight_now
        );
        Ok(DispatchOutcome::Dispatched {
            dispatched,
            inflight_now,
        })
    }

    /// 完成检查
    ///
    /// 在途数与队列长度同时为 0 时把活动从 Sending 迁移到 Completed，
    /// 并清理该活动的队列与计数。重复调用是安全的空操作。
    ///
    /// 先读在途数再读队列长度：worker 总是先把剩余收件人放回队首再递减在途数，
    /// 所以读到在途为 0 之后，队列里已经包含所有被放回的收件人。
    /// 只有本次完成了状态迁移才清理，暂停中的活动保留队列。
    pub async fn finalize(&self, campaign_id: &str) -> Result<FinalizeOutcome> {
        let inflight = self.inflight.get(campaign_id).await?;
        let remaining = self.queue.remaining(campaign_id).await?;
        if remaining > 0 || inflight > 0 {
            debug!(
                "Campaign {} not done: {} remaining, {} inflight",
                campaign_id, remaining, inflight
            );
            return Ok(FinalizeOutcome::NotDone {
                remaining,
                inflight,
            });
        }

        let transitioned = self.storage.complete_if_sending(campaign_id).await?;
        if transitioned {
            self.queue.cleanup(campaign_id).await?;
            info!("Campaign {} completed", campaign_id);
        }
        Ok(FinalizeOutcome::Completed { transitioned })
    }
}

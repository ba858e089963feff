//! 活动分发引擎
//!
//! - `RecipientQueue`: 每个活动的待发送地址列表
//! - `DistributedLock`: 调度决策的互斥锁
//! - `InflightCounter`: 在途 chunk 数
//! - `Coordinator`: 在上限内派发 chunk，并在全部结束时完成活动
//! - `ChunkWorker`: 发送一个 chunk，退出时再次触发协调器

mod coordinator;
mod inflight;
mod lock;
mod recipients;
mod worker;

pub use coordinator::{
    ChunkScheduler, Coordinator, DispatchOutcome, FinalizeOutcome, NotDispatchingReason,
};
pub use inflight::InflightCounter;
pub use lock::{DistributedLock, LockGuard};
pub use recipients::RecipientQueue;
pub use worker::{ChunkExit, ChunkReport, ChunkWorker};

use std::time::Duration;

use crate::config::StaticConfig;

/// 分发参数（从配置派生）
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub chunk_size: usize,
    pub max_inflight: usize,
    pub lock_ttl: Duration,
    pub per_email_delay: Duration,
    pub requeue_backoff: Duration,
    pub recipient_placeholder: String,
}

impl DispatchSettings {
    pub fn from_config(config: &StaticConfig) -> Self {
        let dispatch = &config.dispatch;
        Self {
            chunk_size: dispatch.chunk_size.max(1),
            max_inflight: dispatch.max_inflight.max(1),
            lock_ttl: dispatch.lock_ttl(),
            per_email_delay: dispatch.per_email_delay(),
            requeue_backoff: dispatch.requeue_backoff(),
            recipient_placeholder: config.tracking.recipient_placeholder.clone(),
        }
    }
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self::from_config(&StaticConfig::default())
    }
}

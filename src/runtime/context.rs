//! 运行时组件装配
//!
//! `AppContext` 持有所有共享组件，同时作为 `JobHandler` 把任务路由到
//! 协调器、chunk worker 和点击记录器。

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{StaticConfig, TrackingConfig};
use crate::dispatch::{
    ChunkWorker, Coordinator, DispatchOutcome, DispatchSettings, DistributedLock,
    InflightCounter, NotDispatchingReason, RecipientQueue,
};
use crate::errors::Result;
use crate::jobs::{Job, JobHandler, JobQueue, MemoryJobQueue, StoreJobQueue};
use crate::mail::MailTransport;
use crate::services::CampaignService;
use crate::storage::SeaOrmStorage;
use crate::store::{KeySpace, KvStore};
use crate::tracking::{BotDetector, ClickOutcome, ClickRecorder, LinkResolver};

pub struct AppContext {
    pub storage: Arc<SeaOrmStorage>,
    pub store: Arc<dyn KvStore>,
    pub keys: KeySpace,
    pub jobs: Arc<dyn JobQueue>,
    pub transport: Arc<dyn MailTransport>,
    pub coordinator: Coordinator,
    pub chunk_worker: ChunkWorker,
    pub campaigns: CampaignService,
    pub recorder: ClickRecorder,
    pub links: LinkResolver,
    pub bots: BotDetector,
    pub tracking: TrackingConfig,
    pub settings: DispatchSettings,
}

impl AppContext {
    pub fn new(
        config: &StaticConfig,
        storage: Arc<SeaOrmStorage>,
        store: Arc<dyn KvStore>,
        jobs: Arc<dyn JobQueue>,
        transport: Arc<dyn MailTransport>,
    ) -> Self {
        let keys = KeySpace::new(config.redis.key_prefix.clone());
        let settings = DispatchSettings::from_config(config);
        let tracking = config.tracking.clone();

        let queue = RecipientQueue::new(store.clone(), keys.clone());
        let inflight = InflightCounter::new(store.clone(), keys.clone());
        let lock = DistributedLock::new(store.clone());

        let coordinator = Coordinator::new(
            storage.clone(),
            queue.clone(),
            inflight.clone(),
            lock.clone(),
            keys.clone(),
            settings.clone(),
        );
        let chunk_worker = ChunkWorker::new(
            storage.clone(),
            queue.clone(),
            inflight.clone(),
            transport.clone(),
            jobs.clone(),
            settings.clone(),
        );
        let campaigns = CampaignService::new(
            storage.clone(),
            queue,
            inflight,
            lock,
            keys.clone(),
            jobs.clone(),
            settings.clone(),
        );

        let recorder = ClickRecorder::new(storage.clone(), tracking.bucket_secs);
        let links = LinkResolver::new(
            storage.clone(),
            std::time::Duration::from_secs(tracking.link_cache_ttl_secs),
            tracking.link_cache_capacity,
        );
        let bots = BotDetector::new(&tracking.bot_user_agents, tracking.min_user_agent_len);

        Self {
            storage,
            store,
            keys,
            jobs,
            transport,
            coordinator,
            chunk_worker,
            campaigns,
            recorder,
            links,
            bots,
            tracking,
            settings,
        }
    }

    /// 单进程内存后端使用进程内任务队列，其余情况共享存储里的队列
    pub fn job_queue_for(store: &Arc<dyn KvStore>, keys: &KeySpace) -> Arc<dyn JobQueue> {
        if store.backend_name() == "memory" {
            Arc::new(MemoryJobQueue::new())
        } else {
            Arc::new(StoreJobQueue::new(store.clone(), keys.jobs()))
        }
    }

    async fn run_dispatch(&self, campaign_id: &str) -> Result<()> {
        let outcome = self.coordinator.dispatch(campaign_id, &self.jobs).await?;
        debug!("Dispatch for campaign {}: {:?}", campaign_id, outcome);

        if let DispatchOutcome::NotDispatching {
            reason: NotDispatchingReason::LockBusy,
        } = outcome
        {
            // 持锁者可能在最后一个 chunk 结束前读到了旧的在途数，稍后再试一次
            tokio::time::sleep(self.settings.requeue_backoff).await;
            self.jobs
                .enqueue(Job::Dispatch {
                    campaign_id: campaign_id.to_string(),
                })
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl JobHandler for AppContext {
    async fn handle(&self, job: Job) -> Result<()> {
        match job {
            Job::Dispatch { campaign_id } => self.run_dispatch(&campaign_id).await,
            Job::SendChunk {
                campaign_id,
                emails,
            } => {
                let report = self.chunk_worker.run(&campaign_id, emails).await?;
                if report.failed > 0 {
                    warn!(
                        "Campaign {}: {} send failure(s) in chunk",
                        campaign_id, report.failed
                    );
                }
                Ok(())
            }
            Job::RecordClick { click } => {
                match self.recorder.record(&click).await? {
                    ClickOutcome::Recorded { unique_recipient } => info!(
                        "Click recorded on link {} (campaign {}, first for recipient: {})",
                        click.link_id, click.campaign_id, unique_recipient
                    ),
                    outcome => debug!("Click on link {} not counted: {:?}", click.link_id, outcome),
                }
                Ok(())
            }
        }
    }
}

//! Campaign control service
//!
//! Kickoff, pause, resume and progress queries. The dispatch chain itself
//! runs in the job workers; this service only moves a campaign between
//! states and nudges the coordinator.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::dispatch::{
    DispatchSettings, DistributedLock, InflightCounter, RecipientQueue,
};
use crate::errors::{MailshotError, Result};
use crate::jobs::{Job, JobQueue};
use crate::storage::{CampaignStatus, SeaOrmStorage};
use crate::store::KeySpace;

// ============ Response DTOs ============

/// Result of a successful kickoff
#[derive(Debug, Clone, Serialize)]
pub struct KickoffSummary {
    pub campaign_id: String,
    pub recipients: u64,
}

/// Status before and after a pause/resume
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StatusChange {
    pub previous: CampaignStatus,
    pub current: CampaignStatus,
}

/// Point-in-time progress of a campaign
#[derive(Debug, Clone, Serialize)]
pub struct CampaignProgress {
    pub campaign_id: String,
    pub status: CampaignStatus,
    pub remaining: u64,
    pub inflight: i64,
    pub emails_sent: i64,
    pub estimated_recipients: i64,
}

// ============ Service ============

#[derive(Clone)]
pub struct CampaignService {
    storage: Arc<SeaOrmStorage>,
    queue: RecipientQueue,
    inflight: InflightCounter,
    lock: DistributedLock,
    keys: KeySpace,
    jobs: Arc<dyn JobQueue>,
    settings: DispatchSettings,
}

impl CampaignService {
    pub fn new(
        storage: Arc<SeaOrmStorage>,
        queue: RecipientQueue,
        inflight: InflightCounter,
        lock: DistributedLock,
        keys: KeySpace,
        jobs: Arc<dyn JobQueue>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            storage,
            queue,
            inflight,
            lock,
            keys,
            jobs,
            settings,
        }
    }

    /// Start sending a Draft or Scheduled campaign.
    ///
    /// Seeds the recipient queue with the distinct filtered list, moves the
    /// campaign to Sending and enqueues the first dispatch. Concurrent calls
    /// for the same campaign are serialised by the kickoff lock; the loser
    /// gets `InvalidState`.
    pub async fn send(&self, campaign_id: &str) -> Result<KickoffSummary> {
        let lock_key = self.keys.kickoff_lock(campaign_id);
        let Some(guard) = self
            .lock
            .try_acquire(&lock_key, self.settings.lock_ttl)
            .await?
        else {
            return Err(MailshotError::invalid_state(format!(
                "Campaign {} is already being started.",
                campaign_id
            )));
        };

        let result = self.kickoff_locked(campaign_id).await;

        if let Err(e) = self.lock.release(guard).await {
            warn!(
                "Failed to release kickoff lock for campaign {}: {}",
                campaign_id, e
            );
        }
        result
    }

    async fn kickoff_locked(&self, campaign_id: &str) -> Result<KickoffSummary> {
        let campaign = self.storage.get_campaign(campaign_id).await?.ok_or_else(|| {
            MailshotError::not_found(format!("Campaign {} not found", campaign_id))
        })?;

        if !campaign.status.can_kickoff() {
            return Err(MailshotError::invalid_state(format!(
                "Campaign {} is {} and cannot be sent.",
                campaign_id, campaign.status
            )));
        }

        let recipients = self.storage.resolve_recipients(&campaign).await?;
        if recipients.is_empty() {
            return Err(MailshotError::zero_recipients(format!(
                "Campaign {} has no recipients.",
                campaign_id
            )));
        }
        let total = recipients.len() as u64;

        self.queue.seed(campaign_id, &recipients).await?;
        if let Err(e) = self.storage.begin_sending(campaign_id, total).await {
            // status changed underneath us; leave no queued work behind
            if let Err(cleanup) = self.queue.cleanup(campaign_id).await {
                warn!(
                    "Failed to clean up queue for campaign {}: {}",
                    campaign_id, cleanup
                );
            }
            return Err(e);
        }

        self.enqueue_dispatch(campaign_id).await?;
        info!(
            "Campaign {} kicked off with {} recipients",
            campaign_id, total
        );

        Ok(KickoffSummary {
            campaign_id: campaign_id.to_string(),
            recipients: total,
        })
    }

    /// Pause a campaign. In-flight chunks notice before their next send.
    pub async fn pause(&self, campaign_id: &str) -> Result<StatusChange> {
        let previous = self.storage.pause_campaign(campaign_id).await?;
        Ok(StatusChange {
            previous,
            current: CampaignStatus::Paused,
        })
    }

    /// Resume a campaign and re-trigger the coordinator.
    pub async fn resume(&self, campaign_id: &str) -> Result<StatusChange> {
        let previous = self.storage.resume_campaign(campaign_id).await?;
        self.enqueue_dispatch(campaign_id).await?;
        Ok(StatusChange {
            previous,
            current: CampaignStatus::Sending,
        })
    }

    /// Number of distinct recipients a send would reach right now.
    pub async fn estimate(&self, campaign_id: &str) -> Result<u64> {
        let campaign = self.storage.get_campaign(campaign_id).await?.ok_or_else(|| {
            MailshotError::not_found(format!("Campaign {} not found", campaign_id))
        })?;
        self.storage.estimate_recipients(&campaign).await
    }

    pub async fn progress(&self, campaign_id: &str) -> Result<CampaignProgress> {
        let campaign = self.storage.get_campaign(campaign_id).await?.ok_or_else(|| {
            MailshotError::not_found(format!("Campaign {} not found", campaign_id))
        })?;

        Ok(CampaignProgress {
            campaign_id: campaign.id,
            status: campaign.status,
            remaining: self.queue.remaining(campaign_id).await?,
            inflight: self.inflight.get(campaign_id).await?,
            emails_sent: campaign.emails_sent,
            estimated_recipients: campaign.estimated_recipients,
        })
    }

    async fn enqueue_dispatch(&self, campaign_id: &str) -> Result<()> {
        self.jobs
            .enqueue(Job::Dispatch {
                campaign_id: campaign_id.to_string(),
            })
            .await
    }
}

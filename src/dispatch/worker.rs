//! chunk worker
//!
//! 逐个收件人发送一个 chunk。每封邮件前重新读取活动状态，
//! 一旦不再是 Sending 就把剩余部分（含当前收件人）放回队首并退出。
//! 无论以何种方式退出，都恰好递减一次在途计数，然后投递一个 `Dispatch` 任务。

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

use super::{DispatchSettings, InflightCounter, RecipientQueue};
use crate::errors::Result;
use crate::jobs::{Job, JobQueue};
use crate::mail::{MailTransport, build_message};
use crate::storage::{CampaignStatus, SeaOrmStorage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "exit", content = "status")]
pub enum ChunkExit {
    /// 整个 chunk 处理完
    Completed,
    /// 活动被暂停或进入其他非发送状态
    Interrupted(CampaignStatus),
    CampaignGone,
    /// 活动还没有编译好的正文
    ContentNotReady,
    /// 基础设施错误，剩余收件人已放回
    Failed,
}

impl ChunkExit {
    fn needs_backoff(self) -> bool {
        matches!(self, ChunkExit::ContentNotReady | ChunkExit::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkReport {
    pub campaign_id: String,
    pub sent: u64,
    pub failed: u64,
    /// 找不到联系人 ID 的收件人
    pub skipped: u64,
    /// 放回队首的收件人数
    pub requeued: usize,
    pub exit: ChunkExit,
}

#[derive(Default)]
struct Progress {
    next: usize,
    sent: u64,
    failed: u64,
    skipped: u64,
}

#[derive(Clone)]
pub struct ChunkWorker {
    storage: Arc<SeaOrmStorage>,
    queue: RecipientQueue,
    inflight: InflightCounter,
    transport: Arc<dyn MailTransport>,
    jobs: Arc<dyn JobQueue>,
    settings: DispatchSettings,
}

impl ChunkWorker {
    pub fn new(
        storage: Arc<SeaOrmStorage>,
        queue: RecipientQueue,
        inflight: InflightCounter,
        transport: Arc<dyn MailTransport>,
        jobs: Arc<dyn JobQueue>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            storage,
            queue,
            inflight,
            transport,
            jobs,
            settings,
        }
    }

    pub async fn run(&self, campaign_id: &str, chunk: Vec<String>) -> Result<ChunkReport> {
        let mut progress = Progress::default();

        let exit = match self.send_chunk(campaign_id, &chunk, &mut progress).await {
            Ok(exit) => exit,
            Err(e) => {
                error!(
                    "Chunk for campaign {} aborted after {} of {} recipients: {}",
                    campaign_id,
                    progress.next,
                    chunk.len(),
                    e
                );
                ChunkExit::Failed
            }
        };

        let mut requeued = 0;
        if exit != ChunkExit::Completed {
            let rest = &chunk[progress.next.min(chunk.len())..];
            match self.queue.push_front(campaign_id, rest).await {
                Ok(()) => requeued = rest.len(),
                Err(e) => error!(
                    "Failed to requeue {} recipients for campaign {}: {}",
                    rest.len(),
                    campaign_id,
                    e
                ),
            }
        }

        if let Err(e) = self
            .storage
            .add_emails_sent(campaign_id, progress.sent)
            .await
        {
            error!(
                "Failed to add {} to emails_sent of campaign {}: {}",
                progress.sent, campaign_id, e
            );
        }

        if let Err(e) = self.inflight.decrement(campaign_id).await {
            error!(
                "Failed to decrement inflight for campaign {}: {}",
                campaign_id, e
            );
        }

        // 一封都没发出就退出时，稍等再触发协调器，避免空转
        if exit.needs_backoff() && progress.sent == 0 && !self.settings.requeue_backoff.is_zero() {
            tokio::time::sleep(self.settings.requeue_backoff).await;
        }

        self.jobs
            .enqueue(Job::Dispatch {
                campaign_id: campaign_id.to_string(),
            })
            .await?;

        let report = ChunkReport {
            campaign_id: campaign_id.to_string(),
            sent: progress.sent,
            failed: progress.failed,
            skipped: progress.skipped,
            requeued,
            exit,
        };
        debug!(
            "Chunk done for campaign {}: sent={} failed={} skipped={} requeued={} exit={:?}",
            campaign_id, report.sent, report.failed, report.skipped, report.requeued, report.exit
        );
        Ok(report)
    }

    async fn send_chunk(
        &self,
        campaign_id: &str,
        chunk: &[String],
        progress: &mut Progress,
    ) -> Result<ChunkExit> {
        let Some(campaign) = self.storage.get_campaign(campaign_id).await? else {
            warn!("Campaign {} disappeared, returning chunk", campaign_id);
            return Ok(ChunkExit::CampaignGone);
        };
        let Some(content) = campaign.content() else {
            warn!(
                "Campaign {} has no compiled content yet, returning chunk",
                campaign_id
            );
            return Ok(ChunkExit::ContentNotReady);
        };

        let contact_ids = self
            .storage
            .contact_ids_by_email(&campaign.audience_id, chunk)
            .await?;

        for (idx, email) in chunk.iter().enumerate() {
            if idx > 0 && !self.settings.per_email_delay.is_zero() {
                tokio::time::sleep(self.settings.per_email_delay).await;
            }

            match self.storage.campaign_status(campaign_id).await? {
                None => return Ok(ChunkExit::CampaignGone),
                Some(CampaignStatus::Sending) => {}
                Some(status) => {
                    info!(
                        "Campaign {} is {}, stopping chunk with {} unsent",
                        campaign_id,
                        status,
                        chunk.len() - idx
                    );
                    return Ok(ChunkExit::Interrupted(status));
                }
            }

            let Some(recipient_id) = contact_ids.get(email.as_str()) else {
                warn!(
                    "No contact for {} in audience {}, skipping",
                    email, campaign.audience_id
                );
                progress.skipped += 1;
                progress.next = idx + 1;
                continue;
            };

            let sent = match build_message(
                &campaign,
                &content,
                email,
                recipient_id,
                &self.settings.recipient_placeholder,
            ) {
                Ok(message) => self.transport.send(&message).await,
                Err(e) => Err(e),
            };

            match sent {
                Ok(()) => {
                    trace!("Sent campaign {} to {}", campaign_id, email);
                    progress.sent += 1;
                }
                Err(e) => {
                    warn!(
                        "Failed to send campaign {} to {}: {}",
                        campaign_id, email, e
                    );
                    progress.failed += 1;
                }
            }
            progress.next = idx + 1;
        }

        Ok(ChunkExit::Completed)
    }
}

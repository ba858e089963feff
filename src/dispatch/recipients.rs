use std::sync::Arc;
use tracing::debug;

use crate::errors::Result;
use crate::store::{KeySpace, KvStore};

/// 每个活动一个有序的待发送地址列表
#[derive(Clone)]
pub struct RecipientQueue {
    store: Arc<dyn KvStore>,
    keys: KeySpace,
}

impl RecipientQueue {
    pub fn new(store: Arc<dyn KvStore>, keys: KeySpace) -> Self {
        Self { store, keys }
    }

    /// 丢弃旧状态，写入完整收件人列表，并把在途计数归零
    pub async fn seed(&self, campaign_id: &str, emails: &[String]) -> Result<()> {
        self.store
            .list_replace(
                &self.keys.recipients(campaign_id),
                emails,
                &self.keys.inflight(campaign_id),
            )
            .await?;
        debug!(
            "Seeded {} recipients for campaign {}",
            emails.len(),
            campaign_id
        );
        Ok(())
    }

    /// 从头部原子弹出最多 `n` 个地址
    pub async fn pop_chunk(&self, campaign_id: &str, n: usize) -> Result<Vec<String>> {
        self.store
            .list_pop_front(&self.keys.recipients(campaign_id), n)
            .await
    }

    /// 把地址按原顺序放回头部
    pub async fn push_front(&self, campaign_id: &str, emails: &[String]) -> Result<()> {
        if emails.is_empty() {
            return Ok(());
        }
        self.store
            .list_push_front(&self.keys.recipients(campaign_id), emails)
            .await?;
        debug!(
            "Returned {} recipients to the head of campaign {}",
            emails.len(),
            campaign_id
        );
        Ok(())
    }

    pub async fn remaining(&self, campaign_id: &str) -> Result<u64> {
        self.store
            .list_len(&self.keys.recipients(campaign_id))
            .await
    }

    /// 删除活动的列表与在途计数
    pub async fn cleanup(&self, campaign_id: &str) -> Result<()> {
        self.store
            .delete(&[
                self.keys.recipients(campaign_id),
                self.keys.inflight(campaign_id),
            ])
            .await
    }
}

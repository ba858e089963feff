//! 活动状态读写
//!
//! 状态迁移都在事务内先对活动行加排他锁（SQLite 上为整库写锁），
//! 再按当前状态决定是否更新，避免暂停、恢复和完成之间互相覆盖。

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, ExprTrait, QueryFilter, QuerySelect,
    TransactionTrait,
};
use tracing::{debug, info};

use super::SeaOrmStorage;
use super::retry;
use crate::errors::{MailshotError, Result};
use crate::storage::models::{Campaign, CampaignStatus, model_to_campaign, parse_status};

use migration::entities::campaign;

impl SeaOrmStorage {
    pub async fn get_campaign(&self, campaign_id: &str) -> Result<Option<Campaign>> {
        let model = campaign::Entity::find_by_id(campaign_id.to_string())
            .one(&self.db)
            .await?;
        model.map(model_to_campaign).transpose()
    }

    /// 只读取状态列，chunk worker 每封邮件前调用
    pub async fn campaign_status(&self, campaign_id: &str) -> Result<Option<CampaignStatus>> {
        let status: Option<String> = campaign::Entity::find_by_id(campaign_id.to_string())
            .select_only()
            .column(campaign::Column::Status)
            .into_tuple()
            .one(&self.db)
            .await?;

        status
            .map(|s| parse_status(campaign_id, &s))
            .transpose()
    }

    /// 原子累加已发送数量
    pub async fn add_emails_sent(&self, campaign_id: &str, count: u64) -> Result<()> {
        if count == 0 {
            return Ok(());
        }

        let db = &self.db;
        retry::with_retry("add_emails_sent", self.retry_config, || async {
            campaign::Entity::update_many()
                .col_expr(
                    campaign::Column::EmailsSent,
                    Expr::col(campaign::Column::EmailsSent).add(Expr::val(count as i64)),
                )
                .filter(campaign::Column::Id.eq(campaign_id))
                .exec(db)
                .await
        })
        .await?;

        debug!("Campaign {} emails_sent += {}", campaign_id, count);
        Ok(())
    }

    /// Draft/Scheduled -> Sending
    ///
    /// 记录开始时间与预计人数，并把已发送数清零。
    pub async fn begin_sending(&self, campaign_id: &str, estimated_recipients: u64) -> Result<()> {
        let txn = self.db.begin().await?;

        let current = self.lock_status(&txn, campaign_id).await?;
        if !current.can_kickoff() {
            return Err(MailshotError::invalid_state(format!(
                "Campaign {} is {} and cannot be sent.",
                campaign_id, current
            )));
        }

        campaign::Entity::update_many()
            .col_expr(
                campaign::Column::Status,
                Expr::val(CampaignStatus::Sending.as_ref()),
            )
            .col_expr(campaign::Column::StartedSendingAt, Expr::val(Utc::now()))
            .col_expr(
                campaign::Column::EstimatedRecipients,
                Expr::val(estimated_recipients as i64),
            )
            .col_expr(campaign::Column::EmailsSent, Expr::val(0i64))
            .filter(campaign::Column::Id.eq(campaign_id))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        info!(
            "Campaign {} is now sending to ~{} recipients",
            campaign_id, estimated_recipients
        );
        Ok(())
    }

    /// Sending -> Completed（条件更新）
    ///
    /// 返回是否由本次调用完成状态迁移；并发调用中只有一个会得到 true。
    pub async fn complete_if_sending(&self, campaign_id: &str) -> Result<bool> {
        let db = &self.db;
        let now = Utc::now();
        let result = retry::with_retry("complete_if_sending", self.retry_config, || async {
            campaign::Entity::update_many()
                .col_expr(
                    campaign::Column::Status,
                    Expr::val(CampaignStatus::Completed.as_ref()),
                )
                .col_expr(campaign::Column::CompletedAt, Expr::val(now))
                .filter(campaign::Column::Id.eq(campaign_id))
                .filter(campaign::Column::Status.eq(CampaignStatus::Sending.as_ref()))
                .exec(db)
                .await
        })
        .await?;

        Ok(result.rows_affected == 1)
    }

    /// 暂停活动，返回暂停前的状态
    ///
    /// 只有 Sending 可以暂停；已暂停时原样返回。
    pub async fn pause_campaign(&self, campaign_id: &str) -> Result<CampaignStatus> {
        let txn = self.db.begin().await?;

        let current = self.lock_status(&txn, campaign_id).await?;
        match current {
            CampaignStatus::Sending => {
                campaign::Entity::update_many()
                    .col_expr(
                        campaign::Column::Status,
                        Expr::val(CampaignStatus::Paused.as_ref()),
                    )
                    .filter(campaign::Column::Id.eq(campaign_id))
                    .exec(&txn)
                    .await?;
            }
            CampaignStatus::Paused => {}
            other => {
                return Err(MailshotError::invalid_state(format!(
                    "Campaign {} is {} and cannot be paused.",
                    campaign_id, other
                )));
            }
        }

        txn.commit().await?;
        info!("Campaign {} paused (was {})", campaign_id, current);
        Ok(current)
    }

    /// 恢复发送，返回恢复前的状态
    ///
    /// Paused 回到 Sending 并刷新开始时间；Sending 原样返回，仅用于重新触发协调器。
    /// 从未开始发送的活动没有收件人队列，必须走 kickoff。
    pub async fn resume_campaign(&self, campaign_id: &str) -> Result<CampaignStatus> {
        let txn = self.db.begin().await?;

        let current = self.lock_status(&txn, campaign_id).await?;
        match current {
            CampaignStatus::Paused => {
                campaign::Entity::update_many()
                    .col_expr(
                        campaign::Column::Status,
                        Expr::val(CampaignStatus::Sending.as_ref()),
                    )
                    .col_expr(campaign::Column::StartedSendingAt, Expr::val(Utc::now()))
                    .filter(campaign::Column::Id.eq(campaign_id))
                    .exec(&txn)
                    .await?;
            }
            CampaignStatus::Sending => {}
            other => {
                return Err(MailshotError::invalid_state(format!(
                    "Campaign {} is {} and cannot be resumed.",
                    campaign_id, other
                )));
            }
        }

        txn.commit().await?;
        info!("Campaign {} resumed (was {})", campaign_id, current);
        Ok(current)
    }

    /// 在事务内锁定活动行并读取状态
    async fn lock_status<C: ConnectionTrait>(
        &self,
        conn: &C,
        campaign_id: &str,
    ) -> Result<CampaignStatus> {
        let model = campaign::Entity::find_by_id(campaign_id.to_string())
            .lock_exclusive()
            .one(conn)
            .await?
            .ok_or_else(|| {
                MailshotError::not_found(format!("Campaign {} not found", campaign_id))
            })?;

        parse_status(campaign_id, &model.status)
    }
}

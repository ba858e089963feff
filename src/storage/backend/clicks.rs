//! 幂等点击写入
//!
//! 一次点击在同一个事务里完成：
//! 1. 以 idempotency_key 插入原始事件，唯一约束冲突即为重复点击
//! 2. 首次点击时创建 (campaign, recipient) 汇总行
//! 3. 累加活动、短链与收件人的计数，并维护首次/最近点击时间
//!
//! 计数全部用数据库内表达式更新，不做读后写。

use chrono::{DateTime, Utc};
use sea_orm::sea_query::{CaseStatement, Expr, IntoColumnRef, OnConflict, Query};
use sea_orm::{
    ActiveValue::Set, ConnectionTrait, DbErr, EntityTrait, ExprTrait, SqlErr, TransactionTrait,
};
use tracing::{debug, trace};

use super::SeaOrmStorage;
use super::retry;
use crate::errors::Result;
use crate::tracking::ClickInput;

use migration::entities::{campaign, campaign_link, campaign_recipient, click_event};

/// 点击写入结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordedClick {
    Inserted { first_for_recipient: bool },
    Duplicate,
}

/// 为空时写入 `at`，否则保持原值
fn first_if_null<C: IntoColumnRef + Copy>(col: C, at: DateTime<Utc>) -> CaseStatement {
    CaseStatement::new()
        .case(Expr::col(col).is_null(), Expr::val(at))
        .finally(Expr::col(col))
}

/// 取原值与 `at` 的较大者（SQLite 没有 GREATEST）
fn latest_of<C: IntoColumnRef + Copy>(col: C, at: DateTime<Utc>) -> CaseStatement {
    CaseStatement::new()
        .case(
            Expr::col(col).is_null().or(Expr::col(col).lt(Expr::val(at))),
            Expr::val(at),
        )
        .finally(Expr::col(col))
}

impl SeaOrmStorage {
    /// 写入一次点击
    ///
    /// `idempotency_key` 相同的第二次写入返回 `Duplicate`，且不改变任何计数。
    pub async fn record_click(
        &self,
        input: &ClickInput,
        idempotency_key: &str,
    ) -> Result<RecordedClick> {
        let recorded = retry::with_retry("record_click", self.retry_config, || {
            self.record_click_once(input, idempotency_key)
        })
        .await?;

        debug!(
            "Click on link {} by recipient {}: {:?}",
            input.link_id, input.recipient_id, recorded
        );
        Ok(recorded)
    }

    async fn record_click_once(
        &self,
        input: &ClickInput,
        idempotency_key: &str,
    ) -> std::result::Result<RecordedClick, DbErr> {
        let txn = self.db.begin().await?;
        let now = Utc::now();
        let at = input.occurred_at;

        let event = click_event::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            campaign_id: Set(input.campaign_id.clone()),
            recipient_id: Set(input.recipient_id.clone()),
            link_id: Set(input.link_id.clone()),
            occurred_at: Set(at),
            ip_address: Set(input.ip_address.clone()),
            user_agent: Set(input.user_agent.clone()),
            referrer: Set(input.referrer.clone()),
            source: Set(input.source.as_ref().to_string()),
            idempotency_key: Set(Some(idempotency_key.to_string())),
            created_at: Set(now),
        };

        if let Err(e) = click_event::Entity::insert(event)
            .exec_without_returning(&txn)
            .await
        {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                txn.rollback().await?;
                trace!("Duplicate click key {}", idempotency_key);
                return Ok(RecordedClick::Duplicate);
            }
            return Err(e);
        }

        let summary = campaign_recipient::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            campaign_id: Set(input.campaign_id.clone()),
            recipient_id: Set(input.recipient_id.clone()),
            clicks_count: Set(0),
            first_clicked_at: Set(None),
            last_clicked_at: Set(None),
            created_at: Set(now),
        };
        let created = campaign_recipient::Entity::insert(summary)
            .on_conflict(
                OnConflict::columns([
                    campaign_recipient::Column::CampaignId,
                    campaign_recipient::Column::RecipientId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;
        let first_for_recipient = created == 1;
        let unique_inc = i64::from(first_for_recipient);

        let campaign_stmt = Query::update()
            .table(campaign::Entity)
            .value(
                campaign::Column::ClickCount,
                Expr::col(campaign::Column::ClickCount).add(Expr::val(1i64)),
            )
            .value(
                campaign::Column::UniqueClickCount,
                Expr::col(campaign::Column::UniqueClickCount).add(Expr::val(unique_inc)),
            )
            .value(
                campaign::Column::FirstClickAt,
                first_if_null(campaign::Column::FirstClickAt, at),
            )
            .value(
                campaign::Column::LastClickAt,
                latest_of(campaign::Column::LastClickAt, at),
            )
            .and_where(Expr::col(campaign::Column::Id).eq(input.campaign_id.as_str()))
            .to_owned();
        txn.execute(&campaign_stmt).await?;

        let link_stmt = Query::update()
            .table(campaign_link::Entity)
            .value(
                campaign_link::Column::ClickCount,
                Expr::col(campaign_link::Column::ClickCount).add(Expr::val(1i64)),
            )
            .value(
                campaign_link::Column::UniqueClickCount,
                Expr::col(campaign_link::Column::UniqueClickCount).add(Expr::val(unique_inc)),
            )
            .value(
                campaign_link::Column::FirstClickedAt,
                first_if_null(campaign_link::Column::FirstClickedAt, at),
            )
            .value(
                campaign_link::Column::LastClickedAt,
                latest_of(campaign_link::Column::LastClickedAt, at),
            )
            .and_where(Expr::col(campaign_link::Column::Id).eq(input.link_id.as_str()))
            .to_owned();
        txn.execute(&link_stmt).await?;

        let recipient_stmt = Query::update()
            .table(campaign_recipient::Entity)
            .value(
                campaign_recipient::Column::ClicksCount,
                Expr::col(campaign_recipient::Column::ClicksCount).add(Expr::val(1i64)),
            )
            .value(
                campaign_recipient::Column::FirstClickedAt,
                first_if_null(campaign_recipient::Column::FirstClickedAt, at),
            )
            .value(
                campaign_recipient::Column::LastClickedAt,
                latest_of(campaign_recipient::Column::LastClickedAt, at),
            )
            .and_where(
                Expr::col(campaign_recipient::Column::CampaignId).eq(input.campaign_id.as_str()),
            )
            .and_where(
                Expr::col(campaign_recipient::Column::RecipientId).eq(input.recipient_id.as_str()),
            )
            .to_owned();
        txn.execute(&recipient_stmt).await?;

        txn.commit().await?;
        Ok(RecordedClick::Inserted {
            first_for_recipient,
        })
    }
}

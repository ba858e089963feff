//! 收件人解析
//!
//! 受众中的联系人按创建顺序读取，邮件地址去空白、转小写后去重。
//! 去重放在应用层做，避免依赖各数据库 DISTINCT + ORDER BY 的差异。

use std::collections::{HashMap, HashSet};

use sea_orm::sea_query::{Expr, Func};
use sea_orm::{ColumnTrait, EntityTrait, ExprTrait, QueryFilter, QueryOrder, QuerySelect};
use tracing::debug;

use super::SeaOrmStorage;
use crate::errors::Result;
use crate::storage::models::Campaign;

use migration::entities::contact;

/// 订阅状态常量
pub const SUBSCRIBED: &str = "subscribed";

/// 邮件地址规范化：去首尾空白并转小写，空字符串视为无效
pub fn normalize_email(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

impl SeaOrmStorage {
    /// 解析活动的去重收件人列表，保持受众中的顺序
    pub async fn resolve_recipients(&self, campaign: &Campaign) -> Result<Vec<String>> {
        let mut query = contact::Entity::find()
            .filter(contact::Column::AudienceId.eq(campaign.audience_id.as_str()))
            .filter(contact::Column::EmailAddress.is_not_null());

        if campaign.exclude_unsubscribed {
            query = query.filter(contact::Column::Status.eq(SUBSCRIBED));
        }

        let raw: Vec<Option<String>> = query
            .select_only()
            .column(contact::Column::EmailAddress)
            .order_by_asc(contact::Column::CreatedAt)
            .order_by_asc(contact::Column::Id)
            .into_tuple()
            .all(&self.db)
            .await?;

        let mut seen = HashSet::with_capacity(raw.len());
        let recipients: Vec<String> = raw
            .into_iter()
            .flatten()
            .filter_map(|email| normalize_email(&email))
            .filter(|email| seen.insert(email.clone()))
            .collect();

        debug!(
            "Resolved {} distinct recipients for campaign {}",
            recipients.len(),
            campaign.id
        );
        Ok(recipients)
    }

    /// 预计收件人数
    pub async fn estimate_recipients(&self, campaign: &Campaign) -> Result<u64> {
        Ok(self.resolve_recipients(campaign).await?.len() as u64)
    }

    /// 批量把邮件地址映射到受众内的联系人 ID
    ///
    /// 同一地址出现多次时取最早创建的联系人。
    pub async fn contact_ids_by_email(
        &self,
        audience_id: &str,
        emails: &[String],
    ) -> Result<HashMap<String, String>> {
        let wanted: Vec<String> = emails.iter().filter_map(|e| normalize_email(e)).collect();
        if wanted.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(String, Option<String>)> = contact::Entity::find()
            .filter(contact::Column::AudienceId.eq(audience_id))
            .filter(Expr::expr(Func::lower(Expr::col(contact::Column::EmailAddress))).is_in(wanted))
            .select_only()
            .column(contact::Column::Id)
            .column(contact::Column::EmailAddress)
            .order_by_asc(contact::Column::CreatedAt)
            .order_by_asc(contact::Column::Id)
            .into_tuple()
            .all(&self.db)
            .await?;

        let mut mapping = HashMap::with_capacity(rows.len());
        for (id, email) in rows {
            if let Some(email) = email.as_deref().and_then(normalize_email) {
                mapping.entry(email).or_insert(id);
            }
        }
        Ok(mapping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(
            normalize_email("  Alice@Example.COM "),
            Some("alice@example.com".to_string())
        );
        assert_eq!(normalize_email("   "), None);
        assert_eq!(normalize_email(""), None);
    }
}

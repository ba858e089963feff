use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::errors::{MailshotError, Result};
use migration::entities::{campaign, campaign_link};

/// 活动生命周期状态
///
/// 数据库中以 snake_case 字符串存储。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CampaignStatus {
    Draft,
    Scheduled,
    Sending,
    Paused,
    Completed,
    Canceled,
    Failed,
}

impl CampaignStatus {
    /// 允许启动发送的状态
    pub fn can_kickoff(self) -> bool {
        matches!(self, CampaignStatus::Draft | CampaignStatus::Scheduled)
    }

    pub fn parse(value: &str) -> Option<Self> {
        value.parse().ok()
    }
}

/// 发送所需的活动快照
#[derive(Debug, Clone, Serialize)]
pub struct Campaign {
    pub id: String,
    pub title: String,
    pub status: CampaignStatus,
    pub audience_id: String,
    pub exclude_unsubscribed: bool,
    pub estimated_recipients: i64,
    pub emails_sent: i64,
    pub subject_line: String,
    pub from_name: String,
    pub from_email: String,
    pub reply_to: String,
    #[serde(skip)]
    pub content_text: String,
    #[serde(skip)]
    pub compiled_html: String,
    pub compiled_at: Option<DateTime<Utc>>,
    pub started_sending_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub click_count: i64,
    pub unique_click_count: i64,
}

impl Campaign {
    /// 编译后的正文；尚未编译时返回 None
    pub fn content(&self) -> Option<CampaignContent> {
        if self.compiled_html.trim().is_empty() {
            return None;
        }
        Some(CampaignContent {
            html: self.compiled_html.clone(),
            text: self.content_text.clone(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct CampaignContent {
    pub html: String,
    pub text: String,
}

/// 短链 token 解析结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkTarget {
    pub link_id: String,
    pub campaign_id: String,
    pub original_url: String,
}

impl From<campaign_link::Model> for LinkTarget {
    fn from(model: campaign_link::Model) -> Self {
        Self {
            link_id: model.id,
            campaign_id: model.campaign_id,
            original_url: model.original_url,
        }
    }
}

/// 解析数据库中的状态字符串，无法识别时报告为数据库错误
pub fn parse_status(campaign_id: &str, raw: &str) -> Result<CampaignStatus> {
    CampaignStatus::parse(raw).ok_or_else(|| {
        MailshotError::database_operation(format!(
            "Campaign {} has unknown status '{}'",
            campaign_id, raw
        ))
    })
}

pub fn model_to_campaign(model: campaign::Model) -> Result<Campaign> {
    let status = parse_status(&model.id, &model.status)?;

    Ok(Campaign {
        id: model.id,
        title: model.title,
        status,
        audience_id: model.audience_id,
        exclude_unsubscribed: model.exclude_unsubscribed,
        estimated_recipients: model.estimated_recipients,
        emails_sent: model.emails_sent,
        subject_line: model.subject_line,
        from_name: model.from_name,
        from_email: model.from_email,
        reply_to: model.reply_to,
        content_text: model.content_text,
        compiled_html: model.compiled_html,
        compiled_at: model.compiled_at,
        started_sending_at: model.started_sending_at,
        completed_at: model.completed_at,
        click_count: model.click_count,
        unique_click_count: model.unique_click_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_string_form() {
        assert_eq!(CampaignStatus::Sending.as_ref(), "sending");
        assert_eq!(CampaignStatus::parse("paused"), Some(CampaignStatus::Paused));
        assert_eq!(CampaignStatus::parse("archived"), None);
    }

    #[test]
    fn test_unknown_status_is_database_error() {
        let err = parse_status("c1", "archived").unwrap_err();
        assert!(matches!(err, MailshotError::DatabaseOperation(_)));
        assert_eq!(parse_status("c1", "sending").unwrap(), CampaignStatus::Sending);
    }

    #[test]
    fn test_can_kickoff() {
        assert!(CampaignStatus::Draft.can_kickoff());
        assert!(CampaignStatus::Scheduled.can_kickoff());
        assert!(!CampaignStatus::Sending.can_kickoff());
        assert!(!CampaignStatus::Paused.can_kickoff());
        assert!(!CampaignStatus::Completed.can_kickoff());
    }
}

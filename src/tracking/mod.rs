//! 点击追踪
//!
//! 重定向端点把每次点击转成 `ClickInput`，由 `ClickRecorder` 幂等写入。
//! 同一收件人在同一时间桶内对同一链接的重复点击只记一次。

pub mod bot;
pub mod idempotency;
pub mod links;
pub mod recorder;

pub use bot::BotDetector;
pub use idempotency::{bucket_start, idempotency_key};
pub use links::LinkResolver;
pub use recorder::ClickRecorder;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// 点击来源
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ClickSource {
    #[default]
    Redirect,
    Webhook,
    Test,
}

/// 一次点击的完整描述
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickInput {
    pub campaign_id: String,
    pub recipient_id: String,
    pub link_id: String,
    pub occurred_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: String,
    pub referrer: String,
    pub source: ClickSource,
    /// false 表示疑似机器人，直接丢弃
    pub count: bool,
}

/// 点击处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum ClickOutcome {
    /// 新事件已写入
    Recorded { unique_recipient: bool },
    /// 同一时间桶内的重复点击
    Duplicate,
    /// 被标记为不计数
    Dropped,
}

/// 按字符数截断，保证不截断在 UTF-8 字符中间
pub fn truncate_chars(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((idx, _)) => value[..idx].to_string(),
        None => value.to_string(),
    }
}

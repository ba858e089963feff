//! 邮件构建与发送
//!
//! `MailTransport` 是发送通道的抽象：
//! - `SmtpTransport`: lettre 异步 SMTP，连接池在所有 worker 间共享
//! - `LogTransport`: 只记录日志，开发环境使用
//! - `RecordingTransport`: 保存到内存，测试使用

mod log;
mod message;
mod recording;
mod smtp;

pub use self::log::LogTransport;
pub use self::message::{OutboundMessage, build_message, html_to_text};
pub use self::recording::RecordingTransport;
pub use self::smtp::SmtpTransport;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::config::MailConfig;
use crate::errors::{MailshotError, Result};

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<()>;

    fn name(&self) -> &'static str;
}

/// 根据配置创建发送通道
pub fn create_transport(config: &MailConfig) -> Result<Arc<dyn MailTransport>> {
    let transport: Arc<dyn MailTransport> = match config.transport.to_lowercase().as_str() {
        "smtp" => Arc::new(SmtpTransport::new(&config.smtp)?),
        "log" => Arc::new(LogTransport),
        other => {
            return Err(MailshotError::validation(format!(
                "Unsupported mail transport: {}. Supported: smtp, log",
                other
            )));
        }
    };
    info!("Using {} mail transport", transport.name());
    Ok(transport)
}

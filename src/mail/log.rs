use async_trait::async_trait;
use tracing::info;

use super::{MailTransport, OutboundMessage};
use crate::errors::Result;

/// 不真正发信，只输出一行日志
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTransport;

#[async_trait]
impl MailTransport for LogTransport {
    async fn send(&self, message: &OutboundMessage) -> Result<()> {
        info!(
            target: "mailshot::mail",
            from = %message.from,
            to = %message.to,
            subject = %message.subject,
            html_bytes = message.html_body.len(),
            "would send email"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

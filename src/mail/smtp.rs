use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::PoolConfig;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;
use tracing::{debug, info};

use super::{MailTransport, OutboundMessage};
use crate::config::SmtpConfig;
use crate::errors::{MailshotError, Result};

/// lettre 异步 SMTP 发送
///
/// 内部连接池在克隆之间共享，整个进程只构建一次。
#[derive(Clone)]
pub struct SmtpTransport {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpTransport {
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let host = config.host.trim();
        if host.is_empty() {
            return Err(MailshotError::validation("SMTP host must not be empty"));
        }

        let mut builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
        };

        builder = builder
            .port(config.port)
            .timeout(Some(Duration::from_secs(config.timeout_secs)))
            .pool_config(PoolConfig::new().max_size(config.pool_size.max(1)));

        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        info!(
            "SMTP transport configured for {}:{} (starttls: {}, pool: {})",
            host, config.port, config.starttls, config.pool_size
        );
        Ok(Self {
            mailer: builder.build(),
        })
    }

    fn to_message(message: &OutboundMessage) -> Result<Message> {
        let from: Mailbox = message.from.parse()?;
        let to: Mailbox = message.to.parse()?;

        let mut builder = Message::builder()
            .from(from)
            .to(to)
            .subject(message.subject.clone());

        if let Some(reply_to) = &message.reply_to {
            builder = builder.reply_to(reply_to.parse()?);
        }

        Ok(builder.multipart(MultiPart::alternative_plain_html(
            message.text_body.clone(),
            message.html_body.clone(),
        ))?)
    }
}

#[async_trait]
impl MailTransport for SmtpTransport {
    async fn send(&self, message: &OutboundMessage) -> Result<()> {
        let email = Self::to_message(message)?;
        let response = self.mailer.send(email).await?;
        debug!(
            "SMTP accepted message to {}: {}",
            message.to,
            response.code()
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}

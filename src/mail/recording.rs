use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

use super::{MailTransport, OutboundMessage};
use crate::errors::{MailshotError, Result};

/// 把发送的邮件保存在内存里
///
/// 可以指定一组地址，发往这些地址时返回发送错误。
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
    failing: Arc<Mutex<HashSet<String>>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_for(&self, address: impl Into<String>) {
        self.failing.lock().insert(address.into());
    }

    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().clone()
    }

    pub fn sent_to(&self) -> Vec<String> {
        self.sent.lock().iter().map(|m| m.to.clone()).collect()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().len()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, message: &OutboundMessage) -> Result<()> {
        if self.failing.lock().contains(&message.to) {
            return Err(MailshotError::mail_transport(format!(
                "Recipient {} rejected",
                message.to
            )));
        }
        self.sent.lock().push(message.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

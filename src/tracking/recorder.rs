use std::sync::Arc;
use tracing::debug;

use super::{ClickInput, ClickOutcome, idempotency_key};
use crate::errors::Result;
use crate::storage::{RecordedClick, SeaOrmStorage};

/// 幂等点击记录器
#[derive(Clone)]
pub struct ClickRecorder {
    storage: Arc<SeaOrmStorage>,
    bucket_secs: u64,
}

impl ClickRecorder {
    pub fn new(storage: Arc<SeaOrmStorage>, bucket_secs: u64) -> Self {
        Self {
            storage,
            bucket_secs,
        }
    }

    pub async fn record(&self, input: &ClickInput) -> Result<ClickOutcome> {
        if !input.count {
            debug!(
                "Dropping uncounted click on link {} by {}",
                input.link_id, input.recipient_id
            );
            return Ok(ClickOutcome::Dropped);
        }

        let key = idempotency_key(
            &input.recipient_id,
            &input.link_id,
            input.occurred_at,
            self.bucket_secs,
        );

        let outcome = match self.storage.record_click(input, &key).await? {
            RecordedClick::Inserted {
                first_for_recipient,
            } => ClickOutcome::Recorded {
                unique_recipient: first_for_recipient,
            },
            RecordedClick::Duplicate => ClickOutcome::Duplicate,
        };
        Ok(outcome)
    }
}

use std::sync::Arc;

use crate::errors::Result;
use crate::store::{KeySpace, KvStore};

/// 每个活动在途 chunk 数
///
/// 调度时递增，chunk 结束时递减；递减结果钳制在 0。
#[derive(Clone)]
pub struct InflightCounter {
    store: Arc<dyn KvStore>,
    keys: KeySpace,
}

impl InflightCounter {
    pub fn new(store: Arc<dyn KvStore>, keys: KeySpace) -> Self {
        Self { store, keys }
    }

    pub async fn get(&self, campaign_id: &str) -> Result<i64> {
        self.store.get_i64(&self.keys.inflight(campaign_id)).await
    }

    pub async fn increment(&self, campaign_id: &str) -> Result<i64> {
        self.store.incr(&self.keys.inflight(campaign_id)).await
    }

    pub async fn decrement(&self, campaign_id: &str) -> Result<i64> {
        self.store
            .decr_floor_zero(&self.keys.inflight(campaign_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_counter_never_negative() {
        let counter = InflightCounter::new(Arc::new(MemoryStore::new()), KeySpace::default());
        assert_eq!(counter.get("c").await.unwrap(), 0);
        assert_eq!(counter.increment("c").await.unwrap(), 1);
        assert_eq!(counter.increment("c").await.unwrap(), 2);
        assert_eq!(counter.decrement("c").await.unwrap(), 1);
        assert_eq!(counter.decrement("c").await.unwrap(), 0);
        assert_eq!(counter.decrement("c").await.unwrap(), 0);
    }
}

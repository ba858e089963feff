use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

use crate::errors::Result;
use crate::storage::{LinkTarget, SeaOrmStorage};

/// token -> 链接 的读穿缓存
///
/// 链接一旦生成就不再变化，只缓存命中结果；未知 token 每次都查库。
pub struct LinkResolver {
    storage: Arc<SeaOrmStorage>,
    cache: Cache<String, LinkTarget>,
}

impl LinkResolver {
    pub fn new(storage: Arc<SeaOrmStorage>, ttl: Duration, capacity: u64) -> Self {
        Self {
            storage,
            cache: Cache::builder()
                .time_to_live(ttl)
                .max_capacity(capacity)
                .build(),
        }
    }

    pub async fn resolve(&self, token: &str) -> Result<Option<LinkTarget>> {
        if let Some(link) = self.cache.get(token).await {
            trace!("Link cache hit: {}", token);
            return Ok(Some(link));
        }

        let link = self.storage.find_link_by_token(token).await?;
        if let Some(ref link) = link {
            self.cache.insert(token.to_string(), link.clone()).await;
        }
        Ok(link)
    }
}

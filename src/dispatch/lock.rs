use std::sync::Arc;
use std::time::Duration;
use tracing::{trace, warn};

use crate::errors::Result;
use crate::store::KvStore;

/// 带过期时间的互斥锁
///
/// 获取时写入随机令牌，释放时只删除自己的令牌，
/// 过期后被他人重新获取的锁不会被误删。
#[derive(Clone)]
pub struct DistributedLock {
    store: Arc<dyn KvStore>,
}

/// 已持有的锁
#[derive(Debug, Clone)]
pub struct LockGuard {
    key: String,
    token: String,
}

impl LockGuard {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl DistributedLock {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// 非阻塞获取；已被持有时返回 None
    pub async fn try_acquire(&self, key: &str, ttl: Duration) -> Result<Option<LockGuard>> {
        let token = uuid::Uuid::new_v4().to_string();
        if self.store.set_nx_ex(key, &token, ttl).await? {
            trace!("Lock acquired: {}", key);
            Ok(Some(LockGuard {
                key: key.to_string(),
                token,
            }))
        } else {
            trace!("Lock busy: {}", key);
            Ok(None)
        }
    }

    /// 释放锁；令牌不匹配（已过期并被他人持有）时不做任何事
    pub async fn release(&self, guard: LockGuard) -> Result<bool> {
        let released = self
            .store
            .delete_if_equals(&guard.key, &guard.token)
            .await?;
        if !released {
            warn!(
                "Lock {} expired before release; it is now held by someone else or free",
                guard.key
            );
        }
        Ok(released)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_exclusive_until_released() {
        let lock = DistributedLock::new(Arc::new(MemoryStore::new()));
        let ttl = Duration::from_secs(15);

        let guard = lock.try_acquire("lock:a", ttl).await.unwrap().unwrap();
        assert!(lock.try_acquire("lock:a", ttl).await.unwrap().is_none());
        assert!(lock.try_acquire("lock:b", ttl).await.unwrap().is_some());

        assert!(lock.release(guard).await.unwrap());
        assert!(lock.try_acquire("lock:a", ttl).await.unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_guard_does_not_release_new_holder() {
        let lock = DistributedLock::new(Arc::new(MemoryStore::new()));

        let stale = lock
            .try_acquire("lock:a", Duration::from_secs(1))
            .await
            .unwrap()
            .unwrap();
        tokio::time::advance(Duration::from_secs(2)).await;

        let fresh = lock
            .try_acquire("lock:a", Duration::from_secs(15))
            .await
            .unwrap()
            .unwrap();
        assert!(!lock.release(stale).await.unwrap());
        assert!(lock.try_acquire("lock:a", Duration::from_secs(15)).await.unwrap().is_none());
        assert!(lock.release(fresh).await.unwrap());
    }
}

use async_trait::async_trait;
use redis::{AsyncCommands, Script, aio::ConnectionManager};
use std::num::NonZeroUsize;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, error};

use super::KvStore;
use crate::errors::{MailshotError, Result};

/// DECR 后钳制为 0
static DECR_FLOOR_ZERO: LazyLock<Script> = LazyLock::new(|| {
    Script::new(
        r#"
        local v = redis.call('DECR', KEYS[1])
        if v < 0 then
            redis.call('SET', KEYS[1], 0)
            return 0
        end
        return v
        "#,
    )
});

/// 仅当持有者令牌匹配时释放锁
static COMPARE_AND_DELETE: LazyLock<Script> = LazyLock::new(|| {
    Script::new(
        r#"
        if redis.call('GET', KEYS[1]) == ARGV[1] then
            return redis.call('DEL', KEYS[1])
        end
        return 0
        "#,
    )
});

/// Redis 后端
///
/// `ConnectionManager` 在断线后自动重连，克隆开销很小。
pub struct RedisStore {
    manager: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(|e| {
            MailshotError::store_connection(format!("Invalid Redis URL '{}': {}", url, e))
        })?;

        let mut manager = ConnectionManager::new(client).await.map_err(|e| {
            error!(
                "Failed to connect to Redis: {}. Check Redis server status and URL: {}",
                e, url
            );
            MailshotError::store_connection(format!("Redis connection failed: {}", e))
        })?;

        let response: String = redis::cmd("PING")
            .query_async(&mut manager)
            .await
            .map_err(|e| MailshotError::store_connection(format!("Redis ping failed: {}", e)))?;
        debug!("Redis connection test successful: {}", response);

        Ok(Self { manager })
    }

    fn conn(&self) -> ConnectionManager {
        self.manager.clone()
    }
}

#[async_trait]
impl KvStore for RedisStore {
    async fn list_replace(
        &self,
        list_key: &str,
        values: &[String],
        counter_key: &str,
    ) -> Result<()> {
        let mut conn = self.conn();
        let mut pipe = redis::pipe();
        pipe.atomic()
            .del(list_key)
            .ignore()
            .del(counter_key)
            .ignore();
        if !values.is_empty() {
            pipe.rpush(list_key, values).ignore();
        }
        pipe.set(counter_key, 0).ignore();
        pipe.query_async::<()>(&mut conn).await?;
        Ok(())
    }

    async fn list_pop_front(&self, key: &str, count: usize) -> Result<Vec<String>> {
        let Some(count) = NonZeroUsize::new(count) else {
            return Ok(Vec::new());
        };
        let mut conn = self.conn();
        let popped: Option<Vec<String>> = conn.lpop(key, Some(count)).await?;
        Ok(popped.unwrap_or_default())
    }

    async fn list_push_front(&self, key: &str, values: &[String]) -> Result<()> {
        if values.is_empty() {
            return Ok(());
        }
        // LPUSH 逐个插入头部，反转后整体顺序保持不变
        let reversed: Vec<&String> = values.iter().rev().collect();
        let mut conn = self.conn();
        conn.lpush::<_, _, ()>(key, reversed).await?;
        Ok(())
    }

    async fn list_push_back(&self, key: &str, values: &[String]) -> Result<()> {
        if values.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn();
        conn.rpush::<_, _, ()>(key, values).await?;
        Ok(())
    }

    async fn list_len(&self, key: &str) -> Result<u64> {
        let mut conn = self.conn();
        let len: u64 = conn.llen(key).await?;
        Ok(len)
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        let mut conn = self.conn();
        let value: i64 = conn.incr(key, 1).await?;
        Ok(value)
    }

    async fn decr_floor_zero(&self, key: &str) -> Result<i64> {
        let mut conn = self.conn();
        let value: i64 = DECR_FLOOR_ZERO.key(key).invoke_async(&mut conn).await?;
        Ok(value)
    }

    async fn get_i64(&self, key: &str) -> Result<i64> {
        let mut conn = self.conn();
        let value: Option<i64> = conn.get(key).await?;
        Ok(value.unwrap_or(0))
    }

    async fn set_nx_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        let mut conn = self.conn();
        let ttl_ms = ttl.as_millis().max(1) as u64;
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("PX")
            .arg(ttl_ms)
            .query_async(&mut conn)
            .await?;
        Ok(reply.is_some())
    }

    async fn delete_if_equals(&self, key: &str, value: &str) -> Result<bool> {
        let mut conn = self.conn();
        let deleted: i64 = COMPARE_AND_DELETE
            .key(key)
            .arg(value)
            .invoke_async(&mut conn)
            .await?;
        Ok(deleted > 0)
    }

    async fn delete(&self, keys: &[String]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn();
        conn.del::<_, ()>(keys).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

//! 共享键值存储
//!
//! 调度状态（收件人队列、在途计数、分布式锁、任务队列）都放在这里，
//! 而不是关系型数据库中。每个操作在后端上都是原子的：
//! - `redis`: 多进程部署，单条命令或 Lua 脚本保证原子性
//! - `memory`: 单进程部署与测试，一把互斥锁保护全部数据

mod keys;
mod memory;
mod redis;

pub use self::keys::KeySpace;
pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::StaticConfig;
use crate::errors::{MailshotError, Result};

#[async_trait]
pub trait KvStore: Send + Sync {
    /// 原子地替换列表内容，并把计数器重置为 0
    async fn list_replace(&self, list_key: &str, values: &[String], counter_key: &str)
    -> Result<()>;

    /// 从列表头部弹出最多 `count` 个元素
    async fn list_pop_front(&self, key: &str, count: usize) -> Result<Vec<String>>;

    /// 把元素按原顺序放回列表头部
    async fn list_push_front(&self, key: &str, values: &[String]) -> Result<()>;

    async fn list_push_back(&self, key: &str, values: &[String]) -> Result<()>;

    async fn list_len(&self, key: &str) -> Result<u64>;

    async fn incr(&self, key: &str) -> Result<i64>;

    /// 自减，结果小于 0 时钳制为 0
    async fn decr_floor_zero(&self, key: &str) -> Result<i64>;

    /// 读取整数值，不存在时为 0
    async fn get_i64(&self, key: &str) -> Result<i64>;

    /// 仅当键不存在时写入，并设置过期时间
    async fn set_nx_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<bool>;

    /// 仅当当前值等于 `value` 时删除
    async fn delete_if_equals(&self, key: &str, value: &str) -> Result<bool>;

    async fn delete(&self, keys: &[String]) -> Result<()>;

    fn backend_name(&self) -> &'static str;
}

/// 根据配置创建共享存储
pub async fn create_store(config: &StaticConfig) -> Result<Arc<dyn KvStore>> {
    let backend = config.store.backend.to_lowercase();
    let store: Arc<dyn KvStore> = match backend.as_str() {
        "redis" => Arc::new(RedisStore::connect(&config.redis.url).await?),
        "memory" => Arc::new(MemoryStore::new()),
        other => {
            return Err(MailshotError::validation(format!(
                "Unsupported store backend: {}. Supported: redis, memory",
                other
            )));
        }
    };
    info!("Using {} store backend", store.backend_name());
    Ok(store)
}

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::time::Instant;

use super::KvStore;
use crate::errors::{MailshotError, Result};

#[derive(Debug, Clone)]
enum Entry {
    List(VecDeque<String>),
    Int(i64),
    Text {
        value: String,
        expires_at: Option<Instant>,
    },
}

/// 进程内存储，单进程部署和测试使用
///
/// 所有操作都在同一把锁内完成，因此与 Redis 后端一样是原子的。
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn wrong_type(key: &str, expected: &str) -> MailshotError {
        MailshotError::store_operation(format!(
            "WRONGTYPE key '{}' does not hold a {}",
            key, expected
        ))
    }

    /// 清理已过期的文本键
    fn purge_expired(data: &mut HashMap<String, Entry>, key: &str) {
        let expired = matches!(
            data.get(key),
            Some(Entry::Text {
                expires_at: Some(at),
                ..
            }) if *at <= Instant::now()
        );
        if expired {
            data.remove(key);
        }
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn list_replace(
        &self,
        list_key: &str,
        values: &[String],
        counter_key: &str,
    ) -> Result<()> {
        let mut data = self.data.lock();
        data.remove(list_key);
        if !values.is_empty() {
            data.insert(
                list_key.to_string(),
                Entry::List(values.iter().cloned().collect()),
            );
        }
        data.insert(counter_key.to_string(), Entry::Int(0));
        Ok(())
    }

    async fn list_pop_front(&self, key: &str, count: usize) -> Result<Vec<String>> {
        let mut data = self.data.lock();
        let (popped, now_empty) = match data.get_mut(key) {
            None => return Ok(Vec::new()),
            Some(Entry::List(list)) => {
                let take = count.min(list.len());
                let popped: Vec<String> = list.drain(..take).collect();
                (popped, list.is_empty())
            }
            Some(_) => return Err(Self::wrong_type(key, "list")),
        };
        // 与 Redis 一致：空列表即不存在
        if now_empty {
            data.remove(key);
        }
        Ok(popped)
    }

    async fn list_push_front(&self, key: &str, values: &[String]) -> Result<()> {
        if values.is_empty() {
            return Ok(());
        }
        let mut data = self.data.lock();
        let entry = data
            .entry(key.to_string())
            .or_insert_with(|| Entry::List(VecDeque::new()));
        match entry {
            Entry::List(list) => {
                for value in values.iter().rev() {
                    list.push_front(value.clone());
                }
                Ok(())
            }
            _ => Err(Self::wrong_type(key, "list")),
        }
    }

    async fn list_push_back(&self, key: &str, values: &[String]) -> Result<()> {
        if values.is_empty() {
            return Ok(());
        }
        let mut data = self.data.lock();
        let entry = data
            .entry(key.to_string())
            .or_insert_with(|| Entry::List(VecDeque::new()));
        match entry {
            Entry::List(list) => {
                list.extend(values.iter().cloned());
                Ok(())
            }
            _ => Err(Self::wrong_type(key, "list")),
        }
    }

    async fn list_len(&self, key: &str) -> Result<u64> {
        let data = self.data.lock();
        match data.get(key) {
            None => Ok(0),
            Some(Entry::List(list)) => Ok(list.len() as u64),
            Some(_) => Err(Self::wrong_type(key, "list")),
        }
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        let mut data = self.data.lock();
        let entry = data.entry(key.to_string()).or_insert(Entry::Int(0));
        match entry {
            Entry::Int(value) => {
                *value += 1;
                Ok(*value)
            }
            _ => Err(Self::wrong_type(key, "integer")),
        }
    }

    async fn decr_floor_zero(&self, key: &str) -> Result<i64> {
        let mut data = self.data.lock();
        let entry = data.entry(key.to_string()).or_insert(Entry::Int(0));
        match entry {
            Entry::Int(value) => {
                *value = (*value - 1).max(0);
                Ok(*value)
            }
            _ => Err(Self::wrong_type(key, "integer")),
        }
    }

    async fn get_i64(&self, key: &str) -> Result<i64> {
        let data = self.data.lock();
        match data.get(key) {
            None => Ok(0),
            Some(Entry::Int(value)) => Ok(*value),
            Some(Entry::Text { value, .. }) => value
                .parse::<i64>()
                .map_err(|_| Self::wrong_type(key, "integer")),
            Some(Entry::List(_)) => Err(Self::wrong_type(key, "integer")),
        }
    }

    async fn set_nx_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        let mut data = self.data.lock();
        Self::purge_expired(&mut data, key);
        if data.contains_key(key) {
            return Ok(false);
        }
        data.insert(
            key.to_string(),
            Entry::Text {
                value: value.to_string(),
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(true)
    }

    async fn delete_if_equals(&self, key: &str, value: &str) -> Result<bool> {
        let mut data = self.data.lock();
        Self::purge_expired(&mut data, key);
        let matches = matches!(
            data.get(key),
            Some(Entry::Text { value: current, .. }) if current == value
        );
        if matches {
            data.remove(key);
        }
        Ok(matches)
    }

    async fn delete(&self, keys: &[String]) -> Result<()> {
        let mut data = self.data.lock();
        for key in keys {
            data.remove(key);
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_replace_resets_list_and_counter() {
        let store = MemoryStore::new();
        store
            .list_push_back("list", &strings(&["stale"]))
            .await
            .unwrap();
        store.incr("counter").await.unwrap();

        store
            .list_replace("list", &strings(&["a", "b", "c"]), "counter")
            .await
            .unwrap();

        assert_eq!(store.list_len("list").await.unwrap(), 3);
        assert_eq!(store.get_i64("counter").await.unwrap(), 0);
        assert_eq!(
            store.list_pop_front("list", 10).await.unwrap(),
            strings(&["a", "b", "c"])
        );
    }

    #[tokio::test]
    async fn test_push_front_keeps_order() {
        let store = MemoryStore::new();
        store
            .list_replace("list", &strings(&["c", "d"]), "counter")
            .await
            .unwrap();
        store
            .list_push_front("list", &strings(&["a", "b"]))
            .await
            .unwrap();

        assert_eq!(
            store.list_pop_front("list", 4).await.unwrap(),
            strings(&["a", "b", "c", "d"])
        );
        assert_eq!(store.list_len("list").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_decr_clamps_at_zero() {
        let store = MemoryStore::new();
        assert_eq!(store.decr_floor_zero("n").await.unwrap(), 0);
        store.incr("n").await.unwrap();
        assert_eq!(store.decr_floor_zero("n").await.unwrap(), 0);
        assert_eq!(store.decr_floor_zero("n").await.unwrap(), 0);
        assert_eq!(store.get_i64("n").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_set_nx_and_compare_delete() {
        let store = MemoryStore::new();
        let ttl = Duration::from_secs(5);
        assert!(store.set_nx_ex("lock", "token-a", ttl).await.unwrap());
        assert!(!store.set_nx_ex("lock", "token-b", ttl).await.unwrap());

        assert!(!store.delete_if_equals("lock", "token-b").await.unwrap());
        assert!(store.delete_if_equals("lock", "token-a").await.unwrap());
        assert!(store.set_nx_ex("lock", "token-b", ttl).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_nx_expires() {
        let store = MemoryStore::new();
        assert!(
            store
                .set_nx_ex("lock", "a", Duration::from_secs(2))
                .await
                .unwrap()
        );
        tokio::time::advance(Duration::from_secs(3)).await;
        assert!(
            store
                .set_nx_ex("lock", "b", Duration::from_secs(2))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_wrong_type_is_error() {
        let store = MemoryStore::new();
        store.incr("n").await.unwrap();
        assert!(store.list_push_back("n", &strings(&["x"])).await.is_err());
    }
}

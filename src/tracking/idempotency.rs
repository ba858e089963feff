use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// 时间桶起点（Unix 秒，向下取整到 `bucket_secs` 的倍数）
pub fn bucket_start(at: DateTime<Utc>, bucket_secs: u64) -> i64 {
    let width = bucket_secs.max(1) as i64;
    at.timestamp().div_euclid(width) * width
}

/// 点击幂等键
///
/// `sha256("{recipient}:{link}:{bucket}")` 的十六进制表示，固定 64 个字符。
pub fn idempotency_key(
    recipient_id: &str,
    link_id: &str,
    at: DateTime<Utc>,
    bucket_secs: u64,
) -> String {
    let raw = format!(
        "{}:{}:{}",
        recipient_id,
        link_id,
        bucket_start(at, bucket_secs)
    );
    let digest = Sha256::digest(raw.as_bytes());
    let mut key = hex::encode(digest);
    key.truncate(64);
    key
}

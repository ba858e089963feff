//! 数据库瞬时错误重试
//!
//! 错误分三类：
//! - 瞬时：连接中断、死锁、锁等待超时、SQLite BUSY/LOCKED，按指数退避重试
//! - 唯一约束冲突：调用方据此判断重复写入，绝不重试
//! - 其他：直接返回

use sea_orm::{DbErr, SqlErr};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::DatabaseConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Transient,
    UniqueViolation,
    Permanent,
}

/// 数据库错误码：MySQL 死锁/锁超时，PostgreSQL 序列化失败/死锁，SQLite BUSY/LOCKED
const TRANSIENT_CODES: [&str; 6] = ["1213", "1205", "40001", "40P01", "5", "6"];

pub fn classify(err: &DbErr) -> ErrorClass {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        return ErrorClass::UniqueViolation;
    }

    match err {
        DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => ErrorClass::Transient,
        DbErr::Exec(runtime) | DbErr::Query(runtime) => classify_runtime(runtime),
        _ => ErrorClass::Permanent,
    }
}

fn classify_runtime(err: &sea_orm::error::RuntimeErr) -> ErrorClass {
    use sea_orm::error::RuntimeErr;

    let message = match err {
        RuntimeErr::SqlxError(sqlx_err) => {
            if let Some(code) = sqlx_err.as_database_error().and_then(|db| db.code())
                && TRANSIENT_CODES.contains(&&*code)
            {
                return ErrorClass::Transient;
            }
            sqlx_err.to_string()
        }
        RuntimeErr::Internal(msg) => msg.clone(),
        #[allow(unreachable_patterns)]
        _ => return ErrorClass::Permanent,
    };
    classify_message(&message.to_lowercase())
}

fn classify_message(message: &str) -> ErrorClass {
    if message.contains("unique constraint") || message.contains("duplicate key") {
        ErrorClass::UniqueViolation
    } else if message.contains("deadlock")
        || message.contains("lock wait timeout")
        || message.contains("database is locked")
        || message.contains("serialization failure")
    {
        ErrorClass::Transient
    } else {
        ErrorClass::Permanent
    }
}

pub fn is_retryable_error(err: &DbErr) -> bool {
    classify(err) == ErrorClass::Transient
}

/// 重试策略
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&DatabaseConfig::default())
    }
}

impl From<&DatabaseConfig> for RetryPolicy {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            max_retries: config.retry_count,
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
            max_delay: Duration::from_millis(config.retry_max_delay_ms),
        }
    }
}

impl RetryPolicy {
    /// 第 `attempt` 次重试前的等待：base * 2^(attempt-1)，封顶后加 0-25% 抖动
    pub fn delay_for(&self, attempt: u32) -> Duration {
        use rand::RngExt;
        let exp = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)));
        let capped = exp.min(self.max_delay);
        let jitter_ms = rand::rng().random_range(0..=capped.as_millis() as u64 / 4);
        capped + Duration::from_millis(jitter_ms)
    }
}

pub async fn with_retry<T, F, Fut>(
    operation: &str,
    policy: RetryPolicy,
    mut run: F,
) -> Result<T, DbErr>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbErr>>,
{
    let mut attempt = 0;
    loop {
        match run().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!(operation, retries = attempt, "database operation recovered");
                }
                return Ok(value);
            }
            Err(e) if attempt < policy.max_retries && is_retryable_error(&e) => {
                attempt += 1;
                let delay = policy.delay_for(attempt);
                warn!(
                    operation,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "transient database error, retrying"
                );
                sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::error::{ConnAcquireErr, RuntimeErr};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast() -> RetryPolicy {
        RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(20),
        }
    }

    #[test]
    fn test_classify() {
        assert_eq!(
            classify(&DbErr::ConnectionAcquire(ConnAcquireErr::Timeout)),
            ErrorClass::Transient
        );
        assert_eq!(
            classify(&DbErr::Exec(RuntimeErr::Internal(
                "database is locked".to_string()
            ))),
            ErrorClass::Transient
        );
        assert_eq!(
            classify(&DbErr::Exec(RuntimeErr::Internal(
                "UNIQUE constraint failed: click_events.idempotency_key".to_string()
            ))),
            ErrorClass::UniqueViolation
        );
        assert_eq!(
            classify(&DbErr::RecordNotFound("campaign".to_string())),
            ErrorClass::Permanent
        );
    }

    #[test]
    fn test_delay_grows_and_caps() {
        let policy = RetryPolicy {
            max_retries: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(300),
        };
        let first = policy.delay_for(1).as_millis();
        let second = policy.delay_for(2).as_millis();
        let capped = policy.delay_for(8).as_millis();
        assert!((100..=125).contains(&first));
        assert!((200..=250).contains(&second));
        assert!((300..=375).contains(&capped));
    }

    #[tokio::test]
    async fn test_recovers_from_busy() {
        let calls = AtomicU32::new(0);
        let result = with_retry("emails_sent", fast(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(DbErr::Exec(RuntimeErr::Internal(
                        "database is locked".to_string(),
                    )))
                } else {
                    Ok(7)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let result: Result<(), DbErr> = with_retry("complete", fast(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(DbErr::ConnectionAcquire(ConnAcquireErr::Timeout)) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_unique_violation_is_returned_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<(), DbErr> = with_retry("insert_click", fast(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(DbErr::Exec(RuntimeErr::Internal(
                    "duplicate key value violates unique constraint".to_string(),
                )))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

use std::time::Duration;
use tokio::signal;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::jobs::WorkerPool;

/// 等待正在执行的任务结束的最长时间（秒）
const SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// 等待 Ctrl+C
pub async fn wait_for_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received, stopping job workers..."),
        Err(e) => warn!(
            "Failed to listen for Ctrl+C: {}. Proceeding with shutdown anyway.",
            e
        ),
    }
}

/// 停止 worker 池
///
/// 正在执行的任务可以跑完；超时后放弃等待。未完成的 chunk 的在途计数
/// 不会被回收，需要重新触发调度。
pub async fn stop_workers(pool: WorkerPool) {
    match timeout(Duration::from_secs(SHUTDOWN_TIMEOUT_SECS), pool.shutdown()).await {
        Ok(()) => info!("All shutdown tasks completed successfully"),
        Err(_) => error!(
            "Job workers did not stop within {} seconds, exiting anyway",
            SHUTDOWN_TIMEOUT_SECS
        ),
    }
}

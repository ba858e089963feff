//! 后台任务
//!
//! 协调器、chunk worker 和点击写入都以任务形式投递，由 `WorkerPool` 执行。
//! 队列后端可以是进程内（`MemoryJobQueue`）或共享存储（`StoreJobQueue`）。

mod pool;
mod queue;

pub use pool::{JobHandler, WorkerPool, drain};
pub use queue::{JobQueue, MemoryJobQueue, StoreJobQueue};

use serde::{Deserialize, Serialize};

use crate::tracking::ClickInput;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Job {
    /// 运行一次协调器
    Dispatch { campaign_id: String },
    /// 发送一个 chunk
    SendChunk {
        campaign_id: String,
        emails: Vec<String>,
    },
    /// 写入一次点击
    RecordClick { click: ClickInput },
}

impl Job {
    pub fn kind(&self) -> &'static str {
        match self {
            Job::Dispatch { .. } => "dispatch",
            Job::SendChunk { .. } => "send_chunk",
            Job::RecordClick { .. } => "record_click",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_wire_format() {
        let job = Job::SendChunk {
            campaign_id: "c1".to_string(),
            emails: vec!["a@example.com".to_string()],
        };
        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json["type"], "send_chunk");
        assert_eq!(json["campaign_id"], "c1");

        let back: Job = serde_json::from_value(json).unwrap();
        assert_eq!(back.kind(), "send_chunk");
    }
}

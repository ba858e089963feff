use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::StaticConfig;
use crate::mail::create_transport;
use crate::runtime::AppContext;
use crate::storage::StorageFactory;
use crate::store::{KeySpace, create_store};

/// 组装运行所需的全部组件
///
/// 数据库迁移在创建存储时执行。
pub async fn prepare_context(config: &StaticConfig) -> Result<Arc<AppContext>> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let storage = StorageFactory::create(config)
        .await
        .context("Failed to create storage backend")?;
    info!("Using database backend: {}", storage.backend_name());

    let store = create_store(config)
        .await
        .context("Failed to connect to the key-value store")?;

    let transport = create_transport(&config.mail).context("Failed to create mail transport")?;

    let keys = KeySpace::new(config.redis.key_prefix.clone());
    let jobs = AppContext::job_queue_for(&store, &keys);

    let context = AppContext::new(config, storage, store, jobs, transport);
    debug!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );
    Ok(Arc::new(context))
}

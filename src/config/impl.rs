use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;

use super::StaticConfig;

static CONFIG: OnceLock<ArcSwap<StaticConfig>> = OnceLock::new();

/// Get the global configuration instance
///
/// Returns an Arc pointer to the configuration, which is cheap to clone
/// and doesn't hold any locks. Falls back to loading from the default
/// sources when `init_config()` has not been called yet.
pub fn get_config() -> Arc<StaticConfig> {
    CONFIG
        .get_or_init(|| ArcSwap::from_pointee(StaticConfig::load()))
        .load_full()
}

/// Initialize the global configuration
///
/// Loads configuration from "config.toml" in the current directory,
/// then applies `MS__*` environment overrides.
///
/// # Examples
/// ```no_run
/// use mailshot::config::init_config;
/// init_config();
/// ```
pub fn init_config() {
    CONFIG.get_or_init(|| ArcSwap::from_pointee(StaticConfig::load()));
}

/// 从指定文件初始化，环境变量覆盖规则不变
pub fn init_config_from(path: &str) {
    init_config_with(StaticConfig::load_from(path));
}

/// 使用给定配置初始化（测试与嵌入场景）
///
/// 如果全局配置已经存在，则原子替换。
pub fn init_config_with(config: StaticConfig) {
    match CONFIG.get() {
        Some(existing) => existing.store(Arc::new(config)),
        None => {
            let swap = ArcSwap::from_pointee(config.clone());
            if CONFIG.set(swap).is_err()
                && let Some(existing) = CONFIG.get()
            {
                existing.store(Arc::new(config));
            }
        }
    }
}

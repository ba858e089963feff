use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 静态配置（从 TOML 加载，启动时使用）
///
/// 包含：
/// - server: HTTP 监听地址
/// - database: 关系型数据库连接与重试
/// - redis / store: 队列、锁与计数器所在的共享存储
/// - dispatch: 分块发送参数
/// - tracking: 点击追踪参数
/// - mail: 邮件发送通道
/// - logging: 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// 优先级：ENV > config.toml > 默认值
    /// ENV 前缀：MS，分隔符：__
    /// 示例：MS__DISPATCH__CHUNK_SIZE=50
    pub fn load() -> Self {
        Self::load_from("config.toml")
    }

    pub fn load_from(path: &str) -> Self {
        use config::{Config, Environment, File};

        let builder = Config::builder()
            // 1. 从 TOML 文件加载（可选）
            .add_source(File::with_name(path).required(false))
            // 2. 从环境变量覆盖，前缀 MS，分隔符 __
            .add_source(
                Environment::with_prefix("MS")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("tracking.bot_user_agents")
                    .try_parsing(true),
            );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<StaticConfig>() {
                Ok(config) => {
                    if std::path::Path::new(path).exists() {
                        eprintln!("[INFO] Configuration loaded from: {}", path);
                    }
                    config
                }
                Err(e) => {
                    eprintln!("[ERROR] Failed to deserialize config: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("[ERROR] Failed to build config: {}", e);
                Self::default()
            }
        }
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config)
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }

    /// 保存配置到 TOML 文件
    pub fn save_to_file<P: AsRef<std::path::Path>>(
        &self,
        path: P,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;

        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_cpu_count")]
    pub cpu_count: usize,
}

/// 数据库连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_database_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_database_timeout")]
    pub timeout: u64,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

/// Redis 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_redis_url")]
    pub url: String,
    #[serde(default = "default_redis_key_prefix")]
    pub key_prefix: String,
}

/// 共享存储后端选择：redis（多进程）或 memory（单进程）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_backend")]
    pub backend: String,
}

/// 分块发送配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// 每个 chunk 的收件人数量
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// 每个活动同时在途的 chunk 上限
    #[serde(default = "default_max_inflight")]
    pub max_inflight: usize,
    /// 单封邮件之间的节流间隔
    #[serde(default = "default_per_email_delay_ms")]
    pub per_email_delay_ms: u64,
    #[serde(default = "default_lock_ttl_secs")]
    pub lock_ttl_secs: u64,
    /// chunk 没有任何进展就被退回时，再次触发调度前的等待
    #[serde(default = "default_requeue_backoff_ms")]
    pub requeue_backoff_ms: u64,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_job_poll_interval_ms")]
    pub job_poll_interval_ms: u64,
}

impl DispatchConfig {
    pub fn per_email_delay(&self) -> Duration {
        Duration::from_millis(self.per_email_delay_ms)
    }

    pub fn lock_ttl(&self) -> Duration {
        Duration::from_secs(self.lock_ttl_secs.max(1))
    }

    pub fn requeue_backoff(&self) -> Duration {
        Duration::from_millis(self.requeue_backoff_ms)
    }

    pub fn job_poll_interval(&self) -> Duration {
        Duration::from_millis(self.job_poll_interval_ms.max(1))
    }
}

/// 点击追踪配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// 幂等键的时间桶宽度（秒）
    #[serde(default = "default_bucket_secs")]
    pub bucket_secs: u64,
    /// 重定向端的快速去重窗口（秒），在入队前过滤连击
    #[serde(default = "default_dedupe_ttl_secs")]
    pub dedupe_ttl_secs: u64,
    #[serde(default = "default_link_cache_ttl_secs")]
    pub link_cache_ttl_secs: u64,
    #[serde(default = "default_link_cache_capacity")]
    pub link_cache_capacity: u64,
    /// User-Agent 中包含任一子串即视为机器人（不区分大小写）
    #[serde(default = "default_bot_user_agents")]
    pub bot_user_agents: Vec<String>,
    #[serde(default = "default_min_user_agent_len")]
    pub min_user_agent_len: usize,
    /// 邮件正文中的收件人占位符
    #[serde(default = "default_recipient_placeholder")]
    pub recipient_placeholder: String,
}

impl TrackingConfig {
    pub fn dedupe_ttl(&self) -> Duration {
        Duration::from_secs(self.dedupe_ttl_secs.max(1))
    }
}

/// 邮件发送配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// smtp 或 log
    #[serde(default = "default_mail_transport")]
    pub transport: String,
    #[serde(default)]
    pub smtp: SmtpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    #[serde(default = "default_smtp_host")]
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_smtp_starttls")]
    pub starttls: bool,
    #[serde(default = "default_smtp_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_smtp_pool_size")]
    pub pool_size: u32,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_log_file")]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

// ============================================================
// Default value functions for static config
// ============================================================

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_cpu_count() -> usize {
    num_cpus::get()
}

fn default_database_url() -> String {
    "mailshot.db".to_string()
}

fn default_database_pool_size() -> u32 {
    10
}

fn default_database_timeout() -> u64 {
    30
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    100
}

fn default_retry_max_delay_ms() -> u64 {
    2000
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379/".to_string()
}

fn default_redis_key_prefix() -> String {
    "mailshot:".to_string()
}

fn default_store_backend() -> String {
    "redis".to_string()
}

fn default_chunk_size() -> usize {
    30
}

fn default_max_inflight() -> usize {
    3
}

fn default_per_email_delay_ms() -> u64 {
    600
}

fn default_lock_ttl_secs() -> u64 {
    15
}

fn default_requeue_backoff_ms() -> u64 {
    1000
}

fn default_workers() -> usize {
    num_cpus::get().max(2)
}

fn default_job_poll_interval_ms() -> u64 {
    200
}

fn default_bucket_secs() -> u64 {
    5
}

fn default_dedupe_ttl_secs() -> u64 {
    5
}

fn default_link_cache_ttl_secs() -> u64 {
    86400
}

fn default_link_cache_capacity() -> u64 {
    10000
}

fn default_bot_user_agents() -> Vec<String> {
    [
        "bot",
        "crawler",
        "spider",
        "preview",
        "facebookexternalhit",
        "slackbot",
        "discordbot",
        "whatsapp",
        "googleimageproxy",
        "proofpoint",
        "mimecast",
        "barracuda",
        "curl",
        "wget",
        "python-requests",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_min_user_agent_len() -> usize {
    12
}

fn default_recipient_placeholder() -> String {
    "{recipient_id}".to_string()
}

fn default_mail_transport() -> String {
    "log".to_string()
}

fn default_smtp_host() -> String {
    "127.0.0.1".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_smtp_starttls() -> bool {
    true
}

fn default_smtp_timeout_secs() -> u64 {
    30
}

fn default_smtp_pool_size() -> u32 {
    4
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_log_file() -> Option<String> {
    None
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            cpu_count: default_cpu_count(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            pool_size: default_database_pool_size(),
            timeout: default_database_timeout(),
            retry_count: default_retry_count(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            key_prefix: default_redis_key_prefix(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            max_inflight: default_max_inflight(),
            per_email_delay_ms: default_per_email_delay_ms(),
            lock_ttl_secs: default_lock_ttl_secs(),
            requeue_backoff_ms: default_requeue_backoff_ms(),
            workers: default_workers(),
            job_poll_interval_ms: default_job_poll_interval_ms(),
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            bucket_secs: default_bucket_secs(),
            dedupe_ttl_secs: default_dedupe_ttl_secs(),
            link_cache_ttl_secs: default_link_cache_ttl_secs(),
            link_cache_capacity: default_link_cache_capacity(),
            bot_user_agents: default_bot_user_agents(),
            min_user_agent_len: default_min_user_agent_len(),
            recipient_placeholder: default_recipient_placeholder(),
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            transport: default_mail_transport(),
            smtp: SmtpConfig::default(),
        }
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: default_smtp_host(),
            port: default_smtp_port(),
            username: None,
            password: None,
            starttls: default_smtp_starttls(),
            timeout_secs: default_smtp_timeout_secs(),
            pool_size: default_smtp_pool_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: default_log_file(),
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}

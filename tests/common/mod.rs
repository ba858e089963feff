//! Shared fixtures for integration tests
//!
//! Every test gets its own temporary SQLite database, an in-memory store,
//! an in-memory job queue and a recording mail transport.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use sea_orm::{ActiveModelTrait, ActiveValue::Set, EntityTrait};
use tempfile::TempDir;

use mailshot::config::StaticConfig;
use mailshot::dispatch::{InflightCounter, RecipientQueue};
use mailshot::jobs::{JobQueue, MemoryJobQueue, drain};
use mailshot::mail::{MailTransport, RecordingTransport};
use mailshot::runtime::AppContext;
use mailshot::storage::{CampaignStatus, SeaOrmStorage, StorageFactory};
use mailshot::store::{KeySpace, KvStore, MemoryStore};

use migration::entities::{audience, campaign, campaign_link, contact};

pub const TRACKED_HTML: &str = r#"<html><body><p>Hello</p><a href="https://t.example.com/c/tok-1?r={recipient_id}">Read more</a></body></html>"#;

pub struct TestEnv {
    pub ctx: Arc<AppContext>,
    pub storage: Arc<SeaOrmStorage>,
    pub store: Arc<dyn KvStore>,
    pub queue: Arc<MemoryJobQueue>,
    pub jobs: Arc<dyn JobQueue>,
    pub transport: RecordingTransport,
    pub keys: KeySpace,
    pub config: StaticConfig,
    _dir: TempDir,
}

impl TestEnv {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    pub async fn with_config(tweak: impl FnOnce(&mut StaticConfig)) -> Self {
        Self::with_store(Arc::new(MemoryStore::new()), tweak).await
    }

    /// Same as `with_config` but over a caller-supplied store
    pub async fn with_store(
        store: Arc<dyn KvStore>,
        tweak: impl FnOnce(&mut StaticConfig),
    ) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = dir.path().join("mailshot_test.db");

        let mut config = StaticConfig::default();
        config.database.database_url = format!("sqlite://{}?mode=rwc", db_path.display());
        config.store.backend = "memory".to_string();
        config.redis.key_prefix = "test:".to_string();
        config.mail.transport = "log".to_string();
        config.dispatch.per_email_delay_ms = 0;
        config.dispatch.requeue_backoff_ms = 0;
        tweak(&mut config);

        let storage = StorageFactory::create(&config)
            .await
            .expect("Failed to create storage");
        let queue = Arc::new(MemoryJobQueue::new());
        let jobs: Arc<dyn JobQueue> = queue.clone();
        let transport = RecordingTransport::new();
        let mailer: Arc<dyn MailTransport> = Arc::new(transport.clone());

        let ctx = Arc::new(AppContext::new(
            &config,
            storage.clone(),
            store.clone(),
            jobs.clone(),
            mailer,
        ));

        Self {
            ctx,
            storage,
            store,
            queue,
            jobs,
            transport,
            keys: KeySpace::new("test:"),
            config,
            _dir: dir,
        }
    }

    pub fn recipient_queue(&self) -> RecipientQueue {
        RecipientQueue::new(self.store.clone(), self.keys.clone())
    }

    pub fn inflight(&self) -> InflightCounter {
        InflightCounter::new(self.store.clone(), self.keys.clone())
    }

    /// Run every queued job (and the jobs they enqueue) to completion
    pub async fn drain(&self) -> usize {
        drain(self.jobs.as_ref(), self.ctx.as_ref())
            .await
            .expect("drain failed")
    }

    pub async fn create_audience(&self) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        audience::ActiveModel {
            id: Set(id.clone()),
            name: Set("Newsletter".to_string()),
            created_at: Set(Utc::now()),
        }
        .insert(self.storage.get_db())
        .await
        .expect("insert audience");
        id
    }

    /// Insert a contact; `seq` keeps creation order deterministic
    pub async fn add_contact(
        &self,
        audience_id: &str,
        email: Option<&str>,
        status: &str,
        seq: i64,
    ) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        contact::ActiveModel {
            id: Set(id.clone()),
            audience_id: Set(audience_id.to_string()),
            email_address: Set(email.map(str::to_string)),
            status: Set(status.to_string()),
            created_at: Set(base + Duration::seconds(seq)),
        }
        .insert(self.storage.get_db())
        .await
        .expect("insert contact");
        id
    }

    /// Audience with `n` subscribed contacts user0@example.com .. user{n-1}@example.com
    pub async fn audience_with(&self, n: usize) -> String {
        let audience_id = self.create_audience().await;
        for i in 0..n {
            self.add_contact(
                &audience_id,
                Some(&format!("user{}@example.com", i)),
                "subscribed",
                i as i64,
            )
            .await;
        }
        audience_id
    }

    pub async fn create_campaign(
        &self,
        audience_id: &str,
        status: CampaignStatus,
        compiled_html: &str,
    ) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        campaign::ActiveModel {
            id: Set(id.clone()),
            title: Set("Spring launch".to_string()),
            status: Set(status.as_ref().to_string()),
            audience_id: Set(audience_id.to_string()),
            exclude_unsubscribed: Set(true),
            estimated_recipients: Set(0),
            emails_sent: Set(0),
            subject_line: Set("Something new".to_string()),
            from_name: Set("Acme".to_string()),
            from_email: Set("news@acme.test".to_string()),
            reply_to: Set(String::new()),
            content_html: Set(compiled_html.to_string()),
            content_text: Set(String::new()),
            compiled_html: Set(compiled_html.to_string()),
            compiled_at: Set((!compiled_html.is_empty()).then_some(now)),
            started_sending_at: Set(None),
            completed_at: Set(None),
            click_count: Set(0),
            unique_click_count: Set(0),
            first_click_at: Set(None),
            last_click_at: Set(None),
            created_at: Set(now),
        }
        .insert(self.storage.get_db())
        .await
        .expect("insert campaign");
        id
    }

    pub async fn create_link(&self, campaign_id: &str, token: &str, url: &str) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        campaign_link::ActiveModel {
            id: Set(id.clone()),
            campaign_id: Set(campaign_id.to_string()),
            original_url: Set(url.to_string()),
            token: Set(token.to_string()),
            click_count: Set(0),
            unique_click_count: Set(0),
            first_clicked_at: Set(None),
            last_clicked_at: Set(None),
            created_at: Set(Utc::now()),
        }
        .insert(self.storage.get_db())
        .await
        .expect("insert link");
        id
    }

    pub async fn campaign_row(&self, id: &str) -> campaign::Model {
        campaign::Entity::find_by_id(id.to_string())
            .one(self.storage.get_db())
            .await
            .expect("query campaign")
            .expect("campaign exists")
    }

    pub async fn link_row(&self, id: &str) -> campaign_link::Model {
        campaign_link::Entity::find_by_id(id.to_string())
            .one(self.storage.get_db())
            .await
            .expect("query link")
            .expect("link exists")
    }
}

pub fn emails(range: std::ops::Range<usize>) -> Vec<String> {
    range.map(|i| format!("user{}@example.com", i)).collect()
}

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "campaigns")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub title: String,
    pub status: String,
    pub audience_id: String,
    pub exclude_unsubscribed: bool,
    pub estimated_recipients: i64,
    pub emails_sent: i64,

    pub subject_line: String,
    pub from_name: String,
    pub from_email: String,
    pub reply_to: String,

    #[sea_orm(column_type = "Text")]
    pub content_html: String,
    #[sea_orm(column_type = "Text")]
    pub content_text: String,
    /// 由链接编译步骤生成，包含 `{recipient_id}` 占位符
    #[sea_orm(column_type = "Text")]
    pub compiled_html: String,
    pub compiled_at: Option<DateTimeUtc>,

    pub started_sending_at: Option<DateTimeUtc>,
    pub completed_at: Option<DateTimeUtc>,

    pub click_count: i64,
    pub unique_click_count: i64,
    pub first_click_at: Option<DateTimeUtc>,
    pub last_click_at: Option<DateTimeUtc>,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

//! One row per distinct trackable URL inside a campaign

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "campaign_links")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub campaign_id: String,
    #[sea_orm(column_type = "Text")]
    pub original_url: String,
    /// Public redirect token, e.g. https://t.example.com/c/<token>
    #[sea_orm(unique)]
    pub token: String,
    pub click_count: i64,
    pub unique_click_count: i64,
    pub first_clicked_at: Option<DateTimeUtc>,
    pub last_clicked_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use super::SeaOrmStorage;
use crate::errors::Result;
use crate::storage::models::LinkTarget;

use migration::entities::campaign_link;

impl SeaOrmStorage {
    /// 根据公开 token 查找短链
    pub async fn find_link_by_token(&self, token: &str) -> Result<Option<LinkTarget>> {
        let model = campaign_link::Entity::find()
            .filter(campaign_link::Column::Token.eq(token))
            .one(&self.db)
            .await?;
        Ok(model.map(LinkTarget::from))
    }
}

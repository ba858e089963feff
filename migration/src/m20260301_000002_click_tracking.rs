//! 点击追踪表迁移
//!
//! - campaign_links: 每个活动中每个可追踪 URL 一行
//! - campaign_recipients: (campaign, recipient) 唯一，首次点击时创建
//! - click_events: 只追加的原始点击事件，idempotency_key 唯一

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CampaignLinks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CampaignLinks::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CampaignLinks::CampaignId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(ColumnDef::new(CampaignLinks::OriginalUrl).text().not_null())
                    .col(
                        ColumnDef::new(CampaignLinks::Token)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(CampaignLinks::ClickCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(CampaignLinks::UniqueClickCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(CampaignLinks::FirstClickedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(CampaignLinks::LastClickedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(CampaignLinks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_campaign_links_campaign")
                    .table(CampaignLinks::Table)
                    .col(CampaignLinks::CampaignId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CampaignRecipients::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CampaignRecipients::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CampaignRecipients::CampaignId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CampaignRecipients::RecipientId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CampaignRecipients::ClicksCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(CampaignRecipients::FirstClickedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(CampaignRecipients::LastClickedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(CampaignRecipients::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // (campaign, recipient) 唯一：首次点击即唯一点击
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uniq_campaign_recipient")
                    .table(CampaignRecipients::Table)
                    .col(CampaignRecipients::CampaignId)
                    .col(CampaignRecipients::RecipientId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_campaign_recipients_recipient")
                    .table(CampaignRecipients::Table)
                    .col(CampaignRecipients::RecipientId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ClickEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ClickEvents::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ClickEvents::CampaignId).string_len(36).not_null())
                    .col(ColumnDef::new(ClickEvents::RecipientId).string_len(36).not_null())
                    .col(ColumnDef::new(ClickEvents::LinkId).string_len(36).not_null())
                    .col(
                        ColumnDef::new(ClickEvents::OccurredAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ClickEvents::IpAddress).string_len(45).null())
                    .col(ColumnDef::new(ClickEvents::UserAgent).text().not_null())
                    .col(ColumnDef::new(ClickEvents::Referrer).text().not_null())
                    .col(
                        ColumnDef::new(ClickEvents::Source)
                            .string_len(16)
                            .not_null()
                            .default("redirect"),
                    )
                    .col(
                        ColumnDef::new(ClickEvents::IdempotencyKey)
                            .string_len(128)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ClickEvents::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 唯一索引允许多个 NULL
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uniq_click_events_idempotency_key")
                    .table(ClickEvents::Table)
                    .col(ClickEvents::IdempotencyKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_click_events_campaign_time")
                    .table(ClickEvents::Table)
                    .col(ClickEvents::CampaignId)
                    .col(ClickEvents::OccurredAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_click_events_link_time")
                    .table(ClickEvents::Table)
                    .col(ClickEvents::LinkId)
                    .col(ClickEvents::OccurredAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_click_events_recipient_time")
                    .table(ClickEvents::Table)
                    .col(ClickEvents::RecipientId)
                    .col(ClickEvents::OccurredAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for name in [
            "idx_click_events_recipient_time",
            "idx_click_events_link_time",
            "idx_click_events_campaign_time",
            "uniq_click_events_idempotency_key",
        ] {
            manager
                .drop_index(Index::drop().name(name).to_owned())
                .await?;
        }
        manager
            .drop_table(Table::drop().table(ClickEvents::Table).to_owned())
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_campaign_recipients_recipient")
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(Index::drop().name("uniq_campaign_recipient").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CampaignRecipients::Table).to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_campaign_links_campaign").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CampaignLinks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CampaignLinks {
    Table,
    Id,
    CampaignId,
    OriginalUrl,
    Token,
    ClickCount,
    UniqueClickCount,
    FirstClickedAt,
    LastClickedAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum CampaignRecipients {
    Table,
    Id,
    CampaignId,
    RecipientId,
    ClicksCount,
    FirstClickedAt,
    LastClickedAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ClickEvents {
    Table,
    Id,
    CampaignId,
    RecipientId,
    LinkId,
    OccurredAt,
    IpAddress,
    UserAgent,
    Referrer,
    Source,
    IdempotencyKey,
    CreatedAt,
}

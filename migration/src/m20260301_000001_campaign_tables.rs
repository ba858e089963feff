//! 活动基础表迁移
//!
//! 创建 audiences / contacts / campaigns 三张表。
//! 这些行由外部 CRUD 层维护，调度引擎只读写其中的少量字段。

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Audiences::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Audiences::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Audiences::Name).string_len(200).not_null())
                    .col(
                        ColumnDef::new(Audiences::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Contacts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Contacts::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Contacts::AudienceId).string_len(36).not_null())
                    .col(ColumnDef::new(Contacts::EmailAddress).string_len(254).null())
                    .col(
                        ColumnDef::new(Contacts::Status)
                            .string_len(20)
                            .not_null()
                            .default("subscribed"),
                    )
                    .col(
                        ColumnDef::new(Contacts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 收件人解析按 audience + status 过滤
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_contacts_audience_status")
                    .table(Contacts::Table)
                    .col(Contacts::AudienceId)
                    .col(Contacts::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_contacts_email")
                    .table(Contacts::Table)
                    .col(Contacts::EmailAddress)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Campaigns::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Campaigns::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Campaigns::Title).string_len(200).not_null())
                    .col(
                        ColumnDef::new(Campaigns::Status)
                            .string_len(20)
                            .not_null()
                            .default("draft"),
                    )
                    .col(ColumnDef::new(Campaigns::AudienceId).string_len(36).not_null())
                    .col(
                        ColumnDef::new(Campaigns::ExcludeUnsubscribed)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Campaigns::EstimatedRecipients)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Campaigns::EmailsSent)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Campaigns::SubjectLine).string_len(255).not_null())
                    .col(ColumnDef::new(Campaigns::FromName).string_len(120).not_null())
                    .col(ColumnDef::new(Campaigns::FromEmail).string_len(254).not_null())
                    .col(
                        ColumnDef::new(Campaigns::ReplyTo)
                            .string_len(254)
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Campaigns::ContentHtml).text().not_null())
                    .col(ColumnDef::new(Campaigns::ContentText).text().not_null())
                    .col(ColumnDef::new(Campaigns::CompiledHtml).text().not_null())
                    .col(
                        ColumnDef::new(Campaigns::CompiledAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Campaigns::StartedSendingAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Campaigns::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Campaigns::ClickCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Campaigns::UniqueClickCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Campaigns::FirstClickAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Campaigns::LastClickAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Campaigns::CreatedAt)
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
                    .name("idx_campaigns_status")
                    .table(Campaigns::Table)
                    .col(Campaigns::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_campaigns_status").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Campaigns::Table).to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_contacts_email").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_contacts_audience_status").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Contacts::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Audiences::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Audiences {
    Table,
    Id,
    Name,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Contacts {
    Table,
    Id,
    AudienceId,
    EmailAddress,
    Status,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Campaigns {
    Table,
    Id,
    Title,
    Status,
    AudienceId,
    ExcludeUnsubscribed,
    EstimatedRecipients,
    EmailsSent,
    SubjectLine,
    FromName,
    FromEmail,
    ReplyTo,
    ContentHtml,
    ContentText,
    CompiledHtml,
    CompiledAt,
    StartedSendingAt,
    CompletedAt,
    ClickCount,
    UniqueClickCount,
    FirstClickAt,
    LastClickAt,
    CreatedAt,
}

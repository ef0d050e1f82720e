//! Migration to create the meeting_media table.

use sea_orm_migration::prelude::*;

use super::m2026_02_10_000004_create_recall_bots::RecallBots;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MeetingMedia::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MeetingMedia::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MeetingMedia::RecallBotId).text().not_null())
                    .col(ColumnDef::new(MeetingMedia::MediaType).text().not_null())
                    .col(
                        ColumnDef::new(MeetingMedia::Status)
                            .text()
                            .not_null()
                            .default("done"),
                    )
                    .col(ColumnDef::new(MeetingMedia::DownloadUrl).text().null())
                    .col(
                        ColumnDef::new(MeetingMedia::ExpiresAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(MeetingMedia::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(MeetingMedia::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_meeting_media_recall_bot_id")
                            .from(MeetingMedia::Table, MeetingMedia::RecallBotId)
                            .to(RecallBots::Table, RecallBots::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_meeting_media_bot_type")
                    .table(MeetingMedia::Table)
                    .col(MeetingMedia::RecallBotId)
                    .col(MeetingMedia::MediaType)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MeetingMedia::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum MeetingMedia {
    Table,
    Id,
    RecallBotId,
    MediaType,
    Status,
    DownloadUrl,
    ExpiresAt,
    CreatedAt,
    UpdatedAt,
}

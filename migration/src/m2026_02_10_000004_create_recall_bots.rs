//! Migration to create the recall_bots table.
//!
//! A bot row is keyed by the external bot id and is unique per calendar
//! event. Rows are never deleted; cancellation is recorded in place so the
//! unique-per-event constraint keeps re-scheduling checks idempotent.

use sea_orm_migration::prelude::*;

use super::m2026_02_10_000003_create_calendar_events::CalendarEvents;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RecallBots::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RecallBots::Id)
                            .text()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(RecallBots::CalendarEventId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RecallBots::Status)
                            .text()
                            .not_null()
                            .default("scheduled"),
                    )
                    .col(
                        ColumnDef::new(RecallBots::JoinAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(RecallBots::MeetingUrl).text().not_null())
                    .col(ColumnDef::new(RecallBots::Metadata).json_binary().null())
                    .col(
                        ColumnDef::new(RecallBots::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(RecallBots::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_recall_bots_calendar_event_id")
                            .from(RecallBots::Table, RecallBots::CalendarEventId)
                            .to(CalendarEvents::Table, CalendarEvents::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_recall_bots_calendar_event_id")
                    .table(RecallBots::Table)
                    .col(RecallBots::CalendarEventId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_recall_bots_status_updated_at")
                    .table(RecallBots::Table)
                    .col(RecallBots::Status)
                    .col(RecallBots::UpdatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RecallBots::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum RecallBots {
    Table,
    Id,
    CalendarEventId,
    Status,
    JoinAt,
    MeetingUrl,
    Metadata,
    CreatedAt,
    UpdatedAt,
}

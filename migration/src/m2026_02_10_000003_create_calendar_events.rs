//! Migration to create the calendar_events table.
//!
//! Calendar events are deduplicated per connected account via the
//! (connected_account_id, external_event_id) unique index, which is what
//! makes the upsert path idempotent.

use sea_orm_migration::prelude::*;

use super::m2026_02_10_000001_create_connected_accounts::ConnectedAccounts;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CalendarEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CalendarEvents::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CalendarEvents::ConnectedAccountId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CalendarEvents::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(CalendarEvents::ExternalEventId)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CalendarEvents::Title).text().null())
                    .col(
                        ColumnDef::new(CalendarEvents::StartTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CalendarEvents::EndTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CalendarEvents::Status)
                            .text()
                            .not_null()
                            .default("upcoming"),
                    )
                    .col(ColumnDef::new(CalendarEvents::MeetingUrl).text().null())
                    .col(
                        ColumnDef::new(CalendarEvents::MeetingPlatform)
                            .text()
                            .null(),
                    )
                    .col(ColumnDef::new(CalendarEvents::Location).text().null())
                    .col(
                        ColumnDef::new(CalendarEvents::NotetakerEnabled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(CalendarEvents::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(CalendarEvents::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(CalendarEvents::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_calendar_events_connected_account_id")
                            .from(CalendarEvents::Table, CalendarEvents::ConnectedAccountId)
                            .to(ConnectedAccounts::Table, ConnectedAccounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_calendar_events_dedup_key")
                    .table(CalendarEvents::Table)
                    .col(CalendarEvents::ConnectedAccountId)
                    .col(CalendarEvents::ExternalEventId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_calendar_events_user_id")
                    .table(CalendarEvents::Table)
                    .col(CalendarEvents::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CalendarEvents::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum CalendarEvents {
    Table,
    Id,
    ConnectedAccountId,
    UserId,
    ExternalEventId,
    Title,
    StartTime,
    EndTime,
    Status,
    MeetingUrl,
    MeetingPlatform,
    Location,
    NotetakerEnabled,
    DeletedAt,
    CreatedAt,
    UpdatedAt,
}

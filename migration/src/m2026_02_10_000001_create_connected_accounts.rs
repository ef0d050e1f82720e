//! Migration to create the connected_accounts table.
//!
//! Connected accounts store one row per external calendar credential,
//! including encrypted OAuth tokens and the last successful sync stamp.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ConnectedAccounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ConnectedAccounts::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ConnectedAccounts::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(ConnectedAccounts::Provider)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ConnectedAccounts::ProviderAccountId)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ConnectedAccounts::AccessTokenCiphertext)
                            .binary()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ConnectedAccounts::RefreshTokenCiphertext)
                            .binary()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ConnectedAccounts::ExpiresAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ConnectedAccounts::LastSyncedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ConnectedAccounts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ConnectedAccounts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_connected_accounts_provider_account")
                    .table(ConnectedAccounts::Table)
                    .col(ConnectedAccounts::Provider)
                    .col(ConnectedAccounts::ProviderAccountId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_connected_accounts_user_id")
                    .table(ConnectedAccounts::Table)
                    .col(ConnectedAccounts::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ConnectedAccounts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum ConnectedAccounts {
    Table,
    Id,
    UserId,
    Provider,
    ProviderAccountId,
    AccessTokenCiphertext,
    RefreshTokenCiphertext,
    ExpiresAt,
    LastSyncedAt,
    CreatedAt,
    UpdatedAt,
}

//! Database migrations for the meetsync service.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2026_02_10_000001_create_connected_accounts;
mod m2026_02_10_000002_create_meeting_preferences;
mod m2026_02_10_000003_create_calendar_events;
mod m2026_02_10_000004_create_recall_bots;
mod m2026_02_10_000005_create_meeting_media;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2026_02_10_000001_create_connected_accounts::Migration),
            Box::new(m2026_02_10_000002_create_meeting_preferences::Migration),
            Box::new(m2026_02_10_000003_create_calendar_events::Migration),
            Box::new(m2026_02_10_000004_create_recall_bots::Migration),
            Box::new(m2026_02_10_000005_create_meeting_media::Migration),
        ]
    }
}

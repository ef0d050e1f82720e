//! Calendar event entity model
//!
//! SeaORM entity for the calendar_events table. Rows are created and
//! updated exclusively by the upsert engine, keyed by
//! (connected_account_id, external_event_id).

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

/// Canonical calendar event.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "calendar_events")]
pub struct Model {
    /// Unique identifier for the event (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Account the event was synced from
    pub connected_account_id: Uuid,

    /// Owning user (denormalized from the account)
    pub user_id: Uuid,

    /// Event identifier assigned by the provider; unique per account
    pub external_event_id: String,

    pub title: Option<String>,

    pub start_time: DateTimeWithTimeZone,

    pub end_time: DateTimeWithTimeZone,

    /// Lifecycle status (upcoming|completed|cancelled)
    pub status: String,

    /// Extracted conferencing URL, when the event has one
    pub meeting_url: Option<String>,

    /// Detected conferencing platform
    pub meeting_platform: Option<String>,

    pub location: Option<String>,

    /// Whether a recording bot should attend. Only ever true when
    /// meeting_url is present.
    pub notetaker_enabled: bool,

    /// Set when the provider reported the event removed
    pub deleted_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::connected_account::Entity",
        from = "Column::ConnectedAccountId",
        to = "super::connected_account::Column::Id"
    )]
    ConnectedAccount,
    #[sea_orm(has_one = "super::recall_bot::Entity")]
    RecallBot,
}

impl Related<super::connected_account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ConnectedAccount.def()
    }
}

impl Related<super::recall_bot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecallBot.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

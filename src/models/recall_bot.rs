//! Recall bot entity model
//!
//! SeaORM entity for the recall_bots table. The primary key is the
//! external bot id returned by the remote provisioning API. At most one
//! row exists per calendar event; rows are never deleted (cancellation is
//! recorded in place).

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Remote recording bot tracked against a calendar event.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "recall_bots")]
pub struct Model {
    /// External bot id (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Owning calendar event (unique)
    pub calendar_event_id: Uuid,

    /// Lifecycle status (scheduled|joining|in_call|done|fatal|cancelled)
    pub status: String,

    /// Instant the bot was told to join the meeting
    pub join_at: DateTimeWithTimeZone,

    pub meeting_url: String,

    /// Last raw status snapshot observed from the remote API
    #[sea_orm(column_type = "JsonBinary")]
    pub metadata: Option<JsonValue>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::calendar_event::Entity",
        from = "Column::CalendarEventId",
        to = "super::calendar_event::Column::Id"
    )]
    CalendarEvent,
    #[sea_orm(has_many = "super::meeting_media::Entity")]
    MeetingMedia,
}

impl Related<super::calendar_event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CalendarEvent.def()
    }
}

impl Related<super::meeting_media::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MeetingMedia.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

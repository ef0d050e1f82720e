//! Meeting preference entity model
//!
//! SeaORM entity for the meeting_preferences table, holding per-user
//! defaults. Rows are created lazily on first access.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

/// Per-user meeting defaults.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "meeting_preferences")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: Uuid,

    /// Minutes before an event's start at which the bot joins
    pub lead_minutes: i32,

    /// Whether newly discovered future events get a notetaker by default
    pub default_notetaker: bool,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

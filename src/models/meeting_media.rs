//! Meeting media entity model
//!
//! SeaORM entity for the meeting_media table. One row per
//! (recall_bot_id, media_type); captured media is upserted, never
//! duplicated.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

/// Artifact produced by a recording bot.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "meeting_media")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Producing bot
    pub recall_bot_id: String,

    /// Artifact kind (transcript|video|participant_events|metadata)
    pub media_type: String,

    /// Remote processing status
    pub status: String,

    pub download_url: Option<String>,

    /// Expiry of the signed download URL, when the remote reports one
    pub expires_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::recall_bot::Entity",
        from = "Column::RecallBotId",
        to = "super::recall_bot::Column::Id"
    )]
    RecallBot,
}

impl Related<super::recall_bot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecallBot.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

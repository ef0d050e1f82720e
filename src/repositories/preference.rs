//! # Meeting Preference Repository
//!
//! Resolves a user's meeting preferences, creating a default row on first
//! access.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use tracing::debug;
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::meeting_preference::{
    ActiveModel as PreferenceActiveModel, Entity as MeetingPreference, Model as PreferenceModel,
};

/// Repository for meeting preference rows.
#[derive(Clone)]
pub struct PreferenceRepository {
    db: std::sync::Arc<DatabaseConnection>,
    default_lead_minutes: i64,
}

impl PreferenceRepository {
    pub fn new(db: std::sync::Arc<DatabaseConnection>, default_lead_minutes: i64) -> Self {
        Self {
            db,
            default_lead_minutes,
        }
    }

    /// Load the user's preferences, lazily creating the default row when
    /// none exists yet.
    pub async fn resolve(&self, user_id: Uuid) -> Result<PreferenceModel, CoreError> {
        if let Some(existing) = MeetingPreference::find_by_id(user_id)
            .one(self.db.as_ref())
            .await?
        {
            return Ok(existing);
        }

        let now = Utc::now();
        let defaults = PreferenceActiveModel {
            user_id: Set(user_id),
            lead_minutes: Set(self.default_lead_minutes as i32),
            default_notetaker: Set(true),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        match defaults.insert(self.db.as_ref()).await {
            Ok(created) => {
                debug!(user_id = %user_id, "Created default meeting preferences");
                Ok(created)
            }
            // A concurrent resolve may have inserted first; re-read.
            Err(_) => MeetingPreference::find_by_id(user_id)
                .one(self.db.as_ref())
                .await?
                .ok_or_else(|| {
                    CoreError::internal(format!(
                        "failed to create meeting preferences for user {user_id}"
                    ))
                }),
        }
    }
}

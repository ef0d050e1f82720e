//! Bot lifecycle operations
//!
//! Schedules and cancels remote recording bots for calendar events and
//! applies polling-detected state transitions, capturing produced media and
//! completing the owning event on the way into `done`.

use chrono::{Duration, Utc};
use metrics::counter;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::bots::recall::{BotDetail, BotMetadata, NewBot, RecallApi, RecallError, RecordingConfig};
use crate::bots::status::{PollAction, map_remote_status, next_action};
use crate::content::ContentQueue;
use crate::error::CoreError;
use crate::models::{ALL_MEDIA_KINDS, BotStatus, EventStatus, MediaKind};
use crate::models::calendar_event::{
    ActiveModel as EventActiveModel, Model as EventModel,
};
use crate::models::meeting_media::{
    ActiveModel as MediaActiveModel, Column as MediaColumn, Entity as MeetingMedia,
};
use crate::models::recall_bot::{
    ActiveModel as BotActiveModel, Column as BotColumn, Entity as RecallBot, Model as BotModel,
};
use crate::repositories::PreferenceRepository;

/// Bot lifecycle engine.
pub struct BotLifecycle {
    db: Arc<DatabaseConnection>,
    api: Arc<dyn RecallApi>,
    preferences: PreferenceRepository,
    content: ContentQueue,
}

impl BotLifecycle {
    pub fn new(
        db: Arc<DatabaseConnection>,
        api: Arc<dyn RecallApi>,
        preferences: PreferenceRepository,
        content: ContentQueue,
    ) -> Self {
        Self {
            db,
            api,
            preferences,
            content,
        }
    }

    /// Schedule a bot for the event unless one already exists.
    ///
    /// Returns `None` when the event has no meeting URL or has already
    /// started; an existing bot row of any status is returned unchanged, so
    /// callers may invoke this repeatedly.
    #[instrument(skip_all, fields(event_id = %event.id))]
    pub async fn ensure_bot_scheduled(
        &self,
        event: &EventModel,
    ) -> Result<Option<BotModel>, CoreError> {
        let Some(meeting_url) = event.meeting_url.clone() else {
            return Ok(None);
        };

        if let Some(existing) = RecallBot::find()
            .filter(BotColumn::CalendarEventId.eq(event.id))
            .one(self.db.as_ref())
            .await?
        {
            debug!(bot_id = %existing.id, "Bot already exists for event");
            return Ok(Some(existing));
        }

        let now = Utc::now();
        let start_time = event.start_time.with_timezone(&Utc);
        if start_time <= now {
            debug!("Event already started; not scheduling a bot");
            return Ok(None);
        }

        let preferences = self.preferences.resolve(event.user_id).await?;
        let join_at = start_time - Duration::minutes(preferences.lead_minutes as i64);

        let created = self
            .api
            .create_bot(NewBot {
                meeting_url: meeting_url.clone(),
                join_at,
                recording_config: RecordingConfig::default(),
                metadata: BotMetadata {
                    calendar_event_id: event.id,
                    user_id: event.user_id,
                },
            })
            .await?;

        let bot = BotActiveModel {
            id: Set(created.id),
            calendar_event_id: Set(event.id),
            status: Set(BotStatus::Scheduled.as_str().to_string()),
            join_at: Set(join_at.into()),
            meeting_url: Set(meeting_url),
            metadata: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(self.db.as_ref())
        .await?;

        counter!("bots_scheduled_total").increment(1);
        info!(
            bot_id = %bot.id,
            join_at = %join_at,
            lead_minutes = preferences.lead_minutes,
            "Scheduled recording bot"
        );

        Ok(Some(bot))
    }

    /// Cancel the event's bot, if an active one exists.
    ///
    /// The remote deletion tolerates a 404 (bot already gone) and logs any
    /// other remote failure; in every outcome the local row is flipped to
    /// cancelled so local state never sticks to an unreachable remote
    /// resource.
    #[instrument(skip_all, fields(event_id = %event_id))]
    pub async fn cancel_bot_for_event(&self, event_id: Uuid) -> Result<(), CoreError> {
        let Some(bot) = RecallBot::find()
            .filter(BotColumn::CalendarEventId.eq(event_id))
            .one(self.db.as_ref())
            .await?
        else {
            return Ok(());
        };

        if bot.status == BotStatus::Cancelled.as_str() {
            return Ok(());
        }

        match self.api.delete_bot(&bot.id).await {
            Ok(()) => debug!(bot_id = %bot.id, "Remote bot deleted"),
            Err(RecallError::BotNotFound { .. }) => {
                info!(bot_id = %bot.id, "Remote bot already gone; cancelling locally");
            }
            Err(err) => {
                warn!(bot_id = %bot.id, error = %err, "Remote bot cancellation failed");
            }
        }

        let now = Utc::now();
        BotActiveModel {
            id: Set(bot.id.clone()),
            status: Set(BotStatus::Cancelled.as_str().to_string()),
            updated_at: Set(now.into()),
            ..Default::default()
        }
        .update(self.db.as_ref())
        .await?;

        counter!("bots_cancelled_total").increment(1);
        info!(bot_id = %bot.id, "Bot cancelled");

        Ok(())
    }

    /// Reconcile one bot against its remote status.
    ///
    /// Only a changed observation produces a write; repeated identical
    /// polls are no-ops. Returns the new status when a transition was
    /// applied.
    #[instrument(skip_all, fields(bot_id = %bot.id))]
    pub async fn poll_bot_status(&self, bot: &BotModel) -> Result<Option<BotStatus>, CoreError> {
        let detail = self.api.fetch_bot(&bot.id).await?;

        let Some(snapshot) = detail.latest_status() else {
            debug!("Remote detail carries no status; skipping");
            return Ok(None);
        };

        let Some(stored) = BotStatus::parse(&bot.status) else {
            warn!(status = %bot.status, "Stored bot status is not canonical; skipping");
            return Ok(None);
        };

        match next_action(stored, map_remote_status(&snapshot.code)) {
            PollAction::None => Ok(None),
            PollAction::Transitioned(next) => {
                let snapshot = snapshot.clone();
                self.apply_transition(bot, next, &snapshot).await?;
                Ok(Some(next))
            }
        }
    }

    async fn apply_transition(
        &self,
        bot: &BotModel,
        next: BotStatus,
        snapshot: &crate::bots::recall::StatusSnapshot,
    ) -> Result<(), CoreError> {
        let now = Utc::now();

        BotActiveModel {
            id: Set(bot.id.clone()),
            status: Set(next.as_str().to_string()),
            metadata: Set(serde_json::to_value(snapshot).ok()),
            updated_at: Set(now.into()),
            ..Default::default()
        }
        .update(self.db.as_ref())
        .await?;

        counter!("bot_transitions_total", &[("to", next.as_str())]).increment(1);
        info!(
            from = %bot.status,
            to = %next,
            remote_code = %snapshot.code,
            "Bot transitioned"
        );

        match next {
            BotStatus::Done => self.complete_bot(bot).await?,
            BotStatus::Fatal => {
                warn!(remote_code = %snapshot.code, "Bot entered fatal state");
            }
            _ => {}
        }

        Ok(())
    }

    /// On the transition into done: re-fetch the full detail, capture every
    /// media artifact carrying a download URL, complete the owning event
    /// and hand it to the content collaborator.
    async fn complete_bot(&self, bot: &BotModel) -> Result<(), CoreError> {
        let detail = self.api.fetch_bot(&bot.id).await?;
        let now = Utc::now();

        for kind in ALL_MEDIA_KINDS {
            self.capture_media(&bot.id, &detail, *kind).await?;
        }

        EventActiveModel {
            id: Set(bot.calendar_event_id),
            status: Set(EventStatus::Completed.as_str().to_string()),
            updated_at: Set(now.into()),
            ..Default::default()
        }
        .update(self.db.as_ref())
        .await?;

        info!(event_id = %bot.calendar_event_id, "Owning event completed");
        self.content.dispatch(bot.calendar_event_id);

        Ok(())
    }

    /// Upsert one media row keyed by (bot, kind); re-running is safe.
    async fn capture_media(
        &self,
        bot_id: &str,
        detail: &BotDetail,
        kind: MediaKind,
    ) -> Result<(), CoreError> {
        let Some(shortcut) = detail.media_shortcut(kind) else {
            return Ok(());
        };
        let Some(download_url) = shortcut.data.download_url.clone() else {
            return Ok(());
        };

        let status = shortcut
            .status
            .as_ref()
            .map(|s| s.code.clone())
            .unwrap_or_else(|| "done".to_string());
        let now = Utc::now();

        let existing = MeetingMedia::find()
            .filter(MediaColumn::RecallBotId.eq(bot_id))
            .filter(MediaColumn::MediaType.eq(kind.as_str()))
            .one(self.db.as_ref())
            .await?;

        match existing {
            Some(row) => {
                MediaActiveModel {
                    id: Set(row.id),
                    status: Set(status),
                    download_url: Set(Some(download_url)),
                    expires_at: Set(shortcut.expires_at.map(Into::into)),
                    updated_at: Set(now.into()),
                    ..Default::default()
                }
                .update(self.db.as_ref())
                .await?;
            }
            None => {
                MediaActiveModel {
                    id: Set(Uuid::new_v4()),
                    recall_bot_id: Set(bot_id.to_string()),
                    media_type: Set(kind.as_str().to_string()),
                    status: Set(status),
                    download_url: Set(Some(download_url)),
                    expires_at: Set(shortcut.expires_at.map(Into::into)),
                    created_at: Set(now.into()),
                    updated_at: Set(now.into()),
                }
                .insert(self.db.as_ref())
                .await?;
                counter!("media_captured_total", &[("type", kind.as_str())]).increment(1);
            }
        }

        Ok(())
    }
}

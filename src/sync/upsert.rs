//! # Event Upsert & Diff Engine
//!
//! Persists canonical calendar events idempotently, decides notetaker
//! enablement and bot scheduling/cancellation, computes field-level diffs
//! and emits change notifications. All rows are keyed by
//! (connected_account_id, external_event_id), so re-submitting an
//! unchanged input produces the same stored row and no notification.

use chrono::{DateTime, Utc};
use metrics::counter;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::{BotStatus, EventStatus};
use crate::models::calendar_event::{
    ActiveModel as EventActiveModel, Column as EventColumn, Entity as CalendarEvent,
    Model as EventModel,
};
use crate::models::recall_bot::{Column as BotColumn, Entity as RecallBot};
use crate::normalize::EventInput;
use crate::notify::{ChangeRecord, FieldAction, NewNotification, Notifier, summarize};

/// Per-event result of an upsert: the persisted row plus the bot decision.
#[derive(Debug, Clone)]
pub struct UpsertOutcome {
    pub event: EventModel,
    pub should_schedule_bot: bool,
    pub should_cancel_bot: bool,
}

/// Event persistence and decision engine.
pub struct EventStore {
    db: Arc<DatabaseConnection>,
    notifier: Arc<Notifier>,
}

impl EventStore {
    pub fn new(db: Arc<DatabaseConnection>, notifier: Arc<Notifier>) -> Self {
        Self { db, notifier }
    }

    /// Upsert a batch of normalized events for one account.
    ///
    /// A single captured timestamp covers the whole batch so an event can
    /// never look both past and future within one pass.
    #[instrument(skip_all, fields(account_id = %account_id, inputs = inputs.len()))]
    pub async fn upsert_events(
        &self,
        user_id: Uuid,
        account_id: Uuid,
        inputs: &[EventInput],
        default_notetaker: bool,
    ) -> Result<Vec<UpsertOutcome>, CoreError> {
        let now = Utc::now();
        let mut outcomes = Vec::with_capacity(inputs.len());
        for input in inputs {
            outcomes.push(
                self.upsert_one(user_id, account_id, input, default_notetaker, now)
                    .await?,
            );
        }
        Ok(outcomes)
    }

    async fn upsert_one(
        &self,
        user_id: Uuid,
        account_id: Uuid,
        input: &EventInput,
        default_notetaker: bool,
        now: DateTime<Utc>,
    ) -> Result<UpsertOutcome, CoreError> {
        let existing = CalendarEvent::find()
            .filter(EventColumn::ConnectedAccountId.eq(account_id))
            .filter(EventColumn::ExternalEventId.eq(input.external_event_id.clone()))
            .one(self.db.as_ref())
            .await?;

        let bot = match &existing {
            Some(event) => {
                RecallBot::find()
                    .filter(BotColumn::CalendarEventId.eq(event.id))
                    .one(self.db.as_ref())
                    .await?
            }
            None => None,
        };
        let bot_status = bot.as_ref().and_then(|b| BotStatus::parse(&b.status));

        let notetaker_enabled =
            resolve_notetaker(input, existing.as_ref(), default_notetaker, now);
        let status = resolve_status(input, bot_status, now);

        let (event, changes, is_new) = match existing {
            Some(prev) => {
                let changes = diff_event(&prev, input);
                let dirty = !changes.is_empty()
                    || prev.status != status.as_str()
                    || prev.notetaker_enabled != notetaker_enabled;

                let event = if dirty {
                    let mut active: EventActiveModel = prev.into();
                    active.title = Set(input.title.clone());
                    active.start_time = Set(input.start_time.into());
                    active.end_time = Set(input.end_time.into());
                    active.status = Set(status.as_str().to_string());
                    active.meeting_url = Set(input.meeting_url.clone());
                    active.meeting_platform =
                        Set(input.meeting_platform.map(|p| p.as_str().to_string()));
                    active.location = Set(input.location.clone());
                    active.notetaker_enabled = Set(notetaker_enabled);
                    active.updated_at = Set(now.into());
                    active.update(self.db.as_ref()).await?
                } else {
                    prev
                };
                (event, changes, false)
            }
            None => {
                let event = EventActiveModel {
                    id: Set(Uuid::new_v4()),
                    connected_account_id: Set(account_id),
                    user_id: Set(user_id),
                    external_event_id: Set(input.external_event_id.clone()),
                    title: Set(input.title.clone()),
                    start_time: Set(input.start_time.into()),
                    end_time: Set(input.end_time.into()),
                    status: Set(status.as_str().to_string()),
                    meeting_url: Set(input.meeting_url.clone()),
                    meeting_platform: Set(input
                        .meeting_platform
                        .map(|p| p.as_str().to_string())),
                    location: Set(input.location.clone()),
                    notetaker_enabled: Set(notetaker_enabled),
                    deleted_at: Set(None),
                    created_at: Set(now.into()),
                    updated_at: Set(now.into()),
                }
                .insert(self.db.as_ref())
                .await?;
                (event, Vec::new(), true)
            }
        };

        if is_new {
            counter!("calendar_events_created_total").increment(1);
            let highlights = creation_highlights(&event);
            self.publish_event_notification(
                &event,
                "calendar_event_created",
                &format!("New meeting: {}", display_title(&event)),
                &highlights,
                serde_json::json!({ "highlights": &highlights }),
            )
            .await;
        } else if !changes.is_empty() {
            counter!("calendar_events_updated_total").increment(1);
            let fragments: Vec<String> = changes.iter().map(ChangeRecord::describe).collect();
            self.publish_event_notification(
                &event,
                "calendar_event_updated",
                &format!("Meeting updated: {}", display_title(&event)),
                &fragments,
                serde_json::json!({ "changes": changes }),
            )
            .await;
        }

        Ok(decide(event, bot_status, now))
    }

    async fn publish_event_notification(
        &self,
        event: &EventModel,
        kind: &str,
        title: &str,
        fragments: &[String],
        mut payload: serde_json::Value,
    ) {
        if let Some(map) = payload.as_object_mut() {
            map.insert(
                "event_id".to_string(),
                serde_json::Value::String(event.id.to_string()),
            );
            map.insert(
                "external_event_id".to_string(),
                serde_json::Value::String(event.external_event_id.clone()),
            );
        }

        self.notifier
            .publish(NewNotification {
                user_id: event.user_id,
                kind: kind.to_string(),
                title: title.to_string(),
                body: summarize(fragments),
                payload,
            })
            .await;
    }

    /// Flip the user-facing notetaker flag, re-deriving the bot decision
    /// from the freshly loaded bot state.
    #[instrument(skip_all, fields(event_id = %event_id))]
    pub async fn toggle_notetaker(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        enabled: bool,
    ) -> Result<UpsertOutcome, CoreError> {
        let event = CalendarEvent::find_by_id(event_id)
            .one(self.db.as_ref())
            .await?
            // Ownership mismatches read the same as missing rows.
            .filter(|event| event.user_id == user_id)
            .ok_or_else(|| CoreError::not_found(format!("calendar event {event_id}")))?;

        if enabled && event.meeting_url.is_none() {
            return Err(CoreError::validation(
                "cannot enable the notetaker for an event without a meeting URL",
            ));
        }

        let now = Utc::now();
        let event = if event.notetaker_enabled != enabled {
            let mut active: EventActiveModel = event.into();
            active.notetaker_enabled = Set(enabled);
            active.updated_at = Set(now.into());
            active.update(self.db.as_ref()).await?
        } else {
            event
        };

        let bot = RecallBot::find()
            .filter(BotColumn::CalendarEventId.eq(event.id))
            .one(self.db.as_ref())
            .await?;
        let bot_status = bot.as_ref().and_then(|b| BotStatus::parse(&b.status));

        Ok(decide(event, bot_status, now))
    }

    /// Soft-delete events the provider reported removed. An empty id list
    /// returns without issuing any query.
    #[instrument(skip_all, fields(account_id = %account_id, ids = external_ids.len()))]
    pub async fn mark_events_deleted(
        &self,
        account_id: Uuid,
        external_ids: &[String],
    ) -> Result<u64, CoreError> {
        if external_ids.is_empty() {
            return Ok(0);
        }

        let now = Utc::now();
        let result = CalendarEvent::update_many()
            .col_expr(
                EventColumn::Status,
                Expr::value(EventStatus::Cancelled.as_str()),
            )
            .col_expr(EventColumn::DeletedAt, Expr::value(now))
            .col_expr(EventColumn::UpdatedAt, Expr::value(now))
            .filter(EventColumn::ConnectedAccountId.eq(account_id))
            .filter(EventColumn::ExternalEventId.is_in(external_ids.to_vec()))
            .exec(self.db.as_ref())
            .await?;

        counter!("calendar_events_deleted_total").increment(result.rows_affected);
        Ok(result.rows_affected)
    }
}

/// Notetaker resolution, in priority order: no URL disables, an existing
/// row preserves its stored value, events already underway never
/// auto-enable, otherwise the account owner's default applies.
fn resolve_notetaker(
    input: &EventInput,
    existing: Option<&EventModel>,
    default_notetaker: bool,
    now: DateTime<Utc>,
) -> bool {
    if input.meeting_url.is_none() {
        return false;
    }
    if let Some(prev) = existing {
        return prev.notetaker_enabled;
    }
    if input.start_time <= now {
        return false;
    }
    default_notetaker
}

/// Status resolution, in priority order: provider-reported cancellation
/// wins outright, a finished bot completes the event, so does a passed end
/// time, otherwise the event is upcoming.
fn resolve_status(
    input: &EventInput,
    prior_bot: Option<BotStatus>,
    now: DateTime<Utc>,
) -> EventStatus {
    if input.cancelled {
        EventStatus::Cancelled
    } else if prior_bot == Some(BotStatus::Done) {
        EventStatus::Completed
    } else if input.end_time <= now {
        EventStatus::Completed
    } else {
        EventStatus::Upcoming
    }
}

/// Schedule/cancel decision against the persisted row and the bot state
/// loaded in the same pass.
fn decide(event: EventModel, bot_status: Option<BotStatus>, now: DateTime<Utc>) -> UpsertOutcome {
    let has_active_bot = bot_status.is_some_and(BotStatus::is_active);
    let start_time = event.start_time.with_timezone(&Utc);

    let should_schedule_bot = event.notetaker_enabled
        && event.meeting_url.is_some()
        && start_time > now
        && !has_active_bot;
    let should_cancel_bot =
        (!event.notetaker_enabled || event.meeting_url.is_none()) && has_active_bot;

    UpsertOutcome {
        event,
        should_schedule_bot,
        should_cancel_bot,
    }
}

/// Field-level diff between the stored row and the incoming input over the
/// tracked fields.
fn diff_event(prev: &EventModel, input: &EventInput) -> Vec<ChangeRecord> {
    let mut changes = Vec::new();

    let prev_start = prev.start_time.with_timezone(&Utc);
    if prev_start != input.start_time {
        changes.push(ChangeRecord {
            field: "start time",
            previous: Some(fmt_instant(prev_start)),
            current: Some(fmt_instant(input.start_time)),
            action: FieldAction::Updated,
        });
    }

    let prev_end = prev.end_time.with_timezone(&Utc);
    if prev_end != input.end_time {
        changes.push(ChangeRecord {
            field: "end time",
            previous: Some(fmt_instant(prev_end)),
            current: Some(fmt_instant(input.end_time)),
            action: FieldAction::Updated,
        });
    }

    if let Some(change) = ChangeRecord::from_values(
        "meeting link",
        prev.meeting_url.clone(),
        input.meeting_url.clone(),
    ) {
        changes.push(change);
    }
    if let Some(change) = ChangeRecord::from_values(
        "platform",
        prev.meeting_platform.clone(),
        input.meeting_platform.map(|p| p.as_str().to_string()),
    ) {
        changes.push(change);
    }
    if let Some(change) =
        ChangeRecord::from_values("location", prev.location.clone(), input.location.clone())
    {
        changes.push(change);
    }
    if let Some(change) =
        ChangeRecord::from_values("title", prev.title.clone(), input.title.clone())
    {
        changes.push(change);
    }

    changes
}

/// Highlights for a newly discovered event: the start time always, plus
/// link, location and platform when present.
fn creation_highlights(event: &EventModel) -> Vec<String> {
    let mut highlights = vec![format!(
        "starts at {}",
        fmt_instant(event.start_time.with_timezone(&Utc))
    )];
    if let Some(url) = &event.meeting_url {
        highlights.push(format!("meeting link {url}"));
    }
    if let Some(location) = &event.location {
        highlights.push(format!("location {location}"));
    }
    if let Some(platform) = &event.meeting_platform {
        highlights.push(format!("platform {platform}"));
    }
    highlights
}

fn display_title(event: &EventModel) -> String {
    event
        .title
        .clone()
        .unwrap_or_else(|| "Calendar event".to_string())
}

fn fmt_instant(instant: DateTime<Utc>) -> String {
    instant.format("%b %-d, %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MeetingPlatform;
    use crate::notify::{
        LogRealtimeGateway, NewNotification, Notification, NotificationSink, NotifyError,
    };
    use async_trait::async_trait;
    use chrono::Duration;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{Database, PaginatorTrait};
    use std::sync::Mutex;

    struct RecordingSink {
        created: Arc<Mutex<Vec<Notification>>>,
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        async fn create_notification(
            &self,
            notification: NewNotification,
        ) -> Result<Notification, NotifyError> {
            let created = Notification {
                id: Uuid::new_v4(),
                user_id: notification.user_id,
                kind: notification.kind,
                title: notification.title,
                body: notification.body,
                payload: notification.payload,
            };
            self.created.lock().unwrap().push(created.clone());
            Ok(created)
        }
    }

    struct Harness {
        db: Arc<DatabaseConnection>,
        store: EventStore,
        notifications: Arc<Mutex<Vec<Notification>>>,
        user_id: Uuid,
        account_id: Uuid,
    }

    async fn harness() -> Harness {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("create in-memory db");
        Migrator::up(&db, None).await.expect("apply migrations");
        let db = Arc::new(db);

        let notifications = Arc::new(Mutex::new(Vec::new()));
        let notifier = Arc::new(Notifier::new(
            Arc::new(RecordingSink {
                created: notifications.clone(),
            }),
            Arc::new(LogRealtimeGateway),
        ));

        let user_id = Uuid::new_v4();
        let account_id = Uuid::new_v4();
        let now = Utc::now();
        crate::models::connected_account::ActiveModel {
            id: Set(account_id),
            user_id: Set(user_id),
            provider: Set("google".to_string()),
            provider_account_id: Set(account_id.to_string()),
            access_token_ciphertext: Set(None),
            refresh_token_ciphertext: Set(None),
            expires_at: Set(None),
            last_synced_at: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(db.as_ref())
        .await
        .expect("insert account");

        Harness {
            store: EventStore::new(db.clone(), notifier),
            db,
            notifications,
            user_id,
            account_id,
        }
    }

    fn zoom_input(external_id: &str, start_in: Duration) -> EventInput {
        let start = Utc::now() + start_in;
        EventInput {
            external_event_id: external_id.to_string(),
            title: Some("Design review".to_string()),
            start_time: start,
            end_time: start + Duration::hours(1),
            cancelled: false,
            meeting_url: Some("https://zoom.us/j/1".to_string()),
            meeting_platform: Some(MeetingPlatform::Zoom),
            location: None,
        }
    }

    async fn insert_bot(h: &Harness, event_id: Uuid, status: &str) {
        let now = Utc::now();
        crate::models::recall_bot::ActiveModel {
            id: Set(format!("bot-{event_id}")),
            calendar_event_id: Set(event_id),
            status: Set(status.to_string()),
            join_at: Set(now.into()),
            meeting_url: Set("https://zoom.us/j/1".to_string()),
            metadata: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(h.db.as_ref())
        .await
        .expect("insert bot");
    }

    #[tokio::test]
    async fn fresh_future_event_enables_notetaker_and_schedules() {
        let h = harness().await;
        let input = zoom_input("e1", Duration::hours(1));

        let outcomes = h
            .store
            .upsert_events(h.user_id, h.account_id, &[input], true)
            .await
            .expect("upsert");

        let outcome = &outcomes[0];
        assert!(outcome.event.notetaker_enabled);
        assert_eq!(outcome.event.status, "upcoming");
        assert!(outcome.should_schedule_bot);
        assert!(!outcome.should_cancel_bot);

        let notifications = h.notifications.lock().unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, "calendar_event_created");
        assert!(notifications[0].body.contains("starts at"));
    }

    #[tokio::test]
    async fn identical_reupsert_is_silent_and_stable() {
        let h = harness().await;
        let input = zoom_input("e1", Duration::hours(1));

        let first = h
            .store
            .upsert_events(h.user_id, h.account_id, &[input.clone()], true)
            .await
            .expect("first upsert");
        let stored_first = first[0].event.clone();

        let second = h
            .store
            .upsert_events(h.user_id, h.account_id, &[input], true)
            .await
            .expect("second upsert");

        assert_eq!(second[0].event, stored_first, "row unchanged");
        assert_eq!(
            h.notifications.lock().unwrap().len(),
            1,
            "no notification on the identical re-upsert"
        );

        let count = CalendarEvent::find().count(h.db.as_ref()).await.expect("count");
        assert_eq!(count, 1, "dedup key keeps a single row");
    }

    #[tokio::test]
    async fn active_bot_suppresses_rescheduling() {
        let h = harness().await;
        let input = zoom_input("e1", Duration::hours(1));

        let first = h
            .store
            .upsert_events(h.user_id, h.account_id, &[input.clone()], true)
            .await
            .expect("first upsert");
        insert_bot(&h, first[0].event.id, "scheduled").await;

        let second = h
            .store
            .upsert_events(h.user_id, h.account_id, &[input], true)
            .await
            .expect("second upsert");
        assert!(!second[0].should_schedule_bot);
        assert!(!second[0].should_cancel_bot);
    }

    #[tokio::test]
    async fn past_event_completes_without_notetaker() {
        let h = harness().await;
        let start = Utc::now() - Duration::hours(2);
        let input = EventInput {
            external_event_id: "past".to_string(),
            title: None,
            start_time: start,
            end_time: start + Duration::hours(1),
            cancelled: false,
            meeting_url: Some("https://zoom.us/j/2".to_string()),
            meeting_platform: Some(MeetingPlatform::Zoom),
            location: None,
        };

        let outcomes = h
            .store
            .upsert_events(h.user_id, h.account_id, &[input], true)
            .await
            .expect("upsert");

        assert_eq!(outcomes[0].event.status, "completed");
        assert!(!outcomes[0].event.notetaker_enabled);
        assert!(!outcomes[0].should_schedule_bot);
    }

    #[tokio::test]
    async fn provider_cancellation_wins_over_everything() {
        let h = harness().await;
        let mut input = zoom_input("e1", Duration::hours(1));
        input.cancelled = true;

        let outcomes = h
            .store
            .upsert_events(h.user_id, h.account_id, &[input], true)
            .await
            .expect("upsert");
        assert_eq!(outcomes[0].event.status, "cancelled");
    }

    #[tokio::test]
    async fn finished_bot_completes_the_event() {
        let h = harness().await;
        let input = zoom_input("e1", Duration::hours(1));

        let first = h
            .store
            .upsert_events(h.user_id, h.account_id, &[input.clone()], true)
            .await
            .expect("first upsert");
        insert_bot(&h, first[0].event.id, "done").await;

        let second = h
            .store
            .upsert_events(h.user_id, h.account_id, &[input], true)
            .await
            .expect("second upsert");
        assert_eq!(second[0].event.status, "completed");
    }

    #[tokio::test]
    async fn manual_notetaker_override_survives_resync() {
        let h = harness().await;
        let input = zoom_input("e1", Duration::hours(1));

        let first = h
            .store
            .upsert_events(h.user_id, h.account_id, &[input.clone()], true)
            .await
            .expect("first upsert");

        h.store
            .toggle_notetaker(first[0].event.id, h.user_id, false)
            .await
            .expect("toggle off");

        let second = h
            .store
            .upsert_events(h.user_id, h.account_id, &[input], true)
            .await
            .expect("re-sync");
        assert!(
            !second[0].event.notetaker_enabled,
            "manual override is sticky"
        );
    }

    #[tokio::test]
    async fn changed_fields_notify_with_truncated_summary() {
        let h = harness().await;
        let input = zoom_input("e1", Duration::hours(1));
        h.store
            .upsert_events(h.user_id, h.account_id, &[input.clone()], true)
            .await
            .expect("first upsert");

        let start = input.start_time + Duration::minutes(30);
        let moved = EventInput {
            title: Some("Design review (moved)".to_string()),
            start_time: start,
            end_time: start + Duration::hours(2),
            meeting_url: Some("https://meet.google.com/abc-defg-hij".to_string()),
            meeting_platform: Some(MeetingPlatform::GoogleMeet),
            location: Some("Room 4".to_string()),
            ..input
        };

        h.store
            .upsert_events(h.user_id, h.account_id, &[moved], true)
            .await
            .expect("second upsert");

        let notifications = h.notifications.lock().unwrap();
        assert_eq!(notifications.len(), 2);
        let update = &notifications[1];
        assert_eq!(update.kind, "calendar_event_updated");
        // Six fields changed; the body shows three and collapses the rest.
        assert!(update.body.contains("+3 more"), "body: {}", update.body);
    }

    #[tokio::test]
    async fn dedup_key_resolves_same_row_regardless_of_order() {
        let h = harness().await;
        let a = zoom_input("same-id", Duration::hours(1));
        let mut b = zoom_input("same-id", Duration::hours(1));
        b.title = Some("Renamed".to_string());

        let outcomes = h
            .store
            .upsert_events(h.user_id, h.account_id, &[a, b], true)
            .await
            .expect("upsert");

        assert_eq!(outcomes[0].event.id, outcomes[1].event.id);
        let count = CalendarEvent::find().count(h.db.as_ref()).await.expect("count");
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn toggle_rejects_unknown_and_foreign_events() {
        let h = harness().await;

        let missing = h
            .store
            .toggle_notetaker(Uuid::new_v4(), h.user_id, true)
            .await;
        assert!(matches!(missing, Err(CoreError::NotFound(_))));

        let input = zoom_input("e1", Duration::hours(1));
        let outcomes = h
            .store
            .upsert_events(h.user_id, h.account_id, &[input], true)
            .await
            .expect("upsert");

        let foreign = h
            .store
            .toggle_notetaker(outcomes[0].event.id, Uuid::new_v4(), false)
            .await;
        assert!(matches!(foreign, Err(CoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn toggle_enable_without_url_is_rejected_and_mutation_free() {
        let h = harness().await;
        let start = Utc::now() + Duration::hours(1);
        let input = EventInput {
            external_event_id: "no-url".to_string(),
            title: None,
            start_time: start,
            end_time: start + Duration::hours(1),
            cancelled: false,
            meeting_url: None,
            meeting_platform: None,
            location: None,
        };
        let outcomes = h
            .store
            .upsert_events(h.user_id, h.account_id, &[input], true)
            .await
            .expect("upsert");
        let event_id = outcomes[0].event.id;

        let result = h.store.toggle_notetaker(event_id, h.user_id, true).await;
        assert!(matches!(result, Err(CoreError::Validation(_))));

        let stored = CalendarEvent::find_by_id(event_id)
            .one(h.db.as_ref())
            .await
            .expect("query")
            .expect("row");
        assert!(!stored.notetaker_enabled, "row untouched");
    }

    #[tokio::test]
    async fn toggle_off_with_active_bot_requests_cancellation() {
        let h = harness().await;
        let input = zoom_input("e1", Duration::hours(1));
        let outcomes = h
            .store
            .upsert_events(h.user_id, h.account_id, &[input], true)
            .await
            .expect("upsert");
        insert_bot(&h, outcomes[0].event.id, "in_call").await;

        let outcome = h
            .store
            .toggle_notetaker(outcomes[0].event.id, h.user_id, false)
            .await
            .expect("toggle off");
        assert!(outcome.should_cancel_bot);
        assert!(!outcome.should_schedule_bot);
    }

    #[tokio::test]
    async fn mark_deleted_empty_list_is_a_no_op() {
        let h = harness().await;
        let affected = h
            .store
            .mark_events_deleted(h.account_id, &[])
            .await
            .expect("no-op");
        assert_eq!(affected, 0);
    }

    #[tokio::test]
    async fn mark_deleted_flags_matching_rows() {
        let h = harness().await;
        let a = zoom_input("keep", Duration::hours(1));
        let b = zoom_input("drop", Duration::hours(2));
        h.store
            .upsert_events(h.user_id, h.account_id, &[a, b], true)
            .await
            .expect("upsert");

        let affected = h
            .store
            .mark_events_deleted(h.account_id, &["drop".to_string()])
            .await
            .expect("mark deleted");
        assert_eq!(affected, 1);

        let dropped = CalendarEvent::find()
            .filter(EventColumn::ExternalEventId.eq("drop"))
            .one(h.db.as_ref())
            .await
            .expect("query")
            .expect("row");
        assert_eq!(dropped.status, "cancelled");
        assert!(dropped.deleted_at.is_some());

        let kept = CalendarEvent::find()
            .filter(EventColumn::ExternalEventId.eq("keep"))
            .one(h.db.as_ref())
            .await
            .expect("query")
            .expect("row");
        assert_eq!(kept.status, "upcoming");
        assert!(kept.deleted_at.is_none());
    }

    #[test]
    fn notetaker_resolution_priority() {
        let now = Utc::now();
        let future = zoom_input("e", Duration::hours(1));

        // No URL always disables.
        let mut no_url = future.clone();
        no_url.meeting_url = None;
        assert!(!resolve_notetaker(&no_url, None, true, now));

        // New future event takes the default.
        assert!(resolve_notetaker(&future, None, true, now));
        assert!(!resolve_notetaker(&future, None, false, now));

        // Already-started new event never auto-enables.
        let mut started = future.clone();
        started.start_time = now - Duration::minutes(1);
        assert!(!resolve_notetaker(&started, None, true, now));
    }

    #[test]
    fn status_resolution_priority() {
        let now = Utc::now();
        let future = zoom_input("e", Duration::hours(1));

        let mut cancelled = future.clone();
        cancelled.cancelled = true;
        assert_eq!(
            resolve_status(&cancelled, Some(BotStatus::Done), now),
            EventStatus::Cancelled
        );

        assert_eq!(
            resolve_status(&future, Some(BotStatus::Done), now),
            EventStatus::Completed
        );

        let mut over = future.clone();
        over.end_time = now - Duration::minutes(1);
        assert_eq!(resolve_status(&over, None, now), EventStatus::Completed);

        assert_eq!(resolve_status(&future, None, now), EventStatus::Upcoming);
    }
}

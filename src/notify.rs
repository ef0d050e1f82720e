//! # Change Notifications
//!
//! Builds human-readable change summaries for calendar events and forwards
//! them through the notification collaborator and the realtime gateway.
//! Both collaborators are consumed through narrow traits; the default
//! implementations are single-shot HTTP posts.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

/// At most this many change fragments appear in a notification body; the
/// rest collapse into a "+N more" suffix.
const MAX_SUMMARY_FRAGMENTS: usize = 3;

/// How one tracked field changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldAction {
    Added,
    Removed,
    Updated,
}

/// Field-level difference between the previous and current persisted event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeRecord {
    pub field: &'static str,
    pub previous: Option<String>,
    pub current: Option<String>,
    pub action: FieldAction,
}

impl ChangeRecord {
    /// Build a record when the two sides differ; added/removed are inferred
    /// when one side is empty.
    pub fn from_values(
        field: &'static str,
        previous: Option<String>,
        current: Option<String>,
    ) -> Option<Self> {
        if previous == current {
            return None;
        }
        let action = match (&previous, &current) {
            (None, Some(_)) => FieldAction::Added,
            (Some(_), None) => FieldAction::Removed,
            _ => FieldAction::Updated,
        };
        Some(Self {
            field,
            previous,
            current,
            action,
        })
    }

    /// Human-readable fragment for the notification body.
    pub fn describe(&self) -> String {
        match self.action {
            FieldAction::Added => match &self.current {
                Some(value) => format!("{} added ({})", self.field, value),
                None => format!("{} added", self.field),
            },
            FieldAction::Removed => format!("{} removed", self.field),
            FieldAction::Updated => match &self.current {
                Some(value) => format!("{} changed to {}", self.field, value),
                None => format!("{} changed", self.field),
            },
        }
    }
}

/// Join up to [`MAX_SUMMARY_FRAGMENTS`] fragments, collapsing the overflow
/// into a "+N more" suffix.
pub fn summarize(fragments: &[String]) -> String {
    if fragments.len() <= MAX_SUMMARY_FRAGMENTS {
        return fragments.join(", ");
    }
    let shown = fragments[..MAX_SUMMARY_FRAGMENTS].join(", ");
    format!("{} +{} more", shown, fragments.len() - MAX_SUMMARY_FRAGMENTS)
}

/// Notification creation request.
#[derive(Debug, Clone, Serialize)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub kind: String,
    pub title: String,
    pub body: String,
    pub payload: serde_json::Value,
}

/// Notification as returned by the owning collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub title: String,
    pub body: String,
    pub payload: serde_json::Value,
}

/// Errors surfaced by the notification collaborators.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification endpoint returned status {status}")]
    Http { status: u16 },
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("invalid notification target: {0}")]
    InvalidTarget(String),
}

/// Creation interface owned by the notification collaborator.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn create_notification(
        &self,
        notification: NewNotification,
    ) -> Result<Notification, NotifyError>;
}

/// Realtime gateway forwarding a created notification to connected clients.
#[async_trait]
pub trait RealtimeGateway: Send + Sync {
    async fn emit_notification(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Composes the sink and the gateway. Collaborator failures are logged and
/// never abort the calling sync pass.
pub struct Notifier {
    sink: std::sync::Arc<dyn NotificationSink>,
    gateway: std::sync::Arc<dyn RealtimeGateway>,
}

impl Notifier {
    pub fn new(
        sink: std::sync::Arc<dyn NotificationSink>,
        gateway: std::sync::Arc<dyn RealtimeGateway>,
    ) -> Self {
        Self { sink, gateway }
    }

    /// Create the notification and forward it to the realtime gateway.
    pub async fn publish(&self, notification: NewNotification) {
        let user_id = notification.user_id;
        match self.sink.create_notification(notification).await {
            Ok(created) => {
                debug!(user_id = %user_id, notification_id = %created.id, "Created notification");
                if let Err(err) = self.gateway.emit_notification(&created).await {
                    warn!(
                        user_id = %user_id,
                        error = %err,
                        "Failed to forward notification to realtime gateway"
                    );
                }
            }
            Err(err) => {
                warn!(user_id = %user_id, error = %err, "Failed to create notification");
            }
        }
    }
}

/// HTTP-backed notification sink posting to the collaborator service.
pub struct HttpNotificationSink {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpNotificationSink {
    pub fn new(endpoint: String) -> Self {
        Self {
            client: http_client(),
            endpoint,
        }
    }
}

#[async_trait]
impl NotificationSink for HttpNotificationSink {
    async fn create_notification(
        &self,
        notification: NewNotification,
    ) -> Result<Notification, NotifyError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&notification)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(NotifyError::Http {
                status: response.status().as_u16(),
            });
        }

        // The collaborator assigns the id; fall back to a local one when the
        // response omits it.
        let body: serde_json::Value = response.json().await.unwrap_or_default();
        let id = body
            .get("id")
            .and_then(|v| v.as_str())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);

        Ok(Notification {
            id,
            user_id: notification.user_id,
            kind: notification.kind,
            title: notification.title,
            body: notification.body,
            payload: notification.payload,
        })
    }
}

/// HTTP-backed realtime gateway. Targets must be HTTPS outside local use.
pub struct HttpRealtimeGateway {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRealtimeGateway {
    pub fn new(endpoint: String) -> Self {
        Self {
            client: http_client(),
            endpoint,
        }
    }

    fn redacted_target(&self) -> String {
        Url::parse(&self.endpoint)
            .ok()
            .map(|parsed| {
                let scheme = parsed.scheme();
                let host = parsed.host_str().unwrap_or("unknown");
                format!("{}://{}", scheme, host)
            })
            .unwrap_or_else(|| "[invalid-url]".to_string())
    }
}

#[async_trait]
impl RealtimeGateway for HttpRealtimeGateway {
    async fn emit_notification(&self, notification: &Notification) -> Result<(), NotifyError> {
        if self.endpoint.len() > 2048 {
            return Err(NotifyError::InvalidTarget(format!(
                "gateway URL exceeds maximum length: {}",
                self.redacted_target()
            )));
        }

        let response = self
            .client
            .post(&self.endpoint)
            .json(notification)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(NotifyError::Http {
                status: response.status().as_u16(),
            });
        }

        Ok(())
    }
}

/// Log-only collaborators for local profiles with no endpoints configured.
pub struct LogNotificationSink;

#[async_trait]
impl NotificationSink for LogNotificationSink {
    async fn create_notification(
        &self,
        notification: NewNotification,
    ) -> Result<Notification, NotifyError> {
        debug!(
            user_id = %notification.user_id,
            kind = %notification.kind,
            body = %notification.body,
            "Notification (log sink)"
        );
        Ok(Notification {
            id: Uuid::new_v4(),
            user_id: notification.user_id,
            kind: notification.kind,
            title: notification.title,
            body: notification.body,
            payload: notification.payload,
        })
    }
}

pub struct LogRealtimeGateway;

#[async_trait]
impl RealtimeGateway for LogRealtimeGateway {
    async fn emit_notification(&self, notification: &Notification) -> Result<(), NotifyError> {
        debug!(notification_id = %notification.id, "Notification emit (log gateway)");
        Ok(())
    }
}

fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap_or_default()
}

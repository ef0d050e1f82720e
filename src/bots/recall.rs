//! Remote bot API client
//!
//! Thin client over the bot-provisioning HTTP API: create, fetch and delete
//! bots. A 404 on fetch/delete maps to a distinguished error variant so the
//! lifecycle engine can treat "already gone remotely" as expected.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::models::MediaKind;

/// Bot API error types
#[derive(Debug, Error)]
pub enum RecallError {
    /// The remote bot no longer exists
    #[error("bot {bot_id} not found remotely")]
    BotNotFound { bot_id: String },
    /// HTTP error from the bot API
    #[error("bot API request failed with status {status}: {message}")]
    Api { status: u16, message: String },
    /// Network or connectivity error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    /// Response body did not match the expected shape
    #[error("malformed bot API response: {0}")]
    MalformedResponse(String),
}

/// Fixed recording configuration sent with every provisioning request.
#[derive(Debug, Clone, Serialize)]
pub struct RecordingConfig {
    pub transcript: bool,
    pub video_mixed: bool,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            transcript: true,
            video_mixed: true,
        }
    }
}

/// Metadata linking the remote bot back to the local event and user.
#[derive(Debug, Clone, Serialize)]
pub struct BotMetadata {
    pub calendar_event_id: Uuid,
    pub user_id: Uuid,
}

/// Provisioning request body.
#[derive(Debug, Clone, Serialize)]
pub struct NewBot {
    pub meeting_url: String,
    pub join_at: DateTime<Utc>,
    pub recording_config: RecordingConfig,
    pub metadata: BotMetadata,
}

/// Provisioning response.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedBot {
    pub id: String,
}

/// One entry in the bot's status-change history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusSnapshot {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Signed download data for one media shortcut.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MediaData {
    pub download_url: Option<String>,
}

/// One producible artifact as reported by the remote API.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MediaShortcut {
    pub data: MediaData,
    pub status: Option<StatusSnapshot>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Shortcut block keyed by artifact kind.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MediaShortcuts {
    pub transcript: Option<MediaShortcut>,
    pub video_mixed: Option<MediaShortcut>,
    pub participant_events: Option<MediaShortcut>,
    pub meeting_metadata: Option<MediaShortcut>,
}

/// One recording produced by the bot.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Recording {
    pub media_shortcuts: MediaShortcuts,
}

/// Full bot detail as fetched from the remote API.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BotDetail {
    pub id: String,
    pub status: Option<StatusSnapshot>,
    pub status_changes: Vec<StatusSnapshot>,
    pub recordings: Vec<Recording>,
}

impl BotDetail {
    /// Most recent status snapshot: the tail of the status-change history,
    /// falling back to the top-level status field when the history is
    /// empty.
    pub fn latest_status(&self) -> Option<&StatusSnapshot> {
        self.status_changes.last().or(self.status.as_ref())
    }

    /// Shortcut for one artifact kind, from the first recording.
    pub fn media_shortcut(&self, kind: MediaKind) -> Option<&MediaShortcut> {
        let shortcuts = &self.recordings.first()?.media_shortcuts;
        match kind {
            MediaKind::Transcript => shortcuts.transcript.as_ref(),
            MediaKind::Video => shortcuts.video_mixed.as_ref(),
            MediaKind::ParticipantEvents => shortcuts.participant_events.as_ref(),
            MediaKind::Metadata => shortcuts.meeting_metadata.as_ref(),
        }
    }
}

#[async_trait]
pub trait RecallApi: Send + Sync {
    /// Provision a bot for a meeting.
    async fn create_bot(&self, new_bot: NewBot) -> Result<CreatedBot, RecallError>;

    /// Fetch the bot's current remote detail.
    async fn fetch_bot(&self, bot_id: &str) -> Result<BotDetail, RecallError>;

    /// Delete the remote bot. A remote 404 maps to
    /// [`RecallError::BotNotFound`].
    async fn delete_bot(&self, bot_id: &str) -> Result<(), RecallError>;
}

/// HTTP client for the bot API.
pub struct RecallClient {
    client: reqwest::Client,
    api_base: String,
    api_key: Option<String>,
}

impl RecallClient {
    pub fn new(api_base: String, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(15))
                .build()
                .unwrap_or_default(),
            api_base,
            api_key,
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut request = self.client.request(method, format!("{}{}", self.api_base, path));
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Token {key}"));
        }
        request
    }

    async fn error_for_status(
        response: reqwest::Response,
        bot_id: Option<&str>,
    ) -> Result<reqwest::Response, RecallError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status.as_u16() == 404
            && let Some(bot_id) = bot_id
        {
            return Err(RecallError::BotNotFound {
                bot_id: bot_id.to_string(),
            });
        }

        let message = response.text().await.unwrap_or_default();
        Err(RecallError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl RecallApi for RecallClient {
    async fn create_bot(&self, new_bot: NewBot) -> Result<CreatedBot, RecallError> {
        let response = self
            .request(reqwest::Method::POST, "/bot")
            .json(&new_bot)
            .send()
            .await?;
        let response = Self::error_for_status(response, None).await?;
        response
            .json()
            .await
            .map_err(|e| RecallError::MalformedResponse(e.to_string()))
    }

    async fn fetch_bot(&self, bot_id: &str) -> Result<BotDetail, RecallError> {
        let response = self
            .request(reqwest::Method::GET, &format!("/bot/{bot_id}"))
            .send()
            .await?;
        let response = Self::error_for_status(response, Some(bot_id)).await?;
        response
            .json()
            .await
            .map_err(|e| RecallError::MalformedResponse(e.to_string()))
    }

    async fn delete_bot(&self, bot_id: &str) -> Result<(), RecallError> {
        let response = self
            .request(reqwest::Method::DELETE, &format!("/bot/{bot_id}"))
            .send()
            .await?;
        Self::error_for_status(response, Some(bot_id)).await?;
        Ok(())
    }
}

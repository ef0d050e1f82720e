//! Google Calendar provider implementation
//!
//! Fetches events from the Google Calendar `events.list` endpoint with
//! `pageToken` continuation, and refreshes access tokens against the OAuth
//! token endpoint. Base URLs are injectable so tests can point at a mock
//! server.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::providers::trait_::{
    CalendarProvider, EventPage, EventWindow, ProviderError, ProviderEvent, RefreshedTokens,
};

const MAX_RESULTS_PER_PAGE: u32 = 250;

/// Google Calendar provider adapter.
pub struct GoogleCalendarProvider {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    api_base: String,
    token_url: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventsResponse {
    #[serde(default)]
    items: Vec<ProviderEvent>,
    next_page_token: Option<String>,
}

impl GoogleCalendarProvider {
    pub fn new(
        client_id: String,
        client_secret: String,
        api_base: String,
        token_url: String,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            client_id,
            client_secret,
            api_base,
            token_url,
        }
    }

    async fn error_for_status(
        response: reqwest::Response,
        context: &str,
    ) -> Result<reqwest::Response, ProviderError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = format!("{context}: {}", truncate(&body, 200));
        if status.as_u16() == 401 {
            return Err(ProviderError::Unauthorized(message));
        }
        Err(ProviderError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl CalendarProvider for GoogleCalendarProvider {
    async fn refresh_tokens(
        &self,
        refresh_token: &str,
    ) -> Result<RefreshedTokens, ProviderError> {
        if self.client_id.is_empty() || self.client_secret.is_empty() {
            return Err(ProviderError::Configuration(
                "Google client credentials are not configured".to_string(),
            ));
        }

        let response = self
            .client
            .post(&self.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;

        let response = Self::error_for_status(response, "token refresh failed").await?;
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        Ok(RefreshedTokens {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at: token
                .expires_in
                .map(|seconds| Utc::now() + Duration::seconds(seconds)),
        })
    }

    async fn list_events(
        &self,
        access_token: &str,
        window: &EventWindow,
        page_token: Option<&str>,
    ) -> Result<EventPage, ProviderError> {
        let url = format!("{}/calendars/primary/events", self.api_base);

        let mut query: Vec<(&str, String)> = vec![
            ("singleEvents", "true".to_string()),
            ("orderBy", "startTime".to_string()),
            ("timeMin", window.from.to_rfc3339()),
            ("timeMax", window.to.to_rfc3339()),
            ("maxResults", MAX_RESULTS_PER_PAGE.to_string()),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token.to_string()));
        }

        let response = self
            .client
            .get(&url)
            .bearer_auth(access_token)
            .query(&query)
            .send()
            .await?;
        let response = Self::error_for_status(response, "event listing failed").await?;
        let page: EventsResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        debug!(
            items = page.items.len(),
            has_more = page.next_page_token.is_some(),
            "Fetched Google Calendar events page"
        );

        Ok(EventPage {
            items: page.items,
            next_page_token: page.next_page_token,
        })
    }
}

fn truncate(body: &str, max_chars: usize) -> String {
    if body.chars().count() > max_chars {
        let truncated: String = body.chars().take(max_chars).collect();
        format!("{truncated}...")
    } else {
        body.to_string()
    }
}

//! Calendar provider trait definition
//!
//! Defines the interface every calendar provider adapter implements: token
//! refresh and paginated event listing over a bounded window.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Deserialize;
use thiserror::Error;

/// Provider-specific error types for structured error handling
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider rejected the supplied credentials
    #[error("provider rejected credentials: {0}")]
    Unauthorized(String),
    /// HTTP error from the provider API
    #[error("provider request failed with status {status}: {message}")]
    Api { status: u16, message: String },
    /// Network or connectivity error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    /// Response body did not match the expected shape
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
    /// Provider misconfiguration (missing client credentials, bad base URL)
    #[error("provider configuration error: {0}")]
    Configuration(String),
}

/// Fixed fetch window, inclusive start to exclusive end.
#[derive(Debug, Clone, Copy)]
pub struct EventWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl EventWindow {
    /// Window from `now` through `now + days`.
    pub fn starting_at(now: DateTime<Utc>, days: i64) -> Self {
        Self {
            from: now,
            to: now + Duration::days(days),
        }
    }
}

/// Start or end of a provider event: a timed instant for normal events,
/// a bare date for all-day events.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct EventDateTime {
    pub date_time: Option<DateTime<Utc>>,
    pub date: Option<NaiveDate>,
}

impl EventDateTime {
    /// Resolve to an instant; all-day dates resolve to midnight UTC.
    pub fn resolve(&self) -> Option<DateTime<Utc>> {
        self.date_time.or_else(|| {
            self.date
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        })
    }
}

/// Conference entry point attached to an event.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ConferenceEntryPoint {
    pub entry_point_type: Option<String>,
    pub uri: Option<String>,
}

/// Conference block attached to an event.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ConferenceData {
    pub entry_points: Vec<ConferenceEntryPoint>,
}

/// Calendar event as returned by a provider, before normalization.
///
/// The field shape follows the Google Calendar events resource; other
/// providers adapt their payloads into this shape.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderEvent {
    pub id: Option<String>,
    pub status: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub hangout_link: Option<String>,
    pub conference_data: Option<ConferenceData>,
    pub start: Option<EventDateTime>,
    pub end: Option<EventDateTime>,
}

/// One page of events plus the continuation token, if any.
#[derive(Debug, Clone, Default)]
pub struct EventPage {
    pub items: Vec<ProviderEvent>,
    pub next_page_token: Option<String>,
}

/// Result of a token refresh.
#[derive(Debug, Clone)]
pub struct RefreshedTokens {
    pub access_token: String,
    /// Some providers rotate the refresh token; absent means keep the old one.
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait CalendarProvider: Send + Sync {
    /// Exchange a refresh token for a fresh access token.
    async fn refresh_tokens(&self, refresh_token: &str)
    -> Result<RefreshedTokens, ProviderError>;

    /// Fetch one page of events within the window. Callers loop until
    /// `next_page_token` comes back empty.
    async fn list_events(
        &self,
        access_token: &str,
        window: &EventWindow,
        page_token: Option<&str>,
    ) -> Result<EventPage, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_spans_requested_days() {
        let now = DateTime::parse_from_rfc3339("2025-03-01T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let window = EventWindow::starting_at(now, 28);
        assert_eq!(window.from, now);
        assert_eq!((window.to - window.from).num_days(), 28);
    }

    #[test]
    fn all_day_date_resolves_to_midnight() {
        let dt = EventDateTime {
            date_time: None,
            date: Some(NaiveDate::from_ymd_opt(2025, 3, 5).unwrap()),
        };
        let resolved = dt.resolve().expect("resolves");
        assert_eq!(resolved.to_rfc3339(), "2025-03-05T00:00:00+00:00");
    }

    #[test]
    fn timed_instant_wins_over_date() {
        let instant = DateTime::parse_from_rfc3339("2025-03-05T10:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let dt = EventDateTime {
            date_time: Some(instant),
            date: Some(NaiveDate::from_ymd_opt(2025, 3, 5).unwrap()),
        };
        assert_eq!(dt.resolve(), Some(instant));
    }
}

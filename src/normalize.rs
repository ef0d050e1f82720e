//! # Event Normalizer
//!
//! Maps provider-shaped events into the canonical upsert input: drops
//! events missing the fields the engine requires, extracts the meeting URL
//! and classifies the conferencing platform via a pattern table.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::models::MeetingPlatform;
use crate::providers::ProviderEvent;

/// Canonical upsert input produced from one provider event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventInput {
    pub external_event_id: String,
    pub title: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// The provider explicitly reported the event cancelled.
    pub cancelled: bool,
    pub meeting_url: Option<String>,
    pub meeting_platform: Option<MeetingPlatform>,
    pub location: Option<String>,
}

/// Pattern table mapping meeting-URL shapes to platforms. Kept as data so
/// new platforms extend the table, not the extraction flow.
static PLATFORM_PATTERNS: LazyLock<Vec<(Regex, MeetingPlatform)>> = LazyLock::new(|| {
    vec![
        (
            Regex::new(r#"https://[a-zA-Z0-9.\-]*zoom\.us/j/[^\s<>"']+"#).expect("zoom pattern"),
            MeetingPlatform::Zoom,
        ),
        (
            Regex::new(r#"https://meet\.google\.com/[a-z\-]+"#).expect("meet pattern"),
            MeetingPlatform::GoogleMeet,
        ),
        (
            Regex::new(r#"https://teams\.microsoft\.com/l/meetup-join/[^\s<>"']+"#)
                .expect("teams pattern"),
            MeetingPlatform::MicrosoftTeams,
        ),
        (
            Regex::new(r#"https://[a-zA-Z0-9.\-]*webex\.com/[^\s<>"']+"#).expect("webex pattern"),
            MeetingPlatform::Webex,
        ),
    ]
});

/// Normalize one provider event; `None` drops events missing id, start or
/// end.
pub fn normalize_event(event: &ProviderEvent) -> Option<EventInput> {
    let external_event_id = event.id.as_ref().filter(|id| !id.is_empty())?.clone();
    let start_time = event.start.as_ref().and_then(|s| s.resolve())?;
    let end_time = event.end.as_ref().and_then(|e| e.resolve())?;

    let meeting_url = extract_meeting_url(event);
    let meeting_platform = meeting_url.as_deref().and_then(classify_platform);

    Some(EventInput {
        external_event_id,
        title: event.summary.clone().filter(|s| !s.is_empty()),
        start_time,
        end_time,
        cancelled: event.status.as_deref() == Some("cancelled"),
        meeting_url,
        meeting_platform,
        location: event.location.clone().filter(|s| !s.is_empty()),
    })
}

/// Extract the meeting URL, in priority order: video conference entry
/// point, hangout link, then the first platform-shaped URL found in the
/// location or description text.
fn extract_meeting_url(event: &ProviderEvent) -> Option<String> {
    if let Some(conference) = &event.conference_data {
        let video_entry = conference
            .entry_points
            .iter()
            .find(|entry| entry.entry_point_type.as_deref() == Some("video"))
            .and_then(|entry| entry.uri.clone());
        if video_entry.is_some() {
            return video_entry;
        }
    }

    if let Some(link) = event.hangout_link.clone().filter(|l| !l.is_empty()) {
        return Some(link);
    }

    event
        .location
        .as_deref()
        .and_then(find_meeting_url)
        .or_else(|| event.description.as_deref().and_then(find_meeting_url))
}

/// Find the first meeting-looking URL in free text.
pub fn find_meeting_url(text: &str) -> Option<String> {
    PLATFORM_PATTERNS
        .iter()
        .filter_map(|(pattern, _)| pattern.find(text).map(|m| (m.start(), m.as_str())))
        .min_by_key(|(start, _)| *start)
        .map(|(_, url)| url.to_string())
}

/// Classify a meeting URL's platform by its shape.
pub fn classify_platform(url: &str) -> Option<MeetingPlatform> {
    PLATFORM_PATTERNS
        .iter()
        .find(|(pattern, _)| pattern.is_match(url))
        .map(|(_, platform)| *platform)
}

//! # Data Model
//!
//! SeaORM entities for the meetsync core plus the canonical status and
//! platform vocabularies. The database stores the canonical strings; Rust
//! code works with the enums.

use std::fmt;

pub mod calendar_event;
pub mod connected_account;
pub mod meeting_media;
pub mod meeting_preference;
pub mod recall_bot;

/// Lifecycle status of a calendar event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventStatus {
    Upcoming,
    Completed,
    Cancelled,
}

impl EventStatus {
    /// Return the canonical string representation for this status.
    pub const fn as_str(self) -> &'static str {
        match self {
            EventStatus::Upcoming => "upcoming",
            EventStatus::Completed => "completed",
            EventStatus::Cancelled => "cancelled",
        }
    }

    /// Parse a canonical status string.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "upcoming" => Some(EventStatus::Upcoming),
            "completed" => Some(EventStatus::Completed),
            "cancelled" => Some(EventStatus::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a recording bot.
///
/// Happy path: scheduled → joining → in_call → done. Any non-terminal state
/// may transition to fatal or cancelled. done, fatal and cancelled are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BotStatus {
    Scheduled,
    Joining,
    InCall,
    Done,
    Fatal,
    Cancelled,
}

impl BotStatus {
    /// Return the canonical string representation for this status.
    pub const fn as_str(self) -> &'static str {
        match self {
            BotStatus::Scheduled => "scheduled",
            BotStatus::Joining => "joining",
            BotStatus::InCall => "in_call",
            BotStatus::Done => "done",
            BotStatus::Fatal => "fatal",
            BotStatus::Cancelled => "cancelled",
        }
    }

    /// Parse a canonical status string.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "scheduled" => Some(BotStatus::Scheduled),
            "joining" => Some(BotStatus::Joining),
            "in_call" => Some(BotStatus::InCall),
            "done" => Some(BotStatus::Done),
            "fatal" => Some(BotStatus::Fatal),
            "cancelled" => Some(BotStatus::Cancelled),
            _ => None,
        }
    }

    /// A bot still holding its slot on the meeting: scheduled, joining or
    /// in the call.
    pub const fn is_active(self) -> bool {
        matches!(
            self,
            BotStatus::Scheduled | BotStatus::Joining | BotStatus::InCall
        )
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, BotStatus::Done | BotStatus::Fatal | BotStatus::Cancelled)
    }
}

impl fmt::Display for BotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statuses counted as "active" when enforcing the one-active-bot-per-event
/// invariant in queries.
pub const ACTIVE_BOT_STATUSES: &[&str] = &["scheduled", "joining", "in_call"];

/// Conferencing platform detected from a meeting URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeetingPlatform {
    Zoom,
    GoogleMeet,
    MicrosoftTeams,
    Webex,
}

impl MeetingPlatform {
    pub const fn as_str(self) -> &'static str {
        match self {
            MeetingPlatform::Zoom => "zoom",
            MeetingPlatform::GoogleMeet => "google_meet",
            MeetingPlatform::MicrosoftTeams => "microsoft_teams",
            MeetingPlatform::Webex => "webex",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "zoom" => Some(MeetingPlatform::Zoom),
            "google_meet" => Some(MeetingPlatform::GoogleMeet),
            "microsoft_teams" => Some(MeetingPlatform::MicrosoftTeams),
            "webex" => Some(MeetingPlatform::Webex),
            _ => None,
        }
    }
}

impl fmt::Display for MeetingPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of artifact a bot can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Transcript,
    Video,
    ParticipantEvents,
    Metadata,
}

impl MediaKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            MediaKind::Transcript => "transcript",
            MediaKind::Video => "video",
            MediaKind::ParticipantEvents => "participant_events",
            MediaKind::Metadata => "metadata",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "transcript" => Some(MediaKind::Transcript),
            "video" => Some(MediaKind::Video),
            "participant_events" => Some(MediaKind::ParticipantEvents),
            "metadata" => Some(MediaKind::Metadata),
            _ => None,
        }
    }
}

/// Complete registry of producible media kinds, in capture order.
pub const ALL_MEDIA_KINDS: &[MediaKind] = &[
    MediaKind::Transcript,
    MediaKind::Video,
    MediaKind::ParticipantEvents,
    MediaKind::Metadata,
];

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

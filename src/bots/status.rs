//! Remote status mapping and the edge-triggered transition check.
//!
//! The remote vocabulary is many-to-one and open-ended, so the mapping
//! lives in a lookup table with an explicit unknown-means-ignore default,
//! separate from the polling control flow. The transition check itself is a
//! pure function so it can be tested without any I/O.

use crate::models::BotStatus;

/// Remote status codes mapped to the internal lifecycle vocabulary.
/// Codes absent from this table are ignored by the poller.
const REMOTE_STATUS_MAP: &[(&str, BotStatus)] = &[
    ("ready", BotStatus::Scheduled),
    ("scheduled", BotStatus::Scheduled),
    ("in_waiting_room", BotStatus::Joining),
    ("joining_call", BotStatus::Joining),
    ("in_call_recording", BotStatus::InCall),
    ("in_call_not_recording", BotStatus::InCall),
    ("call_ended", BotStatus::InCall),
    ("done", BotStatus::Done),
    ("fatal", BotStatus::Fatal),
    ("recording_permission_denied", BotStatus::Fatal),
];

/// Map a remote status code; unknown codes return `None` and are ignored.
pub fn map_remote_status(code: &str) -> Option<BotStatus> {
    REMOTE_STATUS_MAP
        .iter()
        .find(|(remote, _)| *remote == code)
        .map(|(_, status)| *status)
}

/// What the poller should do with one observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollAction {
    /// Unchanged, unknown, or terminal — no write, no side effects.
    None,
    /// The bot moved to a new state; act exactly once.
    Transitioned(BotStatus),
}

/// Edge-triggered transition check: only a changed, non-terminal-origin
/// observation produces an action, so repeated identical polls stay
/// side-effect free.
pub fn next_action(stored: BotStatus, mapped: Option<BotStatus>) -> PollAction {
    match mapped {
        Some(next) if !stored.is_terminal() && next != stored => PollAction::Transitioned(next),
        _ => PollAction::None,
    }
}

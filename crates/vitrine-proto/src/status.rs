//! Display-state types for the two music widgets.
//!
//! Each widget's state is a tagged union carrying only the fields that are
//! valid for that state: an errored history lookup has no track to show, so
//! the `Error` variant carries none. Statuses are immutable snapshots; a new
//! poll replaces the previous value wholesale.

use serde::{Deserialize, Serialize};

/// One resolved track from the listening-history API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackInfo {
    pub track: String,
    pub artist: String,
    pub artwork_url: String,
    pub permalink_url: String,
}

/// Coarse lifecycle of the listening-history widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "lifecycle", rename_all = "snake_case")]
pub enum TrackStatus {
    /// Initial state before the first poll completes.
    Loading,
    /// Upstream failure or unexpected response shape.
    Error,
    /// Nothing playing right now; `track` is the most recent scrobble,
    /// `None` when the history is empty.
    Historical { track: Option<TrackInfo> },
    /// A track is playing at this moment.
    Live { track: TrackInfo },
}

impl TrackStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, TrackStatus::Live { .. })
    }

    pub fn track_info(&self) -> Option<&TrackInfo> {
        match self {
            TrackStatus::Live { track } => Some(track),
            TrackStatus::Historical { track } => track.as_ref(),
            TrackStatus::Loading | TrackStatus::Error => None,
        }
    }
}

/// One resolved track from the currently-playing API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NowPlayingTrack {
    pub title: String,
    /// All artist names joined with ", ".
    pub artist: String,
    pub album_art_url: String,
}

/// Coarse lifecycle of the now-playing widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PlayerState {
    /// Nothing playing (204, or 200 with `is_playing: false`).
    Offline,
    /// Transient upstream failure; polling continues.
    Maintenance,
    /// 401 from upstream. Terminal: the poller stops for the session.
    AuthExpired,
    Playing { track: NowPlayingTrack },
}

impl PlayerState {
    /// Benign status string for the widget. Raw errors never reach the page.
    pub fn status_text(&self) -> &'static str {
        match self {
            PlayerState::Offline => "OFFLINE",
            PlayerState::Maintenance | PlayerState::AuthExpired => "UNDER MAINTENANCE",
            PlayerState::Playing { .. } => "LISTENING...",
        }
    }
}

//! Serde models for the three upstream JSON shapes, plus the derivations
//! that map them into the widget status types.
//!
//! The Last.fm shape is quirky: artist and image text live under `#text`,
//! and the now-playing marker is a *string* `"true"` under `@attr`.

use serde::{Deserialize, Serialize};

use crate::status::{NowPlayingTrack, TrackInfo, TrackStatus};

// ── Last.fm user.getrecenttracks ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RecentTracksResponse {
    pub recenttracks: RecentTracks,
}

#[derive(Debug, Deserialize)]
pub struct RecentTracks {
    #[serde(default)]
    pub track: Vec<RecentTrack>,
}

#[derive(Debug, Deserialize)]
pub struct RecentTrack {
    pub name: String,
    pub artist: ArtistField,
    #[serde(default)]
    pub image: Vec<ImageField>,
    #[serde(rename = "@attr")]
    pub attr: Option<TrackAttr>,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct ArtistField {
    #[serde(rename = "#text")]
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct ImageField {
    #[serde(rename = "#text")]
    pub text: String,
    #[serde(default)]
    pub size: String,
}

#[derive(Debug, Deserialize)]
pub struct TrackAttr {
    #[serde(default)]
    pub nowplaying: String,
}

impl RecentTrack {
    /// Largest available artwork. The Last.fm size ladder is positional:
    /// index 3 is extralarge, index 2 large. Empty string when neither is set.
    pub fn artwork_url(&self) -> String {
        for idx in [3usize, 2] {
            if let Some(img) = self.image.get(idx) {
                if !img.text.is_empty() {
                    return img.text.clone();
                }
            }
        }
        String::new()
    }

    pub fn is_now_playing(&self) -> bool {
        self.attr
            .as_ref()
            .map(|a| a.nowplaying == "true")
            .unwrap_or(false)
    }
}

impl RecentTracksResponse {
    /// Collapse the response into a widget lifecycle. An empty history is a
    /// valid "nothing on record" state, not an error.
    pub fn into_track_status(self) -> TrackStatus {
        let Some(track) = self.recenttracks.track.into_iter().next() else {
            return TrackStatus::Historical { track: None };
        };

        let live = track.is_now_playing();
        let info = TrackInfo {
            artwork_url: track.artwork_url(),
            track: track.name,
            artist: track.artist.text,
            permalink_url: track.url,
        };

        if live {
            TrackStatus::Live { track: info }
        } else {
            TrackStatus::Historical { track: Some(info) }
        }
    }
}

// ── Spotify currently-playing ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CurrentlyPlaying {
    pub is_playing: bool,
    pub item: Option<PlayerItem>,
}

#[derive(Debug, Deserialize)]
pub struct PlayerItem {
    pub name: String,
    #[serde(default)]
    pub artists: Vec<PlayerArtist>,
    pub album: PlayerAlbum,
}

#[derive(Debug, Deserialize)]
pub struct PlayerArtist {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct PlayerAlbum {
    #[serde(default)]
    pub images: Vec<PlayerImage>,
}

#[derive(Debug, Deserialize)]
pub struct PlayerImage {
    pub url: String,
}

impl CurrentlyPlaying {
    /// `Some` only when a track is actively playing.
    pub fn playing_track(&self) -> Option<NowPlayingTrack> {
        if !self.is_playing {
            return None;
        }
        let item = self.item.as_ref()?;
        Some(NowPlayingTrack {
            title: item.name.clone(),
            artist: item
                .artists
                .iter()
                .map(|a| a.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            album_art_url: item
                .album
                .images
                .first()
                .map(|i| i.url.clone())
                .unwrap_or_default(),
        })
    }
}

// ── Gemini generateContent ────────────────────────────────────────────────────

/// Body of the caption proxy request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionRequest {
    pub seed: String,
    #[serde(rename = "isActive")]
    pub is_active: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
pub struct CandidatePart {
    #[serde(default)]
    pub text: String,
}

impl GenerateContentResponse {
    /// First candidate's first text part, trimmed. `None` when empty.
    pub fn first_text(&self) -> Option<String> {
        let text = self
            .candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()?
            .text
            .trim();
        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }
}

// ── tests ─────────────────────────────────────────────────────────────────────

//! Now-playing fetcher.
//!
//! Unlike the history fetcher this one keeps the raw HTTP status around,
//! because the poller's behavior depends on it: 401 ends polling for the
//! session, everything else is retried on the next tick.

use reqwest::Client;
use tracing::warn;

use vitrine_proto::status::{NowPlayingTrack, PlayerState};
use vitrine_proto::wire::CurrentlyPlaying;

/// Outcome of one now-playing poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerPoll {
    pub http_status: u16,
    pub track: Option<NowPlayingTrack>,
}

impl PlayerPoll {
    /// 401 is terminal: the poller must not retry for the session.
    pub fn is_terminal(&self) -> bool {
        self.http_status == 401
    }

    pub fn state(&self) -> PlayerState {
        match self.http_status {
            204 => PlayerState::Offline,
            401 => PlayerState::AuthExpired,
            s if s >= 400 => PlayerState::Maintenance,
            _ => match &self.track {
                Some(track) => PlayerState::Playing {
                    track: track.clone(),
                },
                None => PlayerState::Offline,
            },
        }
    }
}

#[derive(Clone)]
pub struct PlayerClient {
    client: Client,
    endpoint: String,
}

impl PlayerClient {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}/api/spotify", base_url.trim_end_matches('/')),
        }
    }

    /// Never errors; network failures become a synthetic 500 poll.
    pub async fn fetch(&self) -> PlayerPoll {
        let resp = match self.client.get(&self.endpoint).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("player: request failed: {}", e);
                return PlayerPoll {
                    http_status: 500,
                    track: None,
                };
            }
        };

        let http_status = resp.status().as_u16();
        if http_status == 204 || http_status >= 400 {
            return PlayerPoll {
                http_status,
                track: None,
            };
        }

        let payload = match resp.json::<CurrentlyPlaying>().await {
            Ok(p) => p,
            Err(e) => {
                warn!("player: unexpected response shape: {}", e);
                return PlayerPoll {
                    http_status: 500,
                    track: None,
                };
            }
        };

        // A playing flag without a usable item is a shape mismatch too.
        let track = payload.playing_track();
        if payload.is_playing && track.is_none() {
            warn!("player: is_playing set but item missing");
            return PlayerPoll {
                http_status: 500,
                track: None,
            };
        }

        PlayerPoll { http_status, track }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_state_triage() {
        let poll = |http_status, track| PlayerPoll { http_status, track };
        assert_eq!(poll(204, None).state(), PlayerState::Offline);
        assert_eq!(poll(401, None).state(), PlayerState::AuthExpired);
        assert_eq!(poll(500, None).state(), PlayerState::Maintenance);
        assert_eq!(poll(429, None).state(), PlayerState::Maintenance);
        assert_eq!(poll(200, None).state(), PlayerState::Offline);

        let track = NowPlayingTrack {
            title: "Midnight City".into(),
            artist: "M83".into(),
            album_art_url: String::new(),
        };
        assert_eq!(
            poll(200, Some(track.clone())).state(),
            PlayerState::Playing { track }
        );
    }

    #[test]
    fn test_only_401_is_terminal() {
        for status in [200u16, 204, 400, 403, 429, 500, 503] {
            assert!(!PlayerPoll {
                http_status: status,
                track: None
            }
            .is_terminal());
        }
        assert!(PlayerPoll {
            http_status: 401,
            track: None
        }
        .is_terminal());
    }
}

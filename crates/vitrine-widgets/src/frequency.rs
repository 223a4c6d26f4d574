//! Listening-history fetcher.
//!
//! Total by contract: every failure path resolves to a lifecycle, never an
//! error. The next poll tick is the retry.

use reqwest::Client;
use tracing::warn;

use vitrine_proto::status::TrackStatus;
use vitrine_proto::wire::RecentTracksResponse;

#[derive(Clone)]
pub struct FrequencyClient {
    client: Client,
    endpoint: String,
}

impl FrequencyClient {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}/api/lastfm", base_url.trim_end_matches('/')),
        }
    }

    pub async fn fetch(&self) -> TrackStatus {
        let resp = match self.client.get(&self.endpoint).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("frequency: request failed: {}", e);
                return TrackStatus::Error;
            }
        };

        if !resp.status().is_success() {
            warn!("frequency: proxy returned {}", resp.status());
            return TrackStatus::Error;
        }

        match resp.json::<RecentTracksResponse>().await {
            Ok(body) => body.into_track_status(),
            Err(e) => {
                warn!("frequency: unexpected response shape: {}", e);
                TrackStatus::Error
            }
        }
    }
}

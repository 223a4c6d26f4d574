//! Caption engine: remote generation through the proxy with a session
//! cache, degrading to the deterministic local generator on any failure.
//!
//! The cache is owned by the composing application and passed in, so two
//! widgets sharing one cache is an explicit decision, not a hidden global.
//! Successful remote captions are cached; fallback phrases are not, so a
//! later poll can still upgrade the same key to a remote caption.

use std::collections::HashMap;
use std::sync::Mutex;

use reqwest::Client;
use tracing::{debug, warn};

use vitrine_proto::caption::{cache_key, fallback_caption};
use vitrine_proto::wire::{CaptionRequest, GenerateContentResponse};

/// Session-scoped caption memo keyed by `"active:"`/`"idle:"` + seed.
/// No eviction; the practical key space is a handful of tracks.
#[derive(Debug, Default)]
pub struct CaptionCache {
    inner: Mutex<HashMap<String, String>>,
}

impl CaptionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.lock().ok()?.get(key).cloned()
    }

    pub fn insert(&self, key: String, caption: String) {
        if let Ok(mut map) = self.inner.lock() {
            map.insert(key, caption);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct CaptionEngine {
    client: Client,
    endpoint: String,
    cache: std::sync::Arc<CaptionCache>,
}

impl CaptionEngine {
    pub fn new(client: Client, base_url: &str, cache: std::sync::Arc<CaptionCache>) -> Self {
        Self {
            client,
            endpoint: format!("{}/api/gemini", base_url.trim_end_matches('/')),
            cache,
        }
    }

    /// At most one outbound call per distinct (activity, seed) pair per
    /// session; a cache hit short-circuits before any network traffic.
    /// Concurrent misses on the same key may each go out once (no in-flight
    /// de-duplication); the last successful writer wins the slot.
    pub async fn caption(&self, is_active: bool, seed: &str) -> String {
        let key = cache_key(is_active, seed);
        if let Some(hit) = self.cache.get(&key) {
            debug!("caption: cache hit for {}", key);
            return hit;
        }

        match self.fetch_remote(is_active, seed).await {
            Ok(Some(text)) => {
                self.cache.insert(key, text.clone());
                text
            }
            Ok(None) => {
                warn!("caption: remote returned no usable text for {}", key);
                fallback_caption(is_active, seed).to_string()
            }
            Err(e) => {
                warn!("caption: remote call failed for {}: {}", key, e);
                fallback_caption(is_active, seed).to_string()
            }
        }
    }

    async fn fetch_remote(&self, is_active: bool, seed: &str) -> anyhow::Result<Option<String>> {
        let body = CaptionRequest {
            seed: seed.to_string(),
            is_active,
        };
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            anyhow::bail!("caption proxy returned {}", resp.status());
        }

        let parsed: GenerateContentResponse = resp.json().await?;
        Ok(parsed.first_text())
    }
}

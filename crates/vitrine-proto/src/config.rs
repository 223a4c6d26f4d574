use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::platform;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub uptime: UptimeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Base URLs of the third-party APIs the gateway fronts. Overridable so
/// tests can point the handlers at a local mock server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_lastfm_base")]
    pub lastfm_base: String,
    #[serde(default = "default_spotify_base")]
    pub spotify_base: String,
    #[serde(default = "default_gemini_base")]
    pub gemini_base: String,
}

/// Server-held secrets. Each field may be left empty in the TOML file and
/// supplied through the environment instead (`LASTFM_API_KEY`, `LASTFM_USER`,
/// `SPOTIFY_TOKEN`, `GEMINI_API_KEY`); the environment wins when both are set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default)]
    pub lastfm_api_key: String,
    #[serde(default)]
    pub lastfm_user: String,
    #[serde(default)]
    pub spotify_token: String,
    #[serde(default)]
    pub gemini_api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Now-playing widget poll period.
    #[serde(default = "default_player_interval_ms")]
    pub player_interval_ms: u64,
    /// Listening-history widget poll period.
    #[serde(default = "default_frequency_interval_ms")]
    pub frequency_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UptimeConfig {
    /// Origin timestamp for the uptime counter, `%Y-%m-%dT%H:%M:%S`.
    #[serde(default = "default_uptime_origin")]
    pub origin: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            lastfm_base: default_lastfm_base(),
            spotify_base: default_spotify_base(),
            gemini_base: default_gemini_base(),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            player_interval_ms: default_player_interval_ms(),
            frequency_interval_ms: default_frequency_interval_ms(),
        }
    }
}

impl Default for UptimeConfig {
    fn default() -> Self {
        Self {
            origin: default_uptime_origin(),
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8991
}

fn default_lastfm_base() -> String {
    "https://ws.audioscrobbler.com/2.0/".to_string()
}

fn default_spotify_base() -> String {
    "https://api.spotify.com/v1/me/player/currently-playing".to_string()
}

fn default_gemini_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        .to_string()
}

fn default_player_interval_ms() -> u64 {
    10_000
}

fn default_frequency_interval_ms() -> u64 {
    7_500
}

fn default_uptime_origin() -> String {
    "2003-09-29T00:00:00".to_string()
}

impl CredentialsConfig {
    /// Apply environment overrides on top of whatever the TOML file held.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = std::env::var("LASTFM_API_KEY") {
            self.lastfm_api_key = v;
        }
        if let Ok(v) = std::env::var("LASTFM_USER") {
            self.lastfm_user = v;
        }
        if let Ok(v) = std::env::var("SPOTIFY_TOKEN") {
            self.spotify_token = v;
        }
        if let Ok(v) = std::env::var("GEMINI_API_KEY") {
            self.gemini_api_key = v;
        }
        self
    }
}

impl UptimeConfig {
    pub fn origin_datetime(&self) -> anyhow::Result<chrono::NaiveDateTime> {
        chrono::NaiveDateTime::parse_from_str(&self.origin, "%Y-%m-%dT%H:%M:%S")
            .map_err(|e| anyhow::anyhow!("invalid uptime origin {:?}: {}", self.origin, e))
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            upstream: UpstreamConfig::default(),
            credentials: CredentialsConfig::default(),
            poll: PollConfig::default(),
            uptime: UptimeConfig::default(),
        }
    }
}

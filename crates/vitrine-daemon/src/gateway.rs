//! Proxy gateway: three thin handlers that attach a server-held credential
//! to one outbound call each and relay the upstream response unchanged.
//!
//! The page never sees a key. Error envelopes follow the upstream status
//! where it is meaningful and collapse to 500 otherwise.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Timelike;
use reqwest::Client;
use tower_http::cors::CorsLayer;
use tracing::debug;

use vitrine_proto::config::{CredentialsConfig, UpstreamConfig};
use vitrine_proto::wire::CaptionRequest;

use crate::error::ProxyError;

#[derive(Clone)]
pub struct GatewayState {
    pub client: Client,
    pub credentials: CredentialsConfig,
    pub upstream: UpstreamConfig,
}

impl GatewayState {
    pub fn new(client: Client, credentials: CredentialsConfig, upstream: UpstreamConfig) -> Self {
        Self {
            client,
            credentials,
            upstream,
        }
    }
}

pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/api/lastfm", get(lastfm))
        .route("/api/spotify", get(spotify))
        .route("/api/gemini", post(gemini))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn json_passthrough(body: Bytes) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}

// ── /api/lastfm ───────────────────────────────────────────────────────────────

async fn lastfm(State(state): State<GatewayState>) -> Result<Response, ProxyError> {
    let creds = &state.credentials;
    if creds.lastfm_api_key.is_empty() || creds.lastfm_user.is_empty() {
        return Err(ProxyError::MissingCredential(
            "Last.fm configuration missing",
        ));
    }

    let resp = state
        .client
        .get(&state.upstream.lastfm_base)
        .query(&[
            ("method", "user.getrecenttracks"),
            ("user", creds.lastfm_user.as_str()),
            ("api_key", creds.lastfm_api_key.as_str()),
            ("format", "json"),
            ("limit", "1"),
        ])
        .send()
        .await?;

    let status = resp.status();
    if !status.is_success() {
        return Err(ProxyError::Upstream {
            status: status.as_u16(),
            message: format!("Last.fm API Error: {}", status.as_u16()),
            details: None,
        });
    }

    Ok(json_passthrough(resp.bytes().await?))
}

// ── /api/spotify ──────────────────────────────────────────────────────────────

async fn spotify(State(state): State<GatewayState>) -> Result<Response, ProxyError> {
    if state.credentials.spotify_token.is_empty() {
        return Err(ProxyError::MissingCredential("Spotify token not configured"));
    }

    let resp = state
        .client
        .get(&state.upstream.spotify_base)
        .bearer_auth(&state.credentials.spotify_token)
        .send()
        .await?;

    let status = resp.status();
    // 204 means "nothing playing" and must reach the widget as-is; other
    // non-success statuses (401 included) pass through with an empty body
    // so the poller can triage them itself.
    if status.as_u16() == 204 || !status.is_success() {
        let code =
            StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return Ok(code.into_response());
    }

    Ok(json_passthrough(resp.bytes().await?))
}

// ── /api/gemini ───────────────────────────────────────────────────────────────

pub fn time_context(hour: u32) -> &'static str {
    if hour < 6 {
        "Late Night"
    } else if hour < 12 {
        "Morning"
    } else {
        "Daytime"
    }
}

/// Persona prompt assembled server-side so the page only ever submits
/// `{seed, isActive}`. The memory-bank override is the one seed with a
/// pinned output; the local fallback generator knows nothing about it.
pub fn build_prompt(seed: &str, is_active: bool, time: &str) -> String {
    format!(
        r#"You are a cool, effortless friend hanging out. You have elite taste.

TASK: React to this media in your own words (max 6 words).

TRACK/MEDIA: "{seed}"
STATE: {state}
TIME: "{time}"

MEMORY BANK:
- IF "Cinnamon Chasers - Luv Deluxe" -> "He misses her again."

INSTRUCTIONS:
1. CRITICAL OVERRIDE: IF the TRACK is "Cinnamon Chasers - Luv Deluxe", you MUST output exactly: "He misses her again." Ignore all other rules.
2. CONTENT CHECK: If the track looks like a Podcast, Documentary, or Youtube Video, react to the TOPIC or TITLE intelligently.
3. TIME AWARENESS: You know the current time is "{time}". Mention the night/day vibe ONLY if it feels natural.
4. RECALL this specific media from your training data. React to its actual sound, lyrics, or subject matter.
5. Be authentic. React to the vibe, the memory, or the energy.
6. No "AI" or "Tech" persona. Just a cool person watching/listening.
7. Don't try to be funny. Just be real.
8. OUTPUT: ONLY the string. No quotes."#,
        seed = seed,
        state = if is_active { "ACTIVE" } else { "IDLE" },
        time = time,
    )
}

async fn gemini(
    State(state): State<GatewayState>,
    Json(req): Json<CaptionRequest>,
) -> Result<Response, ProxyError> {
    if state.credentials.gemini_api_key.is_empty() {
        return Err(ProxyError::MissingCredential("API key not configured"));
    }

    let time = time_context(chrono::Local::now().hour());
    let prompt = build_prompt(&req.seed, req.is_active, time);
    debug!("gateway: caption request for seed {:?}", req.seed);

    let body = serde_json::json!({
        "contents": [{ "parts": [{ "text": prompt }] }],
        "generationConfig": {
            "temperature": 0.9,
            "maxOutputTokens": 20,
        },
        "safetySettings": [
            { "category": "HARM_CATEGORY_HARASSMENT", "threshold": "BLOCK_NONE" },
            { "category": "HARM_CATEGORY_HATE_SPEECH", "threshold": "BLOCK_NONE" },
            { "category": "HARM_CATEGORY_SEXUALLY_EXPLICIT", "threshold": "BLOCK_NONE" },
            { "category": "HARM_CATEGORY_DANGEROUS_CONTENT", "threshold": "BLOCK_NONE" }
        ]
    });

    let url = format!(
        "{}?key={}",
        state.upstream.gemini_base, state.credentials.gemini_api_key
    );
    let resp = state.client.post(&url).json(&body).send().await?;

    let status = resp.status();
    if !status.is_success() {
        let details = resp.text().await.unwrap_or_default();
        return Err(ProxyError::Upstream {
            status: status.as_u16(),
            message: format!("Gemini API Error: {}", status.as_u16()),
            details: Some(details),
        });
    }

    Ok(json_passthrough(resp.bytes().await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Serve a router on an ephemeral port; returns the base URL.
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test server");
        let addr = listener.local_addr().expect("test server addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        format!("http://{}", addr)
    }

    fn credentials() -> CredentialsConfig {
        CredentialsConfig {
            lastfm_api_key: "lfm-key".into(),
            lastfm_user: "listener".into(),
            spotify_token: "sp-token".into(),
            gemini_api_key: "gm-key".into(),
        }
    }

    async fn gateway_for(upstream_base: &str, credentials: CredentialsConfig) -> String {
        let upstream = UpstreamConfig {
            lastfm_base: format!("{}/lastfm", upstream_base),
            spotify_base: format!("{}/spotify", upstream_base),
            gemini_base: format!("{}/gemini", upstream_base),
        };
        serve(router(GatewayState::new(
            Client::new(),
            credentials,
            upstream,
        )))
        .await
    }

    #[tokio::test]
    async fn lastfm_injects_credentials_and_passes_body_through() {
        let seen: Arc<Mutex<Option<std::collections::HashMap<String, String>>>> =
            Arc::new(Mutex::new(None));
        let upstream = Router::new().route(
            "/lastfm",
            get({
                let seen = seen.clone();
                move |axum::extract::Query(q): axum::extract::Query<
                    std::collections::HashMap<String, String>,
                >| {
                    let seen = seen.clone();
                    async move {
                        *seen.lock().unwrap() = Some(q);
                        Json(serde_json::json!({ "recenttracks": { "track": [] } }))
                    }
                }
            }),
        );
        let upstream_base = serve(upstream).await;
        let gw = gateway_for(&upstream_base, credentials()).await;

        let resp = Client::new()
            .get(format!("{}/api/lastfm", gw))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert!(body["recenttracks"]["track"].is_array());

        let q = seen.lock().unwrap().clone().unwrap();
        assert_eq!(q.get("method").map(String::as_str), Some("user.getrecenttracks"));
        assert_eq!(q.get("user").map(String::as_str), Some("listener"));
        assert_eq!(q.get("api_key").map(String::as_str), Some("lfm-key"));
        assert_eq!(q.get("format").map(String::as_str), Some("json"));
        assert_eq!(q.get("limit").map(String::as_str), Some("1"));
    }

    #[tokio::test]
    async fn lastfm_missing_credential_is_500_envelope() {
        let gw = gateway_for("http://127.0.0.1:9", CredentialsConfig::default()).await;

        let resp = Client::new()
            .get(format!("{}/api/lastfm", gw))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 500);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "Last.fm configuration missing");
    }

    #[tokio::test]
    async fn lastfm_upstream_failure_propagates_status() {
        let upstream =
            Router::new().route("/lastfm", get(|| async { StatusCode::SERVICE_UNAVAILABLE }));
        let upstream_base = serve(upstream).await;
        let gw = gateway_for(&upstream_base, credentials()).await;

        let resp = Client::new()
            .get(format!("{}/api/lastfm", gw))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 503);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "Last.fm API Error: 503");
    }

    #[tokio::test]
    async fn spotify_passes_204_and_401_through_with_empty_bodies() {
        for (status, expected) in [(StatusCode::NO_CONTENT, 204u16), (StatusCode::UNAUTHORIZED, 401)]
        {
            let upstream = Router::new().route("/spotify", get(move || async move { status }));
            let upstream_base = serve(upstream).await;
            let gw = gateway_for(&upstream_base, credentials()).await;

            let resp = Client::new()
                .get(format!("{}/api/spotify", gw))
                .send()
                .await
                .unwrap();
            assert_eq!(resp.status().as_u16(), expected);
            assert!(resp.bytes().await.unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn spotify_attaches_bearer_token_and_relays_payload() {
        let seen = Arc::new(Mutex::new(None::<String>));
        let upstream = Router::new().route(
            "/spotify",
            get({
                let seen = seen.clone();
                move |headers: axum::http::HeaderMap| {
                    let seen = seen.clone();
                    async move {
                        *seen.lock().unwrap() = headers
                            .get(header::AUTHORIZATION)
                            .and_then(|v| v.to_str().ok())
                            .map(String::from);
                        Json(serde_json::json!({ "is_playing": false, "item": null }))
                    }
                }
            }),
        );
        let upstream_base = serve(upstream).await;
        let gw = gateway_for(&upstream_base, credentials()).await;

        let resp = Client::new()
            .get(format!("{}/api/spotify", gw))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["is_playing"], false);
        assert_eq!(
            seen.lock().unwrap().as_deref(),
            Some("Bearer sp-token")
        );
    }

    #[tokio::test]
    async fn gemini_builds_prompt_and_injects_key() {
        let seen_uri = Arc::new(Mutex::new(None::<String>));
        let seen_body = Arc::new(Mutex::new(None::<serde_json::Value>));
        let upstream = Router::new().route(
            "/gemini",
            post({
                let seen_uri = seen_uri.clone();
                let seen_body = seen_body.clone();
                move |uri: axum::http::Uri, Json(body): Json<serde_json::Value>| {
                    let seen_uri = seen_uri.clone();
                    let seen_body = seen_body.clone();
                    async move {
                        *seen_uri.lock().unwrap() = Some(uri.to_string());
                        *seen_body.lock().unwrap() = Some(body);
                        Json(serde_json::json!({
                            "candidates": [
                                { "content": { "parts": [{ "text": "He misses her again." }] } }
                            ]
                        }))
                    }
                }
            }),
        );
        let upstream_base = serve(upstream).await;
        let gw = gateway_for(&upstream_base, credentials()).await;

        let resp = Client::new()
            .post(format!("{}/api/gemini", gw))
            .json(&serde_json::json!({
                "seed": "Cinnamon Chasers - Luv Deluxe",
                "isActive": true
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(
            body["candidates"][0]["content"]["parts"][0]["text"],
            "He misses her again."
        );

        let uri = seen_uri.lock().unwrap().clone().unwrap();
        assert!(uri.contains("key=gm-key"));

        let sent = seen_body.lock().unwrap().clone().unwrap();
        let prompt = sent["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(prompt.contains(r#"TRACK/MEDIA: "Cinnamon Chasers - Luv Deluxe""#));
        assert!(prompt.contains("STATE: ACTIVE"));
        assert_eq!(sent["generationConfig"]["temperature"], 0.9);
        assert_eq!(sent["generationConfig"]["maxOutputTokens"], 20);
        assert_eq!(sent["safetySettings"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn gemini_upstream_failure_carries_details() {
        let upstream = Router::new().route(
            "/gemini",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, "quota exhausted") }),
        );
        let upstream_base = serve(upstream).await;
        let gw = gateway_for(&upstream_base, credentials()).await;

        let resp = Client::new()
            .post(format!("{}/api/gemini", gw))
            .json(&serde_json::json!({ "seed": "[SILENCE]", "isActive": false }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 429);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "Gemini API Error: 429");
        assert_eq!(body["details"], "quota exhausted");
    }

    #[tokio::test]
    async fn gemini_missing_key_is_500_envelope() {
        let gw = gateway_for("http://127.0.0.1:9", CredentialsConfig::default()).await;

        let resp = Client::new()
            .post(format!("{}/api/gemini", gw))
            .json(&serde_json::json!({ "seed": "x", "isActive": true }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 500);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "API key not configured");
    }

    #[tokio::test]
    async fn network_failure_collapses_to_500() {
        // Upstream base points at a closed port.
        let gw = gateway_for("http://127.0.0.1:9", credentials()).await;

        let resp = Client::new()
            .get(format!("{}/api/lastfm", gw))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 500);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert!(body["error"].is_string());
    }

    #[test]
    fn test_time_context_boundaries() {
        assert_eq!(time_context(0), "Late Night");
        assert_eq!(time_context(5), "Late Night");
        assert_eq!(time_context(6), "Morning");
        assert_eq!(time_context(11), "Morning");
        assert_eq!(time_context(12), "Daytime");
        assert_eq!(time_context(23), "Daytime");
    }

    #[test]
    fn test_prompt_carries_seed_state_and_override() {
        let prompt = build_prompt("Burial - Archangel", true, "Late Night");
        assert!(prompt.contains(r#"TRACK/MEDIA: "Burial - Archangel""#));
        assert!(prompt.contains("STATE: ACTIVE"));
        assert!(prompt.contains(r#"TIME: "Late Night""#));
        assert!(prompt.contains("Cinnamon Chasers - Luv Deluxe"));
        assert!(prompt.contains("He misses her again."));

        let prompt = build_prompt("[SILENCE]", false, "Daytime");
        assert!(prompt.contains("STATE: IDLE"));
    }
}

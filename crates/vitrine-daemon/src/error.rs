//! Gateway error taxonomy.
//!
//! Three failure classes leave a proxy handler: a missing server-held
//! credential (500), an upstream non-2xx (propagated with the upstream
//! status), and a network-level failure (500 with a generic envelope).
//! Handlers never retry; the caller's next poll tick is the retry.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("{0}")]
    MissingCredential(&'static str),
    #[error("{message}")]
    Upstream {
        status: u16,
        message: String,
        details: Option<String>,
    },
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        match self {
            ProxyError::MissingCredential(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": msg })),
            )
                .into_response(),
            ProxyError::Upstream {
                status,
                message,
                details,
            } => {
                let code =
                    StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                let mut body = serde_json::json!({ "error": message });
                if let Some(details) = details {
                    body["details"] = details.into();
                }
                (code, Json(body)).into_response()
            }
            ProxyError::Network(e) => {
                warn!("gateway: upstream request failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({ "error": e.to_string() })),
                )
                    .into_response()
            }
        }
    }
}

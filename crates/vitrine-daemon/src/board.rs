//! `/api/state`: one JSON snapshot of everything the page renders.

use axum::extract::State;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use chrono::NaiveDateTime;
use serde::Serialize;
use tokio::sync::watch;

use vitrine_proto::status::PlayerState;
use vitrine_proto::uptime::Uptime;
use vitrine_widgets::poll::FrequencyReading;

#[derive(Clone)]
pub struct StatusBoard {
    pub frequency: watch::Receiver<FrequencyReading>,
    pub player: watch::Receiver<PlayerState>,
    pub uptime_origin: NaiveDateTime,
}

#[derive(Serialize)]
struct ApiState {
    frequency: FrequencyReading,
    player: PlayerState,
    player_status_text: &'static str,
    uptime: String,
}

pub fn router(board: StatusBoard) -> Router {
    Router::new()
        .route("/api/state", get(get_state))
        .with_state(board)
}

async fn get_state(State(board): State<StatusBoard>) -> Json<ApiState> {
    let frequency = board.frequency.borrow().clone();
    let player = board.player.borrow().clone();
    let player_status_text = player.status_text();

    Json(ApiState {
        frequency,
        player,
        player_status_text,
        uptime: Uptime::since(board.uptime_origin).to_string(),
    })
}

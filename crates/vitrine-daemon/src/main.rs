mod board;
mod error;
mod gateway;

use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use vitrine_proto::config::Config;
use vitrine_widgets::caption::{CaptionCache, CaptionEngine};
use vitrine_widgets::frequency::FrequencyClient;
use vitrine_widgets::player::PlayerClient;
use vitrine_widgets::poll::{spawn_frequency_poller, spawn_player_poller, visibility_channel};

use board::StatusBoard;
use gateway::GatewayState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Setup file logging
    let data_dir = vitrine_proto::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = data_dir.join("daemon.log");

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(log_file)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,vitrine_daemon=debug")),
        )
        .init();

    info!("Log file: {:?}", log_path);

    let config = Config::load()?;
    info!("Config loaded from: {:?}", Config::config_path());

    let credentials = config.credentials.clone().with_env_overrides();
    let uptime_origin = config.uptime.origin_datetime()?;

    // One shared HTTP client for the gateway handlers and the widget pollers.
    let client = reqwest::Client::new();

    let addr = format!("{}:{}", config.http.bind_address, config.http.port);
    let base_url = format!("http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    // Pollers consume the daemon's own gateway, exactly as the page would.
    let cache = Arc::new(CaptionCache::new());
    let engine = CaptionEngine::new(client.clone(), &base_url, cache);
    let (visible_tx, visible_rx) = visibility_channel(true);

    let (frequency_poller, frequency_rx) = spawn_frequency_poller(
        FrequencyClient::new(client.clone(), &base_url),
        engine,
        Duration::from_millis(config.poll.frequency_interval_ms),
        visible_rx.clone(),
    );
    let (player_poller, player_rx) = spawn_player_poller(
        PlayerClient::new(client.clone(), &base_url),
        Duration::from_millis(config.poll.player_interval_ms),
        visible_rx,
    );

    let app = gateway::router(GatewayState::new(
        client,
        credentials,
        config.upstream.clone(),
    ))
    .merge(board::router(StatusBoard {
        frequency: frequency_rx,
        player: player_rx,
        uptime_origin,
    }));

    info!("Gateway listening on http://{}", addr);
    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("HTTP server error: {}", e);
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");

    drop(visible_tx);
    frequency_poller.stop();
    player_poller.stop();
    frequency_poller.join().await;
    player_poller.join().await;
    server.abort();

    Ok(())
}

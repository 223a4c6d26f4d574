//! Pollers: per-widget interval loops with visibility gating.
//!
//! State machine per widget: one immediate fetch on spawn, then a fixed
//! interval. Ticks are skipped while the page is hidden (the timer keeps
//! running); a hidden→visible transition fetches immediately and restarts
//! the timer. The player poller transitions one-way to terminated on a
//! 401 and never fetches again for the session. `stop()` (or dropping the
//! handle) cancels the task and releases the timer.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use vitrine_proto::caption::caption_request_for;
use vitrine_proto::status::{PlayerState, TrackStatus};

use crate::caption::CaptionEngine;
use crate::frequency::FrequencyClient;
use crate::player::PlayerClient;

/// Latest history status plus the caption derived from it.
#[derive(Debug, Clone, Serialize)]
pub struct FrequencyReading {
    pub status: TrackStatus,
    pub caption: Option<String>,
}

impl FrequencyReading {
    pub fn loading() -> Self {
        Self {
            status: TrackStatus::Loading,
            caption: None,
        }
    }
}

/// Page-visibility input for the pollers. The embedding application holds
/// the sender and flips it when its surface is shown or hidden.
pub fn visibility_channel(visible: bool) -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(visible)
}

/// Handle to a running poller task. Cancelled on `stop()` or drop.
pub struct Poller {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Poller {
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub async fn join(mut self) {
        let _ = (&mut self.handle).await;
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn poll_player_once(client: &PlayerClient, tx: &watch::Sender<PlayerState>) -> bool {
    let poll = client.fetch().await;
    let terminal = poll.is_terminal();
    let _ = tx.send(poll.state());
    terminal
}

pub fn spawn_player_poller(
    client: PlayerClient,
    interval: Duration,
    mut visible: watch::Receiver<bool>,
) -> (Poller, watch::Receiver<PlayerState>) {
    let (tx, rx) = watch::channel(PlayerState::Offline);
    let cancel = CancellationToken::new();
    let task_cancel = cancel.clone();

    let handle = tokio::spawn(async move {
        if poll_player_once(&client, &tx).await {
            warn!("player poller: auth expired on first poll, stopping");
            return;
        }

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        ticker.tick().await; // the first tick completes immediately
        let mut visibility_live = true;

        loop {
            tokio::select! {
                _ = task_cancel.cancelled() => {
                    debug!("player poller: stopped");
                    break;
                }
                _ = ticker.tick() => {
                    if !*visible.borrow() {
                        continue;
                    }
                    if poll_player_once(&client, &tx).await {
                        warn!("player poller: 401 from upstream, polling stopped for the session");
                        break;
                    }
                }
                changed = visible.changed(), if visibility_live => {
                    match changed {
                        Ok(()) if *visible.borrow() => {
                            if poll_player_once(&client, &tx).await {
                                warn!("player poller: 401 from upstream, polling stopped for the session");
                                break;
                            }
                            ticker.reset();
                        }
                        Ok(()) => {}
                        Err(_) => visibility_live = false,
                    }
                }
            }
        }
    });

    (Poller { cancel, handle }, rx)
}

async fn poll_frequency_once(
    client: &FrequencyClient,
    engine: &CaptionEngine,
    tx: &watch::Sender<FrequencyReading>,
) {
    let status = client.fetch().await;
    let caption = match caption_request_for(&status) {
        Some((is_active, seed)) => Some(engine.caption(is_active, &seed).await),
        None => None,
    };
    let _ = tx.send(FrequencyReading { status, caption });
}

pub fn spawn_frequency_poller(
    client: FrequencyClient,
    engine: CaptionEngine,
    interval: Duration,
    mut visible: watch::Receiver<bool>,
) -> (Poller, watch::Receiver<FrequencyReading>) {
    let (tx, rx) = watch::channel(FrequencyReading::loading());
    let cancel = CancellationToken::new();
    let task_cancel = cancel.clone();

    let handle = tokio::spawn(async move {
        poll_frequency_once(&client, &engine, &tx).await;

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        ticker.tick().await;
        let mut visibility_live = true;

        loop {
            tokio::select! {
                _ = task_cancel.cancelled() => {
                    debug!("frequency poller: stopped");
                    break;
                }
                _ = ticker.tick() => {
                    if !*visible.borrow() {
                        continue;
                    }
                    poll_frequency_once(&client, &engine, &tx).await;
                }
                changed = visible.changed(), if visibility_live => {
                    match changed {
                        Ok(()) if *visible.borrow() => {
                            poll_frequency_once(&client, &engine, &tx).await;
                            ticker.reset();
                        }
                        Ok(()) => {}
                        Err(_) => visibility_live = false,
                    }
                }
            }
        }
    });

    (Poller { cancel, handle }, rx)
}

//! Playback polling task

use std::{sync::Arc, time::Duration};
use tokio::time::interval;
use tracing::{debug, info};

use crate::state::{AppState, Step};

/// How often the player is polled for a finished or failed track
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Background task that advances the queue whenever the current track ends.
/// Failures are already logged and shown by `AppState`.
pub async fn playback_monitor_task(state: Arc<AppState>) {
    info!("Starting playback monitor task");

    let mut ticker = interval(POLL_INTERVAL);

    loop {
        ticker.tick().await;

        match state.poll_playback().await {
            Ok(Some(Step::Moved(entry))) => info!("Advanced to {}", entry.title),
            Ok(_) => {}
            Err(e) => debug!("Playback check failed: {}", e),
        }
    }
}

//! Once-per-second countdown task

use std::{sync::Arc, time::Duration};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::state::AppState;

/// Interval between countdown ticks
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Background task that advances every running timer by one second per tick
pub async fn timer_ticker_task(state: Arc<AppState>) {
    info!("Starting timer ticker task");

    let mut ticker = interval(TICK_INTERVAL);
    // A stalled runtime should not replay a burst of seconds
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick fires immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;

        let report = state.tick_timers();
        if !report.is_empty() {
            debug!(
                "Ticked {} timer(s), {} finished",
                report.changed.len(),
                report.expired.len()
            );
        }
    }
}

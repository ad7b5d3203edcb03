//! HTTP API module
//!
//! Every dashboard control is an endpoint here; handlers forward to `AppState`.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Timer grid
        .route("/timers", get(list_timers_handler).post(add_timer_handler))
        .route("/timers/:id", axum::routing::delete(delete_timer_handler))
        .route("/timers/:id/toggle", post(toggle_timer_handler))
        .route("/timers/:id/start", post(start_timer_handler))
        .route("/timers/:id/pause", post(pause_timer_handler))
        .route("/timers/:id/reset", post(reset_timer_handler))
        .route("/timers/:id/duration", put(set_duration_handler))
        .route("/timers/:id/title", put(rename_timer_handler))
        // Audio queue
        .route("/queue", get(queue_handler).post(add_url_handler))
        .route("/queue/:queue_id", axum::routing::delete(remove_entry_handler))
        .route("/queue/:queue_id/up", post(move_up_handler))
        .route("/queue/:queue_id/down", post(move_down_handler))
        .route("/queue/:queue_id/select", post(select_entry_handler))
        .route("/queue/:queue_id/play", post(play_entry_handler))
        // Player
        .route("/player", get(player_handler))
        .route("/player/toggle", post(toggle_playback_handler))
        .route("/player/stop", post(stop_playback_handler))
        .route("/player/next", post(next_handler))
        .route("/player/previous", post(previous_handler))
        .route("/player/seek", put(seek_handler))
        .route("/player/volume", put(volume_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

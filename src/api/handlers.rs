//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use tracing::{error, info};

use crate::{
    error::DashboardError,
    state::{
        timer_collection::column_count, AppState, Step, TimerAction,
    },
};
use super::responses::{
    ApiResponse, DurationRequest, GridQuery, HealthResponse, NewTimerRequest, PlayerView,
    QueueEntryView, QueueResponse, SeekRequest, StatusResponse, TimerListResponse, TimerView,
    TitleRequest, UrlRequest, VolumeRequest,
};

type ApiError = (StatusCode, Json<ApiResponse>);
type HandlerResult<T> = Result<Json<T>, ApiError>;

/// Map a dashboard failure onto an HTTP status with the status-line text as body
fn api_error(err: DashboardError) -> ApiError {
    let code = match &err {
        DashboardError::InvalidUrl | DashboardError::InvalidDuration => StatusCode::BAD_REQUEST,
        DashboardError::TimerNotFound(_) | DashboardError::QueueEntryNotFound(_) => StatusCode::NOT_FOUND,
        DashboardError::CacheFileMissing(_) => StatusCode::CONFLICT,
        DashboardError::PlayerUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => {
            error!("Request failed: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (code, Json(ApiResponse::error(err.to_string())))
}

fn status_reply(state: &AppState) -> Json<ApiResponse> {
    Json(ApiResponse::ok(state.status().message))
}

// ----- Timers -----

/// Handle GET /timers - Timer cards in grid order
pub async fn list_timers_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GridQuery>,
) -> Json<TimerListResponse> {
    let timers = state.timers();
    let viewport_width = query.viewport_width.unwrap_or(state.card_width);
    let placement = timers.grid_placement(viewport_width, state.card_width);

    let views = timers
        .iter()
        .zip(placement)
        .map(|(timer, (_, cell))| TimerView::new(timer, Some(cell)))
        .collect();

    Json(TimerListResponse {
        columns: column_count(viewport_width, state.card_width),
        timers: views,
    })
}

/// Handle POST /timers - Add a custom timer
pub async fn add_timer_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NewTimerRequest>,
) -> HandlerResult<TimerView> {
    let timer = state
        .add_timer(request.title.as_deref(), request.duration.total_seconds())
        .map_err(api_error)?;
    Ok(Json(TimerView::from(&timer)))
}

/// Handle DELETE /timers/:id
pub async fn delete_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(timer_id): Path<String>,
) -> HandlerResult<ApiResponse> {
    state.delete_timer(&timer_id).map_err(api_error)?;
    Ok(Json(ApiResponse::ok("Timer deleted")))
}

async fn timer_action(state: Arc<AppState>, timer_id: String, action: TimerAction) -> HandlerResult<TimerView> {
    let timer = state.timer_action(&timer_id, action).map_err(api_error)?;
    Ok(Json(TimerView::from(&timer)))
}

/// Handle POST /timers/:id/toggle - Play/pause button
pub async fn toggle_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(timer_id): Path<String>,
) -> HandlerResult<TimerView> {
    timer_action(state, timer_id, TimerAction::Toggle).await
}

/// Handle POST /timers/:id/start
pub async fn start_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(timer_id): Path<String>,
) -> HandlerResult<TimerView> {
    timer_action(state, timer_id, TimerAction::Start).await
}

/// Handle POST /timers/:id/pause
pub async fn pause_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(timer_id): Path<String>,
) -> HandlerResult<TimerView> {
    timer_action(state, timer_id, TimerAction::Pause).await
}

/// Handle POST /timers/:id/reset
pub async fn reset_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(timer_id): Path<String>,
) -> HandlerResult<TimerView> {
    timer_action(state, timer_id, TimerAction::Reset).await
}

/// Handle PUT /timers/:id/duration - Set a new duration, restarting from full
pub async fn set_duration_handler(
    State(state): State<Arc<AppState>>,
    Path(timer_id): Path<String>,
    Json(request): Json<DurationRequest>,
) -> HandlerResult<TimerView> {
    let timer = state
        .set_timer_duration(&timer_id, request.total_seconds())
        .map_err(api_error)?;
    Ok(Json(TimerView::from(&timer)))
}

/// Handle PUT /timers/:id/title
pub async fn rename_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(timer_id): Path<String>,
    Json(request): Json<TitleRequest>,
) -> HandlerResult<TimerView> {
    let timer = state.rename_timer(&timer_id, &request.title).map_err(api_error)?;
    Ok(Json(TimerView::from(&timer)))
}

// ----- Queue -----

/// Handle GET /queue
pub async fn queue_handler(State(state): State<Arc<AppState>>) -> Json<QueueResponse> {
    let queue = state.queue();
    let current_id = queue.current_id();
    let selected_id = queue.selected_id();

    Json(QueueResponse {
        entries: queue
            .entries()
            .iter()
            .map(|entry| QueueEntryView::new(entry, current_id, selected_id))
            .collect(),
        current_id: current_id.map(str::to_string),
        selected_id: selected_id.map(str::to_string),
    })
}

/// Handle POST /queue - Download a URL into the queue in the background
pub async fn add_url_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<UrlRequest>,
) -> Result<(StatusCode, Json<ApiResponse>), ApiError> {
    state.submit_url(&request.url).map_err(api_error)?;
    info!("Accepted URL for download");
    Ok((StatusCode::ACCEPTED, status_reply(&state)))
}

/// Handle DELETE /queue/:queue_id
pub async fn remove_entry_handler(
    State(state): State<Arc<AppState>>,
    Path(queue_id): Path<String>,
) -> HandlerResult<ApiResponse> {
    state.remove_entry(&queue_id).await.map_err(api_error)?;
    Ok(status_reply(&state))
}

/// Handle POST /queue/:queue_id/up
pub async fn move_up_handler(
    State(state): State<Arc<AppState>>,
    Path(queue_id): Path<String>,
) -> HandlerResult<ApiResponse> {
    state.move_entry(&queue_id, -1).map_err(api_error)?;
    Ok(status_reply(&state))
}

/// Handle POST /queue/:queue_id/down
pub async fn move_down_handler(
    State(state): State<Arc<AppState>>,
    Path(queue_id): Path<String>,
) -> HandlerResult<ApiResponse> {
    state.move_entry(&queue_id, 1).map_err(api_error)?;
    Ok(status_reply(&state))
}

/// Handle POST /queue/:queue_id/select
pub async fn select_entry_handler(
    State(state): State<Arc<AppState>>,
    Path(queue_id): Path<String>,
) -> HandlerResult<ApiResponse> {
    state.select_entry(&queue_id).map_err(api_error)?;
    Ok(status_reply(&state))
}

/// Handle POST /queue/:queue_id/play
pub async fn play_entry_handler(
    State(state): State<Arc<AppState>>,
    Path(queue_id): Path<String>,
) -> HandlerResult<ApiResponse> {
    state.play_entry(&queue_id).await.map_err(api_error)?;
    Ok(status_reply(&state))
}

// ----- Player -----

/// Handle GET /player
pub async fn player_handler(State(state): State<Arc<AppState>>) -> Json<PlayerView> {
    Json(PlayerView::from(&state.player_snapshot().await))
}

/// Handle POST /player/toggle
pub async fn toggle_playback_handler(State(state): State<Arc<AppState>>) -> HandlerResult<ApiResponse> {
    state.toggle_play_pause().await.map_err(api_error)?;
    Ok(status_reply(&state))
}

/// Handle POST /player/stop
pub async fn stop_playback_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    state.stop_playback().await;
    status_reply(&state)
}

fn step_reply(state: &AppState, step: Step) -> Json<ApiResponse> {
    match step {
        Step::Moved(_) => status_reply(state),
        _ => Json(ApiResponse::new("unchanged".to_string(), state.status().message)),
    }
}

/// Handle POST /player/next
pub async fn next_handler(State(state): State<Arc<AppState>>) -> HandlerResult<ApiResponse> {
    let step = state.play_next(false).await.map_err(api_error)?;
    Ok(step_reply(&state, step))
}

/// Handle POST /player/previous
pub async fn previous_handler(State(state): State<Arc<AppState>>) -> HandlerResult<ApiResponse> {
    let step = state.play_previous().await.map_err(api_error)?;
    Ok(step_reply(&state, step))
}

/// Handle PUT /player/seek
pub async fn seek_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SeekRequest>,
) -> HandlerResult<PlayerView> {
    state.seek(request.permille).await.map_err(api_error)?;
    Ok(Json(PlayerView::from(&state.player_snapshot().await)))
}

/// Handle PUT /player/volume
pub async fn volume_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<VolumeRequest>,
) -> HandlerResult<PlayerView> {
    state.set_volume(request.volume).await.map_err(api_error)?;
    Ok(Json(PlayerView::from(&state.player_snapshot().await)))
}

// ----- Dashboard -----

/// Handle GET /status - Status line, counts, and player state
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let timers = state.timers();
    let player = PlayerView::from(&state.player_snapshot().await);

    Json(StatusResponse {
        status: state.status(),
        timer_count: timers.len(),
        running_timers: timers.iter().filter(|t| t.is_running()).count(),
        queue_length: state.queue().len(),
        player,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
    })
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

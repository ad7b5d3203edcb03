//! API request and response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    state::{
        app_state::PlayerSnapshot, GridCell, QueueEntry, StatusLine, TimerEntity, TimerPhase,
    },
    utils::format_duration_short,
};

/// Response for any action that only needs to acknowledge and report status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ApiResponse {
    pub fn new(status: String, message: String) -> Self {
        Self {
            status,
            message,
            timestamp: Utc::now(),
        }
    }

    pub fn ok(message: impl Into<String>) -> Self {
        Self::new("ok".to_string(), message.into())
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new("error".to_string(), message.into())
    }
}

/// One timer card as the dashboard renders it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerView {
    pub timer_id: String,
    pub title: String,
    pub total_seconds: u64,
    pub remaining_seconds: u64,
    pub is_running: bool,
    pub phase: TimerPhase,
    pub display_time: String,
    pub progress: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
}

impl TimerView {
    pub fn new(timer: &TimerEntity, cell: Option<GridCell>) -> Self {
        Self {
            timer_id: timer.id().to_string(),
            title: timer.title().to_string(),
            total_seconds: timer.total_seconds(),
            remaining_seconds: timer.remaining_seconds(),
            is_running: timer.is_running(),
            phase: timer.phase(),
            display_time: timer.display_time(),
            progress: timer.progress(),
            row: cell.map(|c| c.row),
            column: cell.map(|c| c.column),
        }
    }
}

impl From<&TimerEntity> for TimerView {
    fn from(timer: &TimerEntity) -> Self {
        Self::new(timer, None)
    }
}

/// Timer grid for a given viewport
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerListResponse {
    pub columns: usize,
    pub timers: Vec<TimerView>,
}

/// Query for `GET /timers`
#[derive(Debug, Clone, Deserialize)]
pub struct GridQuery {
    pub viewport_width: Option<u32>,
}

/// Body of `POST /timers`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTimerRequest {
    pub title: Option<String>,
    #[serde(flatten)]
    pub duration: DurationRequest,
}

/// Hours/minutes/seconds as entered on a card
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct DurationRequest {
    #[serde(default)]
    pub hours: u64,
    #[serde(default)]
    pub minutes: u64,
    #[serde(default)]
    pub seconds: u64,
}

impl DurationRequest {
    pub fn total_seconds(&self) -> u64 {
        self.hours
            .saturating_mul(3600)
            .saturating_add(self.minutes.saturating_mul(60))
            .saturating_add(self.seconds)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TitleRequest {
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UrlRequest {
    pub url: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SeekRequest {
    pub permille: u32,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct VolumeRequest {
    pub volume: u8,
}

/// One queue row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueEntryView {
    pub queue_id: String,
    pub url: String,
    pub title: String,
    pub video_id: String,
    pub duration_seconds: u64,
    pub display_text: String,
    pub file_path: String,
    pub is_current: bool,
    pub is_selected: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueResponse {
    pub entries: Vec<QueueEntryView>,
    pub current_id: Option<String>,
    pub selected_id: Option<String>,
}

impl QueueEntryView {
    pub fn new(entry: &QueueEntry, current_id: Option<&str>, selected_id: Option<&str>) -> Self {
        Self {
            queue_id: entry.queue_id.clone(),
            url: entry.url.clone(),
            title: entry.title.clone(),
            video_id: entry.video_id.clone(),
            duration_seconds: entry.duration_seconds,
            display_text: entry.display_text(),
            file_path: entry.file_path.to_string_lossy().into_owned(),
            is_current: current_id == Some(entry.queue_id.as_str()),
            is_selected: selected_id == Some(entry.queue_id.as_str()),
        }
    }
}

/// Player panel state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerView {
    pub now_playing: Option<String>,
    pub is_playing: bool,
    pub position_seconds: u64,
    pub duration_seconds: u64,
    /// Position as thousandths of the track length
    pub progress_permille: u32,
    pub progress_text: String,
    pub volume: u8,
}

impl From<&PlayerSnapshot> for PlayerView {
    fn from(snapshot: &PlayerSnapshot) -> Self {
        let position = snapshot.position.as_secs();
        let duration = snapshot.duration.as_secs();
        let progress_permille = if snapshot.duration.is_zero() {
            0
        } else {
            let ratio = snapshot.position.as_secs_f64() / snapshot.duration.as_secs_f64();
            (ratio * 1000.0).clamp(0.0, 1000.0) as u32
        };

        Self {
            now_playing: snapshot.now_playing.as_ref().map(|e| e.title.clone()),
            is_playing: snapshot.is_playing,
            position_seconds: position,
            duration_seconds: duration,
            progress_permille,
            progress_text: format!(
                "{} / {}",
                format_duration_short(Some(position)),
                format_duration_short(Some(duration))
            ),
            volume: snapshot.volume,
        }
    }
}

/// Full dashboard status
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub status: StatusLine,
    pub timer_count: usize,
    pub running_timers: usize,
    pub queue_length: usize,
    pub player: PlayerView,
    pub uptime: String,
    pub port: u16,
    pub host: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

//! Error taxonomy for the dashboard

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, DashboardError>;

/// Every failure the dashboard can surface. None of them are fatal.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("Invalid YouTube URL.")]
    InvalidUrl,

    #[error("Failed to read video metadata: {0}")]
    MetadataFetchFailed(String),

    #[error("{0}")]
    ExtractionFailed(String),

    #[error("Download finished but no audio file found in cache.")]
    DownloadIncomplete,

    #[error("Cached file missing: {}", .0.display())]
    CacheFileMissing(PathBuf),

    #[error("Could not save {}: {source}", .path.display())]
    PersistenceWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Layout file is malformed: {0}")]
    PersistenceReadMalformed(String),

    #[error("Audio player unavailable: {0}")]
    PlayerUnavailable(String),

    #[error("Timer not found: {0}")]
    TimerNotFound(String),

    #[error("Queue entry not found: {0}")]
    QueueEntryNotFound(String),

    #[error("Set a duration greater than 0.")]
    InvalidDuration,
}

impl DashboardError {
    /// Text shown on the status line for this failure
    pub fn status_text(&self) -> String {
        format!("Error: {}", self)
    }
}

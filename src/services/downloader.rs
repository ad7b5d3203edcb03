//! Download orchestration: URL -> cached audio file -> queue entry

use std::sync::Arc;
use tokio::{sync::Semaphore, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    error::{DashboardError, Result},
    services::{
        audio_cache::AudioCache,
        extractor::AudioExtractor,
        youtube_url::{canonical_watch_url, extract_video_id},
    },
    state::QueueEntry,
};

/// Downloads allowed to run at once unless configured otherwise
pub const DEFAULT_MAX_DOWNLOADS: usize = 4;

/// Receives human readable progress lines while a download runs
pub type ProgressSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Runs one task per submitted URL, bounded by a semaphore
#[derive(Clone)]
pub struct DownloadOrchestrator {
    extractor: Arc<dyn AudioExtractor>,
    cache: AudioCache,
    permits: Arc<Semaphore>,
}

impl DownloadOrchestrator {
    pub fn new(extractor: Arc<dyn AudioExtractor>, cache: AudioCache, max_concurrent: usize) -> Self {
        Self {
            extractor,
            cache,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    pub fn cache(&self) -> &AudioCache {
        &self.cache
    }

    /// Start a background download. The handle resolves to the new queue entry.
    /// There is no cancellation; dropping the handle only ignores the result.
    pub fn submit(&self, url: String, progress: ProgressSink) -> JoinHandle<Result<QueueEntry>> {
        let orchestrator = self.clone();
        tokio::spawn(async move {
            let _permit = orchestrator
                .permits
                .acquire()
                .await
                .map_err(|e| DashboardError::ExtractionFailed(e.to_string()))?;
            orchestrator.run(&url, progress.as_ref()).await
        })
    }

    /// Resolve, check the cache, and download if needed
    pub async fn run(&self, url: &str, progress: &(dyn Fn(&str) + Send + Sync)) -> Result<QueueEntry> {
        let canonical = canonical_watch_url(url);
        let resolved_id = extract_video_id(&canonical).ok_or(DashboardError::InvalidUrl)?;

        progress("Fetching metadata...");
        let metadata = self
            .extractor
            .fetch_metadata(&canonical)
            .await
            .map_err(DashboardError::MetadataFetchFailed)?;

        let video_id = if metadata.video_id.is_empty() {
            resolved_id
        } else {
            metadata.video_id.clone()
        };

        self.cache.cleanup_partial_cache_files(&video_id);
        if let Some(cached) = self.cache.find_cached_audio(&video_id) {
            info!("Using cached audio for {}", video_id);
            return Ok(QueueEntry::new(
                canonical,
                metadata.title,
                metadata.duration_seconds,
                video_id,
                cached,
            ));
        }

        progress("Downloading audio...");
        let template = self.cache.output_template(&video_id);
        let downloaded = self
            .extractor
            .download_audio(&canonical, &template)
            .await
            .map_err(DashboardError::ExtractionFailed)?;

        let file_path = if downloaded.file_path.exists() {
            downloaded.file_path
        } else {
            warn!(
                "Extractor reported {} but it does not exist, probing cache",
                downloaded.file_path.display()
            );
            self.cache
                .find_cached_audio(&video_id)
                .ok_or(DashboardError::DownloadIncomplete)?
        };

        debug!("Downloaded {} to {}", video_id, file_path.display());
        Ok(QueueEntry::new(
            canonical,
            metadata.title,
            metadata.duration_seconds,
            video_id,
            std::fs::canonicalize(&file_path).unwrap_or(file_path),
        ))
    }
}

/// Flatten a finished task into a result, turning a panic into an extraction failure
pub fn join_outcome(
    outcome: std::result::Result<Result<QueueEntry>, tokio::task::JoinError>,
) -> Result<QueueEntry> {
    match outcome {
        Ok(result) => result,
        Err(e) => Err(DashboardError::ExtractionFailed(format!("Download task failed: {}", e))),
    }
}

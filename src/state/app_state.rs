//! Main application state management

use std::{
    path::Path,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};
use tracing::{debug, error, info, warn};

use super::{
    persistence::{PersistenceStore, SaveScheduler},
    playback_queue::{PlaybackQueue, QueueEntry, Step},
    status_line::StatusLine,
    timer_collection::{TickReport, TimerCollection},
    timer_state::TimerEntity,
};
use crate::{
    error::{DashboardError, Result},
    services::{
        downloader::{join_outcome, DownloadOrchestrator, ProgressSink},
        media_player::{MediaPlayer, MediaStatus},
        youtube_url::is_valid_youtube_url,
    },
};

/// Play/pause style actions on a single timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    Toggle,
    Start,
    Pause,
    Reset,
}

/// Snapshot of the player for status reporting
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSnapshot {
    pub now_playing: Option<QueueEntry>,
    pub is_playing: bool,
    pub position: Duration,
    pub duration: Duration,
    pub volume: u8,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns every piece of dashboard state. UI actions arrive as method calls and
/// are serialized by the locks; no lock is held across an await.
pub struct AppState {
    timers: Mutex<TimerCollection>,
    queue: Mutex<PlaybackQueue>,
    player: tokio::sync::Mutex<Box<dyn MediaPlayer>>,
    downloader: DownloadOrchestrator,
    store: PersistenceStore,
    saver: SaveScheduler,
    status: Mutex<StatusLine>,
    /// Card width used for grid placement
    pub card_width: u32,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
}

impl AppState {
    pub fn new(
        store: PersistenceStore,
        saver: SaveScheduler,
        downloader: DownloadOrchestrator,
        player: Box<dyn MediaPlayer>,
        card_width: u32,
        host: String,
        port: u16,
    ) -> Self {
        Self {
            timers: Mutex::new(TimerCollection::new()),
            queue: Mutex::new(PlaybackQueue::new()),
            player: tokio::sync::Mutex::new(player),
            downloader,
            store,
            saver,
            status: Mutex::new(StatusLine::default()),
            card_width,
            start_time: Instant::now(),
            port,
            host,
        }
    }

    // ----- Status line -----

    pub fn set_status(&self, message: impl Into<String>) {
        let message = message.into();
        debug!("Status: {}", message);
        lock(&self.status).set(message);
    }

    pub fn status(&self) -> StatusLine {
        lock(&self.status).clone()
    }

    /// Surface a failure on the status line and hand it back
    fn report<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            warn!("{}", e);
            self.set_status(e.status_text());
        }
        result
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    // ----- Persistence -----

    /// Restore timers from disk, seeding and writing defaults when nothing is restorable
    pub fn load_layout(&self) {
        let snapshots = self.store.load();
        let restored = !snapshots.is_empty();

        {
            let mut timers = lock(&self.timers);
            *timers = TimerCollection::from_snapshots(snapshots);
            if !restored {
                timers.seed_defaults();
            }
        }

        if restored {
            info!("Restored {} timer(s) from {}", self.timer_count(), self.store.path().display());
        } else {
            info!("No saved layout, seeding default timers");
            // Writing immediately heals a missing or broken file on first run
            let _ = self.save_now();
        }
    }

    /// Write the layout right away. A failure is surfaced but state stays in memory.
    pub fn save_now(&self) -> Result<()> {
        let snapshots = lock(&self.timers).snapshots();
        let result = self.store.save(&snapshots);
        if let Err(e) = &result {
            error!("{}", e);
            self.set_status(format!("Save error: {}", e));
        }
        result
    }

    pub fn schedule_save(&self) {
        self.saver.schedule();
    }

    // ----- Timers -----

    pub fn timer_count(&self) -> usize {
        lock(&self.timers).len()
    }

    pub fn timers(&self) -> TimerCollection {
        lock(&self.timers).clone()
    }

    pub fn timer(&self, timer_id: &str) -> Result<TimerEntity> {
        lock(&self.timers)
            .get(timer_id)
            .cloned()
            .ok_or_else(|| DashboardError::TimerNotFound(timer_id.to_string()))
    }

    /// Add a timer from the "custom timer" form. A zero duration is rejected.
    pub fn add_timer(&self, title: Option<&str>, total_seconds: u64) -> Result<TimerEntity> {
        if total_seconds == 0 {
            return self.report(Err(DashboardError::InvalidDuration));
        }

        let title = title.map(str::trim).filter(|t| !t.is_empty()).unwrap_or("Timer");
        let timer = {
            let mut timers = lock(&self.timers);
            timers
                .add_timer(title, total_seconds, None, None, false)
                .and_then(|id| timers.get(&id).cloned())
                .ok_or_else(|| DashboardError::TimerNotFound(title.to_string()))?
        };

        info!("Added timer \"{}\" ({}s)", title, total_seconds);
        self.schedule_save();
        Ok(timer)
    }

    pub fn delete_timer(&self, timer_id: &str) -> Result<()> {
        if !lock(&self.timers).remove_timer(timer_id) {
            return Err(DashboardError::TimerNotFound(timer_id.to_string()));
        }
        info!("Deleted timer {}", timer_id);
        self.schedule_save();
        Ok(())
    }

    /// Apply a mutation to one timer and persist it
    fn update_timer<F>(&self, timer_id: &str, updater: F) -> Result<TimerEntity>
    where
        F: FnOnce(&mut TimerEntity) -> bool,
    {
        let updated = {
            let mut timers = lock(&self.timers);
            let timer = timers
                .get_mut(timer_id)
                .ok_or_else(|| DashboardError::TimerNotFound(timer_id.to_string()))?;
            updater(timer);
            timer.clone()
        };

        self.schedule_save();
        Ok(updated)
    }

    pub fn timer_action(&self, timer_id: &str, action: TimerAction) -> Result<TimerEntity> {
        debug!("Timer {} action {:?}", timer_id, action);
        self.update_timer(timer_id, |timer| match action {
            TimerAction::Toggle => timer.toggle(),
            TimerAction::Start => timer.start(),
            TimerAction::Pause => timer.pause(),
            TimerAction::Reset => timer.reset(),
        })
    }

    pub fn set_timer_duration(&self, timer_id: &str, total_seconds: u64) -> Result<TimerEntity> {
        self.update_timer(timer_id, |timer| timer.set_duration(total_seconds))
    }

    pub fn rename_timer(&self, timer_id: &str, title: &str) -> Result<TimerEntity> {
        self.update_timer(timer_id, |timer| timer.rename(title))
    }

    /// One second of countdown for every running timer
    pub fn tick_timers(&self) -> TickReport {
        let report = lock(&self.timers).tick_all();
        for timer_id in &report.expired {
            info!("Timer {} finished", timer_id);
        }
        if !report.is_empty() {
            self.schedule_save();
        }
        report
    }

    // ----- Audio queue -----

    pub fn queue(&self) -> PlaybackQueue {
        lock(&self.queue).clone()
    }

    /// Validate a pasted URL and start downloading it in the background.
    /// The entry lands in the queue when the download finishes.
    pub fn submit_url(self: &Arc<Self>, url: &str) -> Result<()> {
        let url = url.trim();
        if url.is_empty() {
            self.set_status("Paste a YouTube URL.");
            return Err(DashboardError::InvalidUrl);
        }
        if !is_valid_youtube_url(url) {
            return self.report(Err(DashboardError::InvalidUrl));
        }

        info!("Queueing download for {}", url);
        self.set_status("Fetching metadata/download...");

        let progress_state = Arc::clone(self);
        let progress: ProgressSink = Arc::new(move |message: &str| progress_state.set_status(message));
        let handle = self.downloader.submit(url.to_string(), progress);

        let state = Arc::clone(self);
        tokio::spawn(async move {
            match join_outcome(handle.await) {
                Ok(entry) => state.on_download_finished(entry),
                Err(e) => state.on_download_error(e),
            }
        });
        Ok(())
    }

    pub fn on_download_finished(&self, entry: QueueEntry) {
        info!("Added {} ({})", entry.title, entry.video_id);
        self.set_status(format!("Added: {}", entry.title));
        lock(&self.queue).add_entry(entry);
    }

    pub fn on_download_error(&self, error: DashboardError) {
        warn!("Download failed: {}", error);
        self.set_status(error.status_text());
    }

    pub fn select_entry(&self, queue_id: &str) -> Result<()> {
        if !lock(&self.queue).select(queue_id) {
            return Err(DashboardError::QueueEntryNotFound(queue_id.to_string()));
        }
        Ok(())
    }

    pub async fn remove_entry(&self, queue_id: &str) -> Result<()> {
        let outcome = lock(&self.queue).remove_entry(queue_id);
        if !outcome.removed {
            return Err(DashboardError::QueueEntryNotFound(queue_id.to_string()));
        }
        if outcome.was_current {
            self.stop_playback().await;
        }
        self.set_status("Removed item.");
        Ok(())
    }

    pub fn move_entry(&self, queue_id: &str, delta: isize) -> Result<bool> {
        let moved = {
            let mut queue = lock(&self.queue);
            if queue.get(queue_id).is_none() {
                return Err(DashboardError::QueueEntryNotFound(queue_id.to_string()));
            }
            queue.move_entry(queue_id, delta)
        };
        if moved {
            self.set_status("Reordered queue.");
        }
        Ok(moved)
    }

    // ----- Playback -----

    /// Load and start one queue entry. A missing cache file is reported and
    /// the entry stays queued for manual removal.
    pub async fn play_entry(&self, queue_id: &str) -> Result<()> {
        let entry = lock(&self.queue)
            .get(queue_id)
            .cloned()
            .ok_or_else(|| DashboardError::QueueEntryNotFound(queue_id.to_string()));
        let entry = self.report(entry)?;

        if !entry.is_playable() {
            warn!("Cached file missing for {}: {}", entry.title, entry.file_path.display());
            self.set_status("Cached file missing. Remove and add URL again.");
            return Err(DashboardError::CacheFileMissing(entry.file_path));
        }

        self.start_playback(&entry.file_path, entry.duration_seconds).await?;

        lock(&self.queue).set_current(&entry.queue_id);
        info!("Playing {}", entry.title);
        self.set_status(format!("Playing: {}", entry.title));
        Ok(())
    }

    async fn start_playback(&self, path: &Path, duration_seconds: u64) -> Result<()> {
        let mut player = self.player.lock().await;
        let result = async {
            player.load(path, Duration::from_secs(duration_seconds)).await?;
            player.play().await
        }
        .await
        .map_err(DashboardError::PlayerUnavailable);
        drop(player);
        self.report(result)
    }

    /// Pause when playing, resume when paused, start the selection when idle
    pub async fn toggle_play_pause(&self) -> Result<()> {
        let mut player = self.player.lock().await;
        if player.is_playing() {
            let result = player.pause().await.map_err(DashboardError::PlayerUnavailable);
            drop(player);
            return self.report(result);
        }

        let has_current = lock(&self.queue).current().is_some();
        if has_current {
            let result = player.play().await.map_err(DashboardError::PlayerUnavailable);
            drop(player);
            return self.report(result);
        }
        drop(player);

        let target = lock(&self.queue).selected_or_first().map(|e| e.queue_id.clone());
        match target {
            Some(queue_id) => self.play_entry(&queue_id).await,
            None => {
                self.set_status("Select an item to play.");
                Ok(())
            }
        }
    }

    pub async fn stop_playback(&self) {
        if let Err(e) = self.player.lock().await.stop().await {
            warn!("Failed to stop player: {}", e);
        }
        lock(&self.queue).clear_current();
        self.set_status("Stopped.");
    }

    /// Step forward. `auto_triggered` is set when the previous track ran out.
    pub async fn play_next(&self, auto_triggered: bool) -> Result<Step> {
        let step = lock(&self.queue).advance();
        match &step {
            Step::Moved(entry) => self.play_entry(&entry.queue_id).await?,
            Step::EndOfQueue if auto_triggered => {
                info!("Reached end of queue");
                self.set_status("Reached end of queue.");
            }
            Step::EndOfQueue => {}
            Step::Empty => self.set_status("Queue is empty."),
            Step::NoPrevious => {}
        }
        Ok(step)
    }

    pub async fn play_previous(&self) -> Result<Step> {
        let step = lock(&self.queue).retreat();
        match &step {
            Step::Moved(entry) => self.play_entry(&entry.queue_id).await?,
            Step::NoPrevious => self.set_status("No previous item."),
            Step::Empty => self.set_status("Queue is empty."),
            Step::EndOfQueue => {}
        }
        Ok(step)
    }

    /// Seek to a fraction of the track, given in thousandths
    pub async fn seek(&self, permille: u32) -> Result<()> {
        let mut player = self.player.lock().await;
        let duration = player.duration();
        if duration.is_zero() {
            return Ok(());
        }
        let target = duration.mul_f64(f64::from(permille.min(1000)) / 1000.0);
        let result = player.seek(target).await.map_err(DashboardError::PlayerUnavailable);
        drop(player);
        self.report(result)
    }

    pub async fn set_volume(&self, volume: u8) -> Result<()> {
        let result = self
            .player
            .lock()
            .await
            .set_volume(volume.min(100))
            .await
            .map_err(DashboardError::PlayerUnavailable);
        self.report(result)
    }

    /// Check how the current track is doing. A finished track moves the queue
    /// on; a failed one stays current with the error on the status line.
    pub async fn poll_playback(&self) -> Result<Option<Step>> {
        let outcome = self.player.lock().await.poll_media_status();
        match outcome {
            MediaStatus::Running => Ok(None),
            MediaStatus::Ended => self.play_next(true).await.map(Some),
            MediaStatus::Failed(reason) => {
                warn!("Playback error: {}", reason);
                self.set_status(format!("Playback error: {}", reason));
                Err(DashboardError::PlayerUnavailable(reason))
            }
        }
    }

    pub async fn player_snapshot(&self) -> PlayerSnapshot {
        let now_playing = lock(&self.queue).current().cloned();
        let player = self.player.lock().await;
        PlayerSnapshot {
            now_playing,
            is_playing: player.is_playing(),
            position: player.position(),
            duration: player.duration(),
            volume: player.volume(),
        }
    }

    /// Flush state before exit
    pub async fn shutdown(&self) {
        if let Err(e) = self.save_now() {
            error!("Final layout save failed: {}", e);
        }
        if let Err(e) = self.player.lock().await.stop().await {
            warn!("Failed to stop player on shutdown: {}", e);
        }
    }
}

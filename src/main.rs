//! Timer Deck - Countdown timers and an audio queue behind an HTTP control surface
//!
//! This is the main entry point for the timer-deck application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use timer_deck::{
    api::create_router,
    config::Config,
    services::{AudioCache, DownloadOrchestrator, MpvPlayer, YtDlpExtractor},
    state::{AppState, PersistenceStore, SaveScheduler},
    tasks::{layout_saver_task, playback_monitor_task, timer_ticker_task},
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("timer_deck={},tower_http=info", config.log_level()))
        .init();

    info!("Starting timer-deck server v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, data_dir={}, max_downloads={}",
        config.host,
        config.port,
        config.data_dir.display(),
        config.max_downloads
    );

    // Leftovers from interrupted downloads are cleared before any new one starts
    let cache = AudioCache::new(config.cache_dir());
    cache.ensure_dir()?;
    cache.cleanup_all_partial_cache_files();

    let extractor = Arc::new(YtDlpExtractor::new(config.ytdlp_bin.clone()));
    let downloader = DownloadOrchestrator::new(extractor, cache, config.max_downloads);
    let player = Box::new(MpvPlayer::new(config.mpv_bin.clone(), config.player_socket()));
    let (saver, save_requests) = SaveScheduler::new();

    // Create application state
    let state = Arc::new(AppState::new(
        PersistenceStore::new(config.layout_path()),
        saver,
        downloader,
        player,
        config.card_width,
        config.host.clone(),
        config.port,
    ));
    state.load_layout();

    // Start the background tasks
    let ticker_state = Arc::clone(&state);
    tokio::spawn(async move {
        timer_ticker_task(ticker_state).await;
    });

    let saver_state = Arc::clone(&state);
    tokio::spawn(async move {
        layout_saver_task(saver_state, save_requests).await;
    });

    let monitor_state = Arc::clone(&state);
    tokio::spawn(async move {
        playback_monitor_task(monitor_state).await;
    });

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET  /timers            - Timer grid (?viewport_width=N)");
    info!("  POST /timers            - Add a custom timer");
    info!("  POST /timers/:id/toggle - Start or pause a timer");
    info!("  GET  /queue             - Audio queue");
    info!("  POST /queue             - Download a YouTube URL into the queue");
    info!("  POST /player/toggle     - Play or pause audio");
    info!("  GET  /status            - Status line and counts");
    info!("  GET  /health            - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    state.shutdown().await;
    if state.timers().has_running() {
        warn!("Running timers were saved mid-countdown and resume on next start");
    }

    info!("Server shutdown complete");
    Ok(())
}

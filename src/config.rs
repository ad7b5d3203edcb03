//! Configuration and CLI argument handling

use clap::Parser;
use std::path::PathBuf;

use crate::{
    services::{downloader::DEFAULT_MAX_DOWNLOADS, media_player::DEFAULT_PLAYER_BINARY},
    state::timer_collection::DEFAULT_CARD_WIDTH,
};

/// CLI argument parsing structure
#[derive(Parser, Debug, Clone)]
#[command(name = "timer-deck")]
#[command(about = "Countdown timer grid with a YouTube audio queue, driven over HTTP")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20560")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Directory holding layout.json and the audio cache
    #[arg(short, long, default_value = ".")]
    pub data_dir: PathBuf,

    /// yt-dlp executable used for metadata and downloads
    #[arg(long, default_value = "yt-dlp")]
    pub ytdlp_bin: String,

    /// mpv executable used for playback
    #[arg(long, default_value = DEFAULT_PLAYER_BINARY)]
    pub mpv_bin: String,

    /// Downloads allowed to run at once
    #[arg(long, default_value_t = DEFAULT_MAX_DOWNLOADS)]
    pub max_downloads: usize,

    /// Timer card width in pixels, used for grid columns
    #[arg(long, default_value_t = DEFAULT_CARD_WIDTH)]
    pub card_width: u32,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn layout_path(&self) -> PathBuf {
        self.data_dir.join("layout.json")
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.data_dir.join("cache")
    }

    /// IPC socket for the player, one per port so two servers never share it
    pub fn player_socket(&self) -> PathBuf {
        std::env::temp_dir().join(format!("timer-deck-{}.sock", self.port))
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}

//! External integrations module
//!
//! URL parsing, the on-disk audio cache, the yt-dlp extractor, the download
//! orchestrator, and the mpv-backed audio player.

pub mod audio_cache;
pub mod downloader;
pub mod extractor;
pub mod media_player;
pub mod youtube_url;

// Re-export main types
pub use audio_cache::AudioCache;
pub use downloader::DownloadOrchestrator;
pub use extractor::{AudioExtractor, YtDlpExtractor};
pub use media_player::{MediaPlayer, MediaStatus, MpvPlayer};
pub use youtube_url::{canonical_watch_url, extract_video_id, is_valid_youtube_url};

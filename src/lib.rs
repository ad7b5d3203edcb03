//! Timer Deck - A grid of countdown timers with a YouTube audio queue
//!
//! All dashboard state lives in one process and is driven over a small HTTP
//! API. Timers persist to `layout.json`; audio is fetched with yt-dlp into a
//! local cache and played by an external player process.

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use error::{DashboardError, Result};
pub use state::AppState;
pub use utils::signals::shutdown_signal;

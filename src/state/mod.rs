//! State management module
//! 
//! Timers, the audio queue, persistence, and the application state that owns them.

pub mod app_state;
pub mod persistence;
pub mod playback_queue;
pub mod status_line;
pub mod timer_collection;
pub mod timer_state;

// Re-export main types
pub use app_state::{AppState, TimerAction};
pub use persistence::{PersistenceStore, SaveScheduler};
pub use playback_queue::{PlaybackQueue, QueueEntry, Step};
pub use status_line::StatusLine;
pub use timer_collection::{GridCell, TimerCollection};
pub use timer_state::{TimerEntity, TimerPhase, TimerSnapshot};

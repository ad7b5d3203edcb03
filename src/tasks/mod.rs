//! Background tasks module
//! 
//! Periodic work that runs alongside the HTTP server.

pub mod layout_saver;
pub mod playback_monitor;
pub mod timer_ticker;

// Re-export main functions
pub use layout_saver::layout_saver_task;
pub use playback_monitor::playback_monitor_task;
pub use timer_ticker::timer_ticker_task;

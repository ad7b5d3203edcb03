//! Countdown timer state machine

use serde::{Deserialize, Serialize};

use crate::utils::format_hms;

pub const DEFAULT_TIMER_TITLE: &str = "Timer";

/// Persisted form of one timer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub timer_id: String,
    pub title: String,
    pub total_seconds: u64,
    pub remaining_seconds: u64,
    pub is_running: bool,
}

/// Where a timer sits in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerPhase {
    Idle,
    Running,
    Expired,
}

/// A single countdown.
///
/// `remaining_seconds` always stays within `[0, total_seconds]`, `total_seconds`
/// is at least 1, and a timer with nothing left is never running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerEntity {
    timer_id: String,
    title: String,
    total_seconds: u64,
    remaining_seconds: u64,
    is_running: bool,
}

fn normalize_title(title: &str) -> String {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        DEFAULT_TIMER_TITLE.to_string()
    } else {
        trimmed.to_string()
    }
}

impl TimerEntity {
    /// Create an idle timer with a full countdown
    pub fn new(timer_id: impl Into<String>, title: &str, total_seconds: u64) -> Self {
        let total_seconds = total_seconds.max(1);
        Self {
            timer_id: timer_id.into(),
            title: normalize_title(title),
            total_seconds,
            remaining_seconds: total_seconds,
            is_running: false,
        }
    }

    /// Restore from a snapshot, clamping anything out of range
    pub fn from_snapshot(snapshot: TimerSnapshot) -> Self {
        let total_seconds = snapshot.total_seconds.max(1);
        let remaining_seconds = snapshot.remaining_seconds.min(total_seconds);
        Self {
            timer_id: snapshot.timer_id,
            title: normalize_title(&snapshot.title),
            total_seconds,
            remaining_seconds,
            is_running: snapshot.is_running && remaining_seconds > 0,
        }
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            timer_id: self.timer_id.clone(),
            title: self.title.clone(),
            total_seconds: self.total_seconds,
            remaining_seconds: self.remaining_seconds,
            is_running: self.is_running,
        }
    }

    pub fn id(&self) -> &str {
        &self.timer_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn total_seconds(&self) -> u64 {
        self.total_seconds
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.remaining_seconds
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn phase(&self) -> TimerPhase {
        if self.remaining_seconds == 0 {
            TimerPhase::Expired
        } else if self.is_running {
            TimerPhase::Running
        } else {
            TimerPhase::Idle
        }
    }

    /// Fraction of the countdown already elapsed, in `[0, 1]`
    pub fn progress(&self) -> f64 {
        if self.total_seconds == 0 {
            return 0.0;
        }
        let progress = 1.0 - (self.remaining_seconds as f64 / self.total_seconds as f64);
        progress.clamp(0.0, 1.0)
    }

    /// Remaining time as `HH:MM:SS`
    pub fn display_time(&self) -> String {
        format_hms(self.remaining_seconds)
    }

    /// Start counting down. Starting an expired timer restarts it from the top.
    pub fn start(&mut self) -> bool {
        if self.is_running {
            return false;
        }
        if self.remaining_seconds == 0 {
            self.remaining_seconds = self.total_seconds;
        }
        self.is_running = true;
        true
    }

    pub fn pause(&mut self) -> bool {
        if !self.is_running {
            return false;
        }
        self.is_running = false;
        true
    }

    /// Single play/pause action
    pub fn toggle(&mut self) -> bool {
        if self.is_running {
            self.pause()
        } else {
            self.start()
        }
    }

    /// Advance one second. Returns true if the timer changed.
    pub fn tick(&mut self) -> bool {
        if !self.is_running {
            return false;
        }
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            self.is_running = false;
        }
        true
    }

    pub fn reset(&mut self) -> bool {
        let changed = self.is_running || self.remaining_seconds != self.total_seconds;
        self.remaining_seconds = self.total_seconds;
        self.is_running = false;
        changed
    }

    /// Replace the duration. Progress is never carried over.
    pub fn set_duration(&mut self, total_seconds: u64) -> bool {
        self.total_seconds = total_seconds.max(1);
        self.remaining_seconds = self.total_seconds;
        self.is_running = false;
        true
    }

    pub fn rename(&mut self, title: &str) -> bool {
        let title = normalize_title(title);
        if title == self.title {
            return false;
        }
        self.title = title;
        true
    }
}

//! User-facing status message

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Last message shown to the user, replaced on every action
#[derive(Debug, Clone, Serialize)]
pub struct StatusLine {
    pub message: String,
    pub updated_at: DateTime<Utc>,
}

impl StatusLine {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            updated_at: Utc::now(),
        }
    }

    pub fn set(&mut self, message: impl Into<String>) {
        self.message = message.into();
        self.updated_at = Utc::now();
    }
}

impl Default for StatusLine {
    fn default() -> Self {
        Self::new("Ready.")
    }
}

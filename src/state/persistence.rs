//! Layout file persistence

use serde::Serialize;
use serde_json::Value;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{
    timer_collection::new_id,
    timer_state::{TimerSnapshot, DEFAULT_TIMER_TITLE},
};
use crate::error::{DashboardError, Result};

/// Duration used when a stored timer has none
pub const DEFAULT_TOTAL_SECONDS: u64 = 60;

#[derive(Serialize)]
struct LayoutDocument<'a> {
    timers: &'a [TimerSnapshot],
}

/// Reads and writes `layout.json`
#[derive(Debug, Clone)]
pub struct PersistenceStore {
    path: PathBuf,
}

impl PersistenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load stored timers in display order. Never fails: unreadable or
    /// malformed files yield an empty list.
    pub fn load(&self) -> Vec<TimerSnapshot> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) => {
                debug!("No layout loaded from {}: {}", self.path.display(), e);
                return Vec::new();
            }
        };

        match parse_layout(&raw) {
            Ok(timers) => timers,
            Err(e) => {
                warn!("{}", e);
                Vec::new()
            }
        }
    }

    /// Write the full layout, replacing the previous file
    pub fn save(&self, timers: &[TimerSnapshot]) -> Result<()> {
        let write_failed = |source: std::io::Error| DashboardError::PersistenceWriteFailed {
            path: self.path.clone(),
            source,
        };

        let json = serde_json::to_string_pretty(&LayoutDocument { timers })
            .map_err(|e| write_failed(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_failed)?;
        }

        let staging = self.path.with_extension("json.new");
        fs::write(&staging, json).map_err(write_failed)?;
        fs::rename(&staging, &self.path).map_err(write_failed)?;

        debug!("Saved {} timer(s) to {}", timers.len(), self.path.display());
        Ok(())
    }
}

/// Parse a layout document, filling defaults for anything missing or mistyped
pub fn parse_layout(raw: &str) -> Result<Vec<TimerSnapshot>> {
    let root: Value =
        serde_json::from_str(raw).map_err(|e| DashboardError::PersistenceReadMalformed(e.to_string()))?;

    let root = root
        .as_object()
        .ok_or_else(|| DashboardError::PersistenceReadMalformed("root is not an object".to_string()))?;

    let items = match root.get("timers").and_then(Value::as_array) {
        Some(items) => items,
        None => return Ok(Vec::new()),
    };

    Ok(items.iter().filter_map(snapshot_from_value).collect())
}

fn snapshot_from_value(value: &Value) -> Option<TimerSnapshot> {
    let item = value.as_object()?;

    let timer_id = match item.get("timer_id") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => new_id(),
    };

    let title = match item.get("title") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        _ => DEFAULT_TIMER_TITLE.to_string(),
    };

    let total_seconds = match item.get("total_seconds").and_then(seconds_from_value) {
        Some(n) if n > 0 => n as u64,
        _ => DEFAULT_TOTAL_SECONDS,
    };

    let remaining_seconds = match item.get("remaining_seconds").and_then(seconds_from_value) {
        Some(n) => n.clamp(0, total_seconds as i64) as u64,
        None => total_seconds,
    };

    let is_running = match item.get("is_running") {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        _ => false,
    };

    Some(TimerSnapshot {
        timer_id,
        title,
        total_seconds,
        remaining_seconds,
        is_running: is_running && remaining_seconds > 0,
    })
}

/// Integer seconds from a number or a numeric string
fn seconds_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Handle for requesting a debounced save
#[derive(Debug, Clone)]
pub struct SaveScheduler {
    tx: mpsc::UnboundedSender<()>,
}

impl SaveScheduler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Ask for a save; bursts of requests collapse into one write
    pub fn schedule(&self) {
        if self.tx.send(()).is_err() {
            warn!("Layout saver is not running, change will not be persisted");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn snapshot(id: &str, total: u64, remaining: u64, running: bool) -> TimerSnapshot {
        TimerSnapshot {
            timer_id: id.to_string(),
            title: format!("Timer {}", id),
            total_seconds: total,
            remaining_seconds: remaining,
            is_running: running,
        }
    }

    #[test]
    fn missing_file_loads_empty() {
        let temp = TempDir::new().unwrap();
        let store = PersistenceStore::new(temp.path().join("layout.json"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn malformed_or_non_object_loads_empty() {
        let temp = TempDir::new().unwrap();
        let store = PersistenceStore::new(temp.path().join("layout.json"));

        for raw in ["{not json", "[1, 2, 3]", "\"timers\"", "{\"timers\": 5}", ""] {
            fs::write(store.path(), raw).unwrap();
            assert!(store.load().is_empty(), "{}", raw);
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let temp = TempDir::new().unwrap();
        let store = PersistenceStore::new(temp.path().join("layout.json"));
        let timers = vec![
            snapshot("a", 60, 60, false),
            snapshot("b", 180, 42, true),
            snapshot("c", 3600, 0, false),
        ];

        store.save(&timers).unwrap();
        let loaded = store.load();
        assert_eq!(loaded, timers);

        store.save(&loaded).unwrap();
        assert_eq!(store.load(), timers);
    }

    #[test]
    fn running_with_nothing_left_is_normalized() {
        let raw = r#"{"timers": [{"timer_id": "a", "title": "A", "total_seconds": 60, "remaining_seconds": 0, "is_running": true}]}"#;
        let loaded = parse_layout(raw).unwrap();
        assert!(!loaded[0].is_running);
        assert_eq!(loaded[0].remaining_seconds, 0);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let raw = r#"{"timers": [{}, 7, {"timer_id": "x", "total_seconds": 120}, {"total_seconds": "90", "remaining_seconds": 500, "is_running": 1}]}"#;
        let loaded = parse_layout(raw).unwrap();
        assert_eq!(loaded.len(), 3);

        assert_eq!(loaded[0].title, "Timer");
        assert_eq!(loaded[0].total_seconds, 60);
        assert_eq!(loaded[0].remaining_seconds, 60);
        assert!(!loaded[0].is_running);
        assert_eq!(loaded[0].timer_id.len(), 32);

        assert_eq!(loaded[1].timer_id, "x");
        assert_eq!(loaded[1].remaining_seconds, 120);

        assert_eq!(loaded[2].total_seconds, 90);
        assert_eq!(loaded[2].remaining_seconds, 90);
        assert!(loaded[2].is_running);
    }

    #[test]
    fn non_positive_totals_fall_back_to_default() {
        let raw = r#"{"timers": [
            {"total_seconds": -5, "remaining_seconds": -3},
            {"total_seconds": 0, "remaining_seconds": 30},
            {"total_seconds": -1}
        ]}"#;
        let loaded = parse_layout(raw).unwrap();
        let totals: Vec<u64> = loaded.iter().map(|s| s.total_seconds).collect();
        assert_eq!(totals, vec![DEFAULT_TOTAL_SECONDS; 3]);
        assert_eq!(loaded[0].remaining_seconds, 0);
        assert_eq!(loaded[1].remaining_seconds, 30);
        assert_eq!(loaded[2].remaining_seconds, DEFAULT_TOTAL_SECONDS);
    }

    #[test]
    fn saved_document_shape() {
        let temp = TempDir::new().unwrap();
        let store = PersistenceStore::new(temp.path().join("nested").join("layout.json"));
        store.save(&[snapshot("a", 10, 5, true)]).unwrap();

        let value: Value = serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(value["timers"][0]["timer_id"], "a");
        assert_eq!(value["timers"][0]["remaining_seconds"], 5);
        assert_eq!(value["timers"][0]["is_running"], true);
    }

    #[test]
    fn unwritable_path_reports_write_failure() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("file");
        fs::write(&blocker, b"x").unwrap();
        let store = PersistenceStore::new(blocker.join("layout.json"));

        let err = store.save(&[]).unwrap_err();
        assert!(matches!(err, DashboardError::PersistenceWriteFailed { .. }));
    }

    #[test]
    fn scheduler_delivers_requests() {
        let (scheduler, mut rx) = SaveScheduler::new();
        scheduler.schedule();
        scheduler.schedule();
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }
}

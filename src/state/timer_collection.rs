//! Ordered set of timers and their grid placement

use serde::Serialize;
use uuid::Uuid;

use super::timer_state::{TimerEntity, TimerSnapshot};

/// Width of one timer card in the grid
pub const DEFAULT_CARD_WIDTH: u32 = 340;

/// Narrowest viewport the grid lays out for
pub const MIN_VIEWPORT_WIDTH: u32 = 320;

/// Grid cell of one timer, row-major
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridCell {
    pub row: usize,
    pub column: usize,
}

/// Outcome of one second of ticking across the collection
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub changed: Vec<String>,
    pub expired: Vec<String>,
}

impl TickReport {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
    }
}

/// Fresh opaque id for a timer or queue entry
pub fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Column count for a viewport, never below one
pub fn column_count(viewport_width: u32, card_width: u32) -> usize {
    let card_width = card_width.max(1);
    let viewport_width = viewport_width.max(MIN_VIEWPORT_WIDTH);
    ((viewport_width / card_width) as usize).max(1)
}

/// Timers in display order
#[derive(Debug, Default, Clone)]
pub struct TimerCollection {
    timers: Vec<TimerEntity>,
}

impl TimerCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a collection from snapshots, skipping duplicate ids
    pub fn from_snapshots(snapshots: Vec<TimerSnapshot>) -> Self {
        let mut collection = Self::new();
        for snapshot in snapshots {
            if !collection.contains(&snapshot.timer_id) {
                collection.timers.push(TimerEntity::from_snapshot(snapshot));
            }
        }
        collection
    }

    /// Add a timer at the end. Returns the id, or `None` when `timer_id` is already present.
    pub fn add_timer(
        &mut self,
        title: &str,
        total_seconds: u64,
        timer_id: Option<String>,
        remaining_seconds: Option<u64>,
        is_running: bool,
    ) -> Option<String> {
        let timer_id = timer_id.unwrap_or_else(new_id);
        if self.contains(&timer_id) {
            return None;
        }

        let total_seconds = total_seconds.max(1);
        let snapshot = TimerSnapshot {
            timer_id: timer_id.clone(),
            title: title.to_string(),
            total_seconds,
            remaining_seconds: remaining_seconds.unwrap_or(total_seconds),
            is_running,
        };
        self.timers.push(TimerEntity::from_snapshot(snapshot));
        Some(timer_id)
    }

    pub fn remove_timer(&mut self, timer_id: &str) -> bool {
        let before = self.timers.len();
        self.timers.retain(|timer| timer.id() != timer_id);
        self.timers.len() != before
    }

    pub fn contains(&self, timer_id: &str) -> bool {
        self.timers.iter().any(|timer| timer.id() == timer_id)
    }

    pub fn get(&self, timer_id: &str) -> Option<&TimerEntity> {
        self.timers.iter().find(|timer| timer.id() == timer_id)
    }

    pub fn get_mut(&mut self, timer_id: &str) -> Option<&mut TimerEntity> {
        self.timers.iter_mut().find(|timer| timer.id() == timer_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimerEntity> {
        self.timers.iter()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn ids(&self) -> Vec<String> {
        self.timers.iter().map(|timer| timer.id().to_string()).collect()
    }

    pub fn snapshots(&self) -> Vec<TimerSnapshot> {
        self.timers.iter().map(TimerEntity::snapshot).collect()
    }

    pub fn has_running(&self) -> bool {
        self.timers.iter().any(TimerEntity::is_running)
    }

    /// Tick every running timer once
    pub fn tick_all(&mut self) -> TickReport {
        let mut report = TickReport::default();
        for timer in self.timers.iter_mut().filter(|timer| timer.is_running()) {
            if timer.tick() {
                report.changed.push(timer.id().to_string());
                if !timer.is_running() {
                    report.expired.push(timer.id().to_string());
                }
            }
        }
        report
    }

    /// Row-major placement of every timer for the given viewport
    pub fn grid_placement(&self, viewport_width: u32, card_width: u32) -> Vec<(String, GridCell)> {
        let columns = column_count(viewport_width, card_width);
        self.timers
            .iter()
            .enumerate()
            .map(|(index, timer)| {
                let cell = GridCell {
                    row: index / columns,
                    column: index % columns,
                };
                (timer.id().to_string(), cell)
            })
            .collect()
    }

    /// The three timers a first run starts with
    pub fn seed_defaults(&mut self) {
        self.add_timer("1 min", 60, None, None, false);
        self.add_timer("3 min", 180, None, None, false);
        self.add_timer("1 hour", 3600, None, None, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_is_idempotent_by_id() {
        let mut timers = TimerCollection::new();
        assert_eq!(
            timers.add_timer("Tea", 180, Some("t1".to_string()), None, false),
            Some("t1".to_string())
        );
        assert_eq!(timers.add_timer("Other", 60, Some("t1".to_string()), None, true), None);
        assert_eq!(timers.len(), 1);
        assert_eq!(timers.get("t1").unwrap().title(), "Tea");
    }

    #[test]
    fn generated_ids_are_unique() {
        let mut timers = TimerCollection::new();
        let a = timers.add_timer("A", 10, None, None, false).unwrap();
        let b = timers.add_timer("B", 10, None, None, false).unwrap();
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn removal_preserves_order_of_the_rest() {
        let mut timers = TimerCollection::new();
        for id in ["a", "b", "c"] {
            timers.add_timer(id, 10, Some(id.to_string()), None, false);
        }
        assert!(timers.remove_timer("b"));
        assert!(!timers.remove_timer("b"));
        assert_eq!(timers.ids(), vec!["a", "c"]);
    }

    #[test]
    fn add_clamps_remaining_and_running() {
        let mut timers = TimerCollection::new();
        timers.add_timer("A", 10, Some("a".to_string()), Some(99), true);
        timers.add_timer("B", 10, Some("b".to_string()), Some(0), true);
        assert_eq!(timers.get("a").unwrap().remaining_seconds(), 10);
        assert!(timers.get("a").unwrap().is_running());
        assert!(!timers.get("b").unwrap().is_running());
    }

    #[test]
    fn tick_all_reports_changes_and_expiry() {
        let mut timers = TimerCollection::new();
        timers.add_timer("A", 1, Some("a".to_string()), None, true);
        timers.add_timer("B", 5, Some("b".to_string()), None, true);
        timers.add_timer("C", 5, Some("c".to_string()), None, false);

        let report = timers.tick_all();
        assert_eq!(report.changed, vec!["a", "b"]);
        assert_eq!(report.expired, vec!["a"]);
        assert_eq!(timers.get("c").unwrap().remaining_seconds(), 5);

        let report = timers.tick_all();
        assert_eq!(report.changed, vec!["b"]);
        assert!(report.expired.is_empty());
    }

    #[test]
    fn grid_is_row_major_with_at_least_one_column() {
        let mut timers = TimerCollection::new();
        for id in ["a", "b", "c", "d", "e"] {
            timers.add_timer(id, 10, Some(id.to_string()), None, false);
        }

        let grid = timers.grid_placement(1100, DEFAULT_CARD_WIDTH);
        let cells: Vec<(usize, usize)> = grid.iter().map(|(_, c)| (c.row, c.column)).collect();
        assert_eq!(cells, vec![(0, 0), (0, 1), (0, 2), (1, 0), (1, 1)]);

        let narrow = timers.grid_placement(100, DEFAULT_CARD_WIDTH);
        assert!(narrow.iter().all(|(_, c)| c.column == 0));
        assert_eq!(narrow[4].1.row, 4);
    }

    #[test]
    fn column_count_floors() {
        assert_eq!(column_count(679, 340), 1);
        assert_eq!(column_count(680, 340), 2);
        assert_eq!(column_count(0, 340), 1);
        assert_eq!(column_count(500, 0), 500);
    }

    #[test]
    fn seeds_three_defaults() {
        let mut timers = TimerCollection::new();
        timers.seed_defaults();
        let totals: Vec<u64> = timers.iter().map(TimerEntity::total_seconds).collect();
        assert_eq!(totals, vec![60, 180, 3600]);
        let titles: Vec<&str> = timers.iter().map(TimerEntity::title).collect();
        assert_eq!(titles, vec!["1 min", "3 min", "1 hour"]);
    }
}

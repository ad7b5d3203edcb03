//! Audio queue with a current-entry pointer tracked by id

use serde::Serialize;
use std::path::PathBuf;

use super::timer_collection::new_id;
use crate::utils::format_duration_short;

/// One playable item. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueEntry {
    pub queue_id: String,
    pub url: String,
    pub title: String,
    pub duration_seconds: u64,
    pub video_id: String,
    pub file_path: PathBuf,
}

impl QueueEntry {
    /// New entry with a fresh `queue_id`, so the same video can be queued twice
    pub fn new(url: String, title: String, duration_seconds: u64, video_id: String, file_path: PathBuf) -> Self {
        Self {
            queue_id: new_id(),
            url,
            title,
            duration_seconds,
            video_id,
            file_path,
        }
    }

    pub fn display_text(&self) -> String {
        format!("{}  [{}]", self.title, format_duration_short(Some(self.duration_seconds)))
    }

    /// The backing file is only checked when playback is attempted
    pub fn is_playable(&self) -> bool {
        self.file_path.is_file()
    }
}

/// Result of stepping through the queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Move to this entry
    Moved(QueueEntry),
    EndOfQueue,
    NoPrevious,
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveOutcome {
    pub removed: bool,
    pub was_current: bool,
}

/// Ordered entries plus the now-playing and selected pointers
#[derive(Debug, Default, Clone)]
pub struct PlaybackQueue {
    entries: Vec<QueueEntry>,
    current_id: Option<String>,
    selected_id: Option<String>,
}

impl PlaybackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, queue_id: &str) -> Option<&QueueEntry> {
        self.entries.iter().find(|entry| entry.queue_id == queue_id)
    }

    fn index_of(&self, queue_id: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.queue_id == queue_id)
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current_id.as_deref()
    }

    pub fn current(&self) -> Option<&QueueEntry> {
        self.current_id.as_deref().and_then(|id| self.get(id))
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected_id.as_deref()
    }

    /// Append. The first entry of an empty queue becomes the selection; nothing auto-plays.
    pub fn add_entry(&mut self, entry: QueueEntry) {
        if self.entries.is_empty() {
            self.selected_id = Some(entry.queue_id.clone());
        }
        self.entries.push(entry);
    }

    /// Remove by id. When it was the current entry the pointer is cleared
    /// and the caller is expected to stop playback.
    pub fn remove_entry(&mut self, queue_id: &str) -> RemoveOutcome {
        let index = match self.index_of(queue_id) {
            Some(index) => index,
            None => {
                return RemoveOutcome {
                    removed: false,
                    was_current: false,
                }
            }
        };

        self.entries.remove(index);
        let was_current = self.current_id.as_deref() == Some(queue_id);
        if was_current {
            self.current_id = None;
        }
        if self.selected_id.as_deref() == Some(queue_id) {
            // Selection slides to whatever now occupies the row
            let next = index.min(self.entries.len().saturating_sub(1));
            self.selected_id = self.entries.get(next).map(|entry| entry.queue_id.clone());
        }

        RemoveOutcome {
            removed: true,
            was_current,
        }
    }

    /// Swap with the neighbour `delta` rows away. Out-of-range moves are no-ops.
    pub fn move_entry(&mut self, queue_id: &str, delta: isize) -> bool {
        let index = match self.index_of(queue_id) {
            Some(index) => index,
            None => return false,
        };
        let target = index as isize + delta;
        if delta == 0 || target < 0 || target as usize >= self.entries.len() {
            return false;
        }

        let item = self.entries.remove(index);
        self.entries.insert(target as usize, item);
        self.selected_id = Some(queue_id.to_string());
        true
    }

    pub fn select(&mut self, queue_id: &str) -> bool {
        if self.index_of(queue_id).is_none() {
            return false;
        }
        self.selected_id = Some(queue_id.to_string());
        true
    }

    /// Mark an entry as now playing, which also selects it
    pub fn set_current(&mut self, queue_id: &str) -> bool {
        if !self.select(queue_id) {
            return false;
        }
        self.current_id = Some(queue_id.to_string());
        true
    }

    pub fn clear_current(&mut self) {
        self.current_id = None;
    }

    /// Selected row, or the first one when nothing valid is selected
    pub fn selected_or_first_index(&self) -> Option<usize> {
        self.selected_id
            .as_deref()
            .and_then(|id| self.index_of(id))
            .or(if self.entries.is_empty() { None } else { Some(0) })
    }

    /// Entry that play/pause should start when nothing is current
    pub fn selected_or_first(&self) -> Option<&QueueEntry> {
        self.selected_or_first_index().map(|index| &self.entries[index])
    }

    /// Row of the current entry, falling back to selected-or-first
    fn anchor_index(&self) -> Option<usize> {
        self.current_id
            .as_deref()
            .and_then(|id| self.index_of(id))
            .or_else(|| self.selected_or_first_index())
    }

    /// Next entry after the current one. Stops at the end rather than wrapping.
    pub fn advance(&self) -> Step {
        let index = match self.anchor_index() {
            Some(index) => index,
            None => return Step::Empty,
        };
        match self.entries.get(index + 1) {
            Some(entry) => Step::Moved(entry.clone()),
            None => Step::EndOfQueue,
        }
    }

    /// Entry before the current one
    pub fn retreat(&self) -> Step {
        match self.anchor_index() {
            None => Step::Empty,
            Some(0) => Step::NoPrevious,
            Some(index) => Step::Moved(self.entries[index - 1].clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(title: &str) -> QueueEntry {
        QueueEntry::new(
            format!("https://www.youtube.com/watch?v={}", title),
            title.to_string(),
            90,
            title.to_string(),
            PathBuf::from(format!("/cache/{}.m4a", title)),
        )
    }

    fn abc() -> (PlaybackQueue, QueueEntry, QueueEntry, QueueEntry) {
        let (a, b, c) = (entry("A"), entry("B"), entry("C"));
        let mut queue = PlaybackQueue::new();
        queue.add_entry(a.clone());
        queue.add_entry(b.clone());
        queue.add_entry(c.clone());
        (queue, a, b, c)
    }

    #[test]
    fn first_entry_becomes_selection_without_playing() {
        let (queue, a, _, _) = abc();
        assert_eq!(queue.selected_id(), Some(a.queue_id.as_str()));
        assert!(queue.current().is_none());
    }

    #[test]
    fn same_video_twice_has_distinct_queue_ids() {
        let mut queue = PlaybackQueue::new();
        let first = entry("A");
        let second = QueueEntry::new(
            first.url.clone(),
            first.title.clone(),
            first.duration_seconds,
            first.video_id.clone(),
            first.file_path.clone(),
        );
        queue.add_entry(first.clone());
        queue.add_entry(second.clone());
        assert_eq!(queue.len(), 2);
        assert_ne!(first.queue_id, second.queue_id);
    }

    #[test]
    fn advance_moves_forward_and_stops_at_end() {
        let (mut queue, a, b, c) = abc();
        queue.set_current(&a.queue_id);
        assert_eq!(queue.advance(), Step::Moved(b.clone()));

        queue.set_current(&c.queue_id);
        assert_eq!(queue.advance(), Step::EndOfQueue);
        assert_eq!(queue.current_id(), Some(c.queue_id.as_str()));
    }

    #[test]
    fn retreat_is_noop_at_start() {
        let (mut queue, a, b, _) = abc();
        queue.set_current(&b.queue_id);
        assert_eq!(queue.retreat(), Step::Moved(a.clone()));
        queue.set_current(&a.queue_id);
        assert_eq!(queue.retreat(), Step::NoPrevious);
    }

    #[test]
    fn stepping_without_current_uses_selection() {
        let (mut queue, _, b, c) = abc();
        queue.select(&b.queue_id);
        assert_eq!(queue.advance(), Step::Moved(c));
        assert_eq!(PlaybackQueue::new().advance(), Step::Empty);
        assert_eq!(PlaybackQueue::new().retreat(), Step::Empty);
    }

    #[test]
    fn removing_current_clears_pointer() {
        let (mut queue, a, b, c) = abc();
        queue.set_current(&b.queue_id);

        let outcome = queue.remove_entry(&b.queue_id);
        assert!(outcome.removed && outcome.was_current);
        assert!(queue.current().is_none());
        assert_eq!(queue.selected_id(), Some(c.queue_id.as_str()));

        let outcome = queue.remove_entry(&a.queue_id);
        assert!(outcome.removed && !outcome.was_current);
        assert!(!queue.remove_entry("missing").removed);
    }

    #[test]
    fn current_survives_reordering() {
        let (mut queue, a, b, c) = abc();
        queue.set_current(&a.queue_id);

        assert!(queue.move_entry(&a.queue_id, 1));
        let order: Vec<&str> = queue.entries().iter().map(|e| e.title.as_str()).collect();
        assert_eq!(order, vec!["B", "A", "C"]);
        assert_eq!(queue.advance(), Step::Moved(c.clone()));
        assert_eq!(queue.retreat(), Step::Moved(b.clone()));
    }

    #[test]
    fn move_is_noop_at_boundaries() {
        let (mut queue, a, _, c) = abc();
        assert!(!queue.move_entry(&a.queue_id, -1));
        assert!(!queue.move_entry(&c.queue_id, 1));
        assert!(!queue.move_entry("missing", 1));
        assert_eq!(queue.entries()[0].queue_id, a.queue_id);
    }

    #[test]
    fn display_text_includes_duration() {
        assert_eq!(entry("A").display_text(), "A  [01:30]");
    }
}

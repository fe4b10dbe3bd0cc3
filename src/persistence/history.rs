//! Linear, index-addressed layout history.
//!
//! Every entry holds the arrangement as it was right after its action. `current` points at the
//! entry the workspace currently reflects:
//!
//! ```text
//! push(e4)            [e1, e2, e3, e4]   current = 3
//! undo() x2           [e1, e2, e3, e4]   current = 1
//! push(e5)  <-- new branch, drops e3/e4
//!                     [e1, e2, e5]       current = 2
//! ```
//!
//! When `capacity` is exceeded the oldest entry is evicted.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::snapshot::LayoutSnapshot;

/// What produced a [`HistoryEntry`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HistoryAction {
    Save { layout_id: Uuid },
    Delete { layout_id: Uuid },
    Import { layout_id: Uuid },
    Edit { description: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub action: HistoryAction,
    pub snapshot: LayoutSnapshot,
}

/// Result of [`super::LayoutPersistenceManager::undo`] / `redo`.
#[derive(Clone, Debug, PartialEq)]
pub enum HistoryOutcome {
    /// The history moved and this snapshot was applied.
    Applied(Box<LayoutSnapshot>),
    NothingToUndo,
    NothingToRedo,
}

#[derive(Clone, Debug)]
pub struct LayoutHistory {
    entries: VecDeque<HistoryEntry>,
    current: Option<usize>,
    capacity: usize,
}

impl LayoutHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            current: None,
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, action: HistoryAction, snapshot: LayoutSnapshot) -> &HistoryEntry {
        let keep = self.current.map_or(0, |i| i + 1);
        self.entries.truncate(keep);

        self.entries.push_back(HistoryEntry {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            action,
            snapshot,
        });
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }

        let last = self.entries.len() - 1;
        self.current = Some(last);
        &self.entries[last]
    }

    /// Step back one entry and return it, or `None` at the oldest entry.
    pub fn undo(&mut self) -> Option<&HistoryEntry> {
        let index = self.current.filter(|&i| i > 0)? - 1;
        self.current = Some(index);
        self.entries.get(index)
    }

    /// Step forward one entry and return it, or `None` at the newest entry.
    pub fn redo(&mut self) -> Option<&HistoryEntry> {
        let index = self.current.map_or(0, |i| i + 1);
        if index >= self.entries.len() {
            return None;
        }
        self.current = Some(index);
        self.entries.get(index)
    }

    pub fn can_undo(&self) -> bool {
        self.current.is_some_and(|i| i > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.current.map_or(0, |i| i + 1) < self.entries.len()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.current.and_then(|i| self.entries.get(i))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docking::DockingManager;

    fn snapshot(name: &str) -> LayoutSnapshot {
        LayoutSnapshot::capture(name, "", None, &DockingManager::default())
    }

    fn edit(n: u32) -> HistoryAction {
        HistoryAction::Edit {
            description: format!("edit {n}"),
        }
    }

    #[test]
    fn empty_history_has_nothing_to_move_to() {
        let mut history = LayoutHistory::new(10);
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());
        assert_eq!(history.current_index(), None);
    }

    #[test]
    fn undo_stops_at_index_zero() {
        let mut history = LayoutHistory::new(10);
        history.push(edit(1), snapshot("one"));
        assert!(!history.can_undo());
        assert!(history.undo().is_none());
        assert_eq!(history.current_index(), Some(0));
    }

    #[test]
    fn undo_then_redo_walks_the_entries() {
        let mut history = LayoutHistory::new(10);
        history.push(edit(1), snapshot("one"));
        history.push(edit(2), snapshot("two"));

        assert_eq!(history.undo().unwrap().snapshot.name, "one");
        assert!(history.can_redo());
        assert_eq!(history.redo().unwrap().snapshot.name, "two");
        assert!(history.redo().is_none());
    }

    #[test]
    fn push_after_undo_truncates_redo_branch() {
        let mut history = LayoutHistory::new(10);
        for n in 1..=4 {
            history.push(edit(n), snapshot(&format!("s{n}")));
        }
        history.undo();
        history.undo();
        history.push(edit(5), snapshot("s5"));

        let names: Vec<&str> = history.entries().map(|e| e.snapshot.name.as_str()).collect();
        assert_eq!(names, ["s1", "s2", "s5"]);
        assert_eq!(history.current_index(), Some(2));
        assert!(!history.can_redo());
    }

    #[test]
    fn capacity_evicts_oldest() {
        let mut history = LayoutHistory::new(3);
        for n in 1..=5 {
            history.push(edit(n), snapshot(&format!("s{n}")));
        }
        let names: Vec<&str> = history.entries().map(|e| e.snapshot.name.as_str()).collect();
        assert_eq!(names, ["s3", "s4", "s5"]);
        assert_eq!(history.current_index(), Some(2));
        assert_eq!(history.current().unwrap().action, edit(5));
    }
}

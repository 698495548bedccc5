//! Undo/redo history.
//!
//! A linear undo stack of committed entries and a redo stack of undone
//! ones. Opening a new transaction after an undo discards the redo stack
//! (standard editor behavior).

use crate::operation::Operation;
use crate::transaction::TransactionId;
use std::collections::VecDeque;
use std::fmt;

/// One committed transaction: its label and the operations to replay.
pub(crate) struct HistoryEntry {
    pub(crate) id: TransactionId,
    pub(crate) label: String,
    pub(crate) ops: Vec<Box<dyn Operation>>,
}

/// What happened to the history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryChangeKind {
    /// A transaction committed and was pushed onto the undo stack
    Committed,
    /// The most recent entry was undone
    Undone,
    /// The most recently undone entry was re-applied
    Redone,
    /// The redo stack was discarded by a diverging edit
    RedoDiscarded,
    /// Both stacks were emptied
    Cleared,
}

/// Notification fired by the nexus whenever the history changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryChange {
    /// What happened
    pub kind: HistoryChangeKind,
    /// The transaction involved (`None` for a redo discard or a clear)
    pub id: Option<TransactionId>,
    /// The transaction's label
    pub label: String,
}

/// Undo/redo history stack.
pub(crate) struct History {
    /// Entries that can be undone, oldest first
    undo_stack: VecDeque<HistoryEntry>,
    /// Entries that can be redone, most recently undone last
    redo_stack: Vec<HistoryEntry>,
    /// Maximum undo depth (`None` = unbounded)
    max_size: Option<usize>,
}

impl History {
    pub(crate) fn new(max_size: Option<usize>) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_size,
        }
    }

    /// Push a freshly committed entry.
    pub(crate) fn push_committed(&mut self, entry: HistoryEntry) {
        self.undo_stack.push_back(entry);
        self.trim();
    }

    /// Pop the most recent entry for undo.
    pub(crate) fn pop_undo(&mut self) -> Option<HistoryEntry> {
        self.undo_stack.pop_back()
    }

    /// Pop the most recently undone entry for redo.
    pub(crate) fn pop_redo(&mut self) -> Option<HistoryEntry> {
        self.redo_stack.pop()
    }

    /// Push an entry whose undo completed.
    pub(crate) fn push_redo(&mut self, entry: HistoryEntry) {
        self.redo_stack.push(entry);
    }

    /// Push an entry whose redo completed.
    pub(crate) fn push_undo(&mut self, entry: HistoryEntry) {
        self.undo_stack.push_back(entry);
        self.trim();
    }

    /// Put back an entry whose undo failed.
    pub(crate) fn restore_undo(&mut self, entry: HistoryEntry) {
        self.undo_stack.push_back(entry);
    }

    /// Put back an entry whose redo failed.
    pub(crate) fn restore_redo(&mut self, entry: HistoryEntry) {
        self.redo_stack.push(entry);
    }

    /// Discard the redo stack, returning how many entries were dropped.
    pub(crate) fn clear_redo(&mut self) -> usize {
        let dropped = self.redo_stack.len();
        self.redo_stack.clear();
        dropped
    }

    /// Clear all history.
    pub(crate) fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub(crate) fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub(crate) fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Undo labels, most recent first.
    pub(crate) fn undo_labels(&self) -> Vec<String> {
        self.undo_stack.iter().rev().map(|e| e.label.clone()).collect()
    }

    /// Redo labels, most recent first.
    pub(crate) fn redo_labels(&self) -> Vec<String> {
        self.redo_stack.iter().rev().map(|e| e.label.clone()).collect()
    }

    fn trim(&mut self) {
        if let Some(max) = self.max_size {
            while self.undo_stack.len() > max {
                if let Some(dropped) = self.undo_stack.pop_front() {
                    log::debug!("History full, dropping '{}' ({})", dropped.label, dropped.id);
                }
            }
        }
    }
}

impl fmt::Debug for History {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("History")
            .field("undo_count", &self.undo_stack.len())
            .field("redo_count", &self.redo_stack.len())
            .field("max_size", &self.max_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u64, label: &str) -> HistoryEntry {
        HistoryEntry {
            id: TransactionId(id),
            label: label.to_string(),
            ops: Vec::new(),
        }
    }

    #[test]
    fn test_history_undo_redo() {
        let mut history = History::new(None);

        history.push_committed(entry(1, "one"));
        history.push_committed(entry(2, "two"));
        assert_eq!(history.undo_count(), 2);

        // Pop from undo stack (simulating undo)
        if let Some(e) = history.pop_undo() {
            history.push_redo(e);
        }
        assert_eq!(history.undo_labels(), vec!["one"]);
        assert_eq!(history.redo_labels(), vec!["two"]);

        // Pop from redo stack (simulating redo)
        if let Some(e) = history.pop_redo() {
            history.push_undo(e);
        }
        assert_eq!(history.undo_labels(), vec!["two", "one"]);
        assert_eq!(history.redo_count(), 0);
    }

    #[test]
    fn test_history_bounded() {
        let mut history = History::new(Some(2));

        history.push_committed(entry(1, "one"));
        history.push_committed(entry(2, "two"));
        history.push_committed(entry(3, "three"));

        assert_eq!(history.undo_labels(), vec!["three", "two"]);
    }

    #[test]
    fn test_clear_redo() {
        let mut history = History::new(None);
        history.push_redo(entry(1, "one"));
        history.push_redo(entry(2, "two"));

        assert_eq!(history.clear_redo(), 2);
        assert_eq!(history.redo_count(), 0);
        assert_eq!(history.clear_redo(), 0);
    }
}

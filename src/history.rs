//! Bounded snapshot-based undo/redo.
//!
//! The stack knows nothing about what a snapshot represents. Callers push the
//! state *before* a mutation; `undo` and `redo` take the current state so it
//! can be moved to the opposite stack.
//!
//! ```ignore
//! let mut history = HistoryStack::new(30);
//! history.save_snapshot(session.capture());
//! session.mutate();
//!
//! if let Some(previous) = history.undo(session.capture()) {
//!     session.apply(previous);
//!     history.finish_restore();
//! }
//! ```

use crate::app_log;
use crate::logger::LogLevel;
use std::collections::VecDeque;

/// Default maximum number of undo entries
pub const DEFAULT_HISTORY_DEPTH: usize = 30;

/// Whether the owner is editing or applying a restored snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryMode {
    Editing,
    /// A snapshot returned by undo/redo is being applied; saves are ignored
    Restoring,
}

/// Linear undo/redo history over opaque snapshots
#[derive(Debug, Clone)]
pub struct HistoryStack<T> {
    undo_stack: VecDeque<T>,
    redo_stack: Vec<T>,
    max_depth: usize,
    mode: HistoryMode,
}

impl<T> HistoryStack<T> {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::with_capacity(max_depth),
            redo_stack: Vec::new(),
            max_depth: max_depth.max(1),
            mode: HistoryMode::Editing,
        }
    }

    /// Record the state before an edit.
    ///
    /// Clears the redo stack and evicts the oldest entry past `max_depth`.
    /// Ignored while a restore is being applied.
    pub fn save_snapshot(&mut self, snapshot: T) -> bool {
        if self.mode == HistoryMode::Restoring {
            app_log!(
                LogLevel::Debug,
                "history",
                "Snapshot suppressed: restore in progress"
            );
            return false;
        }

        self.redo_stack.clear();
        self.undo_stack.push_back(snapshot);
        while self.undo_stack.len() > self.max_depth {
            self.undo_stack.pop_front();
        }

        app_log!(
            LogLevel::Debug,
            "history",
            "Snapshot saved (undo depth: {})",
            self.undo_stack.len()
        );
        true
    }

    /// Step back one edit.
    ///
    /// `current` goes onto the redo stack. The returned snapshot should be
    /// applied and then [`finish_restore`](Self::finish_restore) called.
    pub fn undo(&mut self, current: T) -> Option<T> {
        let previous = self.undo_stack.pop_back()?;
        self.redo_stack.push(current);
        self.mode = HistoryMode::Restoring;

        app_log!(
            LogLevel::Debug,
            "history",
            "Undo (undo: {}, redo: {})",
            self.undo_stack.len(),
            self.redo_stack.len()
        );
        Some(previous)
    }

    /// Step forward one undone edit; inverse of [`undo`](Self::undo).
    pub fn redo(&mut self, current: T) -> Option<T> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push_back(current);
        while self.undo_stack.len() > self.max_depth {
            self.undo_stack.pop_front();
        }
        self.mode = HistoryMode::Restoring;

        app_log!(
            LogLevel::Debug,
            "history",
            "Redo (undo: {}, redo: {})",
            self.undo_stack.len(),
            self.redo_stack.len()
        );
        Some(next)
    }

    /// Return to editing once a restored snapshot has been applied
    pub fn finish_restore(&mut self) {
        self.mode = HistoryMode::Editing;
    }

    pub fn mode(&self) -> HistoryMode {
        self.mode
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Oldest entry still available for undo
    pub fn oldest(&self) -> Option<&T> {
        self.undo_stack.front()
    }

    /// Drop both stacks
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.mode = HistoryMode::Editing;
    }
}

impl<T> Default for HistoryStack<T> {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_DEPTH)
    }
}

//! Command-based undo/redo history.
//!
//! - Undo/redo stacks of [`ComboAction`]s
//! - Recording a new entry clears the redo stack (new branch)
//! - Configurable maximum depth; the oldest entries are dropped first
//!
//! # Usage
//!
//! ```ignore
//! let mut history = History::new(200);
//!
//! let mut combo = ComboAction::new("Move clip");
//! combo.append(MoveClip::shift(id, 10));
//! history.push(&mut sequence, combo)?;
//!
//! history.undo(&mut sequence)?;
//! history.redo(&mut sequence)?;
//! ```

use std::time::Instant;

use cn_common::{EditError, EditResult};
use cn_timeline::Sequence;

use crate::combo::ComboAction;

/// A single entry in the undo/redo history.
#[derive(Clone, Debug)]
pub struct HistoryEntry {
    pub combo: ComboAction,
    /// When this entry was recorded.
    pub timestamp: Instant,
}

impl HistoryEntry {
    pub fn label(&self) -> &str {
        self.combo.label()
    }
}

/// Undo/redo stacks of applied command batches.
#[derive(Debug)]
pub struct History {
    undo_stack: Vec<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
    max_entries: usize,
}

impl History {
    pub fn new(max_entries: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_entries,
        }
    }

    /// Run `combo` against `seq` and record it.
    ///
    /// Empty combos are not recorded. Returns whether an entry was added.
    pub fn push(&mut self, seq: &mut Sequence, mut combo: ComboAction) -> EditResult<bool> {
        if combo.is_empty() {
            tracing::debug!(label = %combo.label(), "Push skipped: empty combo");
            return Ok(false);
        }
        combo.redo(seq)?;
        self.record(combo);
        Ok(true)
    }

    /// Record a combo that has already been applied.
    pub fn record(&mut self, combo: ComboAction) {
        self.redo_stack.clear();
        let label = combo.label().to_string();
        self.undo_stack.push(HistoryEntry {
            combo,
            timestamp: Instant::now(),
        });

        // Enforce max history size
        while self.undo_stack.len() > self.max_entries {
            self.undo_stack.remove(0);
        }

        tracing::debug!(
            label = %label,
            undo_depth = self.undo_stack.len(),
            "History entry pushed"
        );
    }

    /// Undo the most recent entry. Returns its label.
    pub fn undo(&mut self, seq: &mut Sequence) -> EditResult<String> {
        let mut entry = self.undo_stack.pop().ok_or(EditError::NothingToUndo)?;
        if let Err(err) = entry.combo.undo(seq) {
            tracing::error!(label = %entry.label(), error = %err, "Undo failed");
            self.undo_stack.push(entry);
            return Err(err);
        }
        tracing::debug!(
            label = %entry.label(),
            undo_remaining = self.undo_stack.len(),
            "Undo"
        );
        let label = entry.label().to_string();
        self.redo_stack.push(entry);
        Ok(label)
    }

    /// Redo the most recently undone entry. Returns its label.
    pub fn redo(&mut self, seq: &mut Sequence) -> EditResult<String> {
        let mut entry = self.redo_stack.pop().ok_or(EditError::NothingToRedo)?;
        if let Err(err) = entry.combo.redo(seq) {
            tracing::error!(label = %entry.label(), error = %err, "Redo failed");
            self.redo_stack.push(entry);
            return Err(err);
        }
        tracing::debug!(
            label = %entry.label(),
            redo_remaining = self.redo_stack.len(),
            "Redo"
        );
        let label = entry.label().to_string();
        self.undo_stack.push(entry);
        Ok(label)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Label of the entry that would be undone next.
    pub fn undo_label(&self) -> Option<&str> {
        self.undo_stack.last().map(HistoryEntry::label)
    }

    /// Label of the entry that would be redone next.
    pub fn redo_label(&self) -> Option<&str> {
        self.redo_stack.last().map(HistoryEntry::label)
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Clear all history (undo and redo stacks).
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        tracing::debug!("History cleared");
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Set the maximum number of undo entries. Trims the oldest entries if needed.
    pub fn set_max_entries(&mut self, max: usize) {
        self.max_entries = max;
        while self.undo_stack.len() > self.max_entries {
            self.undo_stack.remove(0);
        }
    }
}

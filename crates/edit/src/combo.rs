//! Batches of primitive commands forming one undoable gesture.

use cn_common::EditResult;
use cn_timeline::Sequence;
use serde::{Deserialize, Serialize};

use crate::commands::Command;

/// An ordered list of commands plus a list of "post" commands.
///
/// Post commands run after the primary ones on both redo and undo. They hold
/// state that only makes sense once the primaries are in place, such as the
/// selection after a delete.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ComboAction {
    label: String,
    commands: Vec<Command>,
    post_commands: Vec<Command>,
}

impl ComboAction {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            commands: Vec::new(),
            post_commands: Vec::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn append(&mut self, command: impl Into<Command>) {
        self.commands.push(command.into());
    }

    pub fn append_post(&mut self, command: impl Into<Command>) {
        self.post_commands.push(command.into());
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty() && self.post_commands.is_empty()
    }

    /// Total number of commands, post commands included.
    pub fn len(&self) -> usize {
        self.commands.len() + self.post_commands.len()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn post_commands(&self) -> &[Command] {
        &self.post_commands
    }

    /// Apply primaries in order, then post commands in order.
    ///
    /// If a command fails, everything this call applied is undone again and
    /// the error is returned.
    pub fn redo(&mut self, seq: &mut Sequence) -> EditResult<()> {
        let primaries = self.commands.len();
        for i in 0..self.len() {
            let result = if i < primaries {
                self.commands[i].redo(seq)
            } else {
                self.post_commands[i - primaries].redo(seq)
            };
            if let Err(err) = result {
                tracing::warn!(label = %self.label, error = %err, "Combo redo failed, rolling back");
                for j in (0..i).rev() {
                    let undo = if j < primaries {
                        self.commands[j].undo(seq)
                    } else {
                        self.post_commands[j - primaries].undo(seq)
                    };
                    if let Err(undo_err) = undo {
                        tracing::error!(label = %self.label, error = %undo_err, "Rollback failed");
                    }
                }
                return Err(err);
            }
        }
        Ok(())
    }

    /// Undo primaries in reverse, then post commands in reverse.
    pub fn undo(&mut self, seq: &mut Sequence) -> EditResult<()> {
        for command in self.commands.iter_mut().rev() {
            command.undo(seq)?;
        }
        for command in self.post_commands.iter_mut().rev() {
            command.undo(seq)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{DeleteClip, MoveClip, SetSelections};
    use cn_common::{ClipId, Rational, Resolution};
    use cn_timeline::{Clip, Placement, Selection};

    fn make_sequence() -> (Sequence, ClipId) {
        let mut seq = Sequence::new("Test", Rational::FPS_30, Resolution::HD);
        let id = seq.push_clip(Clip::new("a", Placement::new(0, 0, 10)));
        (seq, id)
    }

    #[test]
    fn redo_then_undo_restores() {
        let (mut seq, id) = make_sequence();
        let before = seq.clone();

        let mut combo = ComboAction::new("Move");
        combo.append(MoveClip::shift(id, 10));
        combo.append(MoveClip::shift(id, 5));
        combo.append_post(SetSelections::new(vec![Selection::new(0, 15, 25)]));
        assert_eq!(combo.len(), 3);

        combo.redo(&mut seq).unwrap();
        assert_eq!(seq.clip(id).unwrap().timeline_in(), 15);
        assert_eq!(seq.selections.len(), 1);

        combo.undo(&mut seq).unwrap();
        assert_eq!(seq, before);
    }

    #[test]
    fn failed_redo_rolls_back() {
        let (mut seq, id) = make_sequence();
        let before = seq.clone();

        let mut combo = ComboAction::new("Broken");
        combo.append(MoveClip::shift(id, 10));
        combo.append(DeleteClip::new(ClipId(7)));
        assert!(combo.redo(&mut seq).is_err());
        assert_eq!(seq, before);
    }

    #[test]
    fn empty_combo() {
        let combo = ComboAction::new("Nothing");
        assert!(combo.is_empty());
        assert_eq!(combo.label(), "Nothing");
    }
}

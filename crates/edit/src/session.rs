//! Edit sessions: a sequence, its history and the gestures that change it.
//!
//! Every gesture opens an [`Edit`], lets an algorithm append commands to it
//! and commits it as one history entry. Commands take effect as soon as they
//! are appended, so later steps of an algorithm see what earlier steps did.
//! An `Edit` that is dropped without being committed is rolled back.

use crossbeam::channel::{unbounded, Receiver, Sender};

use cn_common::{
    ClipId, EditError, EditResult, EditorConfig, Frame, Track, TransitionId, TransitionSide,
};
use cn_timeline::{clean_up_selections, DetachedClip, Marker, Selection, Sequence, TransitionKind, Workarea};

use crate::clipboard::Clipboard;
use crate::combo::ComboAction;
use crate::commands::{
    AddClips, AddMarker, AddTransition, ClipFlag, Command, DeleteMarkers, MoveMarker, RenameClips,
    SetClipFlag, SetSelections, SetWorkarea,
};
use crate::history::History;
use crate::trim::TrimEdge;
use crate::{clipboard, delete, links, ripple, speed, split, transitions, trim};

/// Notification sent to subscribers after the history changes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditEvent {
    Committed { label: String },
    Undone { label: String },
    Redone { label: String },
}

/// A sequence being edited, with undo history and clipboard.
pub struct EditSession {
    sequence: Sequence,
    history: History,
    config: EditorConfig,
    clipboard: Clipboard,
    subscribers: Vec<Sender<EditEvent>>,
}

impl EditSession {
    pub fn new(sequence: Sequence, config: EditorConfig) -> Self {
        tracing::info!(
            sequence = %sequence.name,
            clips = sequence.clip_count(),
            history_limit = config.history_limit,
            "Edit session opened"
        );
        Self {
            history: History::new(config.history_limit),
            clipboard: Clipboard::new(sequence.frame_rate),
            sequence,
            config,
            subscribers: Vec::new(),
        }
    }

    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub fn into_sequence(self) -> Sequence {
        self.sequence
    }

    /// Receive an [`EditEvent`] after every commit, undo and redo.
    pub fn subscribe(&mut self) -> Receiver<EditEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    fn notify(&mut self, event: EditEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Start a transaction labelled `label`.
    pub fn begin_edit(&mut self, label: impl Into<String>) -> Edit<'_> {
        let playhead = self.sequence.playhead;
        Edit {
            session: self,
            combo: Some(ComboAction::new(label)),
            split_cache: Vec::new(),
            playhead,
        }
    }

    /// Apply a combo built outside a transaction and record it.
    pub fn push(&mut self, combo: ComboAction) -> EditResult<bool> {
        let label = combo.label().to_string();
        let pushed = self.history.push(&mut self.sequence, combo)?;
        if pushed {
            self.notify(EditEvent::Committed { label });
        }
        Ok(pushed)
    }

    pub fn undo(&mut self) -> EditResult<()> {
        let label = self.history.undo(&mut self.sequence)?;
        self.notify(EditEvent::Undone { label });
        Ok(())
    }

    pub fn redo(&mut self) -> EditResult<()> {
        let label = self.history.redo(&mut self.sequence)?;
        self.notify(EditEvent::Redone { label });
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Move the playhead. Not recorded in history.
    pub fn set_playhead(&mut self, frame: Frame) {
        self.sequence.playhead = frame.max(0);
    }

    // ── Selection ────────────────────────────────────────────────

    /// Replace the selection with the cleaned-up `selections`.
    pub fn select(&mut self, mut selections: Vec<Selection>) -> EditResult<bool> {
        clean_up_selections(&mut selections);
        if selections == self.sequence.selections {
            return Ok(false);
        }
        let mut edit = self.begin_edit("Select");
        edit.append(SetSelections::new(selections))?;
        Ok(edit.commit())
    }

    /// Remove `[timeline_in, timeline_out)` on `track` from the selection.
    pub fn deselect_area(&mut self, track: Track, timeline_in: Frame, timeline_out: Frame) -> EditResult<bool> {
        let mut selections = self.sequence.selections.clone();
        cn_timeline::deselect_area(&mut selections, track, timeline_in, timeline_out);
        self.select(selections)
    }

    // ── Clips ────────────────────────────────────────────────────

    /// Add clips to the sequence. Returns the new ids.
    pub fn add_clips(&mut self, drafts: Vec<DetachedClip>) -> EditResult<Vec<ClipId>> {
        if drafts.is_empty() {
            return Ok(Vec::new());
        }
        let mut edit = self.begin_edit("Add clips");
        let ids = edit.add_clips(drafts)?;
        edit.commit();
        Ok(ids)
    }

    pub fn move_clips(&mut self, ids: &[ClipId], frame_delta: Frame, track_delta: Track) -> EditResult<bool> {
        let mut edit = self.begin_edit("Move clips");
        trim::move_clips(&mut edit, ids, frame_delta, track_delta)?;
        Ok(edit.commit())
    }

    /// Split `ids` at `frame`, following links when configured to.
    pub fn split(&mut self, ids: &[ClipId], frame: Frame) -> EditResult<bool> {
        let relink = self.config.split_linked_clips;
        let mut edit = self.begin_edit("Split");
        for id in ids {
            split::split_clip_and_relink(&mut edit, *id, frame, relink)?;
        }
        Ok(edit.commit())
    }

    /// Split the selected clips under the playhead, or every clip under it
    /// when nothing is selected.
    pub fn split_at_playhead(&mut self) -> EditResult<bool> {
        let playhead = self.sequence.playhead;
        let ids: Vec<ClipId> = if self.sequence.selections.is_empty() {
            self.sequence.clips_spanning(playhead)
        } else {
            self.sequence
                .selected_clips(false)
                .into_iter()
                .filter(|id| self.sequence.clip(*id).is_some_and(|c| c.spans(playhead)))
                .collect()
        };
        self.split(&ids, playhead)
    }

    /// Delete the selected areas, closing the gap when `ripple` is set.
    pub fn delete_selection(&mut self, ripple: bool) -> EditResult<bool> {
        let areas = self.sequence.selections.clone();
        self.delete_areas(&areas, ripple)
    }

    pub fn delete_areas(&mut self, areas: &[Selection], ripple: bool) -> EditResult<bool> {
        if areas.is_empty() {
            tracing::debug!("Delete skipped: no areas");
            return Ok(false);
        }
        let mut edit = self.begin_edit(if ripple { "Ripple delete" } else { "Delete" });
        if ripple {
            ripple::ripple_delete(&mut edit, areas)?;
        } else {
            delete::delete_areas(&mut edit, areas, &[], true)?;
        }
        Ok(edit.commit())
    }

    /// Shift every clip starting at or after `point` by `length`.
    pub fn ripple(&mut self, point: Frame, length: Frame) -> EditResult<bool> {
        let mut edit = self.begin_edit("Ripple");
        ripple::ripple(&mut edit, point, length, &[])?;
        Ok(edit.commit())
    }

    pub fn trim(&mut self, clip: ClipId, edge: TrimEdge, delta: Frame, ripple: bool) -> EditResult<bool> {
        let mut edit = self.begin_edit(if ripple { "Ripple trim" } else { "Trim" });
        trim::trim(&mut edit, clip, edge, delta, ripple)?;
        Ok(edit.commit())
    }

    pub fn slip(&mut self, clip: ClipId, delta: Frame) -> EditResult<bool> {
        let mut edit = self.begin_edit("Slip");
        trim::slip(&mut edit, clip, delta)?;
        Ok(edit.commit())
    }

    pub fn slide(&mut self, clip: ClipId, delta: Frame) -> EditResult<bool> {
        let mut edit = self.begin_edit("Slide");
        trim::slide(&mut edit, clip, delta)?;
        Ok(edit.commit())
    }

    pub fn set_speed(&mut self, ids: &[ClipId], speed: f64, ripple: bool) -> EditResult<bool> {
        let mut edit = self.begin_edit("Change speed");
        speed::set_speed(&mut edit, ids, speed, ripple)?;
        Ok(edit.commit())
    }

    /// Flip `flag` on each clip.
    pub fn toggle_flag(&mut self, ids: &[ClipId], flag: ClipFlag) -> EditResult<bool> {
        if ids.is_empty() {
            return Ok(false);
        }
        let changes = ids
            .iter()
            .map(|id| self.sequence.require_clip(*id).map(|c| (*id, !flag.get(c))))
            .collect::<EditResult<Vec<_>>>()?;
        let mut edit = self.begin_edit("Toggle clip flag");
        edit.append(SetClipFlag::new(flag, changes))?;
        Ok(edit.commit())
    }

    pub fn rename_clips(&mut self, ids: &[ClipId], name: &str) -> EditResult<bool> {
        if ids.is_empty() {
            return Ok(false);
        }
        let changes = ids.iter().map(|id| (*id, name.to_string())).collect();
        let mut edit = self.begin_edit("Rename clips");
        edit.append(RenameClips::new(changes))?;
        Ok(edit.commit())
    }

    // ── Links ────────────────────────────────────────────────────

    pub fn toggle_links(&mut self, ids: &[ClipId]) -> EditResult<bool> {
        let mut edit = self.begin_edit("Toggle links");
        links::toggle_links(&mut edit, ids)?;
        Ok(edit.commit())
    }

    pub fn link(&mut self, ids: &[ClipId]) -> EditResult<bool> {
        let mut edit = self.begin_edit("Link");
        links::link_clips(&mut edit, ids)?;
        Ok(edit.commit())
    }

    pub fn unlink(&mut self, ids: &[ClipId]) -> EditResult<bool> {
        let mut edit = self.begin_edit("Unlink");
        links::unlink_clips(&mut edit, ids)?;
        Ok(edit.commit())
    }

    // ── Transitions ──────────────────────────────────────────────

    pub fn add_transition(
        &mut self,
        clip: ClipId,
        side: TransitionSide,
        kind: TransitionKind,
        length: Frame,
    ) -> EditResult<TransitionId> {
        let mut edit = self.begin_edit("Add transition");
        let id = transitions::add_transition(&mut edit, clip, side, kind, length)?;
        edit.commit();
        Ok(id)
    }

    /// Add a transition shared by `clip` and the adjacent `partner`.
    pub fn add_dual_transition(
        &mut self,
        clip: ClipId,
        partner: ClipId,
        side: TransitionSide,
        kind: TransitionKind,
        length: Frame,
    ) -> EditResult<TransitionId> {
        let mut edit = self.begin_edit("Add transition");
        let id = transitions::add_dual_transition(&mut edit, clip, partner, side, kind, length)?;
        edit.commit();
        Ok(id)
    }

    pub fn add_default_transitions(&mut self, ids: &[ClipId]) -> EditResult<bool> {
        let mut edit = self.begin_edit("Add default transitions");
        transitions::add_default_transitions(&mut edit, ids)?;
        Ok(edit.commit())
    }

    pub fn resize_transition(&mut self, transition: TransitionId, length: Frame) -> EditResult<bool> {
        let mut edit = self.begin_edit("Resize transition");
        transitions::resize_transition(&mut edit, transition, length)?;
        Ok(edit.commit())
    }

    pub fn delete_transition(&mut self, transition: TransitionId) -> EditResult<bool> {
        let mut edit = self.begin_edit("Delete transition");
        transitions::delete_transition(&mut edit, transition)?;
        Ok(edit.commit())
    }

    // ── Markers and workarea ─────────────────────────────────────

    pub fn add_marker(&mut self, frame: Frame, name: &str) -> EditResult<bool> {
        let mut edit = self.begin_edit("Add marker");
        edit.append(AddMarker::new(Marker {
            frame: frame.max(0),
            name: name.to_string(),
            color: [255, 255, 255],
        }))?;
        Ok(edit.commit())
    }

    pub fn move_marker(&mut self, index: usize, frame: Frame) -> EditResult<bool> {
        let mut edit = self.begin_edit("Move marker");
        edit.append(MoveMarker::new(index, frame))?;
        Ok(edit.commit())
    }

    pub fn delete_markers(&mut self, indices: &[usize]) -> EditResult<bool> {
        if indices.is_empty() {
            return Ok(false);
        }
        let mut edit = self.begin_edit("Delete markers");
        edit.append(DeleteMarkers::new(indices.to_vec()))?;
        Ok(edit.commit())
    }

    pub fn set_workarea(&mut self, workarea: Workarea) -> EditResult<bool> {
        if workarea == self.sequence.workarea {
            return Ok(false);
        }
        let mut edit = self.begin_edit("Set workarea");
        edit.append(SetWorkarea::new(workarea))?;
        Ok(edit.commit())
    }

    // ── Clipboard ────────────────────────────────────────────────

    /// Copy the clips entirely inside the selection. Returns how many.
    pub fn copy(&mut self) -> usize {
        self.clipboard = Clipboard::copy(&self.sequence);
        self.clipboard.len()
    }

    /// Copy, then delete the selection.
    pub fn cut(&mut self) -> EditResult<bool> {
        if self.copy() == 0 {
            return Ok(false);
        }
        let areas = self.sequence.selections.clone();
        let mut edit = self.begin_edit("Cut");
        delete::delete_areas(&mut edit, &areas, &[], true)?;
        Ok(edit.commit())
    }

    /// Paste the clipboard at the playhead. Returns the new clip ids.
    pub fn paste(&mut self, insert: bool) -> EditResult<Vec<ClipId>> {
        let clipboard = self.clipboard.clone();
        let mut edit = self.begin_edit(if insert { "Insert" } else { "Paste" });
        let ids = clipboard::paste(&mut edit, &clipboard, insert)?;
        edit.commit();
        Ok(ids)
    }
}

/// An open transaction on an [`EditSession`].
pub struct Edit<'a> {
    session: &'a mut EditSession,
    combo: Option<ComboAction>,
    /// `(original, right half)` for every split done in this transaction.
    split_cache: Vec<(ClipId, ClipId)>,
    playhead: Frame,
}

impl Edit<'_> {
    pub fn sequence(&self) -> &Sequence {
        &self.session.sequence
    }

    pub fn config(&self) -> &EditorConfig {
        &self.session.config
    }

    pub fn label(&self) -> &str {
        self.combo.as_ref().map_or("", ComboAction::label)
    }

    /// Number of commands appended so far.
    pub fn len(&self) -> usize {
        self.combo.as_ref().map_or(0, ComboAction::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply `command` and add it to the transaction.
    pub fn append(&mut self, command: impl Into<Command>) -> EditResult<()> {
        let mut command = command.into();
        command.redo(&mut self.session.sequence)?;
        if let Some(combo) = self.combo.as_mut() {
            combo.append(command);
        }
        Ok(())
    }

    /// Apply `command` and add it as a post command.
    pub fn append_post(&mut self, command: impl Into<Command>) -> EditResult<()> {
        let mut command = command.into();
        command.redo(&mut self.session.sequence)?;
        if let Some(combo) = self.combo.as_mut() {
            combo.append_post(command);
        }
        Ok(())
    }

    /// Add clips and return their ids.
    pub fn add_clips(&mut self, drafts: Vec<DetachedClip>) -> EditResult<Vec<ClipId>> {
        let mut command = AddClips::new(drafts);
        command.redo(&mut self.session.sequence)?;
        let ids = command.clip_ids();
        if let Some(combo) = self.combo.as_mut() {
            combo.append(command);
        }
        Ok(ids)
    }

    pub fn add_clip(&mut self, draft: DetachedClip) -> EditResult<ClipId> {
        self.add_clips(vec![draft])?
            .pop()
            .ok_or_else(|| EditError::InvalidSequence {
                reason: "clip was not added".to_string(),
            })
    }

    /// Attach a transition and return its id.
    pub fn add_transition(&mut self, mut command: AddTransition) -> EditResult<TransitionId> {
        command.redo(&mut self.session.sequence)?;
        let id = command
            .transition_id()
            .ok_or(EditError::InvalidTransitionLength {
                length: command.length(),
            })?;
        if let Some(combo) = self.combo.as_mut() {
            combo.append(command);
        }
        Ok(id)
    }

    /// Move the playhead. Not recorded in history, but restored on rollback.
    pub fn seek(&mut self, frame: Frame) {
        self.session.sequence.playhead = frame.max(0);
    }

    pub(crate) fn record_split(&mut self, original: ClipId, post: ClipId) {
        self.split_cache.push((original, post));
    }

    pub(crate) fn split_cache(&self) -> &[(ClipId, ClipId)] {
        &self.split_cache
    }

    pub fn was_split(&self, clip: ClipId) -> bool {
        self.split_cache.iter().any(|(pre, _)| *pre == clip)
    }

    /// Right half of the first split of `clip` in this transaction.
    pub fn post_of(&self, clip: ClipId) -> EditResult<ClipId> {
        self.split_cache
            .iter()
            .find(|(pre, _)| *pre == clip)
            .map(|(_, post)| *post)
            .ok_or(EditError::NotSplit(clip))
    }

    /// Record the transaction. Returns `false` (and records nothing) when no
    /// command was appended.
    pub fn commit(mut self) -> bool {
        let Some(combo) = self.combo.take() else {
            return false;
        };
        if combo.is_empty() {
            tracing::debug!(label = %combo.label(), "Nothing to commit");
            return false;
        }
        let label = combo.label().to_string();
        tracing::debug!(label = %label, commands = combo.len(), "Edit committed");
        self.session.history.record(combo);
        self.session.notify(EditEvent::Committed { label });
        true
    }

    /// Undo everything appended so far and discard the transaction.
    pub fn rollback(mut self) -> EditResult<()> {
        self.undo_all()
    }

    fn undo_all(&mut self) -> EditResult<()> {
        let Some(mut combo) = self.combo.take() else {
            return Ok(());
        };
        self.session.sequence.playhead = self.playhead;
        if combo.is_empty() {
            return Ok(());
        }
        tracing::debug!(label = %combo.label(), commands = combo.len(), "Edit rolled back");
        combo.undo(&mut self.session.sequence)
    }
}

impl Drop for Edit<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.undo_all() {
            tracing::warn!(error = %err, "Rollback of abandoned edit failed");
        }
    }
}

//! Primitive commands that change clips.

use cn_common::{
    is_video_track, ClipId, EditError, EditResult, Frame, Track, TransitionId, TransitionSide,
};
use cn_timeline::{Clip, DetachedClip, Effect, Placement, Sequence, Transition};
use serde::{Deserialize, Serialize};

use super::transition::{detach, reattach};

// ── MoveClip ─────────────────────────────────────────────────────

/// Where a [`MoveClip`] puts the clip.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum MoveTarget {
    /// Absolute placement.
    To {
        timeline_in: Frame,
        timeline_out: Frame,
        clip_in: Frame,
        track: Track,
    },
    /// Offsets added to the current placement.
    By {
        timeline_in: Frame,
        timeline_out: Frame,
        clip_in: Frame,
        track: Track,
    },
}

/// A dual transition split apart because a move broke its adjacency.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct Detach {
    /// The original transition. Stays with its parent.
    transition: TransitionId,
    /// The former secondary clip, which receives a copy.
    holder: ClipId,
    side: TransitionSide,
    /// Id of the copy given to `holder`.
    copy: TransitionId,
}

/// Move a clip's in/out/clip_in/track.
///
/// With `verify_transitions`, a dual transition whose two clips are no longer
/// touching after the move is split into two single-clip transitions: the
/// parent keeps the original and the secondary clip gets a copy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoveClip {
    clip: ClipId,
    target: MoveTarget,
    verify_transitions: bool,
    old: Option<Placement>,
    detached: Vec<Detach>,
    applied: bool,
}

impl MoveClip {
    pub fn to(clip: ClipId, timeline_in: Frame, timeline_out: Frame, clip_in: Frame, track: Track) -> Self {
        Self::new(
            clip,
            MoveTarget::To {
                timeline_in,
                timeline_out,
                clip_in,
                track,
            },
        )
    }

    pub fn by(clip: ClipId, timeline_in: Frame, timeline_out: Frame, clip_in: Frame, track: Track) -> Self {
        Self::new(
            clip,
            MoveTarget::By {
                timeline_in,
                timeline_out,
                clip_in,
                track,
            },
        )
    }

    /// Shift a clip along its track without changing its length or media offset.
    pub fn shift(clip: ClipId, frames: Frame) -> Self {
        Self::by(clip, frames, frames, 0, 0)
    }

    fn new(clip: ClipId, target: MoveTarget) -> Self {
        Self {
            clip,
            target,
            verify_transitions: true,
            old: None,
            detached: Vec::new(),
            applied: false,
        }
    }

    pub fn verify(mut self, verify_transitions: bool) -> Self {
        self.verify_transitions = verify_transitions;
        self
    }

    pub fn clip(&self) -> ClipId {
        self.clip
    }

    fn resolve(&self, old: &Placement) -> Placement {
        let mut new = *old;
        match self.target {
            MoveTarget::To {
                timeline_in,
                timeline_out,
                clip_in,
                track,
            } => {
                new.timeline_in = timeline_in;
                new.timeline_out = timeline_out;
                new.clip_in = clip_in;
                new.track = track;
            }
            MoveTarget::By {
                timeline_in,
                timeline_out,
                clip_in,
                track,
            } => {
                new.timeline_in += timeline_in;
                new.timeline_out += timeline_out;
                new.clip_in += clip_in;
                new.track += track;
            }
        }
        if new.clip_in < 0 {
            tracing::debug!(clip = %self.clip, clip_in = new.clip_in, "Clamping clip_in to 0");
            new.clip_in = 0;
        }
        new
    }

    /// Dual transitions on `clip` that `new` would pull apart.
    fn broken_duals(seq: &Sequence, id: ClipId, new: &Placement) -> Vec<(TransitionId, ClipId, TransitionSide)> {
        let mut broken = Vec::new();
        for side in TransitionSide::BOTH {
            let Some((tid, t)) = seq.clip_transition(id, side) else {
                continue;
            };
            let (Some(other_id), Some(secondary)) = (t.other_clip(id), t.secondary) else {
                continue;
            };
            let Some(other) = seq.clip(other_id) else {
                continue;
            };
            let adjacent = other.track() == new.track
                && match side {
                    TransitionSide::Opening => other.timeline_out() == new.timeline_in,
                    TransitionSide::Closing => new.timeline_out == other.timeline_in(),
                };
            if adjacent {
                continue;
            }
            let holder_side = if secondary == id {
                Some(side)
            } else {
                seq.clip(secondary).and_then(|c| c.side_of(tid))
            };
            if let Some(holder_side) = holder_side {
                broken.push((tid, secondary, holder_side));
            }
        }
        broken
    }

    pub fn redo(&mut self, seq: &mut Sequence) -> EditResult<()> {
        if self.applied {
            return Ok(());
        }
        let clip = seq.require_clip(self.clip)?;
        let old = clip.placement();
        let new = self.resolve(&old);

        if new.timeline_in >= new.timeline_out || new.timeline_in < 0 {
            return Err(EditError::InvalidRange {
                clip: self.clip,
                timeline_in: new.timeline_in,
                timeline_out: new.timeline_out,
            });
        }
        if is_video_track(new.track) != is_video_track(old.track) {
            return Err(EditError::TrackHalfChanged {
                clip: self.clip,
                from: old.track,
                to: new.track,
            });
        }
        if !clip.fits_media(new.clip_in, new.length()) {
            return Err(EditError::ExceedsMediaLength {
                clip: self.clip,
                needed: new.clip_in + new.length(),
                available: clip.max_length.unwrap_or(Frame::MAX),
            });
        }

        let first_run = self.old.is_none();
        let broken = if first_run && self.verify_transitions {
            Self::broken_duals(seq, self.clip, &new)
        } else {
            Vec::new()
        };

        seq.require_clip_mut(self.clip)?.set_placement(new);
        self.old = Some(old);

        if first_run {
            for (transition, holder, side) in broken {
                let copy = detach(seq, transition, holder, side, None)?;
                self.detached.push(Detach {
                    transition,
                    holder,
                    side,
                    copy,
                });
            }
        } else {
            for d in &self.detached {
                detach(seq, d.transition, d.holder, d.side, Some(d.copy))?;
            }
        }

        self.applied = true;
        Ok(())
    }

    pub fn undo(&mut self, seq: &mut Sequence) -> EditResult<()> {
        if !self.applied {
            return Ok(());
        }
        for d in self.detached.iter().rev() {
            reattach(seq, d.transition, d.holder, d.side, d.copy)?;
        }
        if let Some(old) = self.old {
            seq.require_clip_mut(self.clip)?.set_placement(old);
        }
        self.applied = false;
        Ok(())
    }
}

// ── DeleteClip ───────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct RemovedClip {
    clip: Clip,
    /// Transitions removed with the clip.
    transitions: Vec<(TransitionId, Transition)>,
    /// Dual partners that lost their reference to one of those transitions.
    partner_refs: Vec<(ClipId, TransitionSide, TransitionId)>,
    /// Other clips whose link lists held this clip, with the position.
    link_refs: Vec<(ClipId, usize)>,
}

/// Remove a clip together with its transitions and every link pointing at it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeleteClip {
    clip: ClipId,
    removed: Option<RemovedClip>,
}

impl DeleteClip {
    pub fn new(clip: ClipId) -> Self {
        Self {
            clip,
            removed: None,
        }
    }

    pub fn clip(&self) -> ClipId {
        self.clip
    }

    pub fn redo(&mut self, seq: &mut Sequence) -> EditResult<()> {
        if self.removed.is_some() {
            return Ok(());
        }
        let id = self.clip;
        seq.require_clip(id)?;

        let mut transition_ids = Vec::new();
        let mut partner_refs = Vec::new();
        for side in TransitionSide::BOTH {
            let Some((tid, t)) = seq.clip_transition(id, side) else {
                continue;
            };
            if let Some(other) = t.other_clip(id) {
                if let Some(other_side) = seq.clip(other).and_then(|c| c.side_of(tid)) {
                    partner_refs.push((other, other_side, tid));
                }
            }
            transition_ids.push(tid);
        }

        let link_refs: Vec<(ClipId, usize)> = seq
            .clips()
            .filter(|(other, _)| *other != id)
            .filter_map(|(other, c)| c.linked.iter().position(|l| *l == id).map(|pos| (other, pos)))
            .collect();

        for (other, side, _) in &partner_refs {
            seq.require_clip_mut(*other)?.set_transition(*side, None);
        }
        let mut transitions = Vec::with_capacity(transition_ids.len());
        for tid in transition_ids {
            transitions.push((tid, seq.take_transition(tid)?));
        }
        for (other, pos) in &link_refs {
            seq.require_clip_mut(*other)?.linked.remove(*pos);
        }
        let clip = seq.take_clip(id)?;

        tracing::debug!(
            clip = %id,
            transitions = transitions.len(),
            links = link_refs.len(),
            "Clip deleted"
        );
        self.removed = Some(RemovedClip {
            clip,
            transitions,
            partner_refs,
            link_refs,
        });
        Ok(())
    }

    pub fn undo(&mut self, seq: &mut Sequence) -> EditResult<()> {
        let Some(removed) = self.removed.take() else {
            return Ok(());
        };
        seq.insert_clip(self.clip, removed.clip)?;
        for (other, pos) in removed.link_refs.iter().rev() {
            let linked = &mut seq.require_clip_mut(*other)?.linked;
            let pos = (*pos).min(linked.len());
            linked.insert(pos, self.clip);
        }
        for (tid, t) in removed.transitions.into_iter().rev() {
            seq.insert_transition(tid, t)?;
        }
        for (other, side, tid) in removed.partner_refs.iter().rev() {
            seq.require_clip_mut(*other)?.set_transition(*side, Some(*tid));
        }
        Ok(())
    }
}

// ── AddClips ─────────────────────────────────────────────────────

/// Ids given to one added clip and its transitions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AddedClip {
    pub clip: ClipId,
    pub opening: Option<TransitionId>,
    pub closing: Option<TransitionId>,
}

/// Add detached clips (and their single-clip transitions) to the sequence.
///
/// The first redo appends them; later redos put them back at the same ids.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AddClips {
    drafts: Vec<DetachedClip>,
    added: Vec<AddedClip>,
    applied: bool,
}

impl AddClips {
    pub fn new(drafts: Vec<DetachedClip>) -> Self {
        Self {
            drafts,
            added: Vec::new(),
            applied: false,
        }
    }

    /// Ids of the added clips, in draft order. Empty until first applied.
    pub fn clip_ids(&self) -> Vec<ClipId> {
        self.added.iter().map(|a| a.clip).collect()
    }

    pub fn added(&self) -> &[AddedClip] {
        &self.added
    }

    pub fn redo(&mut self, seq: &mut Sequence) -> EditResult<()> {
        if self.applied {
            return Ok(());
        }
        if self.added.is_empty() {
            for draft in &self.drafts {
                let mut clip = draft.clip.clone();
                clip.opening_transition = None;
                clip.closing_transition = None;
                let id = seq.push_clip(clip);
                let mut added = AddedClip {
                    clip: id,
                    opening: None,
                    closing: None,
                };
                for side in TransitionSide::BOTH {
                    if let Some(t) = draft.transition(side) {
                        let tid = seq.push_transition(Transition::new(t.kind.clone(), id, t.length));
                        seq.require_clip_mut(id)?.set_transition(side, Some(tid));
                        match side {
                            TransitionSide::Opening => added.opening = Some(tid),
                            TransitionSide::Closing => added.closing = Some(tid),
                        }
                    }
                }
                self.added.push(added);
            }
        } else {
            for added in &self.added {
                if seq.clip(added.clip).is_some() {
                    return Err(EditError::ClipSlotOccupied(added.clip));
                }
                for tid in [added.opening, added.closing].into_iter().flatten() {
                    if seq.transition(tid).is_some() {
                        return Err(EditError::TransitionSlotOccupied(tid));
                    }
                }
            }
            for (draft, added) in self.drafts.iter().zip(&self.added) {
                let mut clip = draft.clip.clone();
                clip.opening_transition = added.opening;
                clip.closing_transition = added.closing;
                seq.insert_clip(added.clip, clip)?;
                for (side, tid) in [
                    (TransitionSide::Opening, added.opening),
                    (TransitionSide::Closing, added.closing),
                ] {
                    if let (Some(tid), Some(t)) = (tid, draft.transition(side)) {
                        seq.insert_transition(tid, Transition::new(t.kind.clone(), added.clip, t.length))?;
                    }
                }
            }
        }
        tracing::debug!(count = self.added.len(), "Clips added");
        self.applied = true;
        Ok(())
    }

    pub fn undo(&mut self, seq: &mut Sequence) -> EditResult<()> {
        if !self.applied {
            return Ok(());
        }
        for added in self.added.iter().rev() {
            for tid in [added.closing, added.opening].into_iter().flatten() {
                seq.take_transition(tid)?;
            }
            seq.take_clip(added.clip)?;
        }
        self.applied = false;
        Ok(())
    }
}

// ── SetClipFlag ──────────────────────────────────────────────────

/// Boolean clip properties that can be toggled as an undoable edit.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClipFlag {
    Enabled,
    Reverse,
    MaintainAudioPitch,
    Autoscale,
}

impl ClipFlag {
    pub fn get(self, clip: &Clip) -> bool {
        match self {
            ClipFlag::Enabled => clip.enabled,
            ClipFlag::Reverse => clip.reverse,
            ClipFlag::MaintainAudioPitch => clip.maintain_audio_pitch,
            ClipFlag::Autoscale => clip.autoscale,
        }
    }

    pub fn set(self, clip: &mut Clip, value: bool) {
        match self {
            ClipFlag::Enabled => clip.enabled = value,
            ClipFlag::Reverse => clip.reverse = value,
            ClipFlag::MaintainAudioPitch => clip.maintain_audio_pitch = value,
            ClipFlag::Autoscale => clip.autoscale = value,
        }
    }
}

/// Set a boolean property on several clips, each to its own value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SetClipFlag {
    flag: ClipFlag,
    changes: Vec<(ClipId, bool)>,
    old: Vec<bool>,
    applied: bool,
}

impl SetClipFlag {
    pub fn new(flag: ClipFlag, changes: Vec<(ClipId, bool)>) -> Self {
        Self {
            flag,
            changes,
            old: Vec::new(),
            applied: false,
        }
    }

    pub fn redo(&mut self, seq: &mut Sequence) -> EditResult<()> {
        if self.applied {
            return Ok(());
        }
        let old = self
            .changes
            .iter()
            .map(|(id, _)| seq.require_clip(*id).map(|c| self.flag.get(c)))
            .collect::<EditResult<Vec<_>>>()?;
        for (id, value) in &self.changes {
            self.flag.set(seq.require_clip_mut(*id)?, *value);
        }
        self.old = old;
        self.applied = true;
        Ok(())
    }

    pub fn undo(&mut self, seq: &mut Sequence) -> EditResult<()> {
        if !self.applied {
            return Ok(());
        }
        for ((id, _), value) in self.changes.iter().zip(&self.old).rev() {
            self.flag.set(seq.require_clip_mut(*id)?, *value);
        }
        self.applied = false;
        Ok(())
    }
}

// ── RenameClips ──────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenameClips {
    changes: Vec<(ClipId, String)>,
    old: Vec<String>,
    applied: bool,
}

impl RenameClips {
    pub fn new(changes: Vec<(ClipId, String)>) -> Self {
        Self {
            changes,
            old: Vec::new(),
            applied: false,
        }
    }

    pub fn redo(&mut self, seq: &mut Sequence) -> EditResult<()> {
        if self.applied {
            return Ok(());
        }
        let old = self
            .changes
            .iter()
            .map(|(id, _)| seq.require_clip(*id).map(|c| c.name.clone()))
            .collect::<EditResult<Vec<_>>>()?;
        for (id, name) in &self.changes {
            seq.require_clip_mut(*id)?.name = name.clone();
        }
        self.old = old;
        self.applied = true;
        Ok(())
    }

    pub fn undo(&mut self, seq: &mut Sequence) -> EditResult<()> {
        if !self.applied {
            return Ok(());
        }
        for ((id, _), name) in self.changes.iter().zip(&self.old).rev() {
            seq.require_clip_mut(*id)?.name = name.clone();
        }
        self.applied = false;
        Ok(())
    }
}

// ── SetSpeed ─────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct SpeedState {
    speed: f64,
    effects: Vec<Effect>,
    max_length: Option<Frame>,
}

/// Change a clip's playback speed.
///
/// Keyframes are rescaled by `old / new` and the maximum length is
/// recalculated. The clip's timeline length is left to a following
/// [`MoveClip`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SetSpeed {
    clip: ClipId,
    speed: f64,
    old: Option<SpeedState>,
}

impl SetSpeed {
    pub fn new(clip: ClipId, speed: f64) -> Self {
        Self {
            clip,
            speed,
            old: None,
        }
    }

    pub fn redo(&mut self, seq: &mut Sequence) -> EditResult<()> {
        if self.old.is_some() {
            return Ok(());
        }
        if !(self.speed > 0.0 && self.speed.is_finite()) {
            return Err(EditError::InvalidSpeed { speed: self.speed });
        }
        let rate = seq.frame_rate;
        let clip = seq.require_clip_mut(self.clip)?;
        let old = SpeedState {
            speed: clip.speed(),
            effects: clip.effects.clone(),
            max_length: clip.max_length,
        };
        let multiplier = old.speed / self.speed;
        for effect in &mut clip.effects {
            effect.refactor_keyframes(multiplier);
        }
        let speed = self.speed;
        clip.placement.update(|p| p.speed = speed);
        clip.recalculate_max_length(rate);
        tracing::debug!(clip = %self.clip, from = old.speed, to = speed, "Speed changed");
        self.old = Some(old);
        Ok(())
    }

    pub fn undo(&mut self, seq: &mut Sequence) -> EditResult<()> {
        let Some(old) = self.old.take() else {
            return Ok(());
        };
        let clip = seq.require_clip_mut(self.clip)?;
        clip.placement.update(|p| p.speed = old.speed);
        clip.effects = old.effects;
        clip.max_length = old.max_length;
        Ok(())
    }
}

// ── SetLinks / LinkClips ─────────────────────────────────────────

/// Replace the link lists of several clips.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SetLinks {
    changes: Vec<(ClipId, Vec<ClipId>)>,
    old: Vec<Vec<ClipId>>,
    applied: bool,
}

impl SetLinks {
    pub fn new(changes: Vec<(ClipId, Vec<ClipId>)>) -> Self {
        Self {
            changes,
            old: Vec::new(),
            applied: false,
        }
    }

    pub fn redo(&mut self, seq: &mut Sequence) -> EditResult<()> {
        if self.applied {
            return Ok(());
        }
        let old = self
            .changes
            .iter()
            .map(|(id, _)| seq.require_clip(*id).map(|c| c.linked.clone()))
            .collect::<EditResult<Vec<_>>>()?;
        for (id, links) in &self.changes {
            seq.require_clip_mut(*id)?.linked = links.clone();
        }
        self.old = old;
        self.applied = true;
        Ok(())
    }

    pub fn undo(&mut self, seq: &mut Sequence) -> EditResult<()> {
        if !self.applied {
            return Ok(());
        }
        for ((id, _), links) in self.changes.iter().zip(&self.old).rev() {
            seq.require_clip_mut(*id)?.linked = links.clone();
        }
        self.applied = false;
        Ok(())
    }
}

/// Link a group of clips to each other (full mesh), or clear their links.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinkClips {
    clips: Vec<ClipId>,
    link: bool,
    old: Vec<Vec<ClipId>>,
    applied: bool,
}

impl LinkClips {
    pub fn link(clips: Vec<ClipId>) -> Self {
        Self::new(clips, true)
    }

    pub fn unlink(clips: Vec<ClipId>) -> Self {
        Self::new(clips, false)
    }

    fn new(clips: Vec<ClipId>, link: bool) -> Self {
        Self {
            clips,
            link,
            old: Vec::new(),
            applied: false,
        }
    }

    pub fn redo(&mut self, seq: &mut Sequence) -> EditResult<()> {
        if self.applied {
            return Ok(());
        }
        let old = self
            .clips
            .iter()
            .map(|id| seq.require_clip(*id).map(|c| c.linked.clone()))
            .collect::<EditResult<Vec<_>>>()?;
        for id in &self.clips {
            let clip = seq.require_clip_mut(*id)?;
            if self.link {
                for other in self.clips.iter().filter(|o| *o != id) {
                    clip.link(*other);
                }
            } else {
                clip.linked.clear();
            }
        }
        self.old = old;
        self.applied = true;
        Ok(())
    }

    pub fn undo(&mut self, seq: &mut Sequence) -> EditResult<()> {
        if !self.applied {
            return Ok(());
        }
        for (id, links) in self.clips.iter().zip(&self.old).rev() {
            seq.require_clip_mut(*id)?.linked = links.clone();
        }
        self.applied = false;
        Ok(())
    }
}

//! Primitive commands that change transitions.

use cn_common::{ClipId, EditError, EditResult, Frame, TransitionId, TransitionSide};
use cn_timeline::{Sequence, Transition, TransitionKind};
use serde::{Deserialize, Serialize};

/// Attach a new transition to `clip` on `side`.
///
/// With a `secondary`, the transition is dual: the secondary clip must sit
/// directly against `clip` on the same track and holds the transition on the
/// opposite side.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AddTransition {
    clip: ClipId,
    secondary: Option<ClipId>,
    side: TransitionSide,
    kind: TransitionKind,
    length: Frame,
    id: Option<TransitionId>,
    applied: bool,
}

impl AddTransition {
    pub fn new(clip: ClipId, side: TransitionSide, kind: TransitionKind, length: Frame) -> Self {
        Self {
            clip,
            secondary: None,
            side,
            kind,
            length,
            id: None,
            applied: false,
        }
    }

    pub fn dual(
        clip: ClipId,
        secondary: ClipId,
        side: TransitionSide,
        kind: TransitionKind,
        length: Frame,
    ) -> Self {
        Self {
            secondary: Some(secondary),
            ..Self::new(clip, side, kind, length)
        }
    }

    pub fn clip(&self) -> ClipId {
        self.clip
    }

    pub fn secondary(&self) -> Option<ClipId> {
        self.secondary
    }

    pub fn side(&self) -> TransitionSide {
        self.side
    }

    pub fn length(&self) -> Frame {
        self.length
    }

    pub fn set_length(&mut self, length: Frame) {
        self.length = length;
    }

    /// Id of the created transition. `None` until first applied.
    pub fn transition_id(&self) -> Option<TransitionId> {
        self.id
    }

    fn validate(&self, seq: &Sequence) -> EditResult<()> {
        let clip = seq.require_clip(self.clip)?;
        if clip.transition(self.side).is_some() {
            return Err(EditError::SideOccupied {
                clip: self.clip,
                side: self.side,
            });
        }
        if self.length <= 0 || self.length > clip.length() {
            return Err(EditError::InvalidTransitionLength {
                length: self.length,
            });
        }
        let Some(secondary_id) = self.secondary else {
            return Ok(());
        };
        let secondary = seq.require_clip(secondary_id)?;
        let other_side = self.side.opposite();
        if secondary.transition(other_side).is_some() {
            return Err(EditError::SideOccupied {
                clip: secondary_id,
                side: other_side,
            });
        }
        let (pre, post) = match self.side {
            TransitionSide::Opening => (secondary_id, self.clip),
            TransitionSide::Closing => (self.clip, secondary_id),
        };
        let adjacent = secondary.track() == clip.track()
            && match self.side {
                TransitionSide::Opening => secondary.timeline_out() == clip.timeline_in(),
                TransitionSide::Closing => clip.timeline_out() == secondary.timeline_in(),
            };
        if !adjacent {
            return Err(EditError::NotAdjacent { pre, post });
        }
        if self.length > secondary.length() {
            return Err(EditError::InvalidTransitionLength {
                length: self.length,
            });
        }
        Ok(())
    }

    pub fn redo(&mut self, seq: &mut Sequence) -> EditResult<()> {
        if self.applied {
            return Ok(());
        }
        self.validate(seq)?;
        let transition = Transition {
            kind: self.kind.clone(),
            length: self.length,
            parent: self.clip,
            secondary: self.secondary,
        };
        let id = match self.id {
            Some(id) => {
                seq.insert_transition(id, transition)?;
                id
            }
            None => seq.push_transition(transition),
        };
        seq.require_clip_mut(self.clip)?
            .set_transition(self.side, Some(id));
        if let Some(secondary) = self.secondary {
            seq.require_clip_mut(secondary)?
                .set_transition(self.side.opposite(), Some(id));
        }
        tracing::debug!(
            transition = %id,
            clip = %self.clip,
            side = %self.side,
            length = self.length,
            dual = self.secondary.is_some(),
            "Transition added"
        );
        self.id = Some(id);
        self.applied = true;
        Ok(())
    }

    pub fn undo(&mut self, seq: &mut Sequence) -> EditResult<()> {
        if !self.applied {
            return Ok(());
        }
        let Some(id) = self.id else {
            return Ok(());
        };
        if let Some(secondary) = self.secondary {
            seq.require_clip_mut(secondary)?
                .set_transition(self.side.opposite(), None);
        }
        seq.require_clip_mut(self.clip)?.set_transition(self.side, None);
        seq.take_transition(id)?;
        self.applied = false;
        Ok(())
    }
}

/// Change a transition's length.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModifyTransition {
    transition: TransitionId,
    length: Frame,
    old: Option<Frame>,
}

impl ModifyTransition {
    pub fn new(transition: TransitionId, length: Frame) -> Self {
        Self {
            transition,
            length,
            old: None,
        }
    }

    pub fn redo(&mut self, seq: &mut Sequence) -> EditResult<()> {
        if self.old.is_some() {
            return Ok(());
        }
        let t = seq.require_transition(self.transition)?;
        let room = [Some(t.parent), t.secondary]
            .into_iter()
            .flatten()
            .filter_map(|c| seq.clip(c))
            .map(|c| c.length())
            .min()
            .unwrap_or(0);
        if self.length <= 0 || self.length > room {
            return Err(EditError::InvalidTransitionLength {
                length: self.length,
            });
        }
        let t = seq.require_transition_mut(self.transition)?;
        self.old = Some(t.length);
        t.length = self.length;
        Ok(())
    }

    pub fn undo(&mut self, seq: &mut Sequence) -> EditResult<()> {
        let Some(old) = self.old.take() else {
            return Ok(());
        };
        seq.require_transition_mut(self.transition)?.length = old;
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct RemovedTransition {
    transition: Transition,
    /// Clips that held the transition, with the side they held it on.
    holders: Vec<(ClipId, TransitionSide)>,
}

/// Remove a transition from every clip that holds it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeleteTransition {
    transition: TransitionId,
    removed: Option<RemovedTransition>,
}

impl DeleteTransition {
    pub fn new(transition: TransitionId) -> Self {
        Self {
            transition,
            removed: None,
        }
    }

    pub fn redo(&mut self, seq: &mut Sequence) -> EditResult<()> {
        if self.removed.is_some() {
            return Ok(());
        }
        let t = seq.require_transition(self.transition)?;
        let holders: Vec<(ClipId, TransitionSide)> = [Some(t.parent), t.secondary]
            .into_iter()
            .flatten()
            .filter_map(|c| {
                seq.clip(c)
                    .and_then(|clip| clip.side_of(self.transition))
                    .map(|side| (c, side))
            })
            .collect();
        for (clip, side) in &holders {
            seq.require_clip_mut(*clip)?.set_transition(*side, None);
        }
        let transition = seq.take_transition(self.transition)?;
        tracing::debug!(transition = %self.transition, "Transition deleted");
        self.removed = Some(RemovedTransition {
            transition,
            holders,
        });
        Ok(())
    }

    pub fn undo(&mut self, seq: &mut Sequence) -> EditResult<()> {
        let Some(removed) = self.removed.take() else {
            return Ok(());
        };
        seq.insert_transition(self.transition, removed.transition)?;
        for (clip, side) in removed.holders.iter().rev() {
            seq.require_clip_mut(*clip)?
                .set_transition(*side, Some(self.transition));
        }
        Ok(())
    }
}

/// Move a transition reference from one clip to another, keeping the side.
///
/// Used by split: the closing transition of the original clip belongs to the
/// new right half afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransferTransition {
    transition: TransitionId,
    from: ClipId,
    to: ClipId,
    side: TransitionSide,
    applied: bool,
}

impl TransferTransition {
    pub fn new(transition: TransitionId, from: ClipId, to: ClipId, side: TransitionSide) -> Self {
        Self {
            transition,
            from,
            to,
            side,
            applied: false,
        }
    }

    fn rehome(seq: &mut Sequence, tid: TransitionId, from: ClipId, to: ClipId) -> EditResult<()> {
        let t = seq.require_transition_mut(tid)?;
        if t.parent == from {
            t.parent = to;
        } else if t.secondary == Some(from) {
            t.secondary = Some(to);
        }
        Ok(())
    }

    pub fn redo(&mut self, seq: &mut Sequence) -> EditResult<()> {
        if self.applied {
            return Ok(());
        }
        seq.require_transition(self.transition)?;
        if seq.require_clip(self.from)?.transition(self.side) != Some(self.transition) {
            return Err(EditError::TransitionNotFound(self.transition));
        }
        if seq.require_clip(self.to)?.transition(self.side).is_some() {
            return Err(EditError::SideOccupied {
                clip: self.to,
                side: self.side,
            });
        }
        seq.require_clip_mut(self.from)?.set_transition(self.side, None);
        seq.require_clip_mut(self.to)?
            .set_transition(self.side, Some(self.transition));
        Self::rehome(seq, self.transition, self.from, self.to)?;
        self.applied = true;
        Ok(())
    }

    pub fn undo(&mut self, seq: &mut Sequence) -> EditResult<()> {
        if !self.applied {
            return Ok(());
        }
        seq.require_clip_mut(self.to)?.set_transition(self.side, None);
        seq.require_clip_mut(self.from)?
            .set_transition(self.side, Some(self.transition));
        Self::rehome(seq, self.transition, self.to, self.from)?;
        self.applied = false;
        Ok(())
    }
}

/// Split a dual transition into two single-clip ones.
///
/// The parent keeps the original; the secondary clip gets a copy on the side
/// it held the original.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetachTransition {
    transition: TransitionId,
    /// `(holder, side, copy)` once applied.
    detached: Option<(ClipId, TransitionSide, TransitionId)>,
    applied: bool,
}

impl DetachTransition {
    pub fn new(transition: TransitionId) -> Self {
        Self {
            transition,
            detached: None,
            applied: false,
        }
    }

    pub fn redo(&mut self, seq: &mut Sequence) -> EditResult<()> {
        if self.applied {
            return Ok(());
        }
        let (holder, side) = match self.detached {
            Some((holder, side, _)) => (holder, side),
            None => {
                let t = seq.require_transition(self.transition)?;
                let Some(holder) = t.secondary else {
                    return Err(EditError::InvalidSequence {
                        reason: format!("{} is not a dual transition", self.transition),
                    });
                };
                let side = seq
                    .require_clip(holder)?
                    .side_of(self.transition)
                    .ok_or(EditError::TransitionNotFound(self.transition))?;
                (holder, side)
            }
        };
        let reuse = self.detached.map(|(_, _, copy)| copy);
        let copy = detach(seq, self.transition, holder, side, reuse)?;
        self.detached = Some((holder, side, copy));
        self.applied = true;
        Ok(())
    }

    pub fn undo(&mut self, seq: &mut Sequence) -> EditResult<()> {
        if !self.applied {
            return Ok(());
        }
        if let Some((holder, side, copy)) = self.detached {
            reattach(seq, self.transition, holder, side, copy)?;
        }
        self.applied = false;
        Ok(())
    }
}

/// Turn the dual transition `transition` into a single one on its parent and
/// give `holder` its own copy on `side`. Returns the copy's id.
pub(super) fn detach(
    seq: &mut Sequence,
    transition: TransitionId,
    holder: ClipId,
    side: TransitionSide,
    reuse: Option<TransitionId>,
) -> EditResult<TransitionId> {
    if let Some(id) = reuse {
        if seq.transition(id).is_some() {
            return Err(EditError::TransitionSlotOccupied(id));
        }
    }
    let original = seq.require_transition_mut(transition)?;
    original.secondary = None;
    let copy = Transition::new(original.kind.clone(), holder, original.length);
    let copy_id = match reuse {
        Some(id) => {
            seq.insert_transition(id, copy)?;
            id
        }
        None => seq.push_transition(copy),
    };
    seq.require_clip_mut(holder)?
        .set_transition(side, Some(copy_id));
    tracing::debug!(
        transition = %transition,
        copy = %copy_id,
        holder = %holder,
        "Split dual transition"
    );
    Ok(copy_id)
}

/// Reverse of [`detach`].
pub(super) fn reattach(
    seq: &mut Sequence,
    transition: TransitionId,
    holder: ClipId,
    side: TransitionSide,
    copy: TransitionId,
) -> EditResult<()> {
    seq.take_transition(copy)?;
    seq.require_clip_mut(holder)?
        .set_transition(side, Some(transition));
    seq.require_transition_mut(transition)?.secondary = Some(holder);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cn_common::{Rational, Resolution, Track};
    use cn_timeline::{Clip, Placement};

    fn make_clip(track: Track, a: Frame, b: Frame) -> Clip {
        Clip::new("clip", Placement::new(track, a, b))
    }

    fn make_pair() -> (Sequence, ClipId, ClipId) {
        let mut seq = Sequence::new("Test", Rational::FPS_30, Resolution::HD);
        let pre = seq.push_clip(make_clip(0, 0, 100));
        let post = seq.push_clip(make_clip(0, 100, 200));
        (seq, pre, post)
    }

    #[test]
    fn add_single_and_undo() {
        let (mut seq, pre, _) = make_pair();
        let before = seq.clone();
        let mut cmd = AddTransition::new(pre, TransitionSide::Opening, TransitionKind::CrossDissolve, 12);
        cmd.redo(&mut seq).unwrap();
        let tid = cmd.transition_id().unwrap();
        assert_eq!(seq.clip(pre).unwrap().opening_transition, Some(tid));
        assert!(seq.check_integrity().is_ok());

        cmd.undo(&mut seq).unwrap();
        assert_eq!(seq, before);
        cmd.redo(&mut seq).unwrap();
        assert_eq!(cmd.transition_id(), Some(tid));
    }

    #[test]
    fn add_dual_links_both_sides() {
        let (mut seq, pre, post) = make_pair();
        let mut cmd = AddTransition::dual(post, pre, TransitionSide::Opening, TransitionKind::CrossDissolve, 10);
        cmd.redo(&mut seq).unwrap();
        let tid = cmd.transition_id().unwrap();
        assert_eq!(seq.clip(post).unwrap().opening_transition, Some(tid));
        assert_eq!(seq.clip(pre).unwrap().closing_transition, Some(tid));
        assert_eq!(seq.transition_span(pre, TransitionSide::Closing), Some((90, 110)));
        assert!(seq.check_integrity().is_ok());
    }

    #[test]
    fn add_rejects_occupied_and_gaps() {
        let (mut seq, pre, post) = make_pair();
        AddTransition::new(pre, TransitionSide::Closing, TransitionKind::CrossDissolve, 5)
            .redo(&mut seq)
            .unwrap();

        let err = AddTransition::dual(post, pre, TransitionSide::Opening, TransitionKind::CrossDissolve, 5)
            .redo(&mut seq)
            .unwrap_err();
        assert_eq!(
            err,
            EditError::SideOccupied {
                clip: pre,
                side: TransitionSide::Closing
            }
        );

        let far = seq.push_clip(make_clip(0, 300, 400));
        let err = AddTransition::dual(far, post, TransitionSide::Opening, TransitionKind::CrossDissolve, 5)
            .redo(&mut seq)
            .unwrap_err();
        assert_eq!(err, EditError::NotAdjacent { pre: post, post: far });

        let err = AddTransition::new(far, TransitionSide::Opening, TransitionKind::CrossDissolve, 101)
            .redo(&mut seq)
            .unwrap_err();
        assert_eq!(err, EditError::InvalidTransitionLength { length: 101 });
    }

    #[test]
    fn modify_checks_both_clips() {
        let (mut seq, pre, post) = make_pair();
        seq.clip_mut(pre).unwrap().placement.update(|p| p.timeline_in = 80);
        let mut add = AddTransition::dual(post, pre, TransitionSide::Opening, TransitionKind::CrossDissolve, 10);
        add.redo(&mut seq).unwrap();
        let tid = add.transition_id().unwrap();

        assert!(ModifyTransition::new(tid, 30).redo(&mut seq).is_err());
        let mut modify = ModifyTransition::new(tid, 20);
        modify.redo(&mut seq).unwrap();
        assert_eq!(seq.transition(tid).unwrap().length, 20);
        modify.undo(&mut seq).unwrap();
        assert_eq!(seq.transition(tid).unwrap().length, 10);
    }

    #[test]
    fn delete_dual_and_restore() {
        let (mut seq, pre, post) = make_pair();
        AddTransition::dual(post, pre, TransitionSide::Opening, TransitionKind::CrossDissolve, 10)
            .redo(&mut seq)
            .unwrap();
        let before = seq.clone();
        let tid = seq.clip(post).unwrap().opening_transition.unwrap();

        let mut cmd = DeleteTransition::new(tid);
        cmd.redo(&mut seq).unwrap();
        assert_eq!(seq.transition_count(), 0);
        assert_eq!(seq.clip(pre).unwrap().closing_transition, None);
        assert_eq!(seq.clip(post).unwrap().opening_transition, None);

        cmd.undo(&mut seq).unwrap();
        assert_eq!(seq, before);
    }

    #[test]
    fn detach_and_reattach() {
        let (mut seq, pre, post) = make_pair();
        let mut add = AddTransition::dual(post, pre, TransitionSide::Opening, TransitionKind::CrossDissolve, 10);
        add.redo(&mut seq).unwrap();
        let tid = add.transition_id().unwrap();
        let before = seq.clone();

        let mut cmd = DetachTransition::new(tid);
        cmd.redo(&mut seq).unwrap();
        let copy = seq.clip(pre).unwrap().closing_transition.unwrap();
        assert_ne!(copy, tid);
        assert!(!seq.transition(tid).unwrap().is_dual());
        assert_eq!(seq.transition(copy).unwrap().parent, pre);

        cmd.undo(&mut seq).unwrap();
        assert_eq!(seq, before);
        cmd.redo(&mut seq).unwrap();
        assert_eq!(seq.clip(pre).unwrap().closing_transition, Some(copy));

        let mut single = DetachTransition::new(copy);
        assert!(single.redo(&mut seq).is_err());
    }

    #[test]
    fn transfer_moves_parent() {
        let (mut seq, pre, post) = make_pair();
        let mut add = AddTransition::new(pre, TransitionSide::Closing, TransitionKind::CrossDissolve, 10);
        add.redo(&mut seq).unwrap();
        let tid = add.transition_id().unwrap();
        let before = seq.clone();

        let mut cmd = TransferTransition::new(tid, pre, post, TransitionSide::Closing);
        cmd.redo(&mut seq).unwrap();
        assert_eq!(seq.clip(pre).unwrap().closing_transition, None);
        assert_eq!(seq.clip(post).unwrap().closing_transition, Some(tid));
        assert_eq!(seq.transition(tid).unwrap().parent, post);

        cmd.undo(&mut seq).unwrap();
        assert_eq!(seq, before);
    }
}

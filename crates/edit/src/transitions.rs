//! Placing, resizing and removing transitions.

use cn_common::{ClipId, EditError, EditResult, Frame, TransitionId, TransitionSide};
use cn_timeline::TransitionKind;

use crate::commands::{AddTransition, DeleteTransition, DetachTransition, ModifyTransition};
use crate::session::Edit;

/// Clear space on `clip` for a transition spanning `[start, end)` on `side`.
///
/// The transition on the opposite side is deleted when the new span reaches
/// the far edge of the clip, and shortened when the spans would overlap.
/// With `delete_old`, the transition already on `side` is removed.
pub fn make_room_for_transition(
    edit: &mut Edit<'_>,
    clip: ClipId,
    side: TransitionSide,
    start: Frame,
    end: Frame,
    delete_old: bool,
) -> EditResult<()> {
    let seq = edit.sequence();
    let c = seq.require_clip(clip)?;
    let (timeline_in, timeline_out) = (c.timeline_in(), c.timeline_out());
    let old = c.transition(side).filter(|_| delete_old);
    let opposite = seq
        .clip_transition(clip, side.opposite())
        .map(|(id, t)| (id, t.length));

    if let Some(old) = old {
        edit.append(DeleteTransition::new(old))?;
    }
    let Some((tid, length)) = opposite else {
        return Ok(());
    };
    match side {
        TransitionSide::Opening => {
            if end >= timeline_out {
                edit.append(DeleteTransition::new(tid))?;
            } else if end > timeline_out - length {
                edit.append(ModifyTransition::new(tid, timeline_out - end))?;
            }
        }
        TransitionSide::Closing => {
            if start <= timeline_in {
                edit.append(DeleteTransition::new(tid))?;
            } else if start < timeline_in + length {
                edit.append(ModifyTransition::new(tid, start - timeline_in))?;
            }
        }
    }
    Ok(())
}

/// Shorten any transition on `clip` that is longer than the clip.
pub fn clamp_transitions(edit: &mut Edit<'_>, clip: ClipId) -> EditResult<()> {
    let seq = edit.sequence();
    let Some(c) = seq.clip(clip) else {
        return Ok(());
    };
    let length = c.length();
    let too_long: Vec<TransitionId> = TransitionSide::BOTH
        .into_iter()
        .filter_map(|side| seq.clip_transition(clip, side))
        .filter(|(_, t)| t.length > length)
        .map(|(id, _)| id)
        .collect();
    for tid in too_long {
        tracing::debug!(transition = %tid, clip = %clip, length, "Clamping transition to clip length");
        edit.append(ModifyTransition::new(tid, length))?;
    }
    Ok(())
}

/// Split every dual transition on `clips` whose two clips no longer touch.
///
/// Used after moving several clips at once, where each move on its own would
/// see a partner that has not moved yet.
pub fn verify_transitions(edit: &mut Edit<'_>, clips: &[ClipId]) -> EditResult<()> {
    let seq = edit.sequence();
    let mut broken: Vec<TransitionId> = Vec::new();
    for id in clips {
        let Some(clip) = seq.clip(*id) else {
            continue;
        };
        for side in TransitionSide::BOTH {
            let Some(partner_id) = seq.dual_partner(*id, side) else {
                continue;
            };
            let Some((tid, _)) = seq.clip_transition(*id, side) else {
                continue;
            };
            let Some(partner) = seq.clip(partner_id) else {
                continue;
            };
            let adjacent = partner.track() == clip.track()
                && match side {
                    TransitionSide::Opening => partner.timeline_out() == clip.timeline_in(),
                    TransitionSide::Closing => clip.timeline_out() == partner.timeline_in(),
                };
            if !adjacent && !broken.contains(&tid) {
                broken.push(tid);
            }
        }
    }
    for tid in broken {
        edit.append(DetachTransition::new(tid))?;
    }
    Ok(())
}

/// Attach a single-clip transition, replacing any transition on that side.
///
/// `length` is clamped to the clip.
pub fn add_transition(
    edit: &mut Edit<'_>,
    clip: ClipId,
    side: TransitionSide,
    kind: TransitionKind,
    length: Frame,
) -> EditResult<TransitionId> {
    let c = edit.sequence().require_clip(clip)?;
    let length = length.min(c.length());
    if length <= 0 {
        return Err(EditError::InvalidTransitionLength { length });
    }
    let (start, end) = match side {
        TransitionSide::Opening => (c.timeline_in(), c.timeline_in() + length),
        TransitionSide::Closing => (c.timeline_out() - length, c.timeline_out()),
    };
    make_room_for_transition(edit, clip, side, start, end, true)?;
    edit.add_transition(AddTransition::new(clip, side, kind, length))
}

/// Attach a transition shared by `clip` and the clip touching it on `side`.
///
/// `length` is clamped to both clips. Transitions in the way on either clip
/// are removed or shortened.
pub fn add_dual_transition(
    edit: &mut Edit<'_>,
    clip: ClipId,
    partner: ClipId,
    side: TransitionSide,
    kind: TransitionKind,
    length: Frame,
) -> EditResult<TransitionId> {
    let (pre, post) = match side {
        TransitionSide::Opening => (partner, clip),
        TransitionSide::Closing => (clip, partner),
    };
    let seq = edit.sequence();
    let pre_clip = seq.require_clip(pre)?;
    let post_clip = seq.require_clip(post)?;
    if pre_clip.track() != post_clip.track() || pre_clip.timeline_out() != post_clip.timeline_in() {
        return Err(EditError::NotAdjacent { pre, post });
    }
    let length = length.min(pre_clip.length()).min(post_clip.length());
    if length <= 0 {
        return Err(EditError::InvalidTransitionLength { length });
    }
    let boundary = post_clip.timeline_in();

    make_room_for_transition(edit, post, TransitionSide::Opening, boundary, boundary + length, true)?;
    make_room_for_transition(edit, pre, TransitionSide::Closing, boundary - length, boundary, true)?;
    edit.add_transition(AddTransition::dual(clip, partner, side, kind, length))
}

/// Give each clip the configured default transition on every side that has
/// none. Returns how many transitions were added.
pub fn add_default_transitions(edit: &mut Edit<'_>, ids: &[ClipId]) -> EditResult<usize> {
    let mut added = 0;
    for id in ids {
        for side in TransitionSide::BOTH {
            let seq = edit.sequence();
            let c = seq.require_clip(*id)?;
            if c.transition(side).is_some() {
                continue;
            }
            let taken = seq
                .clip_transition(*id, side.opposite())
                .map_or(0, |(_, t)| t.length);
            let length = edit.config().default_transition_length_for(c.length() - taken);
            if length <= 0 {
                tracing::debug!(clip = %id, side = %side, "No room for default transition");
                continue;
            }
            let kind = if c.is_video() {
                TransitionKind::from(edit.config().default_video_transition)
            } else {
                TransitionKind::from(edit.config().default_audio_transition)
            };
            edit.add_transition(AddTransition::new(*id, side, kind, length))?;
            added += 1;
        }
    }
    Ok(added)
}

/// Change a transition's length, clamped to the clips it sits on, making
/// room on the far side of each clip. Returns whether the length changed.
pub fn resize_transition(edit: &mut Edit<'_>, transition: TransitionId, length: Frame) -> EditResult<bool> {
    let seq = edit.sequence();
    let t = seq.require_transition(transition)?;
    let holders: Vec<(ClipId, TransitionSide, Frame, Frame)> = [Some(t.parent), t.secondary]
        .into_iter()
        .flatten()
        .filter_map(|id| {
            let c = seq.clip(id)?;
            let side = c.side_of(transition)?;
            Some((id, side, c.timeline_in(), c.timeline_out()))
        })
        .collect();
    let room = holders.iter().map(|(_, _, a, b)| b - a).min().unwrap_or(0);
    let length = length.min(room);
    if length <= 0 {
        return Err(EditError::InvalidTransitionLength { length });
    }
    if length == t.length {
        return Ok(false);
    }
    for (clip, side, timeline_in, timeline_out) in holders {
        let (start, end) = match side {
            TransitionSide::Opening => (timeline_in, timeline_in + length),
            TransitionSide::Closing => (timeline_out - length, timeline_out),
        };
        make_room_for_transition(edit, clip, side, start, end, false)?;
    }
    edit.append(ModifyTransition::new(transition, length))?;
    Ok(true)
}

pub fn delete_transition(edit: &mut Edit<'_>, transition: TransitionId) -> EditResult<()> {
    edit.append(DeleteTransition::new(transition))
}

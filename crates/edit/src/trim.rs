//! Trimming, slipping, sliding and moving clips.

use serde::{Deserialize, Serialize};

use cn_common::{is_video_track, ClipId, EditError, EditResult, Frame, Track};
use cn_timeline::{Selection, Sequence};

use crate::commands::MoveClip;
use crate::delete::clear_areas;
use crate::ripple::ripple;
use crate::session::Edit;
use crate::transitions::{clamp_transitions, verify_transitions};

/// Which edge of a clip a trim moves.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrimEdge {
    In,
    Out,
}

/// In point of the nearest clip on `track` starting at or after `frame`.
pub(crate) fn next_start(seq: &Sequence, skip: ClipId, track: Track, frame: Frame) -> Option<Frame> {
    seq.clips()
        .filter(|(id, c)| *id != skip && c.track() == track && c.timeline_in() >= frame)
        .map(|(_, c)| c.timeline_in())
        .min()
}

/// Out point of the nearest clip on `track` ending at or before `frame`.
pub(crate) fn previous_end(seq: &Sequence, skip: ClipId, track: Track, frame: Frame) -> Option<Frame> {
    seq.clips()
        .filter(|(id, c)| *id != skip && c.track() == track && c.timeline_out() <= frame)
        .map(|(_, c)| c.timeline_out())
        .max()
}

/// Move one edge of `clip` by `delta` frames.
///
/// The clip keeps at least one frame and never reads outside its media.
/// Without `ripple` the edge stops at the neighbouring clip. With `ripple`
/// the in point stays put, and everything at or after the old out point moves
/// by the change in length.
pub fn trim(edit: &mut Edit<'_>, clip: ClipId, edge: TrimEdge, delta: Frame, ripple_after: bool) -> EditResult<bool> {
    let seq = edit.sequence();
    let c = seq.require_clip(clip)?;
    let p = c.placement();
    let length = p.length();

    let mut d = delta;
    match edge {
        TrimEdge::Out => {
            if let Some(max) = c.max_length {
                d = d.min(max - p.clip_in - length);
            }
            if !ripple_after {
                if let Some(next) = next_start(seq, clip, p.track, p.timeline_out) {
                    d = d.min(next - p.timeline_out);
                }
            }
            d = d.max(1 - length);
        }
        TrimEdge::In => {
            d = d.max(-p.clip_in);
            if !ripple_after {
                d = d.max(-p.timeline_in);
                if let Some(previous) = previous_end(seq, clip, p.track, p.timeline_in) {
                    d = d.max(previous - p.timeline_in);
                }
            }
            d = d.min(length - 1);
        }
    }
    if d != delta {
        tracing::debug!(clip = %clip, requested = delta, applied = d, "Trim clamped");
    }
    if d == 0 {
        return Ok(false);
    }

    let target = match (edge, ripple_after) {
        (TrimEdge::Out, _) => MoveClip::to(clip, p.timeline_in, p.timeline_out + d, p.clip_in, p.track),
        (TrimEdge::In, false) => MoveClip::to(clip, p.timeline_in + d, p.timeline_out, p.clip_in + d, p.track),
        (TrimEdge::In, true) => MoveClip::to(clip, p.timeline_in, p.timeline_out - d, p.clip_in + d, p.track),
    };
    edit.append(target.verify(false))?;
    if ripple_after {
        let shift = match edge {
            TrimEdge::Out => d,
            TrimEdge::In => -d,
        };
        ripple(edit, p.timeline_out, shift, &[clip])?;
    }
    verify_transitions(edit, &[clip])?;
    clamp_transitions(edit, clip)?;
    Ok(true)
}

/// Shift which part of the media `clip` shows without moving it.
pub fn slip(edit: &mut Edit<'_>, clip: ClipId, delta: Frame) -> EditResult<bool> {
    let c = edit.sequence().require_clip(clip)?;
    let p = c.placement();
    let mut clip_in = p.clip_in + delta;
    if let Some(max) = c.max_length {
        clip_in = clip_in.min(max - p.length());
    }
    let clip_in = clip_in.max(0);
    if clip_in == p.clip_in {
        return Ok(false);
    }
    edit.append(MoveClip::to(clip, p.timeline_in, p.timeline_out, clip_in, p.track).verify(false))?;
    Ok(true)
}

/// Move `clip` along its track, taking the difference out of the clips it
/// touches: an adjacent left neighbour gets longer or shorter at its out
/// point, an adjacent right neighbour at its in point.
pub fn slide(edit: &mut Edit<'_>, clip: ClipId, delta: Frame) -> EditResult<bool> {
    let seq = edit.sequence();
    let p = seq.require_clip(clip)?.placement();
    let left = seq.clip_ending_at(p.track, p.timeline_in).filter(|id| *id != clip);
    let right = seq.clip_starting_at(p.track, p.timeline_out).filter(|id| *id != clip);

    let mut lo = -p.timeline_in;
    let mut hi = Frame::MAX;
    match left.and_then(|id| seq.clip(id)) {
        Some(l) => {
            lo = lo.max(1 - l.length());
            if let Some(max) = l.max_length {
                hi = hi.min(max - l.clip_in() - l.length());
            }
        }
        None => {
            if let Some(previous) = previous_end(seq, clip, p.track, p.timeline_in) {
                lo = lo.max(previous - p.timeline_in);
            }
        }
    }
    match right.and_then(|id| seq.clip(id)) {
        Some(r) => {
            hi = hi.min(r.length() - 1);
            lo = lo.max(-r.clip_in());
        }
        None => {
            if let Some(next) = next_start(seq, clip, p.track, p.timeline_out) {
                hi = hi.min(next - p.timeline_out);
            }
        }
    }
    let d = delta.min(hi).max(lo);
    if d != delta {
        tracing::debug!(clip = %clip, requested = delta, applied = d, "Slide clamped");
    }
    if d == 0 || lo > hi {
        return Ok(false);
    }

    let left = left.and_then(|id| seq.clip(id).map(|c| (id, c.placement())));
    let right = right.and_then(|id| seq.clip(id).map(|c| (id, c.placement())));
    let mut touched = vec![clip];
    if let Some((id, l)) = left {
        edit.append(MoveClip::to(id, l.timeline_in, l.timeline_out + d, l.clip_in, l.track).verify(false))?;
        touched.push(id);
    }
    edit.append(MoveClip::shift(clip, d).verify(false))?;
    if let Some((id, r)) = right {
        edit.append(MoveClip::to(id, r.timeline_in + d, r.timeline_out, r.clip_in + d, r.track).verify(false))?;
        touched.push(id);
    }
    verify_transitions(edit, &touched)?;
    for id in touched {
        clamp_transitions(edit, id)?;
    }
    Ok(true)
}

/// Move clips by `frame_delta` frames and `track_delta` tracks, clearing
/// whatever they land on.
///
/// Fails without changing anything if a clip would cross between the video
/// and audio halves of the timeline.
pub fn move_clips(edit: &mut Edit<'_>, ids: &[ClipId], frame_delta: Frame, track_delta: Track) -> EditResult<bool> {
    let mut ids = ids.to_vec();
    ids.sort();
    ids.dedup();
    if ids.is_empty() || (frame_delta == 0 && track_delta == 0) {
        return Ok(false);
    }

    let seq = edit.sequence();
    let mut placements = Vec::with_capacity(ids.len());
    for id in &ids {
        let p = seq.require_clip(*id)?.placement();
        let to = p.track + track_delta;
        if is_video_track(p.track) != is_video_track(to) {
            return Err(EditError::TrackHalfChanged {
                clip: *id,
                from: p.track,
                to,
            });
        }
        placements.push(p);
    }
    let earliest = placements.iter().map(|p| p.timeline_in).min().unwrap_or(0);
    let frame_delta = frame_delta.max(-earliest);
    if frame_delta == 0 && track_delta == 0 {
        return Ok(false);
    }

    let areas: Vec<Selection> = placements
        .iter()
        .map(|p| Selection::new(p.track + track_delta, p.timeline_in + frame_delta, p.timeline_out + frame_delta))
        .collect();
    clear_areas(edit, &areas, &ids)?;
    for id in &ids {
        edit.append(MoveClip::by(*id, frame_delta, frame_delta, 0, track_delta).verify(false))?;
    }
    verify_transitions(edit, &ids)?;
    tracing::debug!(clips = ids.len(), frame_delta, track_delta, "Moved clips");
    Ok(true)
}

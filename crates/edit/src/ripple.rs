//! Rippling: shifting everything after a point, across all tracks.

use cn_common::{ClipId, EditResult, Frame};
use cn_timeline::{clean_up_selections, Placement, Selection, Sequence};

use crate::commands::MoveClip;
use crate::delete::delete_areas;
use crate::session::Edit;
use crate::transitions::verify_transitions;

/// Move every clip not in `ignore` whose in point is at or after `point` by
/// `length` frames. Returns the length actually applied.
///
/// The shift is shortened so that no clip moves before frame 0 and no moved
/// clip runs into a clip that stays, on any track.
pub fn ripple(edit: &mut Edit<'_>, point: Frame, length: Frame, ignore: &[ClipId]) -> EditResult<Frame> {
    if length == 0 {
        return Ok(0);
    }
    let seq = edit.sequence();
    let movers: Vec<ClipId> = seq
        .clips()
        .filter(|(id, c)| !ignore.contains(id) && c.timeline_in() >= point)
        .map(|(id, _)| id)
        .collect();
    let Some(earliest) = movers
        .iter()
        .filter_map(|id| seq.clip(*id))
        .map(|c| c.timeline_in())
        .min()
    else {
        return Ok(0);
    };

    let (lo, hi) = shift_bounds(seq, &movers);
    let applied = if length < 0 {
        length.max(-earliest).max(lo)
    } else {
        length.min(hi)
    };
    if applied != length {
        tracing::debug!(point, requested = length, applied, "Ripple clamped");
    }
    if applied == 0 {
        return Ok(0);
    }
    for id in &movers {
        edit.append(MoveClip::by(*id, applied, applied, 0, 0).verify(false))?;
    }
    verify_transitions(edit, &movers)?;
    tracing::debug!(point, length = applied, clips = movers.len(), "Rippled");
    Ok(applied)
}

/// How far `movers` can shift back (`lo`, never positive) and forward (`hi`,
/// never negative) before one of them touches a clip that stays put on the
/// same track. Pairs that already overlap are left out.
fn shift_bounds(seq: &Sequence, movers: &[ClipId]) -> (Frame, Frame) {
    let moving: Vec<Placement> = movers
        .iter()
        .filter_map(|id| seq.clip(*id))
        .map(|c| c.placement())
        .collect();
    let (mut lo, mut hi) = (Frame::MIN, Frame::MAX);
    for (id, clip) in seq.clips() {
        if movers.contains(&id) {
            continue;
        }
        let s = clip.placement();
        for m in moving.iter().filter(|m| m.track == s.track) {
            if s.timeline_out <= m.timeline_in {
                lo = lo.max(s.timeline_out - m.timeline_in);
            } else if s.timeline_in >= m.timeline_out {
                hi = hi.min(s.timeline_in - m.timeline_out);
            }
        }
    }
    (lo, hi)
}

/// Delete `areas` and close the gap they leave.
///
/// The ripple starts one frame after the earliest area and is as long as the
/// narrowest area. It is shortened so that no clip left standing across the
/// ripple point gets overlapped by what moves in behind it. A clip touching
/// an area on its own track counts as part of the delete.
pub fn ripple_delete(edit: &mut Edit<'_>, areas: &[Selection]) -> EditResult<()> {
    let mut areas = areas.to_vec();
    clean_up_selections(&mut areas);
    let (Some(start), Some(width)) = (
        areas.iter().map(|s| s.timeline_in).min(),
        areas.iter().map(Selection::length).min(),
    ) else {
        return Ok(());
    };
    let point = start + 1;
    let mut length = width;

    let seq = edit.sequence();
    for (id, clip) in seq.clips() {
        if !clip.spans(point) {
            continue;
        }
        let p = clip.placement();
        let touched = areas.iter().any(|s| {
            s.track == p.track && s.timeline_in <= p.timeline_out && s.timeline_out >= p.timeline_in
        });
        if touched {
            continue;
        }
        for (other, next) in seq.clips() {
            if other == id || next.track() != p.track {
                continue;
            }
            let gap_start = next.timeline_in();
            if gap_start >= p.timeline_out && gap_start < point + length {
                length = length.min(gap_start - p.timeline_out);
            }
        }
    }
    if length != width {
        tracing::debug!(point, width, length, "Ripple shortened by a clip across the ripple point");
    }

    delete_areas(edit, &areas, &[], true)?;
    if length > 0 {
        ripple(edit, point, -length, &[])?;
    }
    edit.seek(point - 1);
    Ok(())
}

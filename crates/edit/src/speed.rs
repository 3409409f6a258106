//! Changing clip playback speed.

use cn_common::{ClipId, EditError, EditResult, Frame};

use crate::commands::{MoveClip, SetSpeed};
use crate::ripple::ripple;
use crate::session::Edit;
use crate::transitions::{clamp_transitions, verify_transitions};
use crate::trim::next_start;

/// Set the playback speed of each clip in `ids`.
///
/// The clip's length, media offset and keyframes scale by `old / new`. The in
/// point stays. With `ripple`, everything after the clip moves by the change
/// in length; otherwise a longer clip stops at the next clip on its track.
pub fn set_speed(edit: &mut Edit<'_>, ids: &[ClipId], speed: f64, ripple_after: bool) -> EditResult<bool> {
    if !(speed > 0.0 && speed.is_finite()) {
        return Err(EditError::InvalidSpeed { speed });
    }
    let mut ids = ids.to_vec();
    ids.sort();
    ids.dedup();

    let mut changed = false;
    for id in ids {
        let p = edit.sequence().require_clip(id)?.placement();
        if (p.speed - speed).abs() < f64::EPSILON {
            continue;
        }
        let multiplier = p.speed / speed;
        edit.append(SetSpeed::new(id, speed))?;

        let seq = edit.sequence();
        let max_length = seq.require_clip(id)?.max_length;
        let mut clip_in = (p.clip_in as f64 * multiplier).round() as Frame;
        let mut length = ((p.length() as f64 * multiplier).round() as Frame).max(1);
        if let Some(max) = max_length {
            clip_in = clip_in.min(max - 1).max(0);
            length = length.min(max - clip_in).max(1);
        }
        let mut timeline_out = p.timeline_in + length;
        if !ripple_after {
            if let Some(next) = next_start(seq, id, p.track, p.timeline_out) {
                timeline_out = timeline_out.min(next).max(p.timeline_in + 1);
            }
        }

        edit.append(MoveClip::to(id, p.timeline_in, timeline_out, clip_in, p.track).verify(false))?;
        if ripple_after {
            ripple(edit, p.timeline_out, timeline_out - p.timeline_out, &[id])?;
        }
        verify_transitions(edit, &[id])?;
        clamp_transitions(edit, id)?;
        tracing::debug!(clip = %id, speed, length = timeline_out - p.timeline_in, "Clip retimed");
        changed = true;
    }
    Ok(changed)
}

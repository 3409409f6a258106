//! Splitting clips and re-linking the halves.

use cn_common::{ClipId, EditResult, Frame, TransitionSide};

use crate::commands::{ModifyTransition, MoveClip, SetLinks, TransferTransition};
use crate::session::Edit;

/// Split `clip` at `frame`. Returns the id of the new right half, or `None`
/// when `frame` is not strictly inside the clip.
pub fn split_clip(edit: &mut Edit<'_>, clip: ClipId, frame: Frame) -> EditResult<Option<ClipId>> {
    split_clip_with_gap(edit, clip, frame, frame)
}

/// Split `clip` into `[in, pre_out)` and `[post_in, out)`, dropping whatever
/// lies between the two points.
///
/// The opening transition stays on the left half and the closing one moves to
/// the right half; both are shortened if their half is now too short.
pub fn split_clip_with_gap(
    edit: &mut Edit<'_>,
    clip: ClipId,
    pre_out: Frame,
    post_in: Frame,
) -> EditResult<Option<ClipId>> {
    let seq = edit.sequence();
    let p = seq.require_clip(clip)?.placement();
    if !(p.timeline_in < pre_out && pre_out <= post_in && post_in < p.timeline_out) {
        tracing::debug!(clip = %clip, pre_out, post_in, "Split skipped: outside clip");
        return Ok(None);
    }

    let mut draft = seq.copy_clip(clip)?;
    draft.opening = None;
    draft.closing = None;
    draft.clip.placement.update(|q| {
        q.clip_in += post_in - q.timeline_in;
        q.timeline_in = post_in;
    });
    let opening = seq
        .clip_transition(clip, TransitionSide::Opening)
        .map(|(id, t)| (id, t.length));
    let closing = seq
        .clip_transition(clip, TransitionSide::Closing)
        .map(|(id, t)| (id, t.length));

    edit.append(MoveClip::to(clip, p.timeline_in, pre_out, p.clip_in, p.track).verify(false))?;
    let post = edit.add_clip(draft)?;

    let pre_len = pre_out - p.timeline_in;
    let post_len = p.timeline_out - post_in;
    if let Some((tid, length)) = opening {
        if length > pre_len {
            edit.append(ModifyTransition::new(tid, pre_len))?;
        }
    }
    if let Some((tid, length)) = closing {
        edit.append(TransferTransition::new(tid, clip, post, TransitionSide::Closing))?;
        if length > post_len {
            edit.append(ModifyTransition::new(tid, post_len))?;
        }
    }

    tracing::debug!(clip = %clip, post = %post, pre_out, post_in, "Clip split");
    edit.record_split(clip, post);
    Ok(Some(post))
}

/// Split `clip` at `frame` once per transaction and, with `relink`, split its
/// linked clips at the same frame and link the right halves to each other.
///
/// Returns whether `clip` was split.
pub fn split_clip_and_relink(edit: &mut Edit<'_>, clip: ClipId, frame: Frame, relink: bool) -> EditResult<bool> {
    if edit.was_split(clip) {
        return Ok(false);
    }
    if split_clip(edit, clip, frame)?.is_none() {
        return Ok(false);
    }
    if relink {
        let linked = edit.sequence().require_clip(clip)?.linked.clone();
        for other in linked {
            let spans = edit.sequence().clip(other).is_some_and(|c| c.spans(frame));
            if spans && !edit.was_split(other) {
                split_clip(edit, other, frame)?;
            }
        }
        relink_splits(edit)?;
    }
    Ok(true)
}

/// Give every right half created in this transaction the links of its
/// original, mapped onto the right halves of the linked clips.
///
/// A clip split several times is matched split for split: the n-th right half
/// of a clip links to the n-th right halves of its partners.
pub fn relink_splits(edit: &mut Edit<'_>) -> EditResult<()> {
    let seq = edit.sequence();
    let cache = edit.split_cache();
    let mut changes = Vec::new();
    for (k, (original, post)) in cache.iter().enumerate() {
        let (Some(original_clip), Some(post_clip)) = (seq.clip(*original), seq.clip(*post)) else {
            continue;
        };
        let nth = cache[..k].iter().filter(|(o, _)| o == original).count();
        let links: Vec<ClipId> = original_clip
            .linked
            .iter()
            .filter_map(|partner| {
                cache
                    .iter()
                    .filter(|(o, _)| o == partner)
                    .nth(nth)
                    .map(|(_, p)| *p)
            })
            .filter(|p| seq.clip(*p).is_some())
            .collect();
        if links != post_clip.linked {
            changes.push((*post, links));
        }
    }
    if changes.is_empty() {
        return Ok(());
    }
    tracing::debug!(count = changes.len(), "Relinking split clips");
    edit.append(SetLinks::new(changes))
}

/// Split every clip under `frame`, with links. Returns whether anything was split.
pub fn split_all_clips_at_point(edit: &mut Edit<'_>, frame: Frame) -> EditResult<bool> {
    let ids = edit.sequence().clips_spanning(frame);
    let mut any = false;
    for id in ids {
        any |= split_clip_and_relink(edit, id, frame, true)?;
    }
    Ok(any)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::AddTransition;
    use crate::session::EditSession;
    use cn_common::{EditorConfig, Rational, Resolution, Track};
    use cn_timeline::{Clip, Placement, Sequence, TransitionKind};

    fn make_clip(track: Track, a: Frame, b: Frame) -> Clip {
        Clip::new("clip", Placement::new(track, a, b))
    }

    /// Video clip on track -1 linked to an audio clip on track 0, both [0, 100).
    fn make_linked() -> (EditSession, ClipId, ClipId) {
        let mut seq = Sequence::new("Test", Rational::FPS_30, Resolution::HD);
        let video = seq.push_clip(make_clip(-1, 0, 100));
        let audio = seq.push_clip(make_clip(0, 0, 100));
        seq.clip_mut(video).unwrap().linked = vec![audio];
        seq.clip_mut(audio).unwrap().linked = vec![video];
        (EditSession::new(seq, EditorConfig::default()), video, audio)
    }

    #[test]
    fn split_keeps_total_length() {
        let (mut session, video, _) = make_linked();
        let mut edit = session.begin_edit("Split");
        let post = split_clip(&mut edit, video, 40).unwrap().unwrap();
        let seq = edit.sequence();
        let pre = seq.clip(video).unwrap();
        let post = seq.clip(post).unwrap();
        assert_eq!(pre.timeline_out(), 40);
        assert_eq!(post.timeline_in(), 40);
        assert_eq!(post.clip_in(), 40);
        assert_eq!(pre.length() + post.length(), 100);
        assert!(post.linked.is_empty());
        assert!(edit.commit());
    }

    #[test]
    fn split_outside_is_noop() {
        let (mut session, video, _) = make_linked();
        let before = session.sequence().clone();
        assert!(!session.split(&[video], 0).unwrap());
        assert!(!session.split(&[video], 100).unwrap());
        assert!(!session.split(&[video], 150).unwrap());
        assert_eq!(session.sequence(), &before);
        assert_eq!(session.history().undo_count(), 0);
    }

    #[test]
    fn split_follows_links_and_relinks() {
        let (mut session, video, audio) = make_linked();
        let before = session.sequence().clone();
        assert!(session.split(&[video], 30).unwrap());

        let seq = session.sequence();
        assert_eq!(seq.clip_count(), 4);
        let video_post = seq.clip_starting_at(-1, 30).unwrap();
        let audio_post = seq.clip_starting_at(0, 30).unwrap();
        assert_eq!(seq.clip(video_post).unwrap().linked, vec![audio_post]);
        assert_eq!(seq.clip(audio_post).unwrap().linked, vec![video_post]);
        assert_eq!(seq.clip(video).unwrap().linked, vec![audio]);
        assert!(seq.check_integrity().is_ok());

        session.undo().unwrap();
        assert_eq!(session.sequence(), &before);
    }

    #[test]
    fn split_twice_in_one_edit_is_ignored() {
        let (mut session, video, audio) = make_linked();
        assert!(session.split(&[video, audio, video], 50).unwrap());
        assert_eq!(session.sequence().clip_count(), 4);
    }

    #[test]
    fn transitions_follow_halves() {
        let mut seq = Sequence::new("Test", Rational::FPS_30, Resolution::HD);
        let id = seq.push_clip(make_clip(0, 0, 100));
        let mut session = EditSession::new(seq, EditorConfig::default());
        let mut edit = session.begin_edit("Setup");
        let opening = edit
            .add_transition(AddTransition::new(id, TransitionSide::Opening, TransitionKind::CrossDissolve, 30))
            .unwrap();
        let closing = edit
            .add_transition(AddTransition::new(id, TransitionSide::Closing, TransitionKind::CrossDissolve, 30))
            .unwrap();
        edit.commit();

        let mut edit = session.begin_edit("Split");
        let post = split_clip(&mut edit, id, 20).unwrap().unwrap();
        edit.commit();

        let seq = session.sequence();
        assert_eq!(seq.clip(id).unwrap().opening_transition, Some(opening));
        assert_eq!(seq.transition(opening).unwrap().length, 20);
        assert_eq!(seq.clip(id).unwrap().closing_transition, None);
        assert_eq!(seq.clip(post).unwrap().closing_transition, Some(closing));
        assert_eq!(seq.transition(closing).unwrap().parent, post);
        assert_eq!(seq.transition(closing).unwrap().length, 30);
        assert!(seq.check_integrity().is_ok());
    }

    #[test]
    fn split_all_at_point() {
        let (mut session, _, _) = make_linked();
        let mut edit = session.begin_edit("Split all");
        assert!(split_all_clips_at_point(&mut edit, 60).unwrap());
        assert!(!split_all_clips_at_point(&mut edit, 100).unwrap());
        edit.commit();
        assert_eq!(session.sequence().clip_count(), 4);
        assert!(session.sequence().check_integrity().is_ok());
    }
}

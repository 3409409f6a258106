//! Deleting selected areas.
//!
//! Each area is planned against the sequence as left by the previous area:
//! clips inside the area are removed, clips straddling one edge are trimmed
//! and clips spanning the whole area are split around it. A selected area
//! that exactly covers a transition removes just the transition; clearing
//! room for moved or pasted clips always cuts the clips.

use cn_common::{ClipId, EditResult, TransitionId, TransitionSide};
use cn_timeline::{clean_up_selections, deselect_area, Selection};

use crate::commands::{DeleteClip, DeleteTransition, ModifyTransition, MoveClip, SetSelections};
use crate::session::Edit;
use crate::split::{relink_splits, split_clip_with_gap};
use crate::transitions::clamp_transitions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cut {
    Transition(TransitionId),
    Remove(ClipId),
    Gap(ClipId),
    Tail(ClipId),
    Head(ClipId),
}

fn plan(edit: &Edit<'_>, area: &Selection, ignore: &[ClipId], transition_cuts: bool) -> Vec<Cut> {
    let seq = edit.sequence();
    let mut cuts = Vec::new();
    for id in seq.clips_on_track(area.track) {
        if ignore.contains(&id) {
            continue;
        }
        let Some(clip) = seq.clip(id) else {
            continue;
        };
        let covered = TransitionSide::BOTH
            .into_iter()
            .filter(|side| transition_cuts && seq.selection_contains_transition(area, id, *side))
            .find_map(|side| clip.transition(side));
        if let Some(tid) = covered {
            if !cuts.contains(&Cut::Transition(tid)) {
                cuts.push(Cut::Transition(tid));
            }
            continue;
        }

        let (a, b) = (clip.timeline_in(), clip.timeline_out());
        let (s_in, s_out) = (area.timeline_in, area.timeline_out);
        if a >= s_in && b <= s_out {
            cuts.push(Cut::Remove(id));
        } else if a < s_in && b > s_out {
            cuts.push(Cut::Gap(id));
        } else if a < s_in && b > s_in {
            cuts.push(Cut::Tail(id));
        } else if a < s_out && b > s_out {
            cuts.push(Cut::Head(id));
        }
    }
    cuts
}

fn cut_tail(edit: &mut Edit<'_>, id: ClipId, area: &Selection) -> EditResult<()> {
    let p = edit.sequence().require_clip(id)?.placement();
    edit.append(MoveClip::to(id, p.timeline_in, area.timeline_in, p.clip_in, p.track))?;

    let closing = edit
        .sequence()
        .clip_transition(id, TransitionSide::Closing)
        .map(|(tid, t)| (tid, t.length));
    if let Some((tid, length)) = closing {
        let removed = p.timeline_out - area.timeline_in;
        if removed >= length {
            edit.append(DeleteTransition::new(tid))?;
        } else {
            edit.append(ModifyTransition::new(tid, length - removed))?;
        }
    }
    clamp_transitions(edit, id)
}

fn cut_head(edit: &mut Edit<'_>, id: ClipId, area: &Selection) -> EditResult<()> {
    let p = edit.sequence().require_clip(id)?.placement();
    let removed = area.timeline_out - p.timeline_in;
    edit.append(MoveClip::to(
        id,
        area.timeline_out,
        p.timeline_out,
        p.clip_in + removed,
        p.track,
    ))?;

    let opening = edit
        .sequence()
        .clip_transition(id, TransitionSide::Opening)
        .map(|(tid, t)| (tid, t.length));
    if let Some((tid, length)) = opening {
        if removed >= length {
            edit.append(DeleteTransition::new(tid))?;
        } else {
            edit.append(ModifyTransition::new(tid, length - removed))?;
        }
    }
    clamp_transitions(edit, id)
}

/// Delete everything inside the selected `areas`, leaving clips in `ignore`
/// alone.
///
/// Right halves of clips split around an area are re-linked to each other.
/// With `deselect`, the deleted areas are also removed from the selection.
pub fn delete_areas(
    edit: &mut Edit<'_>,
    areas: &[Selection],
    ignore: &[ClipId],
    deselect: bool,
) -> EditResult<()> {
    let mut areas = areas.to_vec();
    clean_up_selections(&mut areas);
    if areas.is_empty() {
        return Ok(());
    }
    cut_areas(edit, &areas, ignore, true)?;

    if deselect {
        let mut selections = edit.sequence().selections.clone();
        for area in &areas {
            deselect_area(&mut selections, area.track, area.timeline_in, area.timeline_out);
        }
        if selections != edit.sequence().selections {
            edit.append_post(SetSelections::new(selections))?;
        }
    }
    Ok(())
}

/// Make `areas` empty so clips can be placed there. Unlike [`delete_areas`],
/// an area matching a transition still cuts the clips under it.
pub fn clear_areas(edit: &mut Edit<'_>, areas: &[Selection], ignore: &[ClipId]) -> EditResult<()> {
    let mut areas = areas.to_vec();
    clean_up_selections(&mut areas);
    cut_areas(edit, &areas, ignore, false)
}

fn cut_areas(edit: &mut Edit<'_>, areas: &[Selection], ignore: &[ClipId], transition_cuts: bool) -> EditResult<()> {
    for area in areas {
        let cuts = plan(edit, area, ignore, transition_cuts);
        tracing::debug!(
            track = area.track,
            timeline_in = area.timeline_in,
            timeline_out = area.timeline_out,
            cuts = cuts.len(),
            "Deleting area"
        );
        for cut in cuts {
            match cut {
                Cut::Transition(tid) => {
                    if edit.sequence().transition(tid).is_some() {
                        edit.append(DeleteTransition::new(tid))?;
                    }
                }
                Cut::Remove(id) => {
                    if edit.sequence().clip(id).is_some() {
                        edit.append(DeleteClip::new(id))?;
                    }
                }
                Cut::Gap(id) => {
                    split_clip_with_gap(edit, id, area.timeline_in, area.timeline_out)?;
                }
                Cut::Tail(id) => cut_tail(edit, id, area)?,
                Cut::Head(id) => cut_head(edit, id, area)?,
            }
        }
    }
    relink_splits(edit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::EditSession;
    use cn_common::{EditorConfig, Frame, Rational, Resolution, Track};
    use cn_timeline::{Clip, Placement, Sequence, TransitionKind};

    fn make_clip(track: Track, a: Frame, b: Frame) -> Clip {
        Clip::new("clip", Placement::new(track, a, b))
    }

    fn make_session(clips: &[(Track, Frame, Frame)]) -> (EditSession, Vec<ClipId>) {
        let mut seq = Sequence::new("Test", Rational::FPS_30, Resolution::HD);
        let ids = clips.iter().map(|(t, a, b)| seq.push_clip(make_clip(*t, *a, *b))).collect();
        (EditSession::new(seq, EditorConfig::default()), ids)
    }

    fn span(session: &EditSession, id: ClipId) -> (Frame, Frame) {
        let c = session.sequence().clip(id).unwrap();
        (c.timeline_in(), c.timeline_out())
    }

    #[test]
    fn trims_removes_and_keeps_other_tracks() {
        let (mut session, ids) = make_session(&[(0, 0, 100), (0, 100, 200), (0, 200, 250), (-1, 0, 300)]);
        assert!(session
            .delete_areas(&[Selection::new(0, 80, 260)], false)
            .unwrap());
        let seq = session.sequence();
        assert_eq!(span(&session, ids[0]), (0, 80));
        assert!(seq.clip(ids[1]).is_none());
        assert!(seq.clip(ids[2]).is_none());
        assert_eq!(span(&session, ids[3]), (0, 300));
        assert!(seq.check_integrity().is_ok());
    }

    #[test]
    fn head_trim_advances_clip_in() {
        let (mut session, ids) = make_session(&[(0, 100, 200)]);
        session.delete_areas(&[Selection::new(0, 50, 130)], false).unwrap();
        let c = session.sequence().clip(ids[0]).unwrap();
        assert_eq!((c.timeline_in(), c.timeline_out(), c.clip_in()), (130, 200, 30));
    }

    #[test]
    fn inner_area_splits_with_gap() {
        let (mut session, ids) = make_session(&[(0, 0, 100)]);
        let before = session.sequence().clone();
        session.delete_areas(&[Selection::new(0, 40, 60)], false).unwrap();
        let seq = session.sequence();
        assert_eq!(seq.clip_count(), 2);
        assert_eq!(span(&session, ids[0]), (0, 40));
        let post = seq.clip_starting_at(0, 60).unwrap();
        let c = seq.clip(post).unwrap();
        assert_eq!((c.timeline_out(), c.clip_in()), (100, 60));

        session.undo().unwrap();
        assert_eq!(session.sequence(), &before);
    }

    #[test]
    fn tail_cut_shortens_closing_transition() {
        let (mut session, ids) = make_session(&[(0, 0, 100)]);
        let closing = session
            .add_transition(ids[0], TransitionSide::Closing, TransitionKind::CrossDissolve, 30)
            .unwrap();
        session.delete_areas(&[Selection::new(0, 90, 120)], false).unwrap();
        assert_eq!(session.sequence().transition(closing).unwrap().length, 20);

        session.delete_areas(&[Selection::new(0, 50, 90)], false).unwrap();
        assert_eq!(session.sequence().transition_count(), 0);
        assert!(session.sequence().check_integrity().is_ok());
    }

    #[test]
    fn area_on_transition_removes_only_transition() {
        let (mut session, ids) = make_session(&[(0, 0, 100)]);
        session
            .add_transition(ids[0], TransitionSide::Opening, TransitionKind::CrossDissolve, 20)
            .unwrap();
        session.delete_areas(&[Selection::new(0, 0, 20)], false).unwrap();
        let seq = session.sequence();
        assert_eq!(seq.transition_count(), 0);
        assert_eq!(span(&session, ids[0]), (0, 100));
    }

    #[test]
    fn removed_areas_are_deselected() {
        let (mut session, _) = make_session(&[(0, 0, 100)]);
        session
            .select(vec![Selection::new(0, 10, 50), Selection::new(1, 0, 10)])
            .unwrap();
        assert!(session.delete_selection(false).unwrap());
        assert!(session.sequence().selections.is_empty());

        session.undo().unwrap();
        assert_eq!(session.sequence().selections.len(), 2);
    }

    #[test]
    fn ignored_clips_survive() {
        let (mut session, ids) = make_session(&[(0, 0, 100), (0, 0, 50)]);
        let mut edit = session.begin_edit("Delete");
        delete_areas(&mut edit, &[Selection::new(0, 0, 100)], &[ids[1]], false).unwrap();
        assert!(edit.sequence().clip(ids[0]).is_none());
        assert!(edit.sequence().clip(ids[1]).is_some());
    }

    #[test]
    fn empty_areas_do_nothing() {
        let (mut session, _) = make_session(&[(0, 0, 100)]);
        assert!(!session.delete_areas(&[], true).unwrap());
        assert_eq!(session.history().undo_count(), 0);
    }

    #[test]
    fn clearing_an_area_cuts_clips_under_a_transition() {
        let (mut session, ids) = make_session(&[(0, 0, 50), (0, 50, 100)]);
        session
            .add_dual_transition(ids[0], ids[1], TransitionSide::Closing, TransitionKind::CrossDissolve, 10)
            .unwrap();
        let mut edit = session.begin_edit("Clear");
        clear_areas(&mut edit, &[Selection::new(0, 40, 60)], &[]).unwrap();
        edit.commit();

        let seq = session.sequence();
        assert_eq!(span(&session, ids[0]), (0, 40));
        assert_eq!(span(&session, ids[1]), (60, 100));
        assert_eq!(seq.transition_count(), 0);
        assert!(seq.check_integrity().is_ok());
    }

    #[test]
    fn selecting_a_dual_transition_deletes_only_it() {
        let (mut session, ids) = make_session(&[(0, 0, 50), (0, 50, 100)]);
        session
            .add_dual_transition(ids[0], ids[1], TransitionSide::Closing, TransitionKind::CrossDissolve, 10)
            .unwrap();
        session.delete_areas(&[Selection::new(0, 40, 60)], false).unwrap();
        assert_eq!(span(&session, ids[0]), (0, 50));
        assert_eq!(span(&session, ids[1]), (50, 100));
        assert_eq!(session.sequence().transition_count(), 0);
    }
}

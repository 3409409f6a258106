//! Property tests for ripple, delete and undo.

use cn_common::{EditorConfig, Frame, Rational, Resolution, Track, TransitionSide};
use cn_edit::{EditSession, TrimEdge};
use cn_timeline::{Clip, Placement, Selection, Sequence, TransitionKind};
use proptest::prelude::*;

const TRACKS: [Track; 4] = [-2, -1, 0, 1];

/// Clips laid out left to right on each track with random gaps.
fn sequence() -> impl Strategy<Value = Sequence> {
    let track = prop::collection::vec((0i64..20, 1i64..40), 0..5);
    prop::collection::vec(track, TRACKS.len()).prop_map(|layouts| {
        let mut seq = Sequence::new("Props", Rational::FPS_30, Resolution::HD);
        for (track, layout) in TRACKS.iter().zip(layouts) {
            let mut at = 0;
            for (gap, length) in layout {
                at += gap;
                seq.push_clip(Clip::new("clip", Placement::new(*track, at, at + length)));
                at += length;
            }
        }
        seq
    })
}

fn selection() -> impl Strategy<Value = Selection> {
    (0usize..TRACKS.len(), 0i64..200, 1i64..60)
        .prop_map(|(k, a, length)| Selection::new(TRACKS[k], a, a + length))
}

#[derive(Clone, Debug)]
enum Gesture {
    Split(usize, Frame),
    Delete(Selection, bool),
    Trim(usize, bool, Frame, bool),
    Slide(usize, Frame),
    Move(usize, Frame),
    Link(usize, usize),
    DefaultTransitions(usize),
    DualTransition(usize, Frame),
    Paste(usize, Frame, bool),
    Speed(usize, f64, bool),
}

fn gesture() -> impl Strategy<Value = Gesture> {
    prop_oneof![
        (0usize..16, 0i64..200).prop_map(|(c, f)| Gesture::Split(c, f)),
        (selection(), any::<bool>()).prop_map(|(s, r)| Gesture::Delete(s, r)),
        (0usize..16, any::<bool>(), -30i64..30, any::<bool>())
            .prop_map(|(c, out, d, r)| Gesture::Trim(c, out, d, r)),
        (0usize..16, -30i64..30).prop_map(|(c, d)| Gesture::Slide(c, d)),
        (0usize..16, -50i64..50).prop_map(|(c, d)| Gesture::Move(c, d)),
        (0usize..16, 0usize..16).prop_map(|(a, b)| Gesture::Link(a, b)),
        (0usize..16).prop_map(Gesture::DefaultTransitions),
        (0usize..16, 1i64..15).prop_map(|(c, l)| Gesture::DualTransition(c, l)),
        (0usize..16, 0i64..200, any::<bool>()).prop_map(|(c, f, i)| Gesture::Paste(c, f, i)),
        (0usize..16, prop::sample::select(vec![0.5, 1.5, 2.0, 3.0]), any::<bool>())
            .prop_map(|(c, v, r)| Gesture::Speed(c, v, r)),
    ]
}

/// Apply one gesture, picking clips by position among the live ones.
/// Rejected gestures are fine; they must leave no trace.
fn apply(session: &mut EditSession, gesture: &Gesture) {
    let ids = session.sequence().clip_ids();
    if ids.is_empty() {
        return;
    }
    let pick = |k: usize| ids[k % ids.len()];
    let _ = match gesture {
        Gesture::Split(c, f) => session.split(&[pick(*c)], *f),
        Gesture::Delete(s, ripple) => session.delete_areas(&[*s], *ripple),
        Gesture::Trim(c, out, d, ripple) => {
            let edge = if *out { TrimEdge::Out } else { TrimEdge::In };
            session.trim(pick(*c), edge, *d, *ripple)
        }
        Gesture::Slide(c, d) => session.slide(pick(*c), *d),
        Gesture::Move(c, d) => session.move_clips(&[pick(*c)], *d, 0),
        Gesture::Link(a, b) => session.link(&[pick(*a), pick(*b)]),
        Gesture::DefaultTransitions(c) => session.add_default_transitions(&[pick(*c)]),
        Gesture::DualTransition(c, length) => {
            let seq = session.sequence();
            let clip = pick(*c);
            let Some(placement) = seq.clip(clip).map(|c| c.placement()) else {
                return;
            };
            let Some(partner) = seq.clip_starting_at(placement.track, placement.timeline_out) else {
                return;
            };
            session
                .add_dual_transition(clip, partner, TransitionSide::Closing, TransitionKind::CrossDissolve, *length)
                .map(|_| true)
        }
        Gesture::Paste(c, at, insert) => {
            let Some(p) = session.sequence().clip(pick(*c)).map(|c| c.placement()) else {
                return;
            };
            if session
                .select(vec![Selection::new(p.track, p.timeline_in, p.timeline_out)])
                .is_err()
            {
                return;
            }
            session.copy();
            session.set_playhead(*at);
            session.paste(*insert).map(|ids| !ids.is_empty())
        }
        Gesture::Speed(c, speed, ripple) => session.set_speed(&[pick(*c)], *speed, *ripple),
    };
}

/// The shift a ripple at `point` really applies: never before frame 0 and
/// never into a clip that stays on the same track.
fn ripple_shift(seq: &Sequence, point: Frame, length: Frame) -> Frame {
    let (movers, stays): (Vec<_>, Vec<_>) = seq
        .clips()
        .map(|(_, c)| c.placement())
        .partition(|p| p.timeline_in >= point);
    let Some(earliest) = movers.iter().map(|p| p.timeline_in).min() else {
        return 0;
    };
    if length >= 0 {
        return length;
    }
    let mut lo = -earliest;
    for m in &movers {
        for s in stays.iter().filter(|s| s.track == m.track && s.timeline_out <= m.timeline_in) {
            lo = lo.max(s.timeline_out - m.timeline_in);
        }
    }
    length.max(lo)
}

proptest! {
    #[test]
    fn ripple_shifts_exactly_the_later_clips(
        seq in sequence(),
        point in 0i64..200,
        length in -60i64..60,
    ) {
        let before = seq.clone();
        let mut session = EditSession::new(seq, EditorConfig::default());
        let applied = ripple_shift(&before, point, length);

        session.ripple(point, length).unwrap();
        prop_assert!(session.sequence().check_integrity().is_ok());
        for (id, old) in before.clips() {
            let new = session.sequence().clip(id).unwrap();
            let shift = if old.timeline_in() >= point { applied } else { 0 };
            prop_assert_eq!(new.timeline_in(), old.timeline_in() + shift);
            prop_assert_eq!(new.timeline_out(), old.timeline_out() + shift);
            prop_assert_eq!(new.track(), old.track());
        }
    }

    #[test]
    fn deleted_areas_are_empty(
        seq in sequence(),
        areas in prop::collection::vec(selection(), 1..4),
    ) {
        let before = seq.clone();
        let mut session = EditSession::new(seq, EditorConfig::default());
        session.delete_areas(&areas, false).unwrap();

        let after = session.sequence();
        prop_assert!(after.check_integrity().is_ok());
        for (_, clip) in after.clips() {
            for area in &areas {
                if area.track == clip.track() {
                    prop_assert!(!area.overlaps(clip.timeline_in(), clip.timeline_out()));
                }
            }
        }

        while session.can_undo() {
            session.undo().unwrap();
        }
        prop_assert_eq!(session.sequence(), &before);
    }

    #[test]
    fn undo_restores_and_redo_replays(
        seq in sequence(),
        gestures in prop::collection::vec(gesture(), 1..8),
    ) {
        let before = seq.clone();
        let mut session = EditSession::new(seq, EditorConfig::default());
        for g in &gestures {
            apply(&mut session, g);
            let integrity = session.sequence().check_integrity();
            prop_assert!(integrity.is_ok(), "{:?} broke the sequence: {:?}", g, integrity);
        }
        let edited = session.sequence().clone();

        while session.can_undo() {
            session.undo().unwrap();
        }
        session.set_playhead(before.playhead);
        prop_assert_eq!(session.sequence(), &before);

        while session.can_redo() {
            session.redo().unwrap();
        }
        session.set_playhead(edited.playhead);
        prop_assert_eq!(session.sequence(), &edited);
    }
}

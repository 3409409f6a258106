//! End-to-end editing scenarios through `EditSession`.

use cn_common::{ClipId, EditError, EditorConfig, Frame, Rational, Resolution, Track, TransitionSide};
use cn_edit::{EditEvent, EditSession, TrimEdge};
use cn_timeline::{Clip, Placement, Selection, Sequence, TransitionKind};

fn make_session(clips: &[(Track, Frame, Frame)]) -> (EditSession, Vec<ClipId>) {
    let mut seq = Sequence::new("Scenario", Rational::FPS_30, Resolution::HD);
    let ids = clips
        .iter()
        .map(|(t, a, b)| seq.push_clip(Clip::new("clip", Placement::new(*t, *a, *b))))
        .collect();
    (EditSession::new(seq, EditorConfig::default()), ids)
}

fn span(session: &EditSession, id: ClipId) -> (Frame, Frame) {
    let c = session.sequence().clip(id).expect("clip exists");
    (c.timeline_in(), c.timeline_out())
}

#[test]
fn ripple_delete_across_tracks() {
    let (mut session, ids) = make_session(&[(0, 0, 100), (0, 100, 200), (-1, 50, 150)]);
    let (a, b, c) = (ids[0], ids[1], ids[2]);
    session.select(vec![Selection::new(0, 80, 120)]).unwrap();

    assert!(session.delete_selection(true).unwrap());
    assert_eq!(span(&session, a), (0, 80));
    assert_eq!(span(&session, b), (80, 160));
    assert_eq!(session.sequence().clip(b).unwrap().clip_in(), 20);
    assert_eq!(span(&session, c), (50, 150));
    assert!(session.sequence().selections.is_empty());
    assert!(session.sequence().check_integrity().is_ok());
}

#[test]
fn trimming_in_point_clamps_opening_transition() {
    let (mut session, ids) = make_session(&[(-1, 0, 50)]);
    let opening = session
        .add_transition(ids[0], TransitionSide::Opening, TransitionKind::CrossDissolve, 20)
        .unwrap();
    session.trim(ids[0], TrimEdge::In, 40, false).unwrap();
    assert_eq!(span(&session, ids[0]), (40, 50));
    assert_eq!(session.sequence().transition(opening).unwrap().length, 10);
    assert!(session.sequence().check_integrity().is_ok());
}

#[test]
fn split_identity_and_no_op() {
    let (mut session, ids) = make_session(&[(0, 10, 90)]);
    assert!(!session.split(&ids, 10).unwrap());
    assert!(!session.split(&ids, 90).unwrap());
    assert_eq!(session.history().undo_count(), 0);
    assert_eq!(session.sequence().clip_count(), 1);

    assert!(session.split(&ids, 35).unwrap());
    let post = session.sequence().clip_starting_at(0, 35).unwrap();
    let (pre_in, pre_out) = span(&session, ids[0]);
    let (post_in, post_out) = span(&session, post);
    assert_eq!(pre_out, 35);
    assert_eq!(post_in, 35);
    assert_eq!((pre_out - pre_in) + (post_out - post_in), 80);
}

#[test]
fn link_is_symmetric_and_unlink_wins() {
    let (mut session, ids) = make_session(&[(-1, 0, 10), (0, 0, 10), (1, 0, 10)]);
    let (a, b, c) = (ids[0], ids[1], ids[2]);
    session.link(&[a, b]).unwrap();
    assert!(session.sequence().clip(a).unwrap().linked.contains(&b));
    assert!(session.sequence().clip(b).unwrap().linked.contains(&a));

    assert!(session.toggle_links(&[a, b, c]).unwrap());
    let seq = session.sequence();
    assert!(seq.clip(a).unwrap().linked.is_empty());
    assert!(seq.clip(b).unwrap().linked.is_empty());
    assert!(seq.clip(c).unwrap().linked.is_empty());
}

#[test]
fn undo_everything_restores_original() {
    let (mut session, ids) = make_session(&[(-1, 0, 100), (0, 0, 100), (-1, 100, 160)]);
    let original = session.sequence().clone();

    session.link(&[ids[0], ids[1]]).unwrap();
    session
        .add_dual_transition(ids[0], ids[2], TransitionSide::Closing, TransitionKind::CrossDissolve, 15)
        .unwrap();
    session.split(&[ids[0]], 40).unwrap();
    session.select(vec![Selection::new(-1, 60, 70)]).unwrap();
    session.delete_selection(true).unwrap();
    session.move_clips(&[ids[2]], 30, -1).unwrap();
    session.add_marker(12, "cut here").unwrap();
    let edited = session.sequence().clone();
    assert!(edited.check_integrity().is_ok());

    // Playhead moves are not part of the history.
    while session.can_undo() {
        session.undo().unwrap();
    }
    session.set_playhead(original.playhead);
    assert_eq!(session.sequence(), &original);

    while session.can_redo() {
        session.redo().unwrap();
    }
    session.set_playhead(edited.playhead);
    assert_eq!(session.sequence(), &edited);
}

#[test]
fn subscribers_hear_every_history_change() {
    let (mut session, ids) = make_session(&[(0, 0, 100)]);
    let events = session.subscribe();
    session.split(&ids, 50).unwrap();
    session.undo().unwrap();
    session.redo().unwrap();

    let received: Vec<EditEvent> = events.try_iter().collect();
    assert_eq!(
        received,
        vec![
            EditEvent::Committed { label: "Split".to_string() },
            EditEvent::Undone { label: "Split".to_string() },
            EditEvent::Redone { label: "Split".to_string() },
        ]
    );
}

#[test]
fn structural_errors_are_reported() {
    let (mut session, _) = make_session(&[(0, 0, 100)]);
    assert_eq!(session.undo().unwrap_err(), EditError::NothingToUndo);
    assert_eq!(session.redo().unwrap_err(), EditError::NothingToRedo);
    assert_eq!(
        session.split(&[ClipId(7)], 10).unwrap_err(),
        EditError::ClipNotFound(ClipId(7))
    );
    assert_eq!(
        session.delete_transition(cn_common::TransitionId(0)).unwrap_err(),
        EditError::TransitionNotFound(cn_common::TransitionId(0))
    );
}

#[test]
fn ripple_edits_leave_other_tracks_unbroken() {
    let layout = [(0, 0, 50), (1, 0, 100), (1, 100, 150)];

    let (mut session, ids) = make_session(&layout);
    session.trim(ids[0], TrimEdge::Out, -20, true).unwrap();
    assert_eq!(span(&session, ids[0]), (0, 30));
    assert_eq!(span(&session, ids[2]), (100, 150));
    assert!(session.sequence().check_integrity().is_ok());

    let (mut session, ids) = make_session(&layout);
    session.set_speed(&ids[..1], 2.0, true).unwrap();
    assert_eq!(span(&session, ids[0]), (0, 25));
    assert_eq!(span(&session, ids[2]), (100, 150));
    assert!(session.sequence().check_integrity().is_ok());
}

#[test]
fn ripple_delete_stops_at_clip_ending_on_the_area() {
    let (mut session, ids) = make_session(&[(-1, 2, 6), (-1, 7, 32)]);
    session.delete_areas(&[Selection::new(-2, 5, 7)], true).unwrap();
    assert_eq!(span(&session, ids[0]), (2, 6));
    assert_eq!(span(&session, ids[1]), (6, 31));
    assert!(session.sequence().check_integrity().is_ok());
}

#[test]
fn moving_onto_a_dual_transition_clears_the_clips() {
    let (mut session, ids) = make_session(&[(0, 0, 20), (0, 20, 40), (0, 40, 61), (0, 61, 66)]);
    session
        .add_dual_transition(ids[1], ids[2], TransitionSide::Closing, TransitionKind::CrossDissolve, 10)
        .unwrap();
    let before = session.sequence().clone();

    assert!(session.move_clips(&ids[..1], 30, 0).unwrap());
    assert_eq!(span(&session, ids[0]), (30, 50));
    assert_eq!(span(&session, ids[1]), (20, 30));
    assert_eq!(span(&session, ids[2]), (50, 61));
    assert_eq!(span(&session, ids[3]), (61, 66));
    assert_eq!(session.sequence().transition_count(), 0);
    assert!(session.sequence().check_integrity().is_ok());

    session.undo().unwrap();
    assert_eq!(session.sequence(), &before);
}

#[test]
fn pasting_over_a_dual_transition_clears_the_clips() {
    let (mut session, ids) = make_session(&[(0, 0, 50), (0, 50, 100), (0, 200, 220)]);
    session
        .add_dual_transition(ids[0], ids[1], TransitionSide::Closing, TransitionKind::CrossDissolve, 10)
        .unwrap();
    session.select(vec![Selection::new(0, 200, 220)]).unwrap();
    session.copy();
    session.set_playhead(40);

    let pasted = session.paste(false).unwrap();
    assert_eq!(span(&session, ids[0]), (0, 40));
    assert_eq!(span(&session, ids[1]), (60, 100));
    assert_eq!(span(&session, pasted[0]), (40, 60));
    assert_eq!(session.sequence().transition_count(), 0);
    assert!(session.sequence().check_integrity().is_ok());
}

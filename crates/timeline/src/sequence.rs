//! Sequences: the clip and transition arenas plus sequence-level state.
//!
//! Clips and transitions live in index-stable arenas. Removing an entry leaves
//! an empty slot so every other id stays valid, and undo can put the entry
//! back at the same id. Empty slots at the end of an arena are trimmed, so a
//! sequence returned to an earlier state compares equal to it.

use std::collections::HashMap;

use cn_common::{
    ClipId, EditError, EditResult, Frame, Rational, Resolution, Track, TransitionId,
    TransitionSide,
};
use serde::{Deserialize, Serialize};

use crate::clip::Clip;
use crate::selection::Selection;
use crate::transition::Transition;

/// A named point on the timeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub frame: Frame,
    pub name: String,
    /// RGB color.
    #[serde(default)]
    pub color: [u8; 3],
}

/// Sequence in/out range used for rendering and ripple-delete scoping.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workarea {
    pub enabled: bool,
    pub timeline_in: Frame,
    pub timeline_out: Frame,
}

/// A clip copied out of a sequence, with its single-clip transitions.
///
/// The clip's transition ids and links are cleared; whoever inserts it
/// decides the new ones.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetachedClip {
    pub clip: Clip,
    pub opening: Option<Transition>,
    pub closing: Option<Transition>,
}

impl DetachedClip {
    /// Wrap a clip with no transitions.
    pub fn bare(mut clip: Clip) -> Self {
        clip.opening_transition = None;
        clip.closing_transition = None;
        Self {
            clip,
            opening: None,
            closing: None,
        }
    }

    pub fn transition(&self, side: TransitionSide) -> Option<&Transition> {
        match side {
            TransitionSide::Opening => self.opening.as_ref(),
            TransitionSide::Closing => self.closing.as_ref(),
        }
    }

    pub fn transition_mut(&mut self, side: TransitionSide) -> Option<&mut Transition> {
        match side {
            TransitionSide::Opening => self.opening.as_mut(),
            TransitionSide::Closing => self.closing.as_mut(),
        }
    }
}

/// A timeline of clips on signed tracks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sequence {
    pub name: String,
    pub resolution: Resolution,
    pub frame_rate: Rational,
    pub audio_frequency: u32,
    pub audio_channels: u16,
    pub playhead: Frame,
    #[serde(default)]
    pub workarea: Workarea,
    #[serde(default)]
    pub markers: Vec<Marker>,
    /// Current selection. Not persisted.
    #[serde(skip)]
    pub selections: Vec<Selection>,
    clips: Vec<Option<Clip>>,
    transitions: Vec<Option<Transition>>,
}

fn trim_trailing<T>(slots: &mut Vec<Option<T>>) {
    while matches!(slots.last(), Some(None)) {
        slots.pop();
    }
}

impl Sequence {
    pub fn new(name: impl Into<String>, frame_rate: Rational, resolution: Resolution) -> Self {
        Self {
            name: name.into(),
            resolution,
            frame_rate,
            audio_frequency: 48_000,
            audio_channels: 2,
            playhead: 0,
            workarea: Workarea::default(),
            markers: Vec::new(),
            selections: Vec::new(),
            clips: Vec::new(),
            transitions: Vec::new(),
        }
    }

    // ── Clip arena ───────────────────────────────────────────────

    pub fn clip(&self, id: ClipId) -> Option<&Clip> {
        self.clips.get(id.index()).and_then(Option::as_ref)
    }

    pub fn clip_mut(&mut self, id: ClipId) -> Option<&mut Clip> {
        self.clips.get_mut(id.index()).and_then(Option::as_mut)
    }

    pub fn require_clip(&self, id: ClipId) -> EditResult<&Clip> {
        self.clip(id).ok_or(EditError::ClipNotFound(id))
    }

    pub fn require_clip_mut(&mut self, id: ClipId) -> EditResult<&mut Clip> {
        self.clip_mut(id).ok_or(EditError::ClipNotFound(id))
    }

    /// Live clips in id order.
    pub fn clips(&self) -> impl Iterator<Item = (ClipId, &Clip)> {
        self.clips
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.as_ref().map(|c| (ClipId(i), c)))
    }

    pub fn clip_ids(&self) -> Vec<ClipId> {
        self.clips().map(|(id, _)| id).collect()
    }

    pub fn clip_count(&self) -> usize {
        self.clips.iter().filter(|c| c.is_some()).count()
    }

    /// Number of arena slots, including empty ones.
    pub fn clip_slots(&self) -> usize {
        self.clips.len()
    }

    /// Append a clip and return its new id.
    pub fn push_clip(&mut self, clip: Clip) -> ClipId {
        self.clips.push(Some(clip));
        ClipId(self.clips.len() - 1)
    }

    /// Put a clip back at a specific id. The slot must be empty.
    pub fn insert_clip(&mut self, id: ClipId, clip: Clip) -> EditResult<()> {
        if self.clip(id).is_some() {
            return Err(EditError::ClipSlotOccupied(id));
        }
        if self.clips.len() <= id.index() {
            self.clips.resize_with(id.index() + 1, || None);
        }
        self.clips[id.index()] = Some(clip);
        Ok(())
    }

    /// Remove a clip from the arena, leaving its slot empty.
    pub fn take_clip(&mut self, id: ClipId) -> EditResult<Clip> {
        let clip = self
            .clips
            .get_mut(id.index())
            .and_then(Option::take)
            .ok_or(EditError::ClipNotFound(id))?;
        trim_trailing(&mut self.clips);
        Ok(clip)
    }

    // ── Transition arena ─────────────────────────────────────────

    pub fn transition(&self, id: TransitionId) -> Option<&Transition> {
        self.transitions.get(id.index()).and_then(Option::as_ref)
    }

    pub fn transition_mut(&mut self, id: TransitionId) -> Option<&mut Transition> {
        self.transitions.get_mut(id.index()).and_then(Option::as_mut)
    }

    pub fn require_transition(&self, id: TransitionId) -> EditResult<&Transition> {
        self.transition(id).ok_or(EditError::TransitionNotFound(id))
    }

    pub fn require_transition_mut(&mut self, id: TransitionId) -> EditResult<&mut Transition> {
        self.transition_mut(id)
            .ok_or(EditError::TransitionNotFound(id))
    }

    pub fn transitions(&self) -> impl Iterator<Item = (TransitionId, &Transition)> {
        self.transitions
            .iter()
            .enumerate()
            .filter_map(|(i, t)| t.as_ref().map(|t| (TransitionId(i), t)))
    }

    pub fn transition_count(&self) -> usize {
        self.transitions.iter().filter(|t| t.is_some()).count()
    }

    pub fn push_transition(&mut self, transition: Transition) -> TransitionId {
        self.transitions.push(Some(transition));
        TransitionId(self.transitions.len() - 1)
    }

    pub fn insert_transition(&mut self, id: TransitionId, transition: Transition) -> EditResult<()> {
        if self.transition(id).is_some() {
            return Err(EditError::TransitionSlotOccupied(id));
        }
        if self.transitions.len() <= id.index() {
            self.transitions.resize_with(id.index() + 1, || None);
        }
        self.transitions[id.index()] = Some(transition);
        Ok(())
    }

    pub fn take_transition(&mut self, id: TransitionId) -> EditResult<Transition> {
        let transition = self
            .transitions
            .get_mut(id.index())
            .and_then(Option::take)
            .ok_or(EditError::TransitionNotFound(id))?;
        trim_trailing(&mut self.transitions);
        Ok(transition)
    }

    // ── Queries ──────────────────────────────────────────────────

    /// The transition on `side` of `clip`, if both exist.
    pub fn clip_transition(
        &self,
        clip: ClipId,
        side: TransitionSide,
    ) -> Option<(TransitionId, &Transition)> {
        let id = self.clip(clip)?.transition(side)?;
        self.transition(id).map(|t| (id, t))
    }

    /// Live partner of `clip` through the transition on `side`, if that
    /// transition is dual.
    pub fn dual_partner(&self, clip: ClipId, side: TransitionSide) -> Option<ClipId> {
        let (_, t) = self.clip_transition(clip, side)?;
        let other = t.other_clip(clip)?;
        self.clip(other).map(|_| other)
    }

    /// Timeline span a transition covers, seen from `clip` on `side`.
    ///
    /// A dual transition of length `L` at boundary `B` covers `[B-L, B+L)`.
    /// A single opening covers `[in, in+L)`, a single closing `[out-L, out)`.
    pub fn transition_span(&self, clip: ClipId, side: TransitionSide) -> Option<(Frame, Frame)> {
        let c = self.clip(clip)?;
        let (_, t) = self.clip_transition(clip, side)?;
        let dual = t.other_clip(clip).is_some_and(|o| self.clip(o).is_some());
        let span = match (side, dual) {
            (TransitionSide::Opening, false) => (c.timeline_in(), c.timeline_in() + t.length),
            (TransitionSide::Closing, false) => (c.timeline_out() - t.length, c.timeline_out()),
            (TransitionSide::Opening, true) => {
                (c.timeline_in() - t.length, c.timeline_in() + t.length)
            }
            (TransitionSide::Closing, true) => {
                (c.timeline_out() - t.length, c.timeline_out() + t.length)
            }
        };
        Some(span)
    }

    /// Whether `selection` covers exactly the transition on `side` of `clip`.
    pub fn selection_contains_transition(
        &self,
        selection: &Selection,
        clip: ClipId,
        side: TransitionSide,
    ) -> bool {
        self.transition_span(clip, side)
            .is_some_and(|(a, b)| selection.timeline_in == a && selection.timeline_out == b)
    }

    /// Whether a clip is touched by (or, with `containing`, entirely inside)
    /// a current selection on its track.
    pub fn is_clip_selected(&self, id: ClipId, containing: bool) -> bool {
        let Some(clip) = self.clip(id) else {
            return false;
        };
        let p = clip.placement();
        self.selections.iter().any(|s| {
            s.track == p.track
                && if containing {
                    s.contains(p.timeline_in, p.timeline_out)
                } else {
                    s.overlaps(p.timeline_in, p.timeline_out)
                }
        })
    }

    /// Ids of all selected clips, in id order.
    pub fn selected_clips(&self, containing: bool) -> Vec<ClipId> {
        self.clips()
            .filter(|(id, _)| self.is_clip_selected(*id, containing))
            .map(|(id, _)| id)
            .collect()
    }

    /// Clips on `track`, sorted by in point.
    pub fn clips_on_track(&self, track: Track) -> Vec<ClipId> {
        let mut ids: Vec<(Frame, ClipId)> = self
            .clips()
            .filter(|(_, c)| c.track() == track)
            .map(|(id, c)| (c.timeline_in(), id))
            .collect();
        ids.sort();
        ids.into_iter().map(|(_, id)| id).collect()
    }

    /// Clips that `frame` falls strictly inside.
    pub fn clips_spanning(&self, frame: Frame) -> Vec<ClipId> {
        self.clips()
            .filter(|(_, c)| c.spans(frame))
            .map(|(id, _)| id)
            .collect()
    }

    /// The clip on `track` whose out point is exactly `frame`.
    pub fn clip_ending_at(&self, track: Track, frame: Frame) -> Option<ClipId> {
        self.clips()
            .find(|(_, c)| c.track() == track && c.timeline_out() == frame)
            .map(|(id, _)| id)
    }

    /// The clip on `track` whose in point is exactly `frame`.
    pub fn clip_starting_at(&self, track: Track, frame: Frame) -> Option<ClipId> {
        self.clips()
            .find(|(_, c)| c.track() == track && c.timeline_in() == frame)
            .map(|(id, _)| id)
    }

    /// Last frame occupied by any clip.
    pub fn end_frame(&self) -> Frame {
        self.clips().map(|(_, c)| c.timeline_out()).max().unwrap_or(0)
    }

    /// Copy a clip out of the sequence.
    ///
    /// Single-clip transitions come along. Dual transitions do not: copying
    /// one side of a shared transition would leave a half that refers to a
    /// clip outside the copy.
    pub fn copy_clip(&self, id: ClipId) -> EditResult<DetachedClip> {
        let source = self.require_clip(id)?;
        let mut clip = source.clone();
        clip.linked.clear();
        clip.opening_transition = None;
        clip.closing_transition = None;

        let copy_side = |side: TransitionSide| {
            self.clip_transition(id, side)
                .filter(|(_, t)| !t.is_dual())
                .map(|(_, t)| t.clone())
        };
        Ok(DetachedClip {
            clip,
            opening: copy_side(TransitionSide::Opening),
            closing: copy_side(TransitionSide::Closing),
        })
    }

    // ── Integrity ────────────────────────────────────────────────

    /// Check every structural invariant and report the first violation.
    pub fn check_integrity(&self) -> EditResult<()> {
        let invalid = |reason: String| {
            tracing::debug!(sequence = %self.name, %reason, "Integrity check failed");
            Err(EditError::InvalidSequence { reason })
        };

        let mut by_track: HashMap<Track, Vec<(Frame, Frame, ClipId)>> = HashMap::new();
        for (id, clip) in self.clips() {
            let p = clip.placement();
            if p.timeline_in >= p.timeline_out {
                return invalid(format!("{id} has empty range [{}, {})", p.timeline_in, p.timeline_out));
            }
            if p.timeline_in < 0 || p.clip_in < 0 {
                return invalid(format!("{id} starts before frame 0"));
            }
            if !clip.fits_media(p.clip_in, p.length()) {
                return invalid(format!("{id} reads past the end of its media"));
            }
            for link in &clip.linked {
                if *link == id {
                    return invalid(format!("{id} is linked to itself"));
                }
                if self.clip(*link).is_none() {
                    return invalid(format!("{id} links to missing clip {link}"));
                }
            }
            for side in TransitionSide::BOTH {
                let Some(tid) = clip.transition(side) else {
                    continue;
                };
                let Some(t) = self.transition(tid) else {
                    return invalid(format!("{id} refers to missing transition {tid}"));
                };
                if !t.involves(id) {
                    return invalid(format!("{tid} does not belong to {id}"));
                }
                if t.length > p.length() {
                    return invalid(format!("{tid} is longer than {id}"));
                }
            }
            by_track
                .entry(p.track)
                .or_default()
                .push((p.timeline_in, p.timeline_out, id));
        }

        for (track, mut spans) in by_track {
            spans.sort();
            for pair in spans.windows(2) {
                if pair[0].1 > pair[1].0 {
                    return invalid(format!(
                        "{} and {} overlap on track {track}",
                        pair[0].2, pair[1].2
                    ));
                }
            }
        }

        for (tid, t) in self.transitions() {
            if t.length <= 0 {
                return invalid(format!("{tid} has length {}", t.length));
            }
            let Some(parent) = self.clip(t.parent) else {
                return invalid(format!("{tid} has missing parent {}", t.parent));
            };
            let Some(side) = parent.side_of(tid) else {
                return invalid(format!("{tid} is not attached to its parent {}", t.parent));
            };
            if let Some(secondary_id) = t.secondary {
                let Some(secondary) = self.clip(secondary_id) else {
                    return invalid(format!("{tid} has missing secondary {secondary_id}"));
                };
                if secondary.transition(side.opposite()) != Some(tid) {
                    return invalid(format!("{secondary_id} does not hold {tid} on its {}", side.opposite()));
                }
                let adjacent = match side {
                    TransitionSide::Opening => secondary.timeline_out() == parent.timeline_in(),
                    TransitionSide::Closing => parent.timeline_out() == secondary.timeline_in(),
                };
                if !adjacent || secondary.track() != parent.track() {
                    return invalid(format!("{tid} joins clips that are not adjacent"));
                }
            }
        }

        Ok(())
    }
}

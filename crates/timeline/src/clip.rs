//! Clips: timeline placements of media.

use cn_common::{is_video_track, ClipId, Frame, Rational, Track, TransitionId, TransitionSide};
use serde::{Deserialize, Serialize};

use crate::effect::Effect;
use crate::media::Media;
use crate::published::{Published, PublishedReader};

/// The fields of a clip that background readers need: where the clip sits on
/// the timeline and which part of its media it plays.
///
/// Published as one value so readers never see `timeline_in` from one edit
/// and `timeline_out` from another.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// First frame on the timeline (inclusive).
    pub timeline_in: Frame,
    /// End frame on the timeline (exclusive).
    pub timeline_out: Frame,
    /// Offset into the source media.
    pub clip_in: Frame,
    pub track: Track,
    /// Which stream of the media this clip plays.
    pub media_stream: usize,
    /// Playback rate multiplier.
    pub speed: f64,
}

impl Placement {
    pub fn new(track: Track, timeline_in: Frame, timeline_out: Frame) -> Self {
        Self {
            timeline_in,
            timeline_out,
            clip_in: 0,
            track,
            media_stream: 0,
            speed: 1.0,
        }
    }

    pub fn length(&self) -> Frame {
        self.timeline_out - self.timeline_in
    }
}

/// A clip on a sequence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub placement: Published<Placement>,
    pub enabled: bool,
    pub name: String,
    /// Display color (RGB).
    pub color: [u8; 3],
    /// `None` for generated content (titles, solids, tone).
    pub media: Option<Media>,
    pub reverse: bool,
    pub maintain_audio_pitch: bool,
    pub autoscale: bool,
    /// Clips that move, select and delete together with this one.
    #[serde(default)]
    pub linked: Vec<ClipId>,
    #[serde(default)]
    pub opening_transition: Option<TransitionId>,
    #[serde(default)]
    pub closing_transition: Option<TransitionId>,
    #[serde(default)]
    pub effects: Vec<Effect>,
    /// Longest the clip may be (`clip_in + length`). `None` is unbounded.
    #[serde(default)]
    pub max_length: Option<Frame>,
}

impl Clip {
    pub fn new(name: impl Into<String>, placement: Placement) -> Self {
        Self {
            placement: Published::new(placement),
            enabled: true,
            name: name.into(),
            color: [128, 128, 192],
            media: None,
            reverse: false,
            maintain_audio_pitch: true,
            autoscale: true,
            linked: Vec::new(),
            opening_transition: None,
            closing_transition: None,
            effects: Vec::new(),
            max_length: None,
        }
    }

    /// Attach media and derive the maximum length from it.
    pub fn with_media(mut self, media: Media, stream: usize, seq_rate: Rational) -> Self {
        self.placement.update(|p| p.media_stream = stream);
        self.media = Some(media);
        self.recalculate_max_length(seq_rate);
        self
    }

    pub fn placement(&self) -> Placement {
        self.placement.get()
    }

    pub fn set_placement(&mut self, placement: Placement) {
        self.placement.set(placement);
    }

    /// Reader handle for threads that need to follow this clip's placement.
    pub fn placement_reader(&self) -> PublishedReader<Placement> {
        self.placement.reader()
    }

    pub fn timeline_in(&self) -> Frame {
        self.placement.with(|p| p.timeline_in)
    }

    pub fn timeline_out(&self) -> Frame {
        self.placement.with(|p| p.timeline_out)
    }

    pub fn clip_in(&self) -> Frame {
        self.placement.with(|p| p.clip_in)
    }

    pub fn track(&self) -> Track {
        self.placement.with(|p| p.track)
    }

    pub fn speed(&self) -> f64 {
        self.placement.with(|p| p.speed)
    }

    pub fn length(&self) -> Frame {
        self.placement.with(Placement::length)
    }

    pub fn is_video(&self) -> bool {
        is_video_track(self.track())
    }

    /// Whether `frame` falls strictly inside the clip, so a split there
    /// produces two non-empty halves.
    pub fn spans(&self, frame: Frame) -> bool {
        self.placement
            .with(|p| p.timeline_in < frame && frame < p.timeline_out)
    }

    pub fn transition(&self, side: TransitionSide) -> Option<TransitionId> {
        match side {
            TransitionSide::Opening => self.opening_transition,
            TransitionSide::Closing => self.closing_transition,
        }
    }

    pub fn set_transition(&mut self, side: TransitionSide, id: Option<TransitionId>) {
        match side {
            TransitionSide::Opening => self.opening_transition = id,
            TransitionSide::Closing => self.closing_transition = id,
        }
    }

    /// Which side of this clip holds `id`, if any.
    pub fn side_of(&self, id: TransitionId) -> Option<TransitionSide> {
        if self.opening_transition == Some(id) {
            Some(TransitionSide::Opening)
        } else if self.closing_transition == Some(id) {
            Some(TransitionSide::Closing)
        } else {
            None
        }
    }

    /// Whether the media can supply `length` frames starting at `clip_in`.
    pub fn fits_media(&self, clip_in: Frame, length: Frame) -> bool {
        match self.max_length {
            Some(max) => clip_in + length <= max,
            None => true,
        }
    }

    /// Recompute `max_length` from the media, stream and speed.
    /// Must run whenever the speed or media changes.
    pub fn recalculate_max_length(&mut self, seq_rate: Rational) {
        let placement = self.placement();
        self.max_length = self
            .media
            .as_ref()
            .and_then(|m| m.max_length(placement.media_stream, seq_rate, placement.speed));
    }

    /// Rescale the clip's timing by `multiplier`.
    ///
    /// Keyframes on every effect field are always rescaled. The timeline
    /// points and `clip_in` only move when `change_timeline_points` is set.
    pub fn refactor_frame_rate(&mut self, multiplier: f64, change_timeline_points: bool) {
        if change_timeline_points {
            let scale = |f: Frame| (f as f64 * multiplier).round() as Frame;
            self.placement.update(|p| {
                p.timeline_in = scale(p.timeline_in);
                p.timeline_out = scale(p.timeline_out);
                p.clip_in = scale(p.clip_in);
            });
        }
        for effect in &mut self.effects {
            effect.refactor_keyframes(multiplier);
        }
    }

    /// Add `other` to the link list if absent.
    pub fn link(&mut self, other: ClipId) {
        if !self.linked.contains(&other) {
            self.linked.push(other);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::Keyframe;
    use crate::media::{MediaStream, StreamKind};

    fn make_clip(track: Track, timeline_in: Frame, timeline_out: Frame) -> Clip {
        Clip::new("clip", Placement::new(track, timeline_in, timeline_out))
    }

    #[test]
    fn length_and_spans() {
        let clip = make_clip(0, 10, 40);
        assert_eq!(clip.length(), 30);
        assert!(clip.spans(11));
        assert!(!clip.spans(10));
        assert!(!clip.spans(40));
        assert!(!clip.is_video());
        assert!(make_clip(-1, 0, 1).is_video());
    }

    #[test]
    fn transition_sides() {
        let mut clip = make_clip(0, 0, 10);
        clip.set_transition(TransitionSide::Closing, Some(TransitionId(3)));
        assert_eq!(clip.closing_transition, Some(TransitionId(3)));
        assert_eq!(clip.side_of(TransitionId(3)), Some(TransitionSide::Closing));
        assert_eq!(clip.side_of(TransitionId(4)), None);
        assert_eq!(clip.transition(TransitionSide::Opening), None);
    }

    #[test]
    fn max_length_from_media() {
        let media = Media::Footage {
            id: "m".to_string(),
            name: "m.mov".to_string(),
            duration_secs: 4.0,
            streams: vec![MediaStream {
                file_index: 0,
                kind: StreamKind::Video,
                infinite_length: false,
            }],
        };
        let mut clip = make_clip(-1, 0, 60).with_media(media, 0, Rational::FPS_30);
        assert_eq!(clip.max_length, Some(120));
        assert!(clip.fits_media(60, 60));
        assert!(!clip.fits_media(61, 60));

        clip.placement.update(|p| p.speed = 2.0);
        clip.recalculate_max_length(Rational::FPS_30);
        assert_eq!(clip.max_length, Some(60));
    }

    #[test]
    fn generated_clip_is_unbounded() {
        let mut clip = make_clip(-1, 0, 10);
        clip.recalculate_max_length(Rational::FPS_30);
        assert_eq!(clip.max_length, None);
        assert!(clip.fits_media(1_000_000, 1_000_000));
    }

    #[test]
    fn refactor_frame_rate_moves_points_and_keys() {
        let mut clip = make_clip(0, 10, 20);
        clip.placement.update(|p| p.clip_in = 5);
        let mut effect = Effect::new("Volume").with_field("volume", 1.0);
        effect.fields[0].keyframes.push(Keyframe {
            frame: 4,
            value: 0.5,
        });
        clip.effects.push(effect);

        clip.refactor_frame_rate(2.0, true);
        assert_eq!(clip.timeline_in(), 20);
        assert_eq!(clip.timeline_out(), 40);
        assert_eq!(clip.clip_in(), 10);
        assert_eq!(clip.effects[0].fields[0].keyframes[0].frame, 8);

        clip.refactor_frame_rate(0.5, false);
        assert_eq!(clip.timeline_in(), 20);
        assert_eq!(clip.effects[0].fields[0].keyframes[0].frame, 4);
    }

    #[test]
    fn link_is_deduplicated() {
        let mut clip = make_clip(0, 0, 10);
        clip.link(ClipId(2));
        clip.link(ClipId(2));
        assert_eq!(clip.linked, vec![ClipId(2)]);
    }

    #[test]
    fn reader_follows_placement() {
        let mut clip = make_clip(0, 0, 10);
        let reader = clip.placement_reader();
        clip.set_placement(Placement::new(0, 5, 15));
        assert_eq!(reader.get().timeline_in, 5);
    }
}

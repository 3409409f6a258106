//! Transitions at clip boundaries.
//!
//! A transition is owned by its `parent` clip. When `secondary` is set it is a
//! dual transition shared with an adjacent clip, which refers to the same
//! transition id from the opposite side: an opening transition on the post
//! clip is the closing transition of the pre clip.

use cn_common::{ClipId, DefaultTransition, Frame};
use serde::{Deserialize, Serialize};

/// Direction for slide transitions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlideDirection {
    Left,
    Right,
    Up,
    Down,
}

/// Types of transitions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TransitionKind {
    /// Blend between outgoing and incoming picture.
    CrossDissolve,
    /// Fade through black.
    DipToBlack,
    /// Wipe at a given angle in degrees.
    Wipe { angle: f32 },
    /// Slide in a direction.
    Slide { direction: SlideDirection },
    LinearFade,
    ExponentialFade,
    LogarithmicFade,
}

impl TransitionKind {
    /// Whether this kind applies to audio clips.
    pub fn is_audio(&self) -> bool {
        matches!(
            self,
            TransitionKind::LinearFade
                | TransitionKind::ExponentialFade
                | TransitionKind::LogarithmicFade
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            TransitionKind::CrossDissolve => "Cross Dissolve",
            TransitionKind::DipToBlack => "Dip to Black",
            TransitionKind::Wipe { .. } => "Wipe",
            TransitionKind::Slide { .. } => "Slide",
            TransitionKind::LinearFade => "Linear Fade",
            TransitionKind::ExponentialFade => "Exponential Fade",
            TransitionKind::LogarithmicFade => "Logarithmic Fade",
        }
    }
}

impl From<DefaultTransition> for TransitionKind {
    fn from(kind: DefaultTransition) -> Self {
        match kind {
            DefaultTransition::CrossDissolve => TransitionKind::CrossDissolve,
            DefaultTransition::DipToBlack => TransitionKind::DipToBlack,
            DefaultTransition::LinearFade => TransitionKind::LinearFade,
            DefaultTransition::ExponentialFade => TransitionKind::ExponentialFade,
            DefaultTransition::LogarithmicFade => TransitionKind::LogarithmicFade,
        }
    }
}

/// A transition on one clip edge, or shared by two adjacent clips.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub kind: TransitionKind,
    /// Length in frames on each clip it touches.
    pub length: Frame,
    /// Owning clip.
    pub parent: ClipId,
    /// Partner clip for dual transitions. Non-owning; may refer to a deleted slot.
    #[serde(default)]
    pub secondary: Option<ClipId>,
}

impl Transition {
    pub fn new(kind: TransitionKind, parent: ClipId, length: Frame) -> Self {
        Self {
            kind,
            length,
            parent,
            secondary: None,
        }
    }

    pub fn dual(kind: TransitionKind, parent: ClipId, secondary: ClipId, length: Frame) -> Self {
        Self {
            kind,
            length,
            parent,
            secondary: Some(secondary),
        }
    }

    pub fn is_dual(&self) -> bool {
        self.secondary.is_some()
    }

    /// Whether `clip` is the parent or secondary of this transition.
    pub fn involves(&self, clip: ClipId) -> bool {
        self.parent == clip || self.secondary == Some(clip)
    }

    /// The clip on the other side of a dual transition, seen from `clip`.
    pub fn other_clip(&self, clip: ClipId) -> Option<ClipId> {
        if self.parent == clip {
            self.secondary
        } else if self.secondary == Some(clip) {
            Some(self.parent)
        } else {
            None
        }
    }
}

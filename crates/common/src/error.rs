//! Central error types for the edit core (thiserror-based).
//!
//! Only structural misuse is reported as an error. Gestures that have nothing
//! to do (a split outside the clip, an empty selection) succeed with a
//! "nothing happened" value instead.

use thiserror::Error;

use crate::types::{ClipId, Frame, Track, TransitionId, TransitionSide};

/// Structural errors raised by the edit core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditError {
    #[error("Clip not found: {0}")]
    ClipNotFound(ClipId),

    #[error("Transition not found: {0}")]
    TransitionNotFound(TransitionId),

    #[error("Marker index out of range: {index}")]
    MarkerNotFound { index: usize },

    #[error("Arena slot already occupied: {0}")]
    ClipSlotOccupied(ClipId),

    #[error("Arena slot already occupied: {0}")]
    TransitionSlotOccupied(TransitionId),

    #[error("Clip {clip} cannot move from track {from} to track {to}: video and audio halves are fixed")]
    TrackHalfChanged { clip: ClipId, from: Track, to: Track },

    #[error("Invalid clip range [{timeline_in}, {timeline_out}) for {clip}")]
    InvalidRange {
        clip: ClipId,
        timeline_in: Frame,
        timeline_out: Frame,
    },

    #[error("Clip {clip} would read past the end of its media ({needed} > {available} frames)")]
    ExceedsMediaLength {
        clip: ClipId,
        needed: Frame,
        available: Frame,
    },

    #[error("Clip {clip} already has an {side} transition")]
    SideOccupied { clip: ClipId, side: TransitionSide },

    #[error("Clips {pre} and {post} are not adjacent")]
    NotAdjacent { pre: ClipId, post: ClipId },

    #[error("Invalid transition length: {length}")]
    InvalidTransitionLength { length: Frame },

    #[error("Invalid playback speed: {speed}")]
    InvalidSpeed { speed: f64 },

    #[error("Clip {0} was never split in this edit")]
    NotSplit(ClipId),

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,

    #[error("Invalid sequence: {reason}")]
    InvalidSequence { reason: String },
}

/// Convenience Result type for edit operations.
pub type EditResult<T> = Result<T, EditError>;

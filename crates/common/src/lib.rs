//! `cn-common` -- Shared types, frame arithmetic, errors and configuration for
//! the Chestnut edit core.
//!
//! - **Types**: `ClipId`, `TransitionId`, `Frame`, `Track`, `Rational`, `Resolution`
//! - **Timebase**: screen/frame conversion and frame-rate refactoring
//! - **Errors**: `EditError`, `EditResult` (thiserror-based)
//! - **Config**: `EditorConfig`

pub mod config;
pub mod error;
pub mod timebase;
pub mod types;

// Re-export commonly used items at crate root
pub use config::{DefaultTransition, EditorConfig};
pub use error::{EditError, EditResult};
pub use timebase::{
    frame_to_screen_point, refactor_frame_number, refactor_frame_number_rational,
    screen_point_to_frame, seconds_to_frames,
};
pub use types::{is_video_track, ClipId, Frame, Rational, Resolution, Track, TransitionId, TransitionSide};

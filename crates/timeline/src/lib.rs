//! `cn-timeline` -- Sequence data model for the Chestnut edit core.
//!
//! - **Clips**: `Clip` with its published `Placement`, links and transition slots
//! - **Transitions**: single-clip fades and dual transitions between adjacent clips
//! - **Sequence**: index-stable clip and transition arenas, markers, workarea
//! - **Selections**: per-track intervals and their clean-up
//!
//! All cross references are arena ids (`ClipId`, `TransitionId`). Nothing in
//! this crate records undo state; `cn-edit` builds the command log on top.

pub mod clip;
pub mod effect;
pub mod media;
pub mod published;
pub mod selection;
pub mod sequence;
pub mod transition;

pub use clip::{Clip, Placement};
pub use effect::{Effect, EffectField, Keyframe};
pub use media::{Media, MediaStream, StreamKind};
pub use published::{Published, PublishedReader};
pub use selection::{clean_up_selections, deselect_area, Selection};
pub use sequence::{DetachedClip, Marker, Sequence, Workarea};
pub use transition::{SlideDirection, Transition, TransitionKind};

//! `cn-edit` -- Undoable editing of Chestnut sequences.
//!
//! This crate provides:
//!
//! - **`Command`**: the closed set of primitive edits, each able to undo itself.
//! - **`ComboAction`**: an ordered batch of commands applied and undone as one.
//! - **`History`**: bounded undo/redo stacks of combos.
//! - **`EditSession`**: a sequence with its history, clipboard and gestures.
//! - **Algorithms**: split, delete, ripple, trim, slip, slide, move, speed,
//!   link, transition placement and paste, all written against an [`Edit`]
//!   transaction.
//!
//! # Architecture
//!
//! ```text
//! EditSession
//! ├── sequence: Sequence        (the timeline being edited)
//! ├── history: History          (undo_stack / redo_stack of ComboAction)
//! ├── clipboard: Clipboard      (detached copies + source frame rate)
//! └── subscribers               (EditEvent channels)
//!
//! gesture -> begin_edit() -> algorithm appends Commands -> commit()
//! ```

pub mod clipboard;
pub mod combo;
pub mod commands;
pub mod delete;
pub mod history;
pub mod links;
pub mod ripple;
pub mod session;
pub mod speed;
pub mod split;
pub mod transitions;
pub mod trim;

// Re-export primary types at crate root for convenience.
pub use clipboard::{Clipboard, ClipboardEntry};
pub use combo::ComboAction;
pub use commands::{ClipFlag, Command, MoveTarget};
pub use history::{History, HistoryEntry};
pub use session::{Edit, EditEvent, EditSession};
pub use trim::TrimEdge;

//! Primitive undoable commands.
//!
//! Every edit is built from the closed set of [`Command`] variants. Each
//! variant captures the state it replaces the first time it runs, so `redo`
//! and `undo` can be repeated in strict alternation. Calling `redo` on an
//! applied command (or `undo` on an unapplied one) does nothing.
//!
//! A command validates everything before mutating. On `Err` the sequence is
//! exactly as it was.

mod clip;
mod sequence;
mod transition;

pub use clip::{
    AddClips, AddedClip, ClipFlag, DeleteClip, LinkClips, MoveClip, MoveTarget, RenameClips,
    SetClipFlag, SetLinks, SetSpeed,
};
pub use sequence::{AddMarker, DeleteMarkers, MoveMarker, SetSelections, SetWorkarea};
pub use transition::{
    AddTransition, DeleteTransition, DetachTransition, ModifyTransition, TransferTransition,
};

use cn_common::EditResult;
use cn_timeline::Sequence;
use serde::{Deserialize, Serialize};

/// One primitive edit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Command {
    MoveClip(MoveClip),
    DeleteClip(DeleteClip),
    AddClips(AddClips),
    SetClipFlag(SetClipFlag),
    RenameClips(RenameClips),
    SetSpeed(SetSpeed),
    SetLinks(SetLinks),
    LinkClips(LinkClips),
    AddTransition(AddTransition),
    ModifyTransition(ModifyTransition),
    DeleteTransition(DeleteTransition),
    DetachTransition(DetachTransition),
    TransferTransition(TransferTransition),
    SetSelections(SetSelections),
    AddMarker(AddMarker),
    MoveMarker(MoveMarker),
    DeleteMarkers(DeleteMarkers),
    SetWorkarea(SetWorkarea),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::MoveClip(_) => "move clip",
            Command::DeleteClip(_) => "delete clip",
            Command::AddClips(_) => "add clips",
            Command::SetClipFlag(_) => "set clip flag",
            Command::RenameClips(_) => "rename clips",
            Command::SetSpeed(_) => "set speed",
            Command::SetLinks(_) => "set links",
            Command::LinkClips(_) => "link clips",
            Command::AddTransition(_) => "add transition",
            Command::ModifyTransition(_) => "modify transition",
            Command::DeleteTransition(_) => "delete transition",
            Command::DetachTransition(_) => "detach transition",
            Command::TransferTransition(_) => "transfer transition",
            Command::SetSelections(_) => "set selections",
            Command::AddMarker(_) => "add marker",
            Command::MoveMarker(_) => "move marker",
            Command::DeleteMarkers(_) => "delete markers",
            Command::SetWorkarea(_) => "set workarea",
        }
    }

    pub fn redo(&mut self, seq: &mut Sequence) -> EditResult<()> {
        tracing::trace!(command = self.name(), "redo");
        match self {
            Command::MoveClip(c) => c.redo(seq),
            Command::DeleteClip(c) => c.redo(seq),
            Command::AddClips(c) => c.redo(seq),
            Command::SetClipFlag(c) => c.redo(seq),
            Command::RenameClips(c) => c.redo(seq),
            Command::SetSpeed(c) => c.redo(seq),
            Command::SetLinks(c) => c.redo(seq),
            Command::LinkClips(c) => c.redo(seq),
            Command::AddTransition(c) => c.redo(seq),
            Command::ModifyTransition(c) => c.redo(seq),
            Command::DeleteTransition(c) => c.redo(seq),
            Command::DetachTransition(c) => c.redo(seq),
            Command::TransferTransition(c) => c.redo(seq),
            Command::SetSelections(c) => c.redo(seq),
            Command::AddMarker(c) => c.redo(seq),
            Command::MoveMarker(c) => c.redo(seq),
            Command::DeleteMarkers(c) => c.redo(seq),
            Command::SetWorkarea(c) => c.redo(seq),
        }
    }

    pub fn undo(&mut self, seq: &mut Sequence) -> EditResult<()> {
        tracing::trace!(command = self.name(), "undo");
        match self {
            Command::MoveClip(c) => c.undo(seq),
            Command::DeleteClip(c) => c.undo(seq),
            Command::AddClips(c) => c.undo(seq),
            Command::SetClipFlag(c) => c.undo(seq),
            Command::RenameClips(c) => c.undo(seq),
            Command::SetSpeed(c) => c.undo(seq),
            Command::SetLinks(c) => c.undo(seq),
            Command::LinkClips(c) => c.undo(seq),
            Command::AddTransition(c) => c.undo(seq),
            Command::ModifyTransition(c) => c.undo(seq),
            Command::DeleteTransition(c) => c.undo(seq),
            Command::DetachTransition(c) => c.undo(seq),
            Command::TransferTransition(c) => c.undo(seq),
            Command::SetSelections(c) => c.undo(seq),
            Command::AddMarker(c) => c.undo(seq),
            Command::MoveMarker(c) => c.undo(seq),
            Command::DeleteMarkers(c) => c.undo(seq),
            Command::SetWorkarea(c) => c.undo(seq),
        }
    }
}

macro_rules! impl_from_command {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for Command {
                fn from(cmd: $variant) -> Self {
                    Command::$variant(cmd)
                }
            }
        )*
    };
}

impl_from_command!(
    MoveClip,
    DeleteClip,
    AddClips,
    SetClipFlag,
    RenameClips,
    SetSpeed,
    SetLinks,
    LinkClips,
    AddTransition,
    ModifyTransition,
    DeleteTransition,
    DetachTransition,
    TransferTransition,
    SetSelections,
    AddMarker,
    MoveMarker,
    DeleteMarkers,
    SetWorkarea,
);

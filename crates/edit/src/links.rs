//! Linking and unlinking clips.

use cn_common::{ClipId, EditResult};
use cn_timeline::Sequence;

use crate::commands::LinkClips;
use crate::session::Edit;

/// `ids` plus every live clip reachable from them through links.
pub fn linked_closure(seq: &Sequence, ids: &[ClipId]) -> Vec<ClipId> {
    let mut closure: Vec<ClipId> = Vec::new();
    let mut queue: Vec<ClipId> = ids.to_vec();
    while let Some(id) = queue.pop() {
        if closure.contains(&id) {
            continue;
        }
        let Some(clip) = seq.clip(id) else {
            continue;
        };
        closure.push(id);
        queue.extend(clip.linked.iter().copied());
    }
    closure.sort();
    closure
}

fn dedup(ids: &[ClipId]) -> Vec<ClipId> {
    let mut ids = ids.to_vec();
    ids.sort();
    ids.dedup();
    ids
}

/// Link `ids` to each other. Existing links are kept. Returns whether
/// anything was linked.
pub fn link_clips(edit: &mut Edit<'_>, ids: &[ClipId]) -> EditResult<bool> {
    let ids = dedup(ids);
    if ids.len() < 2 {
        return Ok(false);
    }
    tracing::debug!(clips = ids.len(), "Linking clips");
    edit.append(LinkClips::link(ids))?;
    Ok(true)
}

/// Clear the links of `ids` and of every clip linked to them, directly or
/// not. Returns whether any link was removed.
pub fn unlink_clips(edit: &mut Edit<'_>, ids: &[ClipId]) -> EditResult<bool> {
    let seq = edit.sequence();
    let group: Vec<ClipId> = linked_closure(seq, ids)
        .into_iter()
        .filter(|id| seq.clip(*id).is_some_and(|c| !c.linked.is_empty()))
        .collect();
    if group.is_empty() {
        return Ok(false);
    }
    tracing::debug!(clips = group.len(), "Unlinking clips");
    edit.append(LinkClips::unlink(group))?;
    Ok(true)
}

/// Unlink `ids` if any of them is linked, otherwise link them together.
pub fn toggle_links(edit: &mut Edit<'_>, ids: &[ClipId]) -> EditResult<bool> {
    if ids.is_empty() {
        return Ok(false);
    }
    let seq = edit.sequence();
    for id in ids {
        seq.require_clip(*id)?;
    }
    let any_linked = ids
        .iter()
        .any(|id| seq.clip(*id).is_some_and(|c| !c.linked.is_empty()));
    if any_linked {
        unlink_clips(edit, ids)
    } else {
        link_clips(edit, ids)
    }
}

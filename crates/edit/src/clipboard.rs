//! Copy, cut and paste of clips.
//!
//! The clipboard holds detached copies of clips together with the ids they
//! had when copied (`load_id`), so links between copied clips can be mapped
//! onto the ids the pasted clips receive.

use serde::{Deserialize, Serialize};

use cn_common::{refactor_frame_number_rational, ClipId, EditResult, Frame, Rational};
use cn_timeline::{DetachedClip, Selection, Sequence};

use crate::commands::SetLinks;
use crate::delete::clear_areas;
use crate::ripple::ripple;
use crate::session::Edit;
use crate::split::split_all_clips_at_point;

/// One copied clip.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClipboardEntry {
    /// Id of the clip in the sequence it was copied from.
    pub load_id: ClipId,
    /// The copy. Its `linked` list still holds source ids.
    pub draft: DetachedClip,
}

/// Copied clips, positioned relative to the earliest one, and the frame
/// rate they were copied at.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Clipboard {
    entries: Vec<ClipboardEntry>,
    frame_rate: Rational,
}

impl Clipboard {
    pub fn new(frame_rate: Rational) -> Self {
        Self {
            entries: Vec::new(),
            frame_rate,
        }
    }

    /// Copy every clip lying entirely inside the current selection.
    pub fn copy(seq: &Sequence) -> Self {
        let mut entries: Vec<ClipboardEntry> = seq
            .selected_clips(true)
            .into_iter()
            .filter_map(|id| {
                let mut draft = seq.copy_clip(id).ok()?;
                draft.clip.linked = seq.clip(id)?.linked.clone();
                Some(ClipboardEntry { load_id: id, draft })
            })
            .collect();

        let start = entries
            .iter()
            .map(|e| e.draft.clip.timeline_in())
            .min()
            .unwrap_or(0);
        for entry in &mut entries {
            entry.draft.clip.placement.update(|p| {
                p.timeline_in -= start;
                p.timeline_out -= start;
            });
        }
        tracing::debug!(clips = entries.len(), "Copied to clipboard");
        Self {
            entries,
            frame_rate: seq.frame_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ClipboardEntry] {
        &self.entries
    }

    pub fn frame_rate(&self) -> Rational {
        self.frame_rate
    }
}

/// Fit a copied clip to the destination: convert its frame rate, clamp it to
/// its media and place it relative to `start`.
fn prepare(mut draft: DetachedClip, src: Rational, dst: Rational, start: Frame) -> DetachedClip {
    if src != dst {
        let convert = |f: Frame| refactor_frame_number_rational(f, src, dst);
        draft.clip.placement.update(|p| {
            p.timeline_in = convert(p.timeline_in);
            p.timeline_out = convert(p.timeline_out).max(p.timeline_in + 1);
            p.clip_in = convert(p.clip_in);
        });
        draft.clip.refactor_frame_rate(dst.as_f64() / src.as_f64(), false);
        for t in [draft.opening.as_mut(), draft.closing.as_mut()].into_iter().flatten() {
            t.length = convert(t.length).max(1);
        }
    }
    draft.clip.recalculate_max_length(dst);
    let max_length = draft.clip.max_length;
    draft.clip.placement.update(|p| {
        p.timeline_in += start;
        p.timeline_out += start;
        if let Some(max) = max_length {
            p.clip_in = p.clip_in.min(max - 1).max(0);
            p.timeline_out = p.timeline_out.min(p.timeline_in + (max - p.clip_in).max(1));
        }
    });
    draft.clip.linked.clear();

    let length = draft.clip.length();
    for t in [draft.opening.as_mut(), draft.closing.as_mut()].into_iter().flatten() {
        t.length = t.length.min(length);
    }
    draft
}

/// Paste the clipboard at the playhead. Returns the ids of the new clips.
///
/// Without `insert`, whatever the pasted clips land on is deleted first. With
/// `insert`, every clip under the paste point is split and everything after
/// it moves out of the way.
pub fn paste(edit: &mut Edit<'_>, clipboard: &Clipboard, insert: bool) -> EditResult<Vec<ClipId>> {
    if clipboard.is_empty() {
        return Ok(Vec::new());
    }
    let seq = edit.sequence();
    let (src, dst, playhead) = (clipboard.frame_rate, seq.frame_rate, seq.playhead);
    let drafts: Vec<DetachedClip> = clipboard
        .entries
        .iter()
        .map(|e| prepare(e.draft.clone(), src, dst, playhead))
        .collect();

    let paste_start = drafts.iter().map(|d| d.clip.timeline_in()).min().unwrap_or(playhead);
    let paste_end = drafts.iter().map(|d| d.clip.timeline_out()).max().unwrap_or(playhead);
    if insert {
        split_all_clips_at_point(edit, paste_start)?;
        ripple(edit, paste_start, paste_end - paste_start, &[])?;
    } else {
        let areas: Vec<Selection> = drafts
            .iter()
            .map(|d| Selection::new(d.clip.track(), d.clip.timeline_in(), d.clip.timeline_out()))
            .collect();
        clear_areas(edit, &areas, &[])?;
    }

    let ids = edit.add_clips(drafts)?;
    let changes: Vec<(ClipId, Vec<ClipId>)> = clipboard
        .entries
        .iter()
        .zip(&ids)
        .filter_map(|(entry, id)| {
            let links: Vec<ClipId> = entry
                .draft
                .clip
                .linked
                .iter()
                .filter_map(|old| clipboard.entries.iter().position(|e| e.load_id == *old))
                .filter_map(|k| ids.get(k).copied())
                .collect();
            (!links.is_empty()).then_some((*id, links))
        })
        .collect();
    if !changes.is_empty() {
        edit.append(SetLinks::new(changes))?;
    }

    if edit.config().seek_after_paste {
        edit.seek(paste_end);
    }
    tracing::debug!(clips = ids.len(), paste_start, paste_end, insert, "Pasted");
    Ok(ids)
}

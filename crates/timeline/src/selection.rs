//! Per-track selection intervals and their clean-up.

use cn_common::{Frame, Track};
use serde::{Deserialize, Serialize};

/// A half-open `[timeline_in, timeline_out)` interval on one track.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    pub timeline_in: Frame,
    pub timeline_out: Frame,
    pub track: Track,
}

impl Selection {
    pub fn new(track: Track, timeline_in: Frame, timeline_out: Frame) -> Self {
        Self {
            timeline_in,
            timeline_out,
            track,
        }
    }

    pub fn length(&self) -> Frame {
        self.timeline_out - self.timeline_in
    }

    /// Whether `[a, b)` on this track shares at least one frame with the selection.
    pub fn overlaps(&self, a: Frame, b: Frame) -> bool {
        a < self.timeline_out && b > self.timeline_in
    }

    /// Whether `[a, b)` lies entirely inside the selection.
    pub fn contains(&self, a: Frame, b: Frame) -> bool {
        a >= self.timeline_in && b <= self.timeline_out
    }
}

/// Merge overlapping and touching selections on the same track.
///
/// Each selection is checked against every other one on its track:
/// - contained in another: dropped;
/// - strictly containing another: kept (the other is dropped on its turn);
/// - overlapping or touching an edge: the other is extended to absorb it, then
///   it is dropped.
///
/// After a removal the scan resumes at the same index. The result is sorted by
/// track and in point, so equal unions always clean up to equal vectors.
pub fn clean_up_selections(areas: &mut Vec<Selection>) {
    let mut i = 0;
    while i < areas.len() {
        let s = areas[i];
        let mut removed = false;
        for j in 0..areas.len() {
            if i == j || areas[j].track != s.track {
                continue;
            }
            let ss = &mut areas[j];
            let absorb = if s.timeline_in < ss.timeline_in && s.timeline_out > ss.timeline_out {
                false
            } else if s.timeline_in >= ss.timeline_in && s.timeline_out <= ss.timeline_out {
                true
            } else if s.timeline_in <= ss.timeline_out && s.timeline_out > ss.timeline_out {
                ss.timeline_out = s.timeline_out;
                true
            } else if s.timeline_out >= ss.timeline_in && s.timeline_in < ss.timeline_in {
                ss.timeline_in = s.timeline_in;
                true
            } else {
                false
            };
            if absorb {
                areas.remove(i);
                removed = true;
                break;
            }
        }
        if !removed {
            i += 1;
        }
    }
    areas.sort_by_key(|s| (s.track, s.timeline_in));
}

/// Remove `[timeline_in, timeline_out)` on `track` from the selection set,
/// splitting selections that straddle the removed interval.
pub fn deselect_area(
    areas: &mut Vec<Selection>,
    track: Track,
    timeline_in: Frame,
    timeline_out: Frame,
) {
    let mut i = 0;
    while i < areas.len() {
        let s = areas[i];
        if s.track == track {
            if s.timeline_in >= timeline_in && s.timeline_out <= timeline_out {
                areas.remove(i);
                continue;
            } else if s.timeline_in < timeline_in && s.timeline_out > timeline_out {
                areas[i].timeline_out = timeline_in;
                areas.push(Selection::new(track, timeline_out, s.timeline_out));
            } else if s.timeline_in < timeline_in && s.timeline_out > timeline_in {
                areas[i].timeline_out = timeline_in;
            } else if s.timeline_in < timeline_out && s.timeline_out > timeline_out {
                areas[i].timeline_in = timeline_out;
            }
        }
        i += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sel(track: Track, a: Frame, b: Frame) -> Selection {
        Selection::new(track, a, b)
    }

    #[test]
    fn contained_is_dropped() {
        let mut areas = vec![sel(0, 10, 20), sel(0, 0, 50)];
        clean_up_selections(&mut areas);
        assert_eq!(areas, vec![sel(0, 0, 50)]);
    }

    #[test]
    fn overlapping_edges_merge() {
        let mut areas = vec![sel(0, 0, 30), sel(0, 20, 50), sel(0, 45, 60)];
        clean_up_selections(&mut areas);
        assert_eq!(areas, vec![sel(0, 0, 60)]);
    }

    #[test]
    fn touching_intervals_merge() {
        let mut areas = vec![sel(1, 10, 20), sel(1, 0, 10)];
        clean_up_selections(&mut areas);
        assert_eq!(areas, vec![sel(1, 0, 20)]);
    }

    #[test]
    fn other_tracks_untouched() {
        let mut areas = vec![sel(0, 0, 30), sel(-1, 10, 20), sel(0, 50, 60)];
        clean_up_selections(&mut areas);
        assert_eq!(areas, vec![sel(-1, 10, 20), sel(0, 0, 30), sel(0, 50, 60)]);
    }

    #[test]
    fn duplicates_collapse() {
        let mut areas = vec![sel(0, 5, 9), sel(0, 5, 9), sel(0, 5, 9)];
        clean_up_selections(&mut areas);
        assert_eq!(areas, vec![sel(0, 5, 9)]);
    }

    #[test]
    fn deselect_splits_straddling_selection() {
        let mut areas = vec![sel(0, 0, 100), sel(1, 0, 100)];
        deselect_area(&mut areas, 0, 40, 60);
        areas.sort_by_key(|s| (s.track, s.timeline_in));
        assert_eq!(areas, vec![sel(0, 0, 40), sel(0, 60, 100), sel(1, 0, 100)]);
    }

    #[test]
    fn deselect_trims_and_removes() {
        let mut areas = vec![sel(0, 0, 20), sel(0, 30, 40), sel(0, 50, 70)];
        deselect_area(&mut areas, 0, 10, 60);
        assert_eq!(areas, vec![sel(0, 0, 10), sel(0, 60, 70)]);
    }
}

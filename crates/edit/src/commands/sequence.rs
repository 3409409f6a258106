//! Primitive commands on sequence-level state: selections, markers, workarea.

use cn_common::{EditError, EditResult, Frame};
use cn_timeline::{Marker, Selection, Sequence, Workarea};
use serde::{Deserialize, Serialize};

/// Replace the selection set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SetSelections {
    new: Vec<Selection>,
    old: Option<Vec<Selection>>,
}

impl SetSelections {
    pub fn new(selections: Vec<Selection>) -> Self {
        Self {
            new: selections,
            old: None,
        }
    }

    pub fn redo(&mut self, seq: &mut Sequence) -> EditResult<()> {
        if self.old.is_some() {
            return Ok(());
        }
        self.old = Some(std::mem::replace(&mut seq.selections, self.new.clone()));
        Ok(())
    }

    pub fn undo(&mut self, seq: &mut Sequence) -> EditResult<()> {
        if let Some(old) = self.old.take() {
            seq.selections = old;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AddMarker {
    marker: Marker,
    applied: bool,
}

impl AddMarker {
    pub fn new(marker: Marker) -> Self {
        Self {
            marker,
            applied: false,
        }
    }

    pub fn redo(&mut self, seq: &mut Sequence) -> EditResult<()> {
        if self.applied {
            return Ok(());
        }
        seq.markers.push(self.marker.clone());
        self.applied = true;
        Ok(())
    }

    pub fn undo(&mut self, seq: &mut Sequence) -> EditResult<()> {
        if !self.applied {
            return Ok(());
        }
        seq.markers.pop();
        self.applied = false;
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoveMarker {
    index: usize,
    frame: Frame,
    old: Option<Frame>,
}

impl MoveMarker {
    pub fn new(index: usize, frame: Frame) -> Self {
        Self {
            index,
            frame,
            old: None,
        }
    }

    pub fn redo(&mut self, seq: &mut Sequence) -> EditResult<()> {
        if self.old.is_some() {
            return Ok(());
        }
        let marker = seq
            .markers
            .get_mut(self.index)
            .ok_or(EditError::MarkerNotFound { index: self.index })?;
        self.old = Some(marker.frame);
        marker.frame = self.frame.max(0);
        Ok(())
    }

    pub fn undo(&mut self, seq: &mut Sequence) -> EditResult<()> {
        let Some(old) = self.old.take() else {
            return Ok(());
        };
        seq.markers
            .get_mut(self.index)
            .ok_or(EditError::MarkerNotFound { index: self.index })?
            .frame = old;
        Ok(())
    }
}

/// Remove several markers by index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeleteMarkers {
    indices: Vec<usize>,
    removed: Option<Vec<(usize, Marker)>>,
}

impl DeleteMarkers {
    pub fn new(mut indices: Vec<usize>) -> Self {
        indices.sort_unstable();
        indices.dedup();
        Self {
            indices,
            removed: None,
        }
    }

    pub fn redo(&mut self, seq: &mut Sequence) -> EditResult<()> {
        if self.removed.is_some() {
            return Ok(());
        }
        if let Some(&index) = self.indices.iter().find(|i| **i >= seq.markers.len()) {
            return Err(EditError::MarkerNotFound { index });
        }
        // Highest first so earlier indices stay valid.
        let removed = self
            .indices
            .iter()
            .rev()
            .map(|&i| (i, seq.markers.remove(i)))
            .collect();
        self.removed = Some(removed);
        Ok(())
    }

    pub fn undo(&mut self, seq: &mut Sequence) -> EditResult<()> {
        let Some(removed) = self.removed.take() else {
            return Ok(());
        };
        for (index, marker) in removed.into_iter().rev() {
            seq.markers.insert(index, marker);
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SetWorkarea {
    new: Workarea,
    old: Option<Workarea>,
}

impl SetWorkarea {
    pub fn new(workarea: Workarea) -> Self {
        Self {
            new: workarea,
            old: None,
        }
    }

    pub fn redo(&mut self, seq: &mut Sequence) -> EditResult<()> {
        if self.old.is_some() {
            return Ok(());
        }
        if self.new.enabled && self.new.timeline_in >= self.new.timeline_out {
            return Err(EditError::InvalidSequence {
                reason: format!(
                    "workarea [{}, {}) is empty",
                    self.new.timeline_in, self.new.timeline_out
                ),
            });
        }
        self.old = Some(std::mem::replace(&mut seq.workarea, self.new));
        Ok(())
    }

    pub fn undo(&mut self, seq: &mut Sequence) -> EditResult<()> {
        if let Some(old) = self.old.take() {
            seq.workarea = old;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cn_common::{Rational, Resolution};

    fn make_sequence() -> Sequence {
        Sequence::new("Test", Rational::FPS_30, Resolution::HD)
    }

    fn marker(frame: Frame, name: &str) -> Marker {
        Marker {
            frame,
            name: name.to_string(),
            color: [255, 0, 0],
        }
    }

    #[test]
    fn selections_swap() {
        let mut seq = make_sequence();
        seq.selections.push(Selection::new(0, 0, 10));
        let mut cmd = SetSelections::new(vec![Selection::new(1, 5, 6)]);
        cmd.redo(&mut seq).unwrap();
        assert_eq!(seq.selections, vec![Selection::new(1, 5, 6)]);
        cmd.undo(&mut seq).unwrap();
        assert_eq!(seq.selections, vec![Selection::new(0, 0, 10)]);
    }

    #[test]
    fn marker_lifecycle() {
        let mut seq = make_sequence();
        let before = seq.clone();

        let mut add_a = AddMarker::new(marker(10, "a"));
        let mut add_b = AddMarker::new(marker(20, "b"));
        let mut add_c = AddMarker::new(marker(30, "c"));
        add_a.redo(&mut seq).unwrap();
        add_b.redo(&mut seq).unwrap();
        add_c.redo(&mut seq).unwrap();

        let mut mv = MoveMarker::new(1, 25);
        mv.redo(&mut seq).unwrap();
        assert_eq!(seq.markers[1].frame, 25);

        let mut del = DeleteMarkers::new(vec![2, 0]);
        del.redo(&mut seq).unwrap();
        assert_eq!(seq.markers.len(), 1);
        assert_eq!(seq.markers[0].name, "b");

        del.undo(&mut seq).unwrap();
        assert_eq!(
            seq.markers.iter().map(|m| m.name.as_str()).collect::<Vec<_>>(),
            vec!["a", "b", "c"]
        );
        mv.undo(&mut seq).unwrap();
        add_c.undo(&mut seq).unwrap();
        add_b.undo(&mut seq).unwrap();
        add_a.undo(&mut seq).unwrap();
        assert_eq!(seq, before);
    }

    #[test]
    fn marker_index_errors() {
        let mut seq = make_sequence();
        assert_eq!(
            MoveMarker::new(0, 5).redo(&mut seq).unwrap_err(),
            EditError::MarkerNotFound { index: 0 }
        );
        seq.markers.push(marker(0, "only"));
        assert_eq!(
            DeleteMarkers::new(vec![0, 3]).redo(&mut seq).unwrap_err(),
            EditError::MarkerNotFound { index: 3 }
        );
        assert_eq!(seq.markers.len(), 1);
    }

    #[test]
    fn workarea_validation() {
        let mut seq = make_sequence();
        let bad = Workarea {
            enabled: true,
            timeline_in: 50,
            timeline_out: 10,
        };
        assert!(SetWorkarea::new(bad).redo(&mut seq).is_err());

        let good = Workarea {
            enabled: true,
            timeline_in: 10,
            timeline_out: 50,
        };
        let mut cmd = SetWorkarea::new(good);
        cmd.redo(&mut seq).unwrap();
        assert_eq!(seq.workarea, good);
        cmd.undo(&mut seq).unwrap();
        assert_eq!(seq.workarea, Workarea::default());
    }
}

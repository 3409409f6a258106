//! Project data model.
//!
//! A project file is a named list of sequences. Clips and transitions keep
//! their arena ids on disk, so links and transition parent/secondary ids load
//! back unchanged. Selections are session state and are not saved.

use cn_timeline::Sequence;
use serde::{Deserialize, Serialize};

use crate::migrate::CURRENT_VERSION;

/// File extension used for project files.
pub const FILE_EXTENSION: &str = "cnp";

/// Top-level project file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectFile {
    /// Project format version.
    pub version: u32,
    /// Human-readable project name.
    pub name: String,
    #[serde(default)]
    pub sequences: Vec<Sequence>,
    /// Index into `sequences` of the sequence open in the editor.
    #[serde(default)]
    pub active_sequence: Option<usize>,
}

impl ProjectFile {
    /// Create a new empty project.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: CURRENT_VERSION,
            name: name.into(),
            sequences: Vec::new(),
            active_sequence: None,
        }
    }

    /// Add a sequence and make it active. Returns its index.
    pub fn add_sequence(&mut self, sequence: Sequence) -> usize {
        self.sequences.push(sequence);
        let index = self.sequences.len() - 1;
        self.active_sequence = Some(index);
        index
    }

    pub fn active(&self) -> Option<&Sequence> {
        self.active_sequence.and_then(|i| self.sequences.get(i))
    }

    pub fn active_mut(&mut self) -> Option<&mut Sequence> {
        self.active_sequence.and_then(|i| self.sequences.get_mut(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cn_common::{Rational, Resolution};
    use cn_timeline::Selection;

    #[test]
    fn new_project_is_current_and_empty() {
        let project = ProjectFile::new("Empty");
        assert_eq!(project.version, CURRENT_VERSION);
        assert!(project.sequences.is_empty());
        assert!(project.active().is_none());
    }

    #[test]
    fn add_sequence_activates_it() {
        let mut project = ProjectFile::new("Two");
        project.add_sequence(Sequence::new("A", Rational::FPS_24, Resolution::HD));
        let index = project.add_sequence(Sequence::new("B", Rational::FPS_25, Resolution::UHD));
        assert_eq!(index, 1);
        assert_eq!(project.active().map(|s| s.name.as_str()), Some("B"));

        project.active_mut().unwrap().playhead = 12;
        assert_eq!(project.sequences[1].playhead, 12);
    }

    #[test]
    fn selections_are_not_serialized() {
        let mut project = ProjectFile::new("Sel");
        let mut seq = Sequence::new("A", Rational::FPS_30, Resolution::HD);
        seq.selections.push(Selection::new(0, 0, 10));
        project.add_sequence(seq);

        let json = serde_json::to_string(&project).expect("serialize");
        let loaded: ProjectFile = serde_json::from_str(&json).expect("deserialize");
        assert!(loaded.sequences[0].selections.is_empty());
    }
}

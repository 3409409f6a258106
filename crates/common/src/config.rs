//! Editor configuration consumed by the edit session.

use serde::{Deserialize, Serialize};

use crate::types::Frame;

/// Transition kind identifiers used for the configurable defaults.
///
/// The timeline crate maps these onto its own transition kinds; keeping the
/// config free of timeline types lets it be loaded before any sequence exists.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DefaultTransition {
    #[default]
    CrossDissolve,
    DipToBlack,
    LinearFade,
    ExponentialFade,
    LogarithmicFade,
}

/// Top-level editor configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Maximum number of undo entries kept; the oldest are evicted first.
    pub history_limit: usize,
    /// Length in frames of transitions created by "add default transition".
    pub default_transition_length: Frame,
    /// Transition used on video tracks by "add default transition".
    pub default_video_transition: DefaultTransition,
    /// Transition used on audio tracks by "add default transition".
    pub default_audio_transition: DefaultTransition,
    /// Move the playhead to the end of pasted material.
    pub seek_after_paste: bool,
    /// Split linked clips together with the clip being split.
    pub split_linked_clips: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: 200,
            default_transition_length: 30,
            default_video_transition: DefaultTransition::CrossDissolve,
            default_audio_transition: DefaultTransition::LinearFade,
            seek_after_paste: false,
            split_linked_clips: true,
        }
    }
}

impl EditorConfig {
    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Transition length clamped to what fits in a clip of `available` frames.
    pub fn default_transition_length_for(&self, available: Frame) -> Frame {
        self.default_transition_length.min(available).max(0)
    }
}

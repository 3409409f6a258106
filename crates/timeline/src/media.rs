//! Media a clip can reference: imported footage or a nested sequence.

use cn_common::{refactor_frame_number_rational, seconds_to_frames, Frame, Rational};
use serde::{Deserialize, Serialize};

/// Kind of elementary stream inside a footage file.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamKind {
    Video,
    Audio,
}

/// One stream of an imported footage file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MediaStream {
    /// Index of the stream within its container.
    pub file_index: usize,
    pub kind: StreamKind,
    /// Stills and generators can be stretched to any length.
    #[serde(default)]
    pub infinite_length: bool,
}

/// Source material referenced by a clip.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Media {
    Footage {
        id: String,
        name: String,
        /// Total duration in seconds.
        duration_secs: f64,
        streams: Vec<MediaStream>,
    },
    Sequence {
        id: String,
        name: String,
        /// Last frame of the nested sequence, in its own frame rate.
        end_frame: Frame,
        frame_rate: Rational,
    },
}

impl Media {
    pub fn id(&self) -> &str {
        match self {
            Media::Footage { id, .. } | Media::Sequence { id, .. } => id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Media::Footage { name, .. } | Media::Sequence { name, .. } => name,
        }
    }

    /// Look up a footage stream by its file index.
    pub fn stream(&self, file_index: usize) -> Option<&MediaStream> {
        match self {
            Media::Footage { streams, .. } => streams.iter().find(|s| s.file_index == file_index),
            Media::Sequence { .. } => None,
        }
    }

    /// Usable length in frames of the sequence at `seq_rate` when played at
    /// `speed`. `None` means the media has no length limit.
    pub fn max_length(&self, stream: usize, seq_rate: Rational, speed: f64) -> Option<Frame> {
        let speed = if speed > 0.0 { speed } else { 1.0 };
        match self {
            Media::Footage { duration_secs, .. } => {
                if self.stream(stream).is_some_and(|s| s.infinite_length) {
                    return None;
                }
                let frames = seconds_to_frames(*duration_secs, seq_rate.as_f64());
                Some((frames as f64 / speed).floor() as Frame)
            }
            Media::Sequence {
                end_frame,
                frame_rate,
                ..
            } => {
                let frames = refactor_frame_number_rational(*end_frame, *frame_rate, seq_rate);
                Some((frames as f64 / speed).floor() as Frame)
            }
        }
    }
}

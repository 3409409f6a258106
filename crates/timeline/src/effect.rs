//! Effects attached to clips and their keyframed fields.
//!
//! Only the timing side of effects lives here: keyframe positions must follow
//! the clip when its speed or frame rate changes. Rendering is elsewhere.

use cn_common::Frame;
use serde::{Deserialize, Serialize};

/// A single keyframe. `frame` is relative to the clip's in point.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub frame: Frame,
    pub value: f64,
}

/// One animatable parameter of an effect.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EffectField {
    pub id: String,
    pub value: f64,
    /// Keyframes sorted by frame. Empty means the field is static.
    #[serde(default)]
    pub keyframes: Vec<Keyframe>,
}

/// An effect instance on a clip.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    pub name: String,
    pub enabled: bool,
    pub fields: Vec<EffectField>,
}

impl Effect {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, id: impl Into<String>, value: f64) -> Self {
        self.fields.push(EffectField {
            id: id.into(),
            value,
            keyframes: Vec::new(),
        });
        self
    }

    pub fn field(&self, id: &str) -> Option<&EffectField> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn field_mut(&mut self, id: &str) -> Option<&mut EffectField> {
        self.fields.iter_mut().find(|f| f.id == id)
    }

    /// Rescale every keyframe position by `multiplier`, rounding to the nearest frame.
    pub fn refactor_keyframes(&mut self, multiplier: f64) {
        for field in &mut self.fields {
            for key in &mut field.keyframes {
                key.frame = (key.frame as f64 * multiplier).round() as Frame;
            }
        }
    }

    /// Total number of keyframes across all fields.
    pub fn keyframe_count(&self) -> usize {
        self.fields.iter().map(|f| f.keyframes.len()).sum()
    }
}

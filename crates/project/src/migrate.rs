//! Version migration: transforms older project JSON to the current format.
//!
//! Version 0 files stored a clip's placement fields flat on the clip object.
//! Version 1 nests them under `placement`. Migration runs on the raw JSON
//! value before deserialization so older files never need their own types.

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::{ProjectError, ProjectResult};

/// Current project format version.
pub const CURRENT_VERSION: u32 = 1;

/// Placement fields that version 0 kept directly on the clip.
const PLACEMENT_FIELDS: [&str; 6] = [
    "timeline_in",
    "timeline_out",
    "clip_in",
    "track",
    "media_stream",
    "speed",
];

/// Migrate a project JSON value to the current version in-place.
///
/// Returns the version string after migration. If the project is already at
/// the current version, no changes are made.
pub fn migrate_project(value: &mut Value) -> ProjectResult<String> {
    let obj = value
        .as_object_mut()
        .ok_or_else(|| ProjectError::InvalidProject {
            reason: "project root must be a JSON object".into(),
        })?;

    let version = extract_version(obj)?;

    if version > CURRENT_VERSION {
        return Err(ProjectError::UnsupportedVersion {
            version: version.to_string(),
        });
    }

    if version == CURRENT_VERSION {
        debug!(version, "Project is at current version, no migration needed");
        return Ok(version.to_string());
    }

    let mut current = version;
    while current < CURRENT_VERSION {
        let next = current + 1;
        info!(from = current, to = next, "Migrating project");

        match current {
            0 => migrate_v0_to_v1(obj)?,
            other => {
                return Err(ProjectError::MigrationFailed {
                    from: other.to_string(),
                    to: (other + 1).to_string(),
                    reason: format!("no migration path from version {other}"),
                });
            }
        }

        current = next;
    }

    obj.insert("version".to_string(), Value::Number(CURRENT_VERSION.into()));

    info!(from = version, to = CURRENT_VERSION, "Project migration complete");

    Ok(CURRENT_VERSION.to_string())
}

/// Extract the version number from a project JSON object.
fn extract_version(obj: &Map<String, Value>) -> ProjectResult<u32> {
    match obj.get("version") {
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| ProjectError::InvalidProject {
                reason: "version must be a positive integer".into(),
            }),
        Some(Value::String(s)) => s.parse::<u32>().map_err(|_| ProjectError::InvalidProject {
            reason: format!("cannot parse version string: {s}"),
        }),
        Some(_) => Err(ProjectError::InvalidProject {
            reason: "version field has unexpected type".into(),
        }),
        None => {
            warn!("Project has no version field, assuming version 0");
            Ok(0)
        }
    }
}

fn migration_error(reason: String) -> ProjectError {
    ProjectError::MigrationFailed {
        from: "0".into(),
        to: "1".into(),
        reason,
    }
}

/// Nest every clip's placement fields under `placement`.
///
/// Clip arrays keep their `null` slots; ids are positions in the array.
fn migrate_v0_to_v1(obj: &mut Map<String, Value>) -> ProjectResult<()> {
    if !obj.contains_key("name") {
        obj.insert("name".into(), Value::String("Untitled".into()));
    }

    let Some(sequences) = obj.get_mut("sequences") else {
        obj.insert("sequences".into(), Value::Array(Vec::new()));
        return Ok(());
    };
    let sequences = sequences
        .as_array_mut()
        .ok_or_else(|| migration_error("sequences must be an array".into()))?;

    let mut moved = 0usize;
    for (s, sequence) in sequences.iter_mut().enumerate() {
        let Some(clips) = sequence.get_mut("clips").and_then(Value::as_array_mut) else {
            continue;
        };
        for (c, slot) in clips.iter_mut().enumerate() {
            let Some(clip) = slot.as_object_mut() else {
                continue;
            };
            if clip.contains_key("placement") {
                continue;
            }
            let placement = flatten_to_placement(clip)
                .map_err(|field| migration_error(format!("sequence {s} clip {c} has no {field}")))?;
            clip.insert("placement".into(), Value::Object(placement));
            ensure_field(clip, "enabled", Value::Bool(true));
            ensure_field(clip, "reverse", Value::Bool(false));
            ensure_field(clip, "maintain_audio_pitch", Value::Bool(true));
            ensure_field(clip, "autoscale", Value::Bool(true));
            ensure_field(clip, "media", Value::Null);
            moved += 1;
        }
    }

    debug!(clips = moved, "Nested clip placements");
    Ok(())
}

/// Pull the flat placement fields off a version 0 clip. Older files wrote the
/// timeline range as `in`/`out`. Returns the missing field name on failure.
fn flatten_to_placement(clip: &mut Map<String, Value>) -> Result<Map<String, Value>, &'static str> {
    let mut placement = Map::new();
    for field in PLACEMENT_FIELDS {
        if let Some(v) = clip.remove(field) {
            placement.insert(field.to_string(), v);
        }
    }
    for (alias, field) in [("in", "timeline_in"), ("out", "timeline_out")] {
        if let Some(v) = clip.remove(alias) {
            placement.entry(field).or_insert(v);
        }
    }

    for required in ["timeline_in", "timeline_out", "track"] {
        if !placement.contains_key(required) {
            return Err(required);
        }
    }
    placement.entry("clip_in").or_insert(Value::from(0));
    placement.entry("media_stream").or_insert(Value::from(0));
    placement.entry("speed").or_insert(Value::from(1.0));
    Ok(placement)
}

/// Insert `value` under `key` if the object lacks it.
fn ensure_field(obj: &mut Map<String, Value>, key: &str, value: Value) {
    if !obj.contains_key(key) {
        obj.insert(key.to_string(), value);
    }
}

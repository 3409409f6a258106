//! Structural checks shared by load and save.

use tracing::warn;

use crate::error::{ProjectError, ProjectResult};
use crate::types::ProjectFile;

/// Check the project header, then each sequence's own structural invariants.
pub fn validate_project(project: &ProjectFile) -> ProjectResult<()> {
    if project.name.is_empty() {
        warn!("Project has empty name");
        return Err(ProjectError::InvalidProject {
            reason: "project name is empty".into(),
        });
    }

    if let Some(active) = project.active_sequence {
        if active >= project.sequences.len() {
            return Err(ProjectError::InvalidProject {
                reason: format!(
                    "active sequence {active} out of range ({} sequences)",
                    project.sequences.len()
                ),
            });
        }
    }

    for seq in &project.sequences {
        if seq.resolution.width == 0 || seq.resolution.height == 0 {
            return Err(ProjectError::InvalidProject {
                reason: format!(
                    "sequence '{}' has invalid resolution: {}x{}",
                    seq.name, seq.resolution.width, seq.resolution.height
                ),
            });
        }

        if seq.frame_rate.num == 0 || seq.frame_rate.den == 0 {
            return Err(ProjectError::InvalidProject {
                reason: format!(
                    "sequence '{}' has invalid frame rate: {}/{}",
                    seq.name, seq.frame_rate.num, seq.frame_rate.den
                ),
            });
        }

        seq.check_integrity().map_err(|source| {
            warn!(sequence = %seq.name, error = %source, "Sequence failed integrity check");
            ProjectError::Integrity {
                sequence: seq.name.clone(),
                source,
            }
        })?;
    }

    Ok(())
}

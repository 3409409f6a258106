//! Project deserialization: loading `ProjectFile` from JSON files.

use std::path::Path;

use tracing::{debug, info};

use crate::error::{ProjectError, ProjectResult};
use crate::migrate::migrate_project;
use crate::types::ProjectFile;
use crate::validate::validate_project;

/// Deserialize a project from a JSON string.
///
/// Runs version migration if the project uses an older format, then
/// validates every sequence.
pub fn from_json_string(json: &str) -> ProjectResult<ProjectFile> {
    let mut value: serde_json::Value = serde_json::from_str(json)?;

    let migrated_version = migrate_project(&mut value)?;
    debug!(version = %migrated_version, "Project version after migration");

    let project: ProjectFile = serde_json::from_value(value)?;

    debug!(
        project_name = %project.name,
        version = project.version,
        sequence_count = project.sequences.len(),
        "Deserialized project from JSON"
    );

    validate_project(&project)?;

    Ok(project)
}

/// Load a project from a file at the given path.
pub fn load_project(path: &Path) -> ProjectResult<ProjectFile> {
    if !path.exists() {
        return Err(ProjectError::NotFound {
            path: path.display().to_string(),
        });
    }

    let json = std::fs::read_to_string(path).map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "Failed to read project file");
        ProjectError::Io(e)
    })?;

    let project = from_json_string(&json)?;

    info!(
        project_name = %project.name,
        path = %path.display(),
        sequences = project.sequences.len(),
        "Project loaded successfully"
    );

    Ok(project)
}

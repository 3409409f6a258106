//! Writing projects to disk.
//!
//! A project is checked before anything is written: a sequence that fails
//! `check_integrity()` is refused and the file on disk is left untouched.

use std::ffi::OsString;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info};

use crate::error::{ProjectError, ProjectResult};
use crate::types::ProjectFile;
use crate::validate::validate_project;

/// Serialize a project to pretty-printed JSON. No validation is done here.
pub fn to_json_string(project: &ProjectFile) -> ProjectResult<String> {
    let json = serde_json::to_string_pretty(project)?;
    debug!(project_name = %project.name, bytes = json.len(), "Serialized project");
    Ok(json)
}

/// `<path>.tmp`, next to the target.
fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// Validate `project` and write it to `path`.
///
/// The JSON goes to a staging file that is then renamed over `path`, so a
/// failed save keeps the previous file intact.
pub fn save_project(project: &ProjectFile, path: &Path) -> ProjectResult<()> {
    validate_project(project)?;
    let json = to_json_string(project)?;

    let staging = staging_path(path);
    if let Err(e) = write_synced(&staging, json.as_bytes()) {
        error!(path = %staging.display(), error = %e, "Could not write project");
        let _ = std::fs::remove_file(&staging);
        return Err(ProjectError::Io(e));
    }
    if let Err(e) = std::fs::rename(&staging, path) {
        error!(from = %staging.display(), to = %path.display(), error = %e, "Could not replace project file");
        let _ = std::fs::remove_file(&staging);
        return Err(ProjectError::Io(e));
    }

    info!(
        project_name = %project.name,
        path = %path.display(),
        sequences = project.sequences.len(),
        "Project saved"
    );
    Ok(())
}

//! `cn-project` -- Project file save/load for the Chestnut edit core.
//!
//! A project is a named list of sequences stored as JSON. This crate supports:
//!
//! - **Save/Load**: Serialize/deserialize `ProjectFile` to/from JSON, with
//!   atomic writes.
//! - **Migration**: Upgrade older project layouts before deserialization.
//! - **Validation**: Every sequence must pass `check_integrity()` both when
//!   it is saved and when it is loaded, so a corrupt timeline never reaches
//!   disk and links and transition ownership come back exactly as saved.
//!
//! # Usage
//!
//! ```rust,no_run
//! use cn_common::{Rational, Resolution};
//! use cn_project::{load_project, save_project, ProjectFile};
//! use cn_timeline::Sequence;
//! use std::path::Path;
//!
//! let mut project = ProjectFile::new("My Project");
//! project.add_sequence(Sequence::new("Main", Rational::FPS_30, Resolution::HD));
//!
//! save_project(&project, Path::new("project.cnp")).unwrap();
//!
//! let loaded = load_project(Path::new("project.cnp")).unwrap();
//! assert_eq!(loaded.name, "My Project");
//! ```

pub mod error;
pub mod load;
pub mod migrate;
pub mod save;
pub mod types;
pub mod validate;

// Re-export primary API at crate root
pub use error::{ProjectError, ProjectResult};
pub use load::{from_json_string, load_project};
pub use migrate::{migrate_project, CURRENT_VERSION};
pub use save::{save_project, to_json_string};
pub use types::{ProjectFile, FILE_EXTENSION};
pub use validate::validate_project;

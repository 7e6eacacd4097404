//! Project persistence.
//!
//! The real project-file serializer belongs to the host build graph; the
//! integrator only needs a collaborator it can hand dirty projects to. The
//! JSON store below is the provided implementation, persisting the project
//! graph at the project's recorded path.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::project::Project;

/// Surfaced from the save collaborator. Fatal: the run must be retried from
/// scratch by the caller.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to write project file `{path}`")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize project `{name}`")]
    Serialize {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read project file `{path}`")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse project file `{path}`")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Persistence collaborator: saves one project to its backing storage.
pub trait ProjectStore {
    fn save(&mut self, project: &Project) -> Result<(), PersistenceError>;
}

/// Saves projects as pretty-printed JSON at their recorded path.
#[derive(Debug, Default)]
pub struct JsonProjectStore;

impl JsonProjectStore {
    /// Load a project previously saved by [`save`](ProjectStore::save).
    /// Target definitions are not persisted; the host pipeline re-attaches
    /// them after load.
    pub fn load(&self, path: &Path) -> Result<Project, PersistenceError> {
        let text = fs::read_to_string(path).map_err(|source| PersistenceError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| PersistenceError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl ProjectStore for JsonProjectStore {
    fn save(&mut self, project: &Project) -> Result<(), PersistenceError> {
        let text =
            serde_json::to_string_pretty(project).map_err(|source| PersistenceError::Serialize {
                name: project.name().to_string(),
                source,
            })?;
        fs::write(project.path(), text).map_err(|source| PersistenceError::Write {
            path: project.path().to_path_buf(),
            source,
        })?;
        tracing::debug!("Wrote {}", project.path().display());
        Ok(())
    }
}

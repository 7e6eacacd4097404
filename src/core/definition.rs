//! Collaborator interface supplying per-target autolinking policy.
//!
//! Which logical modules a target depends on, and what the generated
//! provider looks like, are decided by the host pipeline's module-resolution
//! step. The integrator only asks the questions below and treats the answers
//! as opaque.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Reported by the provider generator. Fatal to the current pass: the
/// integrator does not retry, the caller must re-run the whole step.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct GenerationError {
    message: String,
    #[source]
    source: Option<io::Error>,
}

impl GenerationError {
    /// A generation failure with no underlying cause.
    pub fn new(message: impl Into<String>) -> Self {
        GenerationError {
            message: message.into(),
            source: None,
        }
    }

    /// A generation failure caused by an I/O error (typically the artifact
    /// write).
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        GenerationError {
            message: message.into(),
            source: Some(source),
        }
    }
}

/// Autolinking configuration attached to a native target by the host
/// pipeline before the integrator runs.
///
/// A target with no attached definition does not participate in provider
/// integration at all. A target with one participates only while
/// [`needs_provider_generation`](TargetDefinition::needs_provider_generation)
/// returns true; the answer is re-read on every run so that module
/// dependencies added or removed between runs take effect without stale
/// state.
pub trait TargetDefinition: Send + Sync {
    /// Whether this target currently requires a generated module provider.
    fn needs_provider_generation(&self) -> bool;

    /// File name of the provider artifact, e.g. `ModulesProvider.gen.c`.
    fn provider_file_name(&self) -> String;

    /// Directory where generated support files for this target live.
    fn support_files_dir(&self) -> PathBuf;

    /// Generate the provider artifact contents at `output_path`.
    fn generate(&self, target_name: &str, output_path: &Path) -> Result<(), GenerationError>;
}

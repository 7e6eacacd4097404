//! Integration error types.

use thiserror::Error;

use crate::core::definition::GenerationError;
use crate::core::store::PersistenceError;

/// Error during a provider-integration pass.
///
/// Nothing is retried internally; the first failure aborts the pass and
/// propagates to the host pipeline, which decides whether to abort the build
/// or re-run the whole step. In-memory mutations made before the failure
/// stay un-persisted (the dirty flag is set but save never runs), so the
/// on-disk projects are never left half-written.
#[derive(Debug, Error)]
pub enum IntegrateError {
    /// The generator collaborator failed for a target.
    #[error("failed to generate the module provider for target `{target}`")]
    Generation {
        target: String,
        #[source]
        source: GenerationError,
    },

    /// A target classified as participating had no definition attached by
    /// the time it was processed. Contract violation in the host pipeline.
    #[error("target `{target}` has no autolinking definition attached")]
    MissingDefinition { target: String },

    /// The save collaborator failed for a dirty project.
    #[error("failed to persist project `{project}`")]
    Persistence {
        project: String,
        #[source]
        source: PersistenceError,
    },
}

//! Stevedore - wires generated module-provider artifacts into the native
//! build targets of a host application project.
//!
//! Given loaded projects and a set of logical modules each target depends on
//! (decided by an external module-resolution step), the integration pass
//! generates one provider artifact per participating target, registers it
//! exactly once in that target's compiled sources, mirrors generated files
//! in a dedicated group tree, removes whatever became stale, and persists
//! only the projects it actually changed. Re-running with unchanged inputs
//! is a no-op.

pub mod core;
pub mod ops;
pub mod util;

/// Test utilities and stub collaborators for stevedore unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests.
#[cfg(test)]
pub mod test_support;

pub use crate::core::{
    definition::{GenerationError, TargetDefinition},
    project::Project,
    store::{JsonProjectStore, PersistenceError, ProjectStore},
    target::{BuildFile, NativeTarget},
    tree::{FileEntry, Group, GroupTree, Node, NodeId},
};

pub use crate::ops::{needs_provider, IntegrateError, Integrator, GENERATED_GROUP_NAME};

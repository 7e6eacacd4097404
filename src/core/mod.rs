//! Core data model.
//!
//! This module contains the in-memory project graph the integrator mutates:
//! - Projects and their dirty tracking
//! - The arena-backed group tree
//! - Native targets and their source build phase
//! - Collaborator interfaces (autolinking definitions, persistence)

pub mod definition;
pub mod project;
pub mod store;
pub mod target;
pub mod tree;

pub use definition::{GenerationError, TargetDefinition};
pub use project::Project;
pub use store::{JsonProjectStore, PersistenceError, ProjectStore};
pub use target::{BuildFile, NativeTarget};
pub use tree::{FileEntry, Group, GroupTree, Node, NodeId};

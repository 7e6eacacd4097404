//! Native build targets and their compiled-sources build phase.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::definition::TargetDefinition;
use crate::core::tree::NodeId;

/// One entry in a target's source build phase.
///
/// Holds a reference into the owning project's group tree rather than the
/// file itself. The reference dangles once the file node is removed (or was
/// invalidated by the host's own normalization pass); dangling entries are
/// swept by `ops::scrub`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BuildFile {
    file_ref: Option<NodeId>,
}

impl BuildFile {
    /// An entry referencing the file node at `id`.
    pub fn new(id: NodeId) -> Self {
        BuildFile { file_ref: Some(id) }
    }

    /// An entry whose file reference has been invalidated externally.
    pub fn dangling() -> Self {
        BuildFile { file_ref: None }
    }

    /// The referenced file node, if the reference is still set.
    pub fn file_ref(&self) -> Option<NodeId> {
        self.file_ref
    }
}

/// A buildable unit within a project, with its own compiled-sources list.
///
/// Targets are created by the external project loader and never created or
/// destroyed by the integrator; only the build phase is mutated.
#[derive(Serialize, Deserialize)]
pub struct NativeTarget {
    name: String,
    /// Attached by the host pipeline after load; absent for targets that do
    /// not use autolinking.
    #[serde(skip)]
    definition: Option<Arc<dyn TargetDefinition>>,
    source_build_phase: Vec<BuildFile>,
}

impl NativeTarget {
    /// Create a target with no definition and an empty build phase.
    pub fn new(name: impl Into<String>) -> Self {
        NativeTarget {
            name: name.into(),
            definition: None,
            source_build_phase: Vec::new(),
        }
    }

    /// Attach an autolinking definition.
    pub fn with_definition(mut self, definition: Arc<dyn TargetDefinition>) -> Self {
        self.definition = Some(definition);
        self
    }

    /// Replace (or detach) the autolinking definition.
    pub fn set_definition(&mut self, definition: Option<Arc<dyn TargetDefinition>>) {
        self.definition = definition;
    }

    /// The target's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The attached autolinking definition, if any.
    pub fn definition(&self) -> Option<&Arc<dyn TargetDefinition>> {
        self.definition.as_ref()
    }

    /// The compiled-sources build phase, in registration order.
    pub fn source_build_phase(&self) -> &[BuildFile] {
        &self.source_build_phase
    }

    /// Append an entry to the build phase. Duplicate checking is the
    /// caller's job (`ops::integrate` enforces at-most-once registration).
    pub fn push_build_file(&mut self, entry: BuildFile) {
        self.source_build_phase.push(entry);
    }

    /// Keep only the build-phase entries matching `keep`, returning how many
    /// were dropped.
    pub fn retain_build_files(&mut self, keep: impl FnMut(&BuildFile) -> bool) -> usize {
        let before = self.source_build_phase.len();
        self.source_build_phase.retain(keep);
        before - self.source_build_phase.len()
    }
}

impl fmt::Debug for NativeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeTarget")
            .field("name", &self.name)
            .field("has_definition", &self.definition.is_some())
            .field("source_build_phase", &self.source_build_phase)
            .finish()
    }
}

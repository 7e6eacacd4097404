//! Project - one build project plus its dirty flag.
//!
//! A project is loaded once per run by the external parser and saved by the
//! integrator only if dirty. Every structural mutation funnels through a
//! `&mut Project` method here, which is the single place the dirty flag is
//! set; read access goes through the shared accessors.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::target::{BuildFile, NativeTarget};
use crate::core::tree::{GroupTree, NodeId};

/// An in-memory build project: a group tree, native targets, and a dirty
/// flag tracking unsaved mutations.
#[derive(Debug, Serialize, Deserialize)]
pub struct Project {
    name: String,
    /// On-disk location of the project file. Doubles as the project's
    /// identity key when the save pass checks the host's already-scheduled
    /// set.
    path: PathBuf,
    tree: GroupTree,
    targets: Vec<NativeTarget>,
    #[serde(skip)]
    dirty: bool,
}

impl Project {
    /// Create an empty project whose file lives at `path`. Group locations
    /// resolve against the file's parent directory.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let project_dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();
        Project {
            name: name.into(),
            path,
            tree: GroupTree::new(project_dir),
            targets: Vec::new(),
            dirty: false,
        }
    }

    /// The project's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// On-disk location of the project file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The project's group tree.
    pub fn tree(&self) -> &GroupTree {
        &self.tree
    }

    /// The project's native targets, in load order.
    pub fn targets(&self) -> &[NativeTarget] {
        &self.targets
    }

    /// Append a target. Load-time API for the external parser and test
    /// fixtures; does not touch the dirty flag.
    pub fn add_target(&mut self, target: NativeTarget) {
        self.targets.push(target);
    }

    /// Mutable access to the target named `name`. Host pipelines use this
    /// to attach autolinking definitions after load; definitions are
    /// runtime state, so this does not touch the dirty flag either.
    pub fn target_mut(&mut self, name: &str) -> Option<&mut NativeTarget> {
        self.targets.iter_mut().find(|target| target.name() == name)
    }

    /// Whether the project has unsaved in-memory changes.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Flag the project as having unsaved changes.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Clear the dirty flag after a successful save.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Find the group at `path` below `from`, creating missing segments when
    /// `autocreate` is set. Returns `None` when the path is absent and
    /// `autocreate` is false, in which case nothing was mutated.
    pub fn find_or_create_group(
        &mut self,
        from: NodeId,
        path: &str,
        autocreate: bool,
    ) -> Option<NodeId> {
        if autocreate {
            Some(self.ensure_group(from, path))
        } else {
            self.tree.find_subpath(from, path)
        }
    }

    /// Find-or-create without the optionality: always yields a group,
    /// dirtying the project only if something was actually created.
    pub fn ensure_group(&mut self, from: NodeId, path: &str) -> NodeId {
        let before = self.tree.node_count();
        let id = self.tree.ensure_subpath(from, path);
        if self.tree.node_count() > before {
            self.mark_dirty();
        }
        id
    }

    /// Create a file entry under `group` for the artifact at `path`.
    pub fn new_file_in_group(&mut self, group: NodeId, path: &Path) -> NodeId {
        let id = self.tree.new_file(group, path);
        self.mark_dirty();
        id
    }

    /// Remove `group` and everything below it. Returns the number of nodes
    /// removed; 0 (already gone) leaves the dirty flag untouched.
    pub fn remove_group_recursive(&mut self, group: NodeId) -> usize {
        let removed = self.tree.remove_recursive(group);
        if removed > 0 {
            self.mark_dirty();
        }
        removed
    }

    /// Register `file` in the build phase of the target at `target_index`.
    /// Returns false, leaving the project untouched, when the index is out
    /// of range.
    pub fn register_build_file(&mut self, target_index: usize, file: NodeId) -> bool {
        let Some(target) = self.targets.get_mut(target_index) else {
            return false;
        };
        target.push_build_file(BuildFile::new(file));
        self.mark_dirty();
        true
    }

    /// Split borrow for passes that read the tree while rewriting build
    /// phases (`ops::scrub`).
    pub(crate) fn tree_and_targets_mut(&mut self) -> (&GroupTree, &mut [NativeTarget]) {
        (&self.tree, &mut self.targets)
    }
}

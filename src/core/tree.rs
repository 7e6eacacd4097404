//! Group tree - the project's logical file organization.
//!
//! Groups form a tree in which children also know their parent (needed for
//! resolving a group's on-disk location). Rather than owning pointers in both
//! directions, nodes live in an arena indexed by [`NodeId`], and parent/child
//! relations are stored as index pairs.
//!
//! Removal tombstones the arena slot instead of reusing it, so a `NodeId`
//! held elsewhere (a build-phase entry, say) dangles after removal rather
//! than silently aliasing a new node. Dangling references are cleaned up by
//! the scrubbing pass in `ops::scrub`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::util::paths::relative_to;

/// Stable index of a node within a [`GroupTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A node in the group tree: either a nested group or a file reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Node {
    Group(Group),
    File(FileEntry),
}

/// A named folder-like node, distinct from the filesystem layout.
///
/// Invariant: within a parent, child group names are unique. The tree only
/// creates groups through [`GroupTree::ensure_subpath`], which looks up an
/// existing child by name before appending a new one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    name: String,
    /// Optional on-disk path segment. Groups created by `ensure_subpath`
    /// have none and resolve to their parent's location.
    path: Option<PathBuf>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Group {
    /// The group's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The group's on-disk path segment, if it has one.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// A file reference owned by a group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    /// Absolute, or relative to the owning group's resolved location.
    path: PathBuf,
    parent: NodeId,
}

impl FileEntry {
    /// The stored path: absolute, or relative to the owning group.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The group this entry belongs to.
    pub fn parent(&self) -> NodeId {
        self.parent
    }
}

/// Arena-backed tree of groups and file references under one root group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupTree {
    nodes: Vec<Option<Node>>,
    root: NodeId,
    /// Resolved filesystem location of the root group (the project
    /// directory).
    root_location: PathBuf,
}

impl GroupTree {
    /// Create a tree holding a single root group resolving to
    /// `root_location`.
    pub fn new(root_location: impl Into<PathBuf>) -> Self {
        let root_group = Node::Group(Group {
            name: String::new(),
            path: None,
            parent: None,
            children: Vec::new(),
        });
        GroupTree {
            nodes: vec![Some(root_group)],
            root: NodeId(0),
            root_location: root_location.into(),
        }
    }

    /// The root (main) group.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Total number of arena slots ever allocated, tombstones included.
    /// Grows monotonically, so comparing counts detects node creation.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index()).and_then(|slot| slot.as_ref())
    }

    /// The group at `id`, or `None` if `id` is a file or has been removed.
    pub fn group(&self, id: NodeId) -> Option<&Group> {
        match self.node(id) {
            Some(Node::Group(group)) => Some(group),
            _ => None,
        }
    }

    /// The file entry at `id`, or `None` if `id` is a group or has been
    /// removed.
    pub fn file(&self, id: NodeId) -> Option<&FileEntry> {
        match self.node(id) {
            Some(Node::File(file)) => Some(file),
            _ => None,
        }
    }

    /// Children of the group at `id`, in insertion order. Empty for files
    /// and removed nodes.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.node(id) {
            Some(Node::Group(group)) => &group.children,
            _ => &[],
        }
    }

    /// Child groups of `id`, in insertion order.
    pub fn child_groups(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&child| self.group(child).is_some())
            .collect()
    }

    fn find_child_group(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|&child| self.group(child).is_some_and(|g| g.name == name))
    }

    /// Walk `/`-separated segments from `from` without mutating; `None` if
    /// any segment is missing.
    pub fn find_subpath(&self, from: NodeId, path: &str) -> Option<NodeId> {
        let mut current = from;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = self.find_child_group(current, segment)?;
        }
        Some(current)
    }

    /// Walk `/`-separated segments from `from`, creating any missing group
    /// along the way. Created groups carry a name but no path segment, so
    /// they resolve to their parent's location.
    pub fn ensure_subpath(&mut self, from: NodeId, path: &str) -> NodeId {
        let mut current = from;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = match self.find_child_group(current, segment) {
                Some(existing) => existing,
                None => self.create_group(current, segment),
            };
        }
        current
    }

    fn create_group(&mut self, parent: NodeId, name: &str) -> NodeId {
        let id = self.alloc(Node::Group(Group {
            name: name.to_string(),
            path: None,
            parent: Some(parent),
            children: Vec::new(),
        }));
        self.attach(parent, id);
        id
    }

    /// Resolved filesystem location of the group at `id`: the root location
    /// joined with every path segment on the way down.
    pub fn location(&self, id: NodeId) -> PathBuf {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(gid) = current {
            let Some(group) = self.group(gid) else { break };
            if let Some(path) = &group.path {
                segments.push(path.clone());
            }
            current = group.parent;
        }
        let mut location = self.root_location.clone();
        for segment in segments.iter().rev() {
            location.push(segment);
        }
        location
    }

    /// Create a file entry under `group` for the artifact at `path`. The
    /// stored path is rewritten relative to the group's resolved location
    /// when a relative form exists, so lookups and duplicate checks compare
    /// the same string regardless of how the artifact path was supplied.
    pub fn new_file(&mut self, group: NodeId, path: &Path) -> NodeId {
        let stored = relative_to(path, &self.location(group));
        let id = self.alloc(Node::File(FileEntry {
            path: stored,
            parent: group,
        }));
        self.attach(group, id);
        id
    }

    /// Exact match of `path` against the stored paths of `group`'s direct
    /// file children.
    pub fn find_file_by_path(&self, group: NodeId, path: &Path) -> Option<NodeId> {
        self.children(group)
            .iter()
            .copied()
            .find(|&child| self.file(child).is_some_and(|f| f.path == path))
    }

    /// Detach `id` and every descendant from the tree, depth-first. Returns
    /// the number of nodes removed; 0 means `id` was already gone, which
    /// callers treat as "nothing to clean up" rather than an error.
    pub fn remove_recursive(&mut self, id: NodeId) -> usize {
        if self.node(id).is_none() {
            return 0;
        }
        let mut removed = 0;
        for child in self.children(id).to_vec() {
            removed += self.remove_recursive(child);
        }
        self.detach(id);
        removed + 1
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        self.nodes.push(Some(node));
        NodeId((self.nodes.len() - 1) as u32)
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) {
        if let Some(Some(Node::Group(group))) = self.nodes.get_mut(parent.index()) {
            group.children.push(child);
        }
    }

    fn detach(&mut self, id: NodeId) {
        let parent = match self.node(id) {
            Some(Node::Group(group)) => group.parent,
            Some(Node::File(file)) => Some(file.parent),
            None => None,
        };
        if let Some(pid) = parent {
            if let Some(Some(Node::Group(group))) = self.nodes.get_mut(pid.index()) {
                group.children.retain(|&child| child != id);
            }
        }
        self.nodes[id.index()] = None;
    }
}

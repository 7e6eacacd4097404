//! Build-phase scrubbing.
//!
//! The host build graph's own merge/cache normalization can invalidate file
//! references after load, and provider cleanup tombstones file nodes that
//! build phases may still point at. Either way the entry no longer resolves
//! to a file and is safe to drop from the target.

use crate::core::project::Project;

/// Remove every build-phase entry whose file reference no longer resolves.
/// Marks the project dirty if anything was dropped. Returns the number of
/// entries removed.
///
/// Runs once per project, after provider integration, independent of
/// provider state.
pub fn scrub_dangling_refs(project: &mut Project) -> usize {
    let mut removed = 0;
    {
        let (tree, targets) = project.tree_and_targets_mut();
        for target in targets.iter_mut() {
            let dropped = target.retain_build_files(|entry| {
                entry
                    .file_ref()
                    .is_some_and(|id| tree.file(id).is_some())
            });
            if dropped > 0 {
                tracing::debug!(
                    "Removed {} dangling source reference(s) from `{}`",
                    dropped,
                    target.name()
                );
            }
            removed += dropped;
        }
    }
    if removed > 0 {
        project.mark_dirty();
    }
    removed
}
